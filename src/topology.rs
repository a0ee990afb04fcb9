//! Hardware graphs of structured samplers.

use petgraph::graphmap::UnGraphMap;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// An undirected qubit connectivity graph.
///
/// ```
/// # use qubo_tutorials::topology::Topology;
/// let c16 = Topology::chimera(16, 16, 4);
/// assert_eq!(c16.num_nodes(), 2048);
/// assert_eq!(c16.neighbors(0), vec![4, 5, 6, 7, 128]);
/// ```
#[derive(Clone, Debug)]
pub struct Topology {
	name: String,
	graph: UnGraphMap<usize, ()>,
}

/// Shape of a Chimera lattice: `m` rows and `n` columns of unit cells, each a
/// complete bipartite graph K_{t,t}.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChimeraShape {
	pub m: usize,
	pub n: usize,
	pub t: usize,
}

impl ChimeraShape {
	/// Linear index of qubit `k` in half `u` of cell `(i, j)`.
	pub fn linear_index(&self, i: usize, j: usize, u: usize, k: usize) -> usize {
		i * 2 * self.n * self.t + j * 2 * self.t + u * self.t + k
	}

	/// `(i, j, u, k)` of a linear index.
	pub fn coordinates(&self, q: usize) -> (usize, usize, usize, usize) {
		let k = q % self.t;
		let u = q / self.t % 2;
		let j = q / (2 * self.t) % self.n;
		let i = q / (2 * self.n * self.t);
		(i, j, u, k)
	}
}

impl Topology {
	/// Empty graph; nodes and couplers are added with [`Topology::custom`].
	fn empty(name: &str) -> Self {
		Self {
			name: name.to_string(),
			graph: UnGraphMap::new(),
		}
	}

	/// Chimera lattice with linear qubit indexing. Qubits with `u = 0` couple
	/// vertically to the next row, `u = 1` horizontally to the next column.
	pub fn chimera(m: usize, n: usize, t: usize) -> Self {
		let shape = ChimeraShape { m, n, t };
		let mut topology = Self::empty(&format!("chimera({}, {}, {})", m, n, t));
		for q in 0..2 * m * n * t {
			topology.graph.add_node(q);
		}
		for i in 0..m {
			for j in 0..n {
				for k0 in 0..t {
					for k1 in 0..t {
						topology.graph.add_edge(
							shape.linear_index(i, j, 0, k0),
							shape.linear_index(i, j, 1, k1),
							(),
						);
					}
					if i + 1 < m {
						topology.graph.add_edge(
							shape.linear_index(i, j, 0, k0),
							shape.linear_index(i + 1, j, 0, k0),
							(),
						);
					}
					if j + 1 < n {
						topology.graph.add_edge(
							shape.linear_index(i, j, 1, k0),
							shape.linear_index(i, j + 1, 1, k0),
							(),
						);
					}
				}
			}
		}
		topology
	}

	/// Fully connected graph on `n` qubits.
	pub fn complete(n: usize) -> Self {
		let mut topology = Self::empty(&format!("complete({})", n));
		for q in 0..n {
			topology.graph.add_node(q);
		}
		for a in 0..n {
			for b in a + 1..n {
				topology.graph.add_edge(a, b, ());
			}
		}
		topology
	}

	/// Graph made of the given couplers. Self-loops are ignored.
	pub fn custom<I>(name: &str, edges: I) -> Self
	where
		I: IntoIterator<Item = (usize, usize)>,
	{
		let mut topology = Self::empty(name);
		for (a, b) in edges {
			topology.graph.add_node(a);
			topology.graph.add_node(b);
			if a != b {
				topology.graph.add_edge(a, b, ());
			}
		}
		topology
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn graph(&self) -> &UnGraphMap<usize, ()> {
		&self.graph
	}

	pub fn num_nodes(&self) -> usize {
		self.graph.node_count()
	}

	pub fn num_edges(&self) -> usize {
		self.graph.edge_count()
	}

	pub fn contains(&self, q: usize) -> bool {
		self.graph.contains_node(q)
	}

	#[inline]
	pub fn is_connected(&self, a: usize, b: usize) -> bool {
		self.graph.contains_edge(a, b)
	}

	/// Qubits in ascending order.
	pub fn nodes(&self) -> Vec<usize> {
		let mut nodes = self.graph.nodes().collect::<Vec<_>>();
		nodes.sort_unstable();
		nodes
	}

	/// Couplers as `(low, high)` pairs in ascending order.
	pub fn edges(&self) -> Vec<(usize, usize)> {
		let mut edges = self
			.graph
			.all_edges()
			.map(|(a, b, _)| if a < b { (a, b) } else { (b, a) })
			.collect::<Vec<_>>();
		edges.sort_unstable();
		edges
	}

	/// Neighbours of `q` in ascending order, empty if `q` is not a qubit.
	pub fn neighbors(&self, q: usize) -> Vec<usize> {
		if !self.contains(q) {
			return Vec::new();
		}
		let mut neighbors = self.graph.neighbors(q).collect::<Vec<_>>();
		neighbors.sort_unstable();
		neighbors
	}

	pub fn adjacency(&self) -> BTreeMap<usize, BTreeSet<usize>> {
		self.graph
			.nodes()
			.map(|q| (q, self.graph.neighbors(q).collect()))
			.collect()
	}

	/// BFS distances from `sources`, moving only through qubits accepted by
	/// `passable`. Sources always get distance 0.
	pub fn distances_from<F>(&self, sources: &BTreeSet<usize>, passable: F) -> BTreeMap<usize, usize>
	where
		F: Fn(usize) -> bool,
	{
		let mut dist = BTreeMap::new();
		let mut queue = VecDeque::new();
		for &s in sources {
			dist.insert(s, 0);
			queue.push_back(s);
		}
		while let Some(current) = queue.pop_front() {
			let d = dist[&current];
			for next in self.graph.neighbors(current) {
				if !dist.contains_key(&next) && passable(next) {
					dist.insert(next, d + 1);
					queue.push_back(next);
				}
			}
		}
		dist
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn chimera_c16_counts() {
		let c16 = Topology::chimera(16, 16, 4);
		assert_eq!(c16.num_nodes(), 2048);
		assert_eq!(c16.num_edges(), 6016);
		assert!(c16.is_connected(0, 4));
		assert!(c16.is_connected(1, 5));
		assert!(!c16.is_connected(0, 1));
		// horizontal coupler between cells (0, 0) and (0, 1)
		assert!(c16.is_connected(4, 12));
	}

	#[test]
	fn chimera_coordinates_roundtrip() {
		let shape = ChimeraShape { m: 16, n: 16, t: 4 };
		assert_eq!(shape.coordinates(128), (1, 0, 0, 0));
		assert_eq!(shape.linear_index(3, 5, 1, 2), 3 * 128 + 5 * 8 + 4 + 2);
		assert_eq!(shape.coordinates(shape.linear_index(3, 5, 1, 2)), (3, 5, 1, 2));
	}

	#[test]
	fn complete_and_custom_graphs() {
		let k4 = Topology::complete(4);
		assert_eq!(k4.num_edges(), 6);
		assert_eq!(k4.neighbors(2), vec![0, 1, 3]);
		let path = Topology::custom("path", vec![(0, 1), (1, 2), (2, 2)]);
		assert_eq!(path.edges(), vec![(0, 1), (1, 2)]);
		assert!(path.neighbors(7).is_empty());
	}

	#[test]
	fn bfs_respects_passable_qubits() {
		let path = Topology::custom("path", vec![(0, 1), (1, 2), (2, 3)]);
		let sources = Some(0).into_iter().collect();
		let all = path.distances_from(&sources, |_| true);
		assert_eq!(all[&3], 3);
		let blocked = path.distances_from(&sources, |q| q != 2);
		assert!(!blocked.contains_key(&3));
	}
}
