//! Small undirected graphs with integer nodes.

use petgraph::graphmap::UnGraphMap;

pub type Graph = UnGraphMap<usize, ()>;

/// Hub `0` joined to leaves `1..=n`.
pub fn star_graph(n: usize) -> Graph {
	let mut g = Graph::new();
	g.add_node(0);
	for leaf in 1..=n {
		g.add_edge(0, leaf, ());
	}
	g
}

/// Hub `0` joined to a cycle on `1..n`; `n` nodes in total.
pub fn wheel_graph(n: usize) -> Graph {
	let mut g = Graph::new();
	if n == 0 {
		return g;
	}
	g.add_node(0);
	for v in 1..n {
		g.add_edge(0, v, ());
	}
	if n > 3 {
		for v in 1..n {
			let next = if v + 1 < n { v + 1 } else { 1 };
			g.add_edge(v, next, ());
		}
	} else if n == 3 {
		g.add_edge(1, 2, ());
	}
	g
}

/// Two `n`-cycles `0..n` and `n..2n` joined by the rungs `(i, i + n)`.
pub fn circular_ladder_graph(n: usize) -> Graph {
	let mut g = Graph::new();
	for i in 0..n {
		g.add_node(i);
		g.add_node(i + n);
		g.add_edge(i, i + n, ());
		if n > 1 {
			let next = (i + 1) % n;
			g.add_edge(i, next, ());
			g.add_edge(i + n, next + n, ());
		}
	}
	g
}
