//! Minor-embedding of logical models onto hardware graphs.
//!
//! Every logical variable is represented by a chain of physical qubits. The
//! chain is held together by strong ferromagnetic couplers, logical
//! interactions are spread over the couplers joining two chains.

use crate::error::{Error, Result};
use crate::model::{BinaryQuadraticModel, Vartype};
use crate::solution::{Sample, SampleRecord, SampleSet};
use crate::topology::Topology;
use crate::TqType;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::iter::FromIterator;
use std::str::FromStr;
use tracing::{debug, info, instrument};

/// Mapping from logical variables to chains of qubits.
#[derive(Clone, PartialEq, Eq)]
pub struct Embedding<Tq: TqType>(BTreeMap<Tq, BTreeSet<usize>>);

impl<Tq: TqType> Embedding<Tq> {
	pub fn new() -> Self {
		Self(BTreeMap::new())
	}

	pub fn insert<C>(&mut self, v: Tq, chain: C)
	where
		C: IntoIterator<Item = usize>,
	{
		self.0.insert(v, chain.into_iter().collect());
	}

	pub fn chain(&self, v: &Tq) -> Option<&BTreeSet<usize>> {
		self.0.get(v)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&Tq, &BTreeSet<usize>)> {
		self.0.iter()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Total number of qubits used.
	pub fn num_qubits(&self) -> usize {
		self.0.values().map(|c| c.len()).sum()
	}

	pub fn max_chain_length(&self) -> usize {
		self.0.values().map(|c| c.len()).max().unwrap_or(0)
	}

	/// Chains keyed by the debug form of their labels, for reporting.
	pub fn to_json(&self) -> serde_json::Value {
		let map = self
			.0
			.iter()
			.map(|(v, chain)| {
				(
					format!("{:?}", v),
					serde_json::Value::from(chain.iter().copied().collect::<Vec<_>>()),
				)
			})
			.collect::<serde_json::Map<_, _>>();
		serde_json::Value::Object(map)
	}
}

impl<Tq: TqType> Default for Embedding<Tq> {
	fn default() -> Self {
		Self::new()
	}
}

impl<Tq, C> FromIterator<(Tq, C)> for Embedding<Tq>
where
	Tq: TqType,
	C: IntoIterator<Item = usize>,
{
	fn from_iter<I: IntoIterator<Item = (Tq, C)>>(iter: I) -> Self {
		Self(
			iter.into_iter()
				.map(|(v, c)| (v, c.into_iter().collect()))
				.collect(),
		)
	}
}

impl<Tq: TqType> fmt::Debug for Embedding<Tq> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(self.0.iter()).finish()
	}
}

/// How logical values are recovered from broken chains.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainBreakMethod {
	/// Most common value in the chain, ties resolve to the "true" value.
	MajorityVote,
	/// Drop reads with any broken chain.
	Discard,
}

impl Default for ChainBreakMethod {
	fn default() -> Self {
		ChainBreakMethod::MajorityVote
	}
}

impl FromStr for ChainBreakMethod {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"majority_vote" | "majority-vote" => Ok(ChainBreakMethod::MajorityVote),
			"discard" => Ok(ChainBreakMethod::Discard),
			other => Err(Error::InvalidParameter {
				parameter: "chain_break_method",
				reason: format!("unknown method `{}`", other),
			}),
		}
	}
}

/// Chain strength used when none is given: twice the largest absolute bias
/// of the Ising form of `bqm`, or 1 for a model without biases.
pub fn default_chain_strength<Tq: TqType>(bqm: &BinaryQuadraticModel<Tq>) -> f64 {
	let m = bqm.change_vartype(Vartype::Spin).max_abs_bias();
	if m > 0.0 {
		2.0 * m
	} else {
		1.0
	}
}

fn chain_is_connected(chain: &BTreeSet<usize>, target: &Topology) -> bool {
	match chain.iter().next() {
		Some(&root) => {
			let start = Some(root).into_iter().collect();
			target.distances_from(&start, |q| chain.contains(&q)).len() == chain.len()
		}
		None => false,
	}
}

fn chains_coupled(a: &BTreeSet<usize>, b: &BTreeSet<usize>, target: &Topology) -> bool {
	a.iter().any(|&p| b.iter().any(|&q| target.is_connected(p, q)))
}

/// Check that chains are non-empty, disjoint, made of qubits of `target`,
/// connected, and that every source interaction has a coupler between the
/// two chains.
pub fn verify_embedding<Tq: TqType>(
	embedding: &Embedding<Tq>,
	source_edges: &BTreeSet<(Tq, Tq)>,
	target: &Topology,
) -> Result<()> {
	let mut owner: HashMap<usize, &Tq> = HashMap::new();
	for (v, chain) in embedding.iter() {
		if chain.is_empty() {
			return Err(Error::InvalidEmbedding(format!("chain of {:?} is empty", v)));
		}
		for &q in chain {
			if !target.contains(q) {
				return Err(Error::InvalidEmbedding(format!(
					"chain of {:?} uses {}, which is not a qubit of {}",
					v,
					q,
					target.name()
				)));
			}
			if let Some(other) = owner.insert(q, v) {
				return Err(Error::InvalidEmbedding(format!(
					"qubit {} is shared by {:?} and {:?}",
					q, other, v
				)));
			}
		}
		if !chain_is_connected(chain, target) {
			return Err(Error::InvalidEmbedding(format!(
				"chain of {:?} is not connected",
				v
			)));
		}
	}
	for (u, v) in source_edges {
		let (cu, cv) = match (embedding.chain(u), embedding.chain(v)) {
			(Some(cu), Some(cv)) => (cu, cv),
			(None, _) => return Err(Error::MissingVariable(format!("{:?}", u))),
			(_, None) => return Err(Error::MissingVariable(format!("{:?}", v))),
		};
		if !chains_coupled(cu, cv, target) {
			return Err(Error::InvalidEmbedding(format!(
				"no coupler between the chains of {:?} and {:?}",
				u, v
			)));
		}
	}
	Ok(())
}

/// Greedy chain growth. Variables are placed one at a time, preferring the one
/// with most already placed neighbours. Its root is the free qubit closest to
/// those neighbours' chains and the chain grows along shortest free paths
/// until it touches each of them.
struct ChainPlacer<'a> {
	target: &'a Topology,
	used: BTreeSet<usize>,
}

impl<'a> ChainPlacer<'a> {
	fn is_free(&self, q: usize) -> bool {
		!self.used.contains(&q)
	}

	fn place_root(&self, placed: &[&BTreeSet<usize>], rng: &mut SmallRng) -> Option<usize> {
		if placed.is_empty() {
			if self.used.is_empty() {
				return self.target.nodes().choose(rng).copied();
			}
			let d = self.target.distances_from(&self.used, |q| self.is_free(q));
			return d
				.iter()
				.filter(|(q, _)| self.is_free(**q))
				.min_by_key(|(_, d)| **d)
				.map(|(q, _)| *q);
		}
		let dists = placed
			.iter()
			.map(|chain| self.target.distances_from(chain, |q| self.is_free(q)))
			.collect::<Vec<_>>();
		let mut best: Option<(usize, usize)> = None;
		for q in self.target.nodes().into_iter().filter(|q| self.is_free(*q)) {
			let mut total = 0;
			let mut reachable = true;
			for d in dists.iter() {
				match d.get(&q) {
					Some(x) => total += x,
					None => {
						reachable = false;
						break;
					}
				}
			}
			if reachable && best.map_or(true, |(_, b)| total < b) {
				best = Some((q, total));
			}
		}
		best.map(|(q, _)| q)
	}

	/// Extend `chain` along a shortest free path until it is coupled to
	/// `other`. Returns false if no such path exists.
	fn connect(&self, chain: &mut BTreeSet<usize>, other: &BTreeSet<usize>) -> bool {
		if chains_coupled(chain, other, self.target) {
			return true;
		}
		let mut pred: HashMap<usize, usize> = HashMap::new();
		let mut queue = chain.iter().copied().collect::<std::collections::VecDeque<_>>();
		let mut seen = chain.clone();
		while let Some(current) = queue.pop_front() {
			for next in self.target.neighbors(current) {
				if seen.contains(&next) || !self.is_free(next) {
					continue;
				}
				seen.insert(next);
				pred.insert(next, current);
				if self.target.neighbors(next).iter().any(|q| other.contains(q)) {
					let mut at = next;
					while !chain.contains(&at) {
						chain.insert(at);
						at = pred[&at];
					}
					return true;
				}
				queue.push_back(next);
			}
		}
		false
	}

	fn try_embed<Tq: TqType>(
		mut self,
		variables: &[Tq],
		adjacency: &BTreeMap<&Tq, BTreeSet<&Tq>>,
		rng: &mut SmallRng,
	) -> Option<Embedding<Tq>> {
		let mut pending = variables.to_vec();
		pending.shuffle(rng);
		let mut chains: BTreeMap<Tq, BTreeSet<usize>> = BTreeMap::new();
		while !pending.is_empty() {
			let score = |v: &Tq| {
				let neigh = adjacency.get(v);
				let placed = neigh.map_or(0, |n| n.iter().filter(|u| chains.contains_key(**u)).count());
				(placed, neigh.map_or(0, |n| n.len()))
			};
			let mut at = 0;
			for (i, v) in pending.iter().enumerate() {
				if score(v) > score(&pending[at]) {
					at = i;
				}
			}
			let v = pending.remove(at);
			let placed = adjacency
				.get(&v)
				.into_iter()
				.flat_map(|n| n.iter())
				.filter_map(|u| chains.get(*u))
				.collect::<Vec<_>>();
			let root = self.place_root(&placed, rng)?;
			let mut chain = Some(root).into_iter().collect::<BTreeSet<_>>();
			self.used.insert(root);
			for other in placed.iter() {
				if !self.connect(&mut chain, other) {
					return None;
				}
				self.used.extend(chain.iter().copied());
			}
			chains.insert(v, chain);
		}
		Some(Embedding(chains))
	}
}

/// Search an embedding of the graph given by `variables` and `source_edges`
/// into `target`, retrying up to `tries` times with shuffled orders.
#[instrument(skip_all, fields(num_variables = variables.len(), num_edges = source_edges.len()))]
pub fn find_embedding<Tq: TqType>(
	variables: &[Tq],
	source_edges: &BTreeSet<(Tq, Tq)>,
	target: &Topology,
	tries: usize,
	seed: Option<u64>,
) -> Result<Embedding<Tq>> {
	let mut adjacency: BTreeMap<&Tq, BTreeSet<&Tq>> = variables.iter().map(|v| (v, BTreeSet::new())).collect();
	for (u, v) in source_edges {
		adjacency.entry(u).or_default().insert(v);
		adjacency.entry(v).or_default().insert(u);
	}
	let mut all = variables.to_vec();
	for v in adjacency.keys() {
		if !variables.contains(v) {
			all.push((*v).clone());
		}
	}
	let mut rng = match seed {
		Some(seed) => SmallRng::seed_from_u64(seed),
		None => SmallRng::from_entropy(),
	};
	for attempt in 0..tries {
		let placer = ChainPlacer {
			target,
			used: BTreeSet::new(),
		};
		if let Some(embedding) = placer.try_embed(&all, &adjacency, &mut rng) {
			if verify_embedding(&embedding, source_edges, target).is_ok() {
				info!(
					attempt,
					num_qubits = embedding.num_qubits(),
					max_chain_length = embedding.max_chain_length(),
					"embedding found"
				);
				return Ok(embedding);
			}
		}
		debug!(attempt, "embedding attempt failed");
	}
	Err(Error::EmbeddingNotFound { tries })
}

/// Embed `bqm` onto `target`. The biases are spread in spin space: a linear
/// bias evenly over its chain, a quadratic bias evenly over the couplers
/// between two chains. Each coupler inside a chain receives
/// `-chain_strength`, and the offset is raised so that unbroken chains
/// contribute no energy. The result has the vartype of `bqm`.
#[instrument(skip_all, fields(num_variables = bqm.num_variables(), chain_strength = chain_strength))]
pub fn embed_bqm<Tq: TqType>(
	bqm: &BinaryQuadraticModel<Tq>,
	embedding: &Embedding<Tq>,
	target: &Topology,
	chain_strength: f64,
) -> Result<BinaryQuadraticModel<usize>> {
	let spin = bqm.change_vartype(Vartype::Spin);
	let mut out = BinaryQuadraticModel::new(Vartype::Spin);
	out.add_offset(spin.offset());
	let chain_of = |v: &Tq| {
		embedding
			.chain(v)
			.ok_or_else(|| Error::MissingVariable(format!("{:?}", v)))
	};
	for (v, bias) in spin.linear().iter() {
		let chain = chain_of(v)?;
		for &q in chain.iter() {
			if !target.contains(q) {
				return Err(Error::InvalidEmbedding(format!("{} is not a qubit", q)));
			}
			out.add_variable(q, bias / chain.len() as f64);
		}
	}
	for ((u, v), bias) in spin.quadratic().iter() {
		let (cu, cv) = (chain_of(u)?, chain_of(v)?);
		let couplers = cu
			.iter()
			.flat_map(|&p| cv.iter().map(move |&q| (p, q)))
			.filter(|(p, q)| target.is_connected(*p, *q))
			.collect::<Vec<_>>();
		if couplers.is_empty() {
			return Err(Error::InvalidEmbedding(format!(
				"no coupler between the chains of {:?} and {:?}",
				u, v
			)));
		}
		for (p, q) in couplers.iter() {
			out.add_interaction(*p, *q, bias / couplers.len() as f64);
		}
	}
	for (_, chain) in embedding.iter() {
		let qubits = chain.iter().copied().collect::<Vec<_>>();
		for (i, &p) in qubits.iter().enumerate() {
			for &q in qubits[i + 1..].iter() {
				if target.is_connected(p, q) {
					out.add_interaction(p, q, -chain_strength);
					out.add_offset(chain_strength);
				}
			}
		}
	}
	debug!(
		num_qubits = out.num_variables(),
		num_couplers = out.num_interactions(),
		"embedded"
	);
	Ok(out.change_vartype(bqm.vartype()))
}

/// Recover logical samples from `target_samples`. Energies are recomputed on
/// `source` and each record carries the fraction of its broken chains.
pub fn unembed_sampleset<Tq: TqType>(
	target_samples: &SampleSet<usize>,
	embedding: &Embedding<Tq>,
	source: &BinaryQuadraticModel<Tq>,
	method: ChainBreakMethod,
) -> Result<SampleSet<Tq>> {
	let variables = source.variables().cloned().collect::<Vec<_>>();
	let mut records = Vec::with_capacity(target_samples.len());
	'records: for record in target_samples.iter() {
		let mut sample = Sample::new();
		let mut broken = 0;
		for v in variables.iter() {
			let chain = embedding
				.chain(v)
				.ok_or_else(|| Error::MissingVariable(format!("{:?}", v)))?;
			let mut ups = 0;
			for q in chain.iter() {
				match record.sample.get_bool(q) {
					Some(true) => ups += 1,
					Some(false) => {}
					None => return Err(Error::MissingVariable(q.to_string())),
				}
			}
			if ups != 0 && ups != chain.len() {
				broken += 1;
				if method == ChainBreakMethod::Discard {
					continue 'records;
				}
			}
			sample.insert(v.clone(), source.vartype().from_bool(2 * ups >= chain.len()));
		}
		let energy = source.energy(&sample)?;
		records.push(SampleRecord {
			sample,
			energy,
			num_occurrences: record.num_occurrences,
			chain_break_fraction: Some(if variables.is_empty() {
				0.0
			} else {
				broken as f64 / variables.len() as f64
			}),
		});
	}
	Ok(SampleSet::from_records(records, variables, source.vartype()))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn and_gate() -> BinaryQuadraticModel<&'static str> {
		BinaryQuadraticModel::from_qubo(
			vec![
				(("x1", "x2"), 1.0),
				(("x1", "z"), -2.0),
				(("x2", "z"), -2.0),
				(("z", "z"), 3.0),
			],
			0.0,
		)
	}

	fn and_embedding() -> Embedding<&'static str> {
		vec![("x1", vec![1]), ("x2", vec![5]), ("z", vec![0, 4])]
			.into_iter()
			.collect()
	}

	#[test]
	fn fixed_and_gate_embedding_is_valid() {
		let c16 = Topology::chimera(16, 16, 4);
		let bqm = and_gate();
		assert!(verify_embedding(&and_embedding(), &bqm.edges(), &c16).is_ok());
	}

	#[test]
	fn invalid_embeddings_are_rejected() {
		let c16 = Topology::chimera(16, 16, 4);
		let edges = and_gate().edges();
		let shared: Embedding<&str> = vec![("x1", vec![1]), ("x2", vec![1]), ("z", vec![0, 4])]
			.into_iter()
			.collect();
		assert!(verify_embedding(&shared, &edges, &c16).is_err());
		let disconnected: Embedding<&str> = vec![("x1", vec![1]), ("x2", vec![5]), ("z", vec![0, 2])]
			.into_iter()
			.collect();
		assert!(verify_embedding(&disconnected, &edges, &c16).is_err());
		let uncoupled: Embedding<&str> = vec![("x1", vec![0]), ("x2", vec![1]), ("z", vec![4])]
			.into_iter()
			.collect();
		assert!(verify_embedding(&uncoupled, &edges, &c16).is_err());
	}

	#[test]
	fn unbroken_chains_keep_energies() {
		let c16 = Topology::chimera(16, 16, 4);
		let bqm = and_gate();
		let embedding = and_embedding();
		let embedded = embed_bqm(&bqm, &embedding, &c16, 1.5).unwrap();
		assert_eq!(embedded.vartype(), Vartype::Binary);
		assert_eq!(embedded.get_quadratic(&0, &4), Some(-6.0));
		for bits in 0..8u8 {
			let (x1, x2, z) = ((bits & 1) as i8, (bits >> 1 & 1) as i8, (bits >> 2 & 1) as i8);
			let logical: Sample<&str> = vec![("x1", x1), ("x2", x2), ("z", z)].into_iter().collect();
			let physical: Sample<usize> = vec![(1, x1), (5, x2), (0, z), (4, z)].into_iter().collect();
			let expected = bqm.energy(&logical).unwrap();
			assert!((embedded.energy(&physical).unwrap() - expected).abs() < 1e-9);
		}
	}

	#[test]
	fn majority_vote_and_discard() {
		let bqm = and_gate();
		let embedding: Embedding<&str> = vec![("x1", vec![1]), ("x2", vec![5]), ("z", vec![0, 4, 12])]
			.into_iter()
			.collect();
		let broken: Sample<usize> = vec![(1, 1), (5, 1), (0, 1), (4, 1), (12, 0)].into_iter().collect();
		let intact: Sample<usize> = vec![(1, 0), (5, 0), (0, 0), (4, 0), (12, 0)].into_iter().collect();
		let target = SampleSet::from_records(
			vec![SampleRecord::new(broken, 0.0), SampleRecord::new(intact, 0.0)],
			vec![0, 1, 4, 5, 12],
			Vartype::Binary,
		);
		let voted = unembed_sampleset(&target, &embedding, &bqm, ChainBreakMethod::MajorityVote).unwrap();
		assert_eq!(voted.len(), 2);
		let fixed = voted
			.iter()
			.find(|r| r.sample[&"x1"] == 1)
			.unwrap();
		assert_eq!(fixed.sample[&"z"], 1);
		assert!((fixed.chain_break_fraction.unwrap() - 1.0 / 3.0).abs() < 1e-12);
		let kept = unembed_sampleset(&target, &embedding, &bqm, ChainBreakMethod::Discard).unwrap();
		assert_eq!(kept.len(), 1);
		assert_eq!(kept.first().unwrap().chain_break_fraction, Some(0.0));
	}

	#[test]
	fn majority_vote_ties_go_up() {
		let bqm = BinaryQuadraticModel::from_ising(vec![("s", 1.0)], Vec::<((&str, &str), f64)>::new(), 0.0);
		let embedding: Embedding<&str> = vec![("s", vec![0, 4])].into_iter().collect();
		let target = SampleSet::from_records(
			vec![SampleRecord::new(vec![(0, -1), (4, 1)].into_iter().collect(), 0.0)],
			vec![0, 4],
			Vartype::Spin,
		);
		let out = unembed_sampleset(&target, &embedding, &bqm, ChainBreakMethod::MajorityVote).unwrap();
		assert_eq!(out.first().unwrap().sample[&"s"], 1);
	}

	#[test]
	fn finds_embedding_of_a_triangle() {
		let c16 = Topology::chimera(16, 16, 4);
		let bqm = and_gate();
		let variables = bqm.variables().cloned().collect::<Vec<_>>();
		let embedding = find_embedding(&variables, &bqm.edges(), &c16, 10, Some(7)).unwrap();
		assert_eq!(embedding.len(), 3);
		assert!(verify_embedding(&embedding, &bqm.edges(), &c16).is_ok());
	}

	#[test]
	fn finds_embedding_of_k5() {
		let c4 = Topology::chimera(4, 4, 4);
		let mut edges = BTreeSet::new();
		for a in 0..5u8 {
			for b in a + 1..5 {
				edges.insert((a, b));
			}
		}
		let variables = (0..5u8).collect::<Vec<_>>();
		let embedding = find_embedding(&variables, &edges, &c4, 20, Some(3)).unwrap();
		assert!(verify_embedding(&embedding, &edges, &c4).is_ok());
	}

	#[test]
	fn too_small_target_fails() {
		let path = Topology::custom("path", vec![(0, 1)]);
		let mut edges = BTreeSet::new();
		edges.insert(("a", "b"));
		edges.insert(("b", "c"));
		edges.insert(("a", "c"));
		let variables = vec!["a", "b", "c"];
		assert!(matches!(
			find_embedding(&variables, &edges, &path, 3, Some(1)),
			Err(Error::EmbeddingNotFound { tries: 3 })
		));
	}
}
