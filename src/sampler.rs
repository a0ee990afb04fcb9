//! Sampler contract and the classical reference samplers.
//!
//! A sampler takes a [`BinaryQuadraticModel`] and a [`SampleParams`] bag and
//! returns a [`SampleSet`] whose records are sorted by energy:
//!
//! ```
//! # use qubo_tutorials::model::BinaryQuadraticModel;
//! # use qubo_tutorials::sampler::{ExactSolver, SampleParams, Sampler};
//! let q = vec![(("x", "x"), -1.0), (("x", "z"), 2.0), (("z", "x"), 0.0), (("z", "z"), -1.0)];
//! let response = ExactSolver::new().sample_qubo(q, &SampleParams::default()).unwrap();
//! for datum in response.iter() {
//! 	println!("{}", datum);
//! }
//! assert_eq!(response.first().unwrap().energy, -1.0);
//! ```

use crate::anneal::{generate_beta_schedule, IndexedQubo, QubitState, SimpleAnnealer};
use crate::embedding::ChainBreakMethod;
use crate::error::{Error, Result};
use crate::model::BinaryQuadraticModel;
use crate::solution::{SampleRecord, SampleSet};
use crate::topology::Topology;
use crate::TqType;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;
use tracing::{debug, instrument};

/// Parameter bag passed to [`Sampler::sample`]. Unset fields fall back to
/// the sampler's defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleParams {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub num_reads: Option<usize>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub num_sweeps: Option<usize>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub beta_range: Option<(f64, f64)>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub seed: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub chain_strength: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub chain_break_method: Option<ChainBreakMethod>,
}

impl SampleParams {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_num_reads(mut self, num_reads: usize) -> Self {
		self.num_reads = Some(num_reads);
		self
	}

	pub fn with_num_sweeps(mut self, num_sweeps: usize) -> Self {
		self.num_sweeps = Some(num_sweeps);
		self
	}

	pub fn with_beta_range(mut self, beta_min: f64, beta_max: f64) -> Self {
		self.beta_range = Some((beta_min, beta_max));
		self
	}

	pub fn with_seed(mut self, seed: u64) -> Self {
		self.seed = Some(seed);
		self
	}

	pub fn with_chain_strength(mut self, chain_strength: f64) -> Self {
		self.chain_strength = Some(chain_strength);
		self
	}

	pub fn with_chain_break_method(mut self, method: ChainBreakMethod) -> Self {
		self.chain_break_method = Some(method);
		self
	}

	/// Names of the parameters that are set.
	pub fn names(&self) -> Vec<&'static str> {
		let mut names = Vec::new();
		if self.num_reads.is_some() {
			names.push("num_reads");
		}
		if self.num_sweeps.is_some() {
			names.push("num_sweeps");
		}
		if self.beta_range.is_some() {
			names.push("beta_range");
		}
		if self.seed.is_some() {
			names.push("seed");
		}
		if self.chain_strength.is_some() {
			names.push("chain_strength");
		}
		if self.chain_break_method.is_some() {
			names.push("chain_break_method");
		}
		names
	}

	/// Fail on the first set parameter not listed in `accepted`.
	pub fn check_supported(&self, sampler: &str, accepted: &[&'static str]) -> Result<()> {
		match self.names().into_iter().find(|n| !accepted.contains(n)) {
			Some(parameter) => Err(Error::UnsupportedParameter {
				sampler: sampler.to_string(),
				parameter,
			}),
			None => Ok(()),
		}
	}

	/// Clear every parameter not listed in `accepted`.
	pub fn retain(&mut self, accepted: &[&'static str]) {
		if !accepted.contains(&"num_reads") {
			self.num_reads = None;
		}
		if !accepted.contains(&"num_sweeps") {
			self.num_sweeps = None;
		}
		if !accepted.contains(&"beta_range") {
			self.beta_range = None;
		}
		if !accepted.contains(&"seed") {
			self.seed = None;
		}
		if !accepted.contains(&"chain_strength") {
			self.chain_strength = None;
		}
		if !accepted.contains(&"chain_break_method") {
			self.chain_break_method = None;
		}
	}

	/// The bag without the parameters consumed by embedding composites.
	pub fn for_child(&self) -> Self {
		Self {
			chain_strength: None,
			chain_break_method: None,
			..self.clone()
		}
	}
}

/// Anything that turns a model into sample records.
pub trait Sampler<Tq: TqType> {
	fn name(&self) -> &str;

	/// Parameters this sampler accepts in a [`SampleParams`] bag.
	fn parameters(&self) -> Vec<&'static str>;

	fn sample(&self, bqm: &BinaryQuadraticModel<Tq>, params: &SampleParams) -> Result<SampleSet<Tq>>;

	fn sample_qubo<I>(&self, q: I, params: &SampleParams) -> Result<SampleSet<Tq>>
	where
		I: IntoIterator<Item = ((Tq, Tq), f64)>,
		Self: Sized,
	{
		self.sample(&BinaryQuadraticModel::from_qubo(q, 0.0), params)
	}

	fn sample_ising<H, J>(&self, h: H, j: J, params: &SampleParams) -> Result<SampleSet<Tq>>
	where
		H: IntoIterator<Item = (Tq, f64)>,
		J: IntoIterator<Item = ((Tq, Tq), f64)>,
		Self: Sized,
	{
		self.sample(&BinaryQuadraticModel::from_ising(h, j, 0.0), params)
	}
}

impl<Tq: TqType, S: Sampler<Tq> + ?Sized> Sampler<Tq> for Box<S> {
	fn name(&self) -> &str {
		(**self).name()
	}

	fn parameters(&self) -> Vec<&'static str> {
		(**self).parameters()
	}

	fn sample(&self, bqm: &BinaryQuadraticModel<Tq>, params: &SampleParams) -> Result<SampleSet<Tq>> {
		(**self).sample(bqm, params)
	}
}

/// A sampler restricted to a fixed hardware graph.
pub trait Structured {
	fn topology(&self) -> &Topology;

	fn nodelist(&self) -> Vec<usize> {
		self.topology().nodes()
	}

	fn edgelist(&self) -> Vec<(usize, usize)> {
		self.topology().edges()
	}

	fn adjacency(&self) -> BTreeMap<usize, BTreeSet<usize>> {
		self.topology().adjacency()
	}
}

/// Largest model [`ExactSolver`] enumerates.
pub const MAX_EXACT_VARIABLES: usize = 20;

/// Enumerates every assignment; one record per assignment.
#[derive(Clone, Debug, Default)]
pub struct ExactSolver;

impl ExactSolver {
	pub fn new() -> Self {
		Self
	}
}

impl<Tq: TqType> Sampler<Tq> for ExactSolver {
	fn name(&self) -> &str {
		"ExactSolver"
	}

	fn parameters(&self) -> Vec<&'static str> {
		Vec::new()
	}

	#[instrument(skip_all, fields(num_variables = bqm.num_variables()))]
	fn sample(&self, bqm: &BinaryQuadraticModel<Tq>, params: &SampleParams) -> Result<SampleSet<Tq>> {
		params.check_supported("ExactSolver", &[])?;
		let n = bqm.num_variables();
		if n > MAX_EXACT_VARIABLES {
			return Err(Error::TooManyVariables {
				sampler: "ExactSolver",
				count: n,
				max: MAX_EXACT_VARIABLES,
			});
		}
		let qubo = IndexedQubo::new(bqm);
		let records = (0..1u64 << n)
			.into_par_iter()
			.map(|bits| {
				let state = QubitState::from_bits(n, bits);
				SampleRecord::new(qubo.to_sample(&state, bqm.vartype()), qubo.energy(&state))
			})
			.collect::<Vec<_>>();
		debug!("enumerated {} assignments", records.len());
		Ok(SampleSet::from_distinct_records(
			records,
			qubo.variables.clone(),
			bqm.vartype(),
		))
	}
}

/// Metropolis simulated annealing with independent reads run in parallel.
#[derive(Clone, Debug)]
pub struct SimulatedAnnealingSampler {
	pub default_num_reads: usize,
	pub default_num_sweeps: usize,
}

impl SimulatedAnnealingSampler {
	pub fn new() -> Self {
		Self {
			default_num_reads: 10,
			default_num_sweeps: 1000,
		}
	}
}

impl Default for SimulatedAnnealingSampler {
	fn default() -> Self {
		Self::new()
	}
}

/// Seeds for `count` reads: derived from `seed` or drawn from entropy.
pub(crate) fn read_seeds(seed: Option<u64>, count: usize) -> Vec<u64> {
	let mut r = match seed {
		Some(seed) => SmallRng::seed_from_u64(seed),
		None => SmallRng::from_entropy(),
	};
	(0..count).map(|_| r.gen::<u64>()).collect()
}

/// Anneal `num_reads` random initial states of `bqm` in parallel.
pub(crate) fn anneal_reads<Tq: TqType>(
	bqm: &BinaryQuadraticModel<Tq>,
	num_reads: usize,
	num_sweeps: usize,
	beta_range: Option<(f64, f64)>,
	seed: Option<u64>,
) -> Result<Vec<SampleRecord<Tq>>> {
	let qubo = IndexedQubo::new(bqm);
	let (beta_min, beta_max) = beta_range.unwrap_or_else(|| qubo.default_beta_range());
	if !(beta_min > 0.0 && beta_max >= beta_min && beta_max.is_finite()) {
		return Err(Error::InvalidParameter {
			parameter: "beta_range",
			reason: format!("expected 0 < beta_min <= beta_max, got ({}, {})", beta_min, beta_max),
		});
	}
	let annealer = SimpleAnnealer::new(1, generate_beta_schedule(beta_min, beta_max, num_sweeps));
	debug!(beta_min, beta_max, num_sweeps, num_reads, "annealing");
	let records = read_seeds(seed, num_reads)
		.into_par_iter()
		.map(|s| {
			let mut r = SmallRng::seed_from_u64(s);
			let mut state = QubitState::new_random(qubo.len(), &mut r);
			annealer.run(&mut state, &mut r, &qubo.h, &qubo.neighbors);
			SampleRecord::new(qubo.to_sample(&state, bqm.vartype()), qubo.energy(&state))
		})
		.collect();
	Ok(records)
}

impl<Tq: TqType> Sampler<Tq> for SimulatedAnnealingSampler {
	fn name(&self) -> &str {
		"SimulatedAnnealingSampler"
	}

	fn parameters(&self) -> Vec<&'static str> {
		vec!["num_reads", "num_sweeps", "beta_range", "seed"]
	}

	#[instrument(skip_all, fields(num_variables = bqm.num_variables()))]
	fn sample(&self, bqm: &BinaryQuadraticModel<Tq>, params: &SampleParams) -> Result<SampleSet<Tq>> {
		params.check_supported("SimulatedAnnealingSampler", &<Self as Sampler<Tq>>::parameters(self))?;
		let num_reads = params.num_reads.unwrap_or(self.default_num_reads);
		let num_sweeps = params.num_sweeps.unwrap_or(self.default_num_sweeps);
		if num_reads == 0 {
			return Err(Error::InvalidParameter {
				parameter: "num_reads",
				reason: "must be positive".to_string(),
			});
		}
		let start = Instant::now();
		let records = anneal_reads(bqm, num_reads, num_sweeps, params.beta_range, params.seed)?;
		debug!("annealing completed in {:?}", start.elapsed());
		Ok(SampleSet::from_records(
			records,
			bqm.variables().cloned().collect(),
			bqm.vartype(),
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::Vartype;

	fn and_gate() -> Vec<((&'static str, &'static str), f64)> {
		vec![
			(("x1", "x2"), 1.0),
			(("x1", "z"), -2.0),
			(("x2", "z"), -2.0),
			(("z", "z"), 3.0),
		]
	}

	#[test]
	fn exact_solver_lists_every_assignment() {
		let response = ExactSolver::new()
			.sample_qubo(and_gate(), &SampleParams::default())
			.unwrap();
		assert_eq!(response.len(), 8);
		let lowest = response.lowest();
		assert_eq!(lowest.len(), 4);
		for record in lowest {
			let s = &record.sample;
			assert_eq!(s[&"z"], s[&"x1"] * s[&"x2"]);
		}
	}

	#[test]
	fn exact_solver_records_are_distinct() {
		let j: Vec<((usize, usize), f64)> = vec![((0, 1), -1.0)];
		let bqm = BinaryQuadraticModel::from_ising((0..12usize).map(|v| (v, 0.0)), j, 0.0);
		let response = ExactSolver::new().sample(&bqm, &SampleParams::default()).unwrap();
		assert_eq!(response.len(), 4096);
		assert_eq!(response.total_occurrences(), 4096);
		assert!(response.iter().all(|r| r.num_occurrences == 1));
		assert_eq!(response.lowest().len(), 2048);
		assert!(response.records().windows(2).all(|w| w[0].energy <= w[1].energy));
	}

	#[test]
	fn exact_solver_keeps_spin_domain() {
		let response = ExactSolver::new()
			.sample_ising(vec![("a", 1.0)], vec![(("a", "b"), -1.0)], &SampleParams::default())
			.unwrap();
		assert_eq!(response.vartype(), Vartype::Spin);
		let first = response.first().unwrap();
		assert_eq!(first.energy, -2.0);
		assert_eq!(first.sample[&"a"], -1);
		assert_eq!(first.sample[&"b"], -1);
	}

	#[test]
	fn exact_solver_rejects_reads() {
		let err = ExactSolver::new()
			.sample_qubo(and_gate(), &SampleParams::new().with_num_reads(10))
			.unwrap_err();
		assert!(matches!(err, Error::UnsupportedParameter { parameter: "num_reads", .. }));
	}

	#[test]
	fn exact_solver_refuses_large_models() {
		let mut bqm = BinaryQuadraticModel::new(Vartype::Binary);
		for v in 0..=MAX_EXACT_VARIABLES {
			bqm.add_variable(v, 1.0);
		}
		assert!(matches!(
			ExactSolver::new().sample(&bqm, &SampleParams::default()),
			Err(Error::TooManyVariables { .. })
		));
	}

	#[test]
	fn annealing_finds_and_gate_ground_states() {
		let sampler = SimulatedAnnealingSampler::new();
		let params = SampleParams::new().with_num_reads(50).with_seed(1234);
		let response = sampler.sample_qubo(and_gate(), &params).unwrap();
		assert_eq!(response.total_occurrences(), 50);
		assert_eq!(response.first().unwrap().energy, 0.0);
		let again = sampler.sample_qubo(and_gate(), &params).unwrap();
		assert_eq!(response.records(), again.records());
	}

	#[test]
	fn retain_drops_unaccepted_parameters() {
		let mut params = SampleParams::new().with_num_reads(5).with_seed(3).with_chain_strength(2.0);
		params.retain(&["seed"]);
		assert_eq!(params, SampleParams::new().with_seed(3));
		let boxed: Box<dyn Sampler<&str>> = Box::new(ExactSolver::new());
		assert!(boxed.sample_qubo(and_gate(), &params.for_child()).is_err());
		assert_eq!(boxed.sample_qubo(and_gate(), &SampleParams::default()).unwrap().len(), 8);
	}

	#[test]
	fn annealing_rejects_bad_beta_range() {
		let sampler = SimulatedAnnealingSampler::new();
		let params = SampleParams::new().with_beta_range(1.0, 0.5);
		assert!(sampler.sample_qubo(and_gate(), &params).is_err());
	}
}
