//! Composites that put logical models onto structured samplers.

use crate::embedding::{
	default_chain_strength, embed_bqm, find_embedding, unembed_sampleset, verify_embedding,
	Embedding,
};
use crate::error::{Error, Result};
use crate::model::BinaryQuadraticModel;
use crate::sampler::{SampleParams, Sampler, Structured};
use crate::solution::SampleSet;
use crate::TqType;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

const COMPOSITE_PARAMETERS: [&str; 2] = ["chain_strength", "chain_break_method"];

fn composite_parameters<S: Sampler<usize>>(child: &S) -> Vec<&'static str> {
	let mut parameters = child.parameters();
	parameters.extend_from_slice(&COMPOSITE_PARAMETERS);
	parameters
}

fn sample_embedded<S, Tq>(
	child: &S,
	bqm: &BinaryQuadraticModel<Tq>,
	embedding: &Embedding<Tq>,
	params: &SampleParams,
) -> Result<SampleSet<Tq>>
where
	S: Sampler<usize> + Structured,
	Tq: TqType,
{
	let chain_strength = params
		.chain_strength
		.unwrap_or_else(|| default_chain_strength(bqm));
	if !(chain_strength >= 0.0 && chain_strength.is_finite()) {
		return Err(Error::InvalidParameter {
			parameter: "chain_strength",
			reason: format!("{} is not a non-negative number", chain_strength),
		});
	}
	let embedded = embed_bqm(bqm, embedding, child.topology(), chain_strength)?;
	let response = child.sample(&embedded, &params.for_child())?;
	let mut out = unembed_sampleset(
		&response,
		embedding,
		bqm,
		params.chain_break_method.unwrap_or_default(),
	)?;
	for (key, value) in response.info() {
		out.insert_info(key, value.clone());
	}
	out.insert_info("chain_strength", chain_strength);
	out.insert_info("num_qubits", embedding.num_qubits());
	out.insert_info("embedding", embedding.to_json());
	Ok(out)
}

/// Finds a fresh minor-embedding for every problem it samples.
pub struct EmbeddingComposite<S> {
	child: S,
	tries: usize,
}

impl<S> EmbeddingComposite<S>
where
	S: Sampler<usize> + Structured,
{
	pub fn new(child: S) -> Self {
		Self { child, tries: 10 }
	}

	/// Number of embedding attempts before giving up.
	pub fn with_tries(mut self, tries: usize) -> Self {
		self.tries = tries;
		self
	}

	pub fn child(&self) -> &S {
		&self.child
	}
}

impl<S, Tq> Sampler<Tq> for EmbeddingComposite<S>
where
	S: Sampler<usize> + Structured,
	Tq: TqType,
{
	fn name(&self) -> &str {
		"EmbeddingComposite"
	}

	fn parameters(&self) -> Vec<&'static str> {
		composite_parameters(&self.child)
	}

	fn sample(&self, bqm: &BinaryQuadraticModel<Tq>, params: &SampleParams) -> Result<SampleSet<Tq>> {
		params.check_supported("EmbeddingComposite", &composite_parameters(&self.child))?;
		let variables = bqm.variables().cloned().collect::<Vec<_>>();
		let embedding = find_embedding(
			&variables,
			&bqm.edges(),
			self.child.topology(),
			self.tries,
			params.seed,
		)?;
		debug!(?embedding, "sampling through a found embedding");
		sample_embedded(&self.child, bqm, &embedding, params)
	}
}

/// Samples every problem through one embedding given up front.
pub struct FixedEmbeddingComposite<S, Tq: TqType> {
	child: S,
	embedding: Embedding<Tq>,
}

impl<S, Tq> FixedEmbeddingComposite<S, Tq>
where
	S: Sampler<usize> + Structured,
	Tq: TqType,
{
	/// Fails if a chain is empty, disconnected, overlaps another chain or
	/// uses a qubit the child does not have.
	pub fn new(child: S, embedding: Embedding<Tq>) -> Result<Self> {
		verify_embedding(&embedding, &BTreeSet::new(), child.topology())?;
		info!(num_qubits = embedding.num_qubits(), "using fixed embedding");
		Ok(Self { child, embedding })
	}

	pub fn embedding(&self) -> &Embedding<Tq> {
		&self.embedding
	}

	/// Logical adjacency: two variables are adjacent when a coupler joins
	/// their chains.
	pub fn adjacency(&self) -> BTreeMap<Tq, BTreeSet<Tq>> {
		let topology = self.child.topology();
		let mut adjacency: BTreeMap<Tq, BTreeSet<Tq>> = self
			.embedding
			.iter()
			.map(|(v, _)| (v.clone(), BTreeSet::new()))
			.collect();
		let chains = self.embedding.iter().collect::<Vec<_>>();
		for (i, (u, cu)) in chains.iter().enumerate() {
			for (v, cv) in chains[i + 1..].iter() {
				let coupled = cu
					.iter()
					.any(|&p| cv.iter().any(|&q| topology.is_connected(p, q)));
				if coupled {
					adjacency.entry((*u).clone()).or_default().insert((*v).clone());
					adjacency.entry((*v).clone()).or_default().insert((*u).clone());
				}
			}
		}
		adjacency
	}
}

impl<S, Tq> Sampler<Tq> for FixedEmbeddingComposite<S, Tq>
where
	S: Sampler<usize> + Structured,
	Tq: TqType,
{
	fn name(&self) -> &str {
		"FixedEmbeddingComposite"
	}

	fn parameters(&self) -> Vec<&'static str> {
		composite_parameters(&self.child)
	}

	fn sample(&self, bqm: &BinaryQuadraticModel<Tq>, params: &SampleParams) -> Result<SampleSet<Tq>> {
		params.check_supported("FixedEmbeddingComposite", &composite_parameters(&self.child))?;
		if let Some(v) = bqm.variables().find(|v| self.embedding.chain(v).is_none()) {
			return Err(Error::MissingVariable(format!("{:?}", v)));
		}
		verify_embedding(&self.embedding, &bqm.edges(), self.child.topology())?;
		sample_embedded(&self.child, bqm, &self.embedding, params)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::embedding::ChainBreakMethod;
	use crate::qpu::QpuSampler;

	fn not_gate() -> Vec<((&'static str, &'static str), f64)> {
		vec![
			(("x", "x"), -1.0),
			(("x", "z"), 2.0),
			(("z", "x"), 0.0),
			(("z", "z"), -1.0),
		]
	}

	fn and_gate() -> Vec<((&'static str, &'static str), f64)> {
		vec![
			(("x1", "x2"), 1.0),
			(("x1", "z"), -2.0),
			(("x2", "z"), -2.0),
			(("z", "z"), 3.0),
		]
	}

	#[test]
	fn fixed_not_gate_adjacency() {
		let embedding: Embedding<&str> = vec![("x", vec![0]), ("z", vec![4])].into_iter().collect();
		let sampler = FixedEmbeddingComposite::new(QpuSampler::default(), embedding).unwrap();
		let adjacency = sampler.adjacency();
		assert!(adjacency[&"x"].contains(&"z"));
		assert!(adjacency[&"z"].contains(&"x"));
	}

	#[test]
	fn fixed_and_gate_samples_valid_states() {
		let embedding: Embedding<&str> = vec![("x1", vec![1]), ("x2", vec![5]), ("z", vec![0, 4])]
			.into_iter()
			.collect();
		let sampler = FixedEmbeddingComposite::new(QpuSampler::default(), embedding).unwrap();
		assert_eq!(sampler.adjacency()[&"z"].len(), 2);
		let params = SampleParams::new().with_num_reads(500).with_seed(11);
		let response = sampler.sample_qubo(and_gate(), &params).unwrap();
		assert_eq!(response.total_occurrences(), 500);
		let best = response.first().unwrap();
		assert_eq!(best.energy, 0.0);
		assert_eq!(best.sample[&"z"], best.sample[&"x1"] * best.sample[&"x2"]);
		assert!(response.iter().all(|r| r.chain_break_fraction.is_some()));
		assert_eq!(response.info()["chain_strength"], serde_json::json!(1.0));
	}

	#[test]
	fn fixed_embedding_must_fit_the_chip() {
		let embedding: Embedding<&str> = vec![("x", vec![0]), ("z", vec![0])].into_iter().collect();
		assert!(FixedEmbeddingComposite::new(QpuSampler::default(), embedding).is_err());
		let embedding: Embedding<&str> = vec![("x", vec![0]), ("z", vec![1])].into_iter().collect();
		let sampler = FixedEmbeddingComposite::new(QpuSampler::default(), embedding).unwrap();
		assert!(matches!(
			sampler.sample_qubo(not_gate(), &SampleParams::default()),
			Err(Error::InvalidEmbedding(_))
		));
	}

	#[test]
	fn embedding_composite_solves_not_gate() {
		let sampler = EmbeddingComposite::new(QpuSampler::default());
		let params = SampleParams::new()
			.with_num_reads(200)
			.with_seed(3)
			.with_chain_break_method(ChainBreakMethod::MajorityVote);
		let response = sampler.sample_qubo(not_gate(), &params).unwrap();
		let best = response.first().unwrap();
		assert_eq!(best.energy, -1.0);
		assert_ne!(best.sample[&"x"], best.sample[&"z"]);
		assert!(response.info().contains_key("embedding"));
	}

	#[test]
	fn composite_rejects_unknown_parameters() {
		let sampler = EmbeddingComposite::new(QpuSampler::default());
		let params = SampleParams::new().with_beta_range(0.1, 1.0);
		assert!(matches!(
			Sampler::<&str>::sample_qubo(&sampler, not_gate(), &params),
			Err(Error::UnsupportedParameter { .. })
		));
	}
}
