//! NOT and AND gate commands.

use anyhow::{Context, Result};

use qubo_tutorials::composite::{EmbeddingComposite, FixedEmbeddingComposite};
use qubo_tutorials::embedding::Embedding;
use qubo_tutorials::sampler::{Sampler, Structured};

use super::common::{labelled, SamplerKind, Session};

type Qubo = Vec<((&'static str, &'static str), f64)>;

/// `−x − z + 2xz`: lowest when `z = ¬x`.
pub fn not_gate() -> Qubo {
	vec![
		(("x", "x"), -1.0),
		(("x", "z"), 2.0),
		(("z", "x"), 0.0),
		(("z", "z"), -1.0),
	]
}

/// `x1·x2 − 2·x1·z − 2·x2·z + 3z`: lowest when `z = x1 ∧ x2`.
pub fn and_gate() -> Qubo {
	vec![
		(("x1", "x2"), 1.0),
		(("x1", "z"), -2.0),
		(("x2", "z"), -2.0),
		(("z", "z"), 3.0),
	]
}

/// Execute the not-gate command.
pub fn execute_not(session: &mut Session) -> Result<()> {
	let sampler = session.sampler::<&'static str>(SamplerKind::Qpu);
	let params = session.params::<&'static str, _>(&*sampler, 5000);
	session.header(&format!("NOT gate on {}", sampler.name()));
	let response = sampler
		.sample_qubo(not_gate(), &params)
		.context("Failed to sample the NOT gate")?;
	session.records(&response);
	session.record("not_gate", &labelled(&response)?)?;
	Ok(())
}

/// Execute the and-gate command: automatic embedding, then fixed embeddings
/// with default and weak chains.
pub fn execute_and(session: &mut Session) -> Result<()> {
	let qpu = session.config.qpu();
	let composite = EmbeddingComposite::new(qpu.clone());
	let params = session.params::<&str, _>(&composite, 5000);

	session.header("AND gate, automatic embedding");
	let response = composite
		.sample_qubo(and_gate(), &params)
		.context("Failed to sample the AND gate")?;
	session.records(&response);
	session.record("and_gate", &labelled(&response)?)?;

	let first = qpu
		.nodelist()
		.first()
		.copied()
		.context("The annealer has no qubits")?;
	let adjacent = qpu.adjacency().remove(&first).unwrap_or_default();
	session.header(&format!("Qubits adjacent to qubit {}", first));
	session.line(format!("  {:?}", adjacent));
	session.record("adjacent_to_first_qubit", &adjacent)?;

	session.header("NOT gate, fixed embedding {x: [0], z: [4]}");
	let embedding: Embedding<&str> = vec![("x", vec![0]), ("z", vec![4])].into_iter().collect();
	let fixed = FixedEmbeddingComposite::new(qpu.clone(), embedding)
		.context("Failed to use the NOT gate embedding")?;
	session.line(format!("  logical adjacency: {:?}", fixed.adjacency()));
	let response = fixed.sample_qubo(not_gate(), &params)?;
	session.records(&response);
	session.record("not_gate_fixed", &labelled(&response)?)?;

	session.header("AND gate, fixed embedding {x1: [1], x2: [5], z: [0, 4]}");
	let embedding: Embedding<&str> = vec![("x1", vec![1]), ("x2", vec![5]), ("z", vec![0, 4])]
		.into_iter()
		.collect();
	let fixed = FixedEmbeddingComposite::new(qpu.clone(), embedding)
		.context("Failed to use the AND gate embedding")?;
	let extended_j_range = qpu.properties().extended_j_range;
	session.line(format!("  extended_j_range: {:?}", extended_j_range));
	session.record("extended_j_range", &extended_j_range)?;
	let response = fixed.sample_qubo(and_gate(), &params)?;
	session.records(&response);
	session.record("and_gate_fixed", &labelled(&response)?)?;

	session.header("AND gate, fixed embedding, chain strength 0.25");
	let weak = params.clone().with_chain_strength(0.25);
	let response = fixed.sample_qubo(and_gate(), &weak)?;
	session.records(&response);
	session.record("and_gate_weak_chains", &labelled(&response)?)?;
	Ok(())
}
