//! Multi-gate circuit command.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;

use qubo_tutorials::circuits::{multi_gate_csp, single_constraint_csp, validate_samples};
use qubo_tutorials::csp::stitch;
use qubo_tutorials::Qubit;

use super::common::{decisions, SamplerKind, Session};

/// Execute the circuit command. Energies of every read are written to
/// `plot_out` as JSON when given.
pub fn execute(session: &mut Session, plot_out: Option<&Path>) -> Result<()> {
	let sampler = session.sampler::<Qubit<&'static str>>(SamplerKind::Qpu);
	let params = session.params::<Qubit<&'static str>, _>(&*sampler, 1000);
	let formulations = vec![
		("single_constraint", single_constraint_csp()?),
		("multi_gate", multi_gate_csp()?),
	];
	let mut energies = serde_json::Map::new();
	for (name, csp) in formulations {
		let bqm = stitch(&csp, 2.0)?;
		session.header(&format!(
			"{}: {} variables, {} interactions on {}",
			name,
			bqm.num_variables(),
			bqm.num_interactions(),
			sampler.name()
		));
		let response = sampler
			.sample(&bqm, &params)
			.with_context(|| format!("Failed to sample the {} circuit", name))?;
		let validation = validate_samples(&csp, &response)?;
		session.line(format!(
			"  {} valid and {} invalid reads",
			validation.valid, validation.invalid
		));
		let readable = decisions(&response);
		if let Some(first) = readable.first() {
			session.line(format!("  first sample: {}", first.sample));
		}
		session.records(&readable);
		session.record(
			name,
			&json!({
				"valid": validation.valid,
				"invalid": validation.invalid,
				"samples": readable,
			}),
		)?;
		energies.insert(name.to_string(), serde_json::to_value(&validation.points)?);
	}
	if let Some(path) = plot_out {
		let out = serde_json::to_string_pretty(&energies)?;
		fs::write(path, out)
			.with_context(|| format!("Failed to write energies: {}", path.display()))?;
		session.line(format!("Energies written to {}", path.display()));
	}
	Ok(())
}
