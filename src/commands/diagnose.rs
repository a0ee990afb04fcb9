//! Fault diagnosis command.

use anyhow::{Context, Result};

use qubo_tutorials::circuits::diagnose;
use qubo_tutorials::Qubit;

use super::common::{SamplerKind, Session};

/// Execute the diagnose command.
pub fn execute(session: &mut Session, a: u8, b: u8, p: u8) -> Result<()> {
	let sampler = session.sampler::<Qubit<&'static str>>(SamplerKind::Sa);
	let params = session.params::<Qubit<&'static str>, _>(&*sampler, 1000);
	session.header(&format!("Diagnosing {} * {} = {} on {}", a, b, p, sampler.name()));
	let report = diagnose(a, b, p, &*sampler, &params)
		.with_context(|| format!("Failed to diagnose {} * {} = {}", a, b, p))?;
	if report.valid {
		session.line(format!("  {} * {} = {} is a valid product", a, b, p));
	} else {
		session.line(format!("  {} * {} = {} is not a valid product", a, b, p));
	}
	session.line(format!(
		"  minimum number of faults: {} (energy {})",
		report.min_faults, report.energy
	));
	if !report.faulty_gates.is_empty() {
		session.line(format!("  faulty gates: {}", report.faulty_gates.join(", ")));
	}
	if report.explanations.len() > 1 {
		session.line(format!("  {} explanations found:", report.explanations.len()));
		for gates in report.explanations.iter() {
			session.line(format!("    {}", gates.join(", ")));
		}
	}
	session.record("diagnosis", &report)?;
	Ok(())
}
