//! Factoring command.

use anyhow::{Context, Result};

use qubo_tutorials::circuits::factor;
use qubo_tutorials::Qubit;

use super::common::{SamplerKind, Session};

/// Execute the factor command.
pub fn execute(session: &mut Session, p: u8) -> Result<()> {
	let sampler = session.sampler::<Qubit<&'static str>>(SamplerKind::Sa);
	let params = session.params::<Qubit<&'static str>, _>(&*sampler, 1000);
	session.header(&format!("Factoring {} on {}", p, sampler.name()));
	let report = factor(p, &*sampler, &params).with_context(|| format!("Failed to factor {}", p))?;
	session.line(format!(
		"  {:>3} {:>3} {:>6} {:>12} {:>11}",
		"a", "b", "valid", "occurrences", "percentage"
	));
	for f in report.results.iter() {
		session.line(format!(
			"  {:>3} {:>3} {:>6} {:>12} {:>10.1}%",
			f.a, f.b, f.valid, f.num_occurrences, f.percentage
		));
	}
	session.record("factoring", &report)?;
	Ok(())
}
