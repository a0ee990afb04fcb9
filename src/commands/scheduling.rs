//! Meeting scheduling command.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use serde::Serialize;

use qubo_tutorials::csp::{stitch, ConstraintSatisfactionProblem};
use qubo_tutorials::sampler::{ExactSolver, SampleParams, Sampler};
use qubo_tutorials::solution::Sample;
use qubo_tutorials::Qubit;

use super::common::{decisions, SamplerKind, Session};

const VARIABLES: [&str; 4] = ["time", "location", "length", "mandatory"];

/// Business hours meetings are held at the office and are mandatory;
/// evening meetings are teleconferences and short.
pub fn scheduling(x: &[bool]) -> bool {
	let (time, location, length, mandatory) = (x[0], x[1], x[2], x[3]);
	if time {
		location && mandatory
	} else {
		!location && length
	}
}

#[derive(Debug, Serialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Meeting {
	pub time: &'static str,
	pub location: &'static str,
	pub length: &'static str,
	pub attendance: &'static str,
}

impl Meeting {
	fn from_sample(sample: &Sample<&'static str>) -> Option<Self> {
		let pick = |v, yes, no| sample.get_bool(&v).map(|b| if b { yes } else { no });
		Some(Self {
			time: pick("time", "business hours", "evenings")?,
			location: pick("location", "office", "home")?,
			length: pick("length", "short", "long")?,
			attendance: pick("mandatory", "mandatory", "optional")?,
		})
	}
}

impl std::fmt::Display for Meeting {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"Meeting during {} at {}, {} and {}",
			self.time, self.location, self.length, self.attendance
		)
	}
}

/// Execute the scheduling command.
pub fn execute(session: &mut Session) -> Result<()> {
	let mut csp = ConstraintSatisfactionProblem::new();
	csp.add_constraint_fn(scheduling, VARIABLES.to_vec())?;
	let bqm = stitch(&csp, 2.0).context("Failed to stitch the scheduling constraint")?;

	session.header("Stitched model");
	for (v, bias) in bqm.linear() {
		session.line(format!("  {}: {}", v, bias));
	}
	for ((u, v), bias) in bqm.quadratic() {
		session.line(format!("  ({}, {}): {}", u, v, bias));
	}

	session.header("Exact solutions");
	let response = ExactSolver::new().sample(&bqm, &SampleParams::default())?;
	let lowest = response.lowest();
	let min_energy = lowest.first().map(|r| r.energy).unwrap_or(0.0);
	session.line(format!("  minimum energy: {}", min_energy));
	let meetings = lowest
		.iter()
		.filter_map(|r| Meeting::from_sample(&r.sample.decision_variables()))
		.collect::<BTreeSet<_>>();
	for meeting in meetings.iter() {
		session.line(format!("  {}", meeting));
	}
	session.record("min_energy", &min_energy)?;
	session.record("meetings", &meetings)?;

	let sampler = session.sampler::<Qubit<&'static str>>(SamplerKind::Qpu);
	let params = session.params::<Qubit<&'static str>, _>(&*sampler, 5000);
	session.header(&format!("Sampling on {}", sampler.name()));
	let response = sampler
		.sample(&bqm, &params)
		.context("Failed to sample the scheduling model")?;
	let response = decisions(&response);
	session.records(&response);
	session.record("samples", &response)?;
	Ok(())
}
