//! Binary constraint satisfaction problems and their conversion into
//! penalty models.
//!
//! ```
//! # use qubo_tutorials::csp::{gates, stitch, ConstraintSatisfactionProblem};
//! # use qubo_tutorials::sampler::{ExactSolver, SampleParams, Sampler};
//! let mut csp = ConstraintSatisfactionProblem::new();
//! csp.add_constraint(gates::and_gate(["a", "b", "c"]).unwrap());
//! let bqm = stitch(&csp, 2.0).unwrap();
//! let response = ExactSolver::new().sample(&bqm, &SampleParams::default()).unwrap();
//! for record in response.lowest() {
//! 	assert!(csp.check(&record.sample.decision_variables()).unwrap());
//! }
//! ```

pub mod gates;
pub mod operators;
mod penalty;

pub use penalty::{penalty_model, Template};

use crate::error::{Error, Result};
use crate::model::BinaryQuadraticModel;
use crate::polynomial::Polynomial;
use crate::solution::Sample;
use crate::wrapper::{Builder, Qubit};
use crate::TqType;
use std::collections::BTreeSet;
use tracing::{debug, instrument};

/// Largest number of variables a constraint given by a function may have.
pub const MAX_CONSTRAINT_VARIABLES: usize = 16;

/// A relation over binary variables, given by its feasible configurations.
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint<Tq: TqType> {
	variables: Vec<Tq>,
	configurations: BTreeSet<Vec<bool>>,
	name: Option<String>,
}

impl<Tq: TqType> Constraint<Tq> {
	/// Constraint holding exactly where `f` holds.
	pub fn from_fn<F>(f: F, variables: Vec<Tq>) -> Result<Self>
	where
		F: Fn(&[bool]) -> bool,
	{
		check_variables(&variables)?;
		if variables.len() > MAX_CONSTRAINT_VARIABLES {
			return Err(Error::InvalidInput(format!(
				"a constraint function may take at most {} variables, got {}",
				MAX_CONSTRAINT_VARIABLES,
				variables.len()
			)));
		}
		let n = variables.len();
		let configurations = (0..1usize << n)
			.map(|bits| (0..n).map(|i| bits >> (n - 1 - i) & 1 == 1).collect::<Vec<_>>())
			.filter(|config| f(config))
			.collect();
		Ok(Self {
			variables,
			configurations,
			name: None,
		})
	}

	/// Constraint whose feasible configurations are listed.
	pub fn from_configurations<I>(configurations: I, variables: Vec<Tq>) -> Result<Self>
	where
		I: IntoIterator<Item = Vec<bool>>,
	{
		check_variables(&variables)?;
		let configurations = configurations.into_iter().collect::<BTreeSet<_>>();
		if let Some(bad) = configurations.iter().find(|c| c.len() != variables.len()) {
			return Err(Error::InvalidInput(format!(
				"configuration of length {} for {} variables",
				bad.len(),
				variables.len()
			)));
		}
		Ok(Self {
			variables,
			configurations,
			name: None,
		})
	}

	pub fn with_name(mut self, name: &str) -> Self {
		self.name = Some(name.to_string());
		self
	}

	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	pub fn variables(&self) -> &[Tq] {
		&self.variables
	}

	pub fn configurations(&self) -> &BTreeSet<Vec<bool>> {
		&self.configurations
	}

	pub fn is_feasible(&self, config: &[bool]) -> bool {
		self.configurations.contains(config)
	}

	/// Whether `sample` satisfies the constraint. Every variable of the
	/// constraint must be assigned.
	pub fn check(&self, sample: &Sample<Tq>) -> Result<bool> {
		let config = self
			.variables
			.iter()
			.map(|v| {
				sample
					.get_bool(v)
					.ok_or_else(|| Error::MissingVariable(format!("{:?}", v)))
			})
			.collect::<Result<Vec<_>>>()?;
		Ok(self.is_feasible(&config))
	}
}

fn check_variables<Tq: TqType>(variables: &[Tq]) -> Result<()> {
	for (i, v) in variables.iter().enumerate() {
		if variables[..i].contains(v) {
			return Err(Error::InvalidInput(format!(
				"variable {:?} appears twice in a constraint",
				v
			)));
		}
	}
	Ok(())
}

/// A conjunction of binary constraints.
#[derive(Clone, Debug, Default)]
pub struct ConstraintSatisfactionProblem<Tq: TqType> {
	constraints: Vec<Constraint<Tq>>,
}

impl<Tq: TqType> ConstraintSatisfactionProblem<Tq> {
	pub fn new() -> Self {
		Self {
			constraints: Vec::new(),
		}
	}

	pub fn add_constraint(&mut self, constraint: Constraint<Tq>) {
		self.constraints.push(constraint);
	}

	/// Add the constraint that holds where `f` holds.
	pub fn add_constraint_fn<F>(&mut self, f: F, variables: Vec<Tq>) -> Result<()>
	where
		F: Fn(&[bool]) -> bool,
	{
		self.add_constraint(Constraint::from_fn(f, variables)?);
		Ok(())
	}

	pub fn constraints(&self) -> &[Constraint<Tq>] {
		&self.constraints
	}

	pub fn len(&self) -> usize {
		self.constraints.len()
	}

	pub fn is_empty(&self) -> bool {
		self.constraints.is_empty()
	}

	pub fn variables(&self) -> BTreeSet<&Tq> {
		self.constraints
			.iter()
			.flat_map(|c| c.variables.iter())
			.collect()
	}

	/// Whether every constraint is satisfied by `sample`.
	pub fn check(&self, sample: &Sample<Tq>) -> Result<bool> {
		for constraint in self.constraints.iter() {
			if !constraint.check(sample)? {
				return Ok(false);
			}
		}
		Ok(true)
	}
}

fn check_gap(parameter: &'static str, gap: f64) -> Result<()> {
	if gap > 0.0 && gap.is_finite() {
		Ok(())
	} else {
		Err(Error::InvalidParameter {
			parameter,
			reason: format!("{} is not a positive number", gap),
		})
	}
}

/// Binary quadratic model of `csp`: the sum of one penalty model per
/// constraint. With ancillas at their best values, assignments satisfying
/// every constraint have energy 0 and any other assignment at least
/// `min_classical_gap`.
#[instrument(skip_all, fields(num_constraints = csp.len(), min_classical_gap = min_classical_gap))]
pub fn stitch<Tq: TqType>(
	csp: &ConstraintSatisfactionProblem<Tq>,
	min_classical_gap: f64,
) -> Result<BinaryQuadraticModel<Qubit<Tq>>> {
	check_gap("min_classical_gap", min_classical_gap)?;
	let mut builder = Builder::new();
	let mut total = Polynomial::new();
	for constraint in csp.constraints() {
		total += penalty_model(constraint, min_classical_gap, &mut builder);
	}
	let mut bqm = total.to_bqm()?;
	for v in csp.variables() {
		bqm.add_variable(Qubit::new(v.clone()), 0.0);
	}
	debug!(
		num_variables = bqm.num_variables(),
		num_interactions = bqm.num_interactions(),
		num_ancillas = builder.ancillas(),
		"stitched"
	);
	Ok(bqm)
}

/// Soft model of `csp` in which every broken constraint costs exactly
/// `fault_gap`. With ancillas at their best values the energy is
/// `fault_gap` times the number of violated constraints, so the ground
/// states are the explanations with the fewest faults.
///
/// Variables in `fixed` are substituted before order reduction and do not
/// appear in the model.
#[instrument(skip_all, fields(num_constraints = csp.len(), fault_gap = fault_gap, num_fixed = fixed.len()))]
pub fn fault_model<Tq: TqType>(
	csp: &ConstraintSatisfactionProblem<Tq>,
	fault_gap: f64,
	fixed: &Sample<Tq>,
) -> Result<BinaryQuadraticModel<Qubit<Tq>>> {
	check_gap("fault_gap", fault_gap)?;
	let mut total = Polynomial::new();
	for constraint in csp.constraints() {
		total += penalty::indicator(constraint, fault_gap);
	}
	for (v, value) in fixed.iter() {
		total.fix_variable(&Qubit::new(v.clone()), value > 0);
	}
	let mut builder = Builder::new();
	total.reduce_order(&mut builder, fault_gap);
	let mut bqm = total.to_bqm()?;
	for v in csp.variables() {
		if fixed.get(v).is_none() {
			bqm.add_variable(Qubit::new(v.clone()), 0.0);
		}
	}
	debug!(
		num_variables = bqm.num_variables(),
		num_ancillas = builder.ancillas(),
		"fault model built"
	);
	Ok(bqm)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sampler::{ExactSolver, SampleParams, Sampler};

	fn scheduling(x: &[bool]) -> bool {
		let (time, location, length, mandatory) = (x[0], x[1], x[2], x[3]);
		if time {
			location && mandatory
		} else {
			!location && length
		}
	}

	#[test]
	fn from_fn_enumerates_feasible_configurations() {
		let c = Constraint::from_fn(scheduling, vec!["time", "location", "length", "mandatory"]).unwrap();
		assert_eq!(c.configurations().len(), 4);
		assert!(c.is_feasible(&[true, true, false, true]));
		assert!(!c.is_feasible(&[false, true, true, true]));
	}

	#[test]
	fn duplicate_variables_are_rejected() {
		assert!(Constraint::from_fn(|x| x[0], vec!["a", "a"]).is_err());
		assert!(Constraint::from_configurations(vec![vec![true]], vec!["a", "b"]).is_err());
	}

	#[test]
	fn check_requires_every_variable() {
		let mut csp = ConstraintSatisfactionProblem::new();
		csp.add_constraint_fn(|x| x[0] != x[1], vec!["a", "b"]).unwrap();
		let partial: Sample<&str> = vec![("a", 1)].into_iter().collect();
		assert!(csp.check(&partial).is_err());
		let good: Sample<&str> = vec![("a", 1), ("b", 0)].into_iter().collect();
		assert!(csp.check(&good).unwrap());
	}

	#[test]
	fn scheduling_ground_states_are_the_feasible_meetings() {
		let mut csp = ConstraintSatisfactionProblem::new();
		csp.add_constraint_fn(scheduling, vec!["time", "location", "length", "mandatory"])
			.unwrap();
		let bqm = stitch(&csp, 2.0).unwrap();
		let response = ExactSolver::new().sample(&bqm, &SampleParams::default()).unwrap();
		let min_energy = response.first().unwrap().energy;
		assert!(min_energy.abs() < 1e-9);
		let meetings = response
			.lowest()
			.iter()
			.map(|r| r.sample.decision_variables())
			.collect::<BTreeSet<_>>();
		assert_eq!(meetings.len(), 4);
		for meeting in meetings.iter() {
			assert!(csp.check(meeting).unwrap());
		}
	}

	#[test]
	fn unconstrained_variables_stay_in_the_model() {
		let mut csp = ConstraintSatisfactionProblem::new();
		csp.add_constraint_fn(|x| x[0], vec!["a", "b"]).unwrap();
		csp.add_constraint_fn(|_| true, vec!["c"]).unwrap();
		let bqm = stitch(&csp, 2.0).unwrap();
		assert_eq!(bqm.num_variables(), 3);
		assert_eq!(bqm.get_linear(&Qubit::new("b")), Some(0.0));
		let response = ExactSolver::new().sample(&bqm, &SampleParams::default()).unwrap();
		let lowest = response.lowest();
		assert_eq!(lowest.len(), 4);
		for record in lowest {
			let sample = record.sample.decision_variables();
			assert_eq!(sample[&"a"], 1);
			assert!(csp.check(&sample).unwrap());
		}
	}

	#[test]
	fn fault_model_counts_broken_constraints() {
		let mut csp = ConstraintSatisfactionProblem::new();
		csp.add_constraint(gates::and_gate(["a", "b", "c"]).unwrap());
		csp.add_constraint(gates::and_gate(["c", "d", "e"]).unwrap());
		let fixed: Sample<&str> = vec![("a", 1), ("b", 1), ("d", 1), ("e", 0)].into_iter().collect();
		let bqm = fault_model(&csp, 0.5, &fixed).unwrap();
		assert_eq!(bqm.num_variables(), 1);
		let response = ExactSolver::new().sample(&bqm, &SampleParams::default()).unwrap();
		// either gate may take the blame
		assert_eq!(response.len(), 2);
		for record in response.iter() {
			assert!((record.energy - 0.5).abs() < 1e-9);
		}
		let consistent: Sample<&str> = vec![("a", 1), ("b", 1), ("d", 1), ("e", 1)].into_iter().collect();
		let bqm = fault_model(&csp, 0.5, &consistent).unwrap();
		let response = ExactSolver::new().sample(&bqm, &SampleParams::default()).unwrap();
		let best = response.first().unwrap();
		assert!(best.energy.abs() < 1e-9);
		assert_eq!(best.sample[&Qubit::new("c")], 1);
		assert!(fault_model(&csp, -1.0, &consistent).is_err());
	}

	#[test]
	fn gap_must_be_positive() {
		let csp: ConstraintSatisfactionProblem<&str> = ConstraintSatisfactionProblem::new();
		assert!(stitch(&csp, 0.0).is_err());
	}
}
