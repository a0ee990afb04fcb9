//! Gate circuits written as constraint satisfaction problems, factoring by
//! running a three bit multiplier backwards, and fault diagnosis of the
//! same multiplier.

use crate::csp::{fault_model, gates, operators, stitch, Constraint, ConstraintSatisfactionProblem};
use crate::error::{Error, Result};
use crate::sampler::{SampleParams, Sampler};
use crate::solution::{Sample, SampleSet};
use crate::wrapper::Qubit;
use crate::TqType;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument};

/// Gap between valid and invalid circuit states in the factoring model.
pub const FACTORING_GAP: f64 = 1.0;

/// Energy of one faulty gate in the diagnosis model.
pub const FAULT_GAP: f64 = 0.5;

/// Output of the seven gate circuit:
/// `z = (a ∧ ¬b ∧ (b ∨ c ∨ d)) ∨ ¬(b ∨ c ∨ d)`.
pub fn logic_circuit(a: bool, b: bool, c: bool, d: bool) -> bool {
	let not1 = !b;
	let or2 = b || c;
	let and3 = a && not1;
	let or4 = or2 || d;
	let and5 = and3 && or4;
	let not6 = !or4;
	and5 || not6
}

/// The whole circuit as one constraint over `a, b, c, d, z`.
pub fn single_constraint_csp() -> Result<ConstraintSatisfactionProblem<&'static str>> {
	let mut csp = ConstraintSatisfactionProblem::new();
	csp.add_constraint(
		Constraint::from_fn(
			|x| x[4] == logic_circuit(x[0], x[1], x[2], x[3]),
			vec!["a", "b", "c", "d", "z"],
		)?
		.with_name("circuit"),
	);
	Ok(csp)
}

/// The circuit gate by gate, with intermediate outputs
/// `not1 or2 and3 or4 and5 not6` and the result in `z`.
pub fn multi_gate_csp() -> Result<ConstraintSatisfactionProblem<&'static str>> {
	let mut csp = ConstraintSatisfactionProblem::new();
	csp.add_constraint(operators::ne(["b", "not1"])?);
	csp.add_constraint(gates::or_gate(["b", "c", "or2"])?);
	csp.add_constraint(gates::and_gate(["a", "not1", "and3"])?);
	csp.add_constraint(gates::or_gate(["d", "or2", "or4"])?);
	csp.add_constraint(gates::and_gate(["and3", "or4", "and5"])?);
	csp.add_constraint(operators::ne(["or4", "not6"])?);
	csp.add_constraint(gates::or_gate(["and5", "not6", "z"])?);
	Ok(csp)
}

/// Energy of one read and whether it satisfies the circuit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EnergyPoint {
	pub energy: f64,
	pub valid: bool,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct Validation {
	pub valid: usize,
	pub invalid: usize,
	/// One point per read, in record order.
	pub points: Vec<EnergyPoint>,
}

/// Count the reads of `response` that satisfy `csp`, ignoring ancillas.
pub fn validate_samples<Tq: TqType>(
	csp: &ConstraintSatisfactionProblem<Tq>,
	response: &SampleSet<Qubit<Tq>>,
) -> Result<Validation> {
	let mut validation = Validation::default();
	for record in response.iter() {
		let valid = csp.check(&record.sample.decision_variables())?;
		if valid {
			validation.valid += record.num_occurrences;
		} else {
			validation.invalid += record.num_occurrences;
		}
		let point = EnergyPoint {
			energy: record.energy,
			valid,
		};
		validation
			.points
			.extend(std::iter::repeat(point).take(record.num_occurrences));
	}
	Ok(validation)
}

const MULTIPLICAND: [&str; 3] = ["a0", "a1", "a2"];
const MULTIPLIER: [&str; 3] = ["b0", "b1", "b2"];
const PRODUCT: [&str; 6] = ["p0", "p1", "p2", "p3", "p4", "p5"];

/// Output of `a_i ∧ b_j`. The lowest bit of the product needs no adder.
const AND_OUTPUTS: [[&str; 3]; 3] = [
	["p0", "and01", "and02"],
	["and10", "and11", "and12"],
	["and20", "and21", "and22"],
];

const AND_GATES: [[&str; 3]; 3] = [
	["and00", "and01", "and02"],
	["and10", "and11", "and12"],
	["and20", "and21", "and22"],
];

/// Array multiplier of two 3 bit numbers `a2a1a0 · b2b1b0 = p5…p0`: nine AND
/// gates, three half adders and three full adders. Each constraint carries
/// the name of its gate.
pub fn three_bit_multiplier() -> Result<ConstraintSatisfactionProblem<&'static str>> {
	let mut csp = ConstraintSatisfactionProblem::new();
	for (i, a) in MULTIPLICAND.iter().enumerate() {
		for (j, b) in MULTIPLIER.iter().enumerate() {
			csp.add_constraint(
				gates::and_gate([*a, *b, AND_OUTPUTS[i][j]])?.with_name(AND_GATES[i][j]),
			);
		}
	}
	// weight 2
	csp.add_constraint(
		gates::halfadder_gate(["and01", "and10", "p1", "carry01"])?.with_name("add01"),
	);
	// weight 4
	csp.add_constraint(
		gates::halfadder_gate(["and11", "and20", "sum11", "carry11"])?.with_name("add11"),
	);
	csp.add_constraint(
		gates::fulladder_gate(["and02", "sum11", "carry01", "p2", "carry02"])?.with_name("add02"),
	);
	// weight 8
	csp.add_constraint(
		gates::fulladder_gate(["and12", "and21", "carry11", "sum12", "carry12"])?.with_name("add12"),
	);
	csp.add_constraint(
		gates::halfadder_gate(["carry02", "sum12", "p3", "carry03"])?.with_name("add03"),
	);
	// weight 16 and 32
	csp.add_constraint(
		gates::fulladder_gate(["carry03", "and22", "carry12", "p4", "p5"])?.with_name("add13"),
	);
	Ok(csp)
}

/// One distinct pair of factors read from the samples.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Factors {
	pub a: u8,
	pub b: u8,
	pub valid: bool,
	#[serde(rename = "numOfOccurrences")]
	pub num_occurrences: usize,
	#[serde(rename = "percentageOfOccurrences")]
	pub percentage: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct FactoringReport {
	pub p: u8,
	/// Sorted by occurrences, most frequent first.
	pub results: Vec<Factors>,
	#[serde(rename = "numberOfReads")]
	pub number_of_reads: usize,
}

fn read_number(sample: &Sample<&'static str>, bits: &[&'static str]) -> Result<u8> {
	let mut n = 0u8;
	for (i, bit) in bits.iter().enumerate() {
		let set = sample
			.get_bool(bit)
			.ok_or_else(|| Error::MissingVariable(bit.to_string()))?;
		if set {
			n |= 1 << i;
		}
	}
	Ok(n)
}

/// Factor `p < 64` by clamping the product bits of the multiplier and
/// sampling the remaining circuit.
#[instrument(skip(sampler, params))]
pub fn factor<S>(p: u8, sampler: &S, params: &SampleParams) -> Result<FactoringReport>
where
	S: Sampler<Qubit<&'static str>> + ?Sized,
{
	if p >= 64 {
		return Err(Error::InvalidInput(format!(
			"{} does not fit the 6 bit product of the multiplier",
			p
		)));
	}
	let csp = three_bit_multiplier()?;
	let mut bqm = stitch(&csp, FACTORING_GAP)?;
	for (i, bit) in PRODUCT.iter().enumerate() {
		bqm.fix_variable(&Qubit::new(*bit), (p >> i & 1) as i8)?;
	}
	debug!(
		num_variables = bqm.num_variables(),
		num_interactions = bqm.num_interactions(),
		"product bits fixed"
	);
	let response = sampler.sample(&bqm, params)?;
	let total = response.total_occurrences();
	let mut counts: BTreeMap<(u8, u8), usize> = BTreeMap::new();
	for record in response.iter() {
		let sample = record.sample.decision_variables();
		let a = read_number(&sample, &MULTIPLICAND)?;
		let b = read_number(&sample, &MULTIPLIER)?;
		*counts.entry((a, b)).or_insert(0) += record.num_occurrences;
	}
	let mut results = counts
		.into_iter()
		.map(|((a, b), n)| Factors {
			a,
			b,
			valid: a as u16 * b as u16 == p as u16,
			num_occurrences: n,
			percentage: 100.0 * n as f64 / total.max(1) as f64,
		})
		.collect::<Vec<_>>();
	results.sort_by(|x, y| y.num_occurrences.cmp(&x.num_occurrences));
	Ok(FactoringReport {
		p,
		results,
		number_of_reads: total,
	})
}

/// Fewest faulty gates that explain a multiplier reading `a · b = p`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Diagnosis {
	pub a: u8,
	pub b: u8,
	pub p: u8,
	/// Whether `a · b = p`, i.e. a working circuit explains the reading.
	pub valid: bool,
	#[serde(rename = "minFaults")]
	pub min_faults: usize,
	/// Gates of the lowest energy explanation.
	#[serde(rename = "faultyGates")]
	pub faulty_gates: Vec<String>,
	/// Every distinct explanation with `min_faults` gates among the reads.
	pub explanations: Vec<Vec<String>>,
	pub energy: f64,
	#[serde(rename = "numberOfReads")]
	pub number_of_reads: usize,
}

fn bits(sample: &mut Sample<&'static str>, labels: &[&'static str], n: u8) {
	for (i, label) in labels.iter().enumerate() {
		sample.insert(*label, (n >> i & 1) as i8);
	}
}

fn faulty_gates(
	csp: &ConstraintSatisfactionProblem<&'static str>,
	sample: &Sample<&'static str>,
) -> Result<Vec<String>> {
	let mut faulty = Vec::new();
	for constraint in csp.constraints() {
		if !constraint.check(sample)? {
			faulty.push(constraint.name().unwrap_or("unnamed").to_string());
		}
	}
	Ok(faulty)
}

/// Clamp the inputs `a`, `b` and the output `p` of the multiplier and sample
/// the fault model of the remaining wires. Every faulty gate costs
/// [`FAULT_GAP`].
#[instrument(skip(sampler, params))]
pub fn diagnose<S>(a: u8, b: u8, p: u8, sampler: &S, params: &SampleParams) -> Result<Diagnosis>
where
	S: Sampler<Qubit<&'static str>> + ?Sized,
{
	if a >= 8 || b >= 8 || p >= 64 {
		return Err(Error::InvalidInput(format!(
			"{} · {} = {} does not fit the 3 bit multiplier",
			a, b, p
		)));
	}
	let csp = three_bit_multiplier()?;
	let mut fixed = Sample::new();
	bits(&mut fixed, &MULTIPLICAND, a);
	bits(&mut fixed, &MULTIPLIER, b);
	bits(&mut fixed, &PRODUCT, p);
	let bqm = fault_model(&csp, FAULT_GAP, &fixed)?;
	let response = sampler.sample(&bqm, params)?;
	let best = response
		.first()
		.ok_or_else(|| Error::InvalidProblem("the sampler returned no samples".to_string()))?;
	let mut found: Vec<Vec<String>> = Vec::new();
	for record in response.iter() {
		let mut sample = record.sample.decision_variables();
		for (v, value) in fixed.iter() {
			sample.insert(*v, value);
		}
		found.push(faulty_gates(&csp, &sample)?);
	}
	let min_faults = found.iter().map(Vec::len).min().unwrap_or(0);
	let mut seen = BTreeSet::new();
	let explanations = found
		.iter()
		.filter(|gates| gates.len() == min_faults && seen.insert((*gates).clone()))
		.cloned()
		.collect::<Vec<_>>();
	debug!(min_faults, explanations = explanations.len(), "diagnosed");
	Ok(Diagnosis {
		a,
		b,
		p,
		valid: a as u16 * b as u16 == p as u16,
		min_faults,
		faulty_gates: explanations.first().cloned().unwrap_or_default(),
		explanations,
		energy: best.energy,
		number_of_reads: response.total_occurrences(),
	})
}
