use super::Constraint;
use crate::polynomial::Polynomial;
use crate::wrapper::{Builder, Qubit};
use crate::TqType;
use std::collections::BTreeSet;

/// Relations with a known quadratic penalty that needs no ancilla. Each has
/// gap 1 before scaling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Template {
	/// `out = in1 ∧ in2`: `in1·in2 − 2·in1·out − 2·in2·out + 3·out`
	And,
	/// `out = in1 ∨ in2`: `in1·in2 + in1 + in2 + out − 2·in1·out − 2·in2·out`
	Or,
	/// `a ≠ b`: `1 − a − b + 2ab`
	Ne,
	/// `a = b`: `a + b − 2ab`
	Eq,
}

fn table<F>(n: usize, f: F) -> BTreeSet<Vec<bool>>
where
	F: Fn(&[bool]) -> bool,
{
	(0..1usize << n)
		.map(|bits| (0..n).map(|i| bits >> i & 1 == 1).collect::<Vec<_>>())
		.filter(|c| f(c))
		.collect()
}

impl Template {
	/// Template whose feasible set equals the constraint's, if any.
	pub fn detect<Tq: TqType>(constraint: &Constraint<Tq>) -> Option<Self> {
		let configurations = constraint.configurations();
		match constraint.variables().len() {
			2 => [
				(Template::Ne, table(2, |c| c[0] != c[1])),
				(Template::Eq, table(2, |c| c[0] == c[1])),
			],
			3 => [
				(Template::And, table(3, |c| c[2] == (c[0] && c[1]))),
				(Template::Or, table(3, |c| c[2] == (c[0] || c[1]))),
			],
			_ => return None,
		}
		.iter()
		.find(|(_, t)| t == configurations)
		.map(|(template, _)| *template)
	}

	fn polynomial<Tq: TqType>(self, variables: &[Tq], gap: f64) -> Polynomial<Tq> {
		let x = |i: usize| Qubit::new(variables[i].clone());
		let term = |qs: &[usize]| qs.iter().map(|i| x(*i)).collect::<BTreeSet<_>>();
		let terms: Vec<(BTreeSet<Qubit<Tq>>, f64)> = match self {
			Template::And => vec![
				(term(&[0, 1]), 1.0),
				(term(&[0, 2]), -2.0),
				(term(&[1, 2]), -2.0),
				(term(&[2]), 3.0),
			],
			Template::Or => vec![
				(term(&[0, 1]), 1.0),
				(term(&[0]), 1.0),
				(term(&[1]), 1.0),
				(term(&[2]), 1.0),
				(term(&[0, 2]), -2.0),
				(term(&[1, 2]), -2.0),
			],
			Template::Ne => vec![
				(term(&[]), 1.0),
				(term(&[0]), -1.0),
				(term(&[1]), -1.0),
				(term(&[0, 1]), 2.0),
			],
			Template::Eq => vec![
				(term(&[0]), 1.0),
				(term(&[1]), 1.0),
				(term(&[0, 1]), -2.0),
			],
		};
		let mut p = Polynomial::new();
		for (set, c) in terms {
			p.add_term(set, c * gap);
		}
		p
	}
}

/// `gap` times the multilinear indicator of the infeasible configurations.
pub(super) fn indicator<Tq: TqType>(constraint: &Constraint<Tq>, gap: f64) -> Polynomial<Tq> {
	let n = constraint.variables().len();
	let mut coeffs = (0..1usize << n)
		.map(|mask| {
			let config = (0..n).map(|i| mask >> i & 1 == 1).collect::<Vec<_>>();
			if constraint.is_feasible(&config) {
				0.0
			} else {
				1.0
			}
		})
		.collect::<Vec<f64>>();
	// Möbius transform over the subset lattice
	for i in 0..n {
		for mask in 0..1usize << n {
			if mask >> i & 1 == 1 {
				coeffs[mask] -= coeffs[mask ^ 1 << i];
			}
		}
	}
	let mut p = Polynomial::new();
	for (mask, c) in coeffs.into_iter().enumerate() {
		if c != 0.0 {
			let set = (0..n)
				.filter(|i| mask >> i & 1 == 1)
				.map(|i| Qubit::new(constraint.variables()[i].clone()))
				.collect();
			p.add_term(set, c * gap);
		}
	}
	p
}

/// One ancilla per feasible configuration, exactly one of them set, each
/// pinning the variables to its configuration. Costs `gap` per deviation.
fn one_hot<Tq: TqType>(constraint: &Constraint<Tq>, gap: f64, builder: &mut Builder) -> Polynomial<Tq> {
	let mut p = Polynomial::constant(gap);
	let mut selectors: Vec<Qubit<Tq>> = Vec::new();
	for config in constraint.configurations() {
		let y: Qubit<Tq> = builder.ancilla();
		let ones = config.iter().filter(|b| **b).count() as f64;
		p.add_term(Some(y.clone()).into_iter().collect(), gap * (ones - 1.0));
		for (v, b) in constraint.variables().iter().zip(config.iter()) {
			let set = vec![y.clone(), Qubit::new(v.clone())].into_iter().collect();
			p.add_term(set, if *b { -gap } else { gap });
		}
		for other in selectors.iter() {
			p.add_term(vec![y.clone(), other.clone()].into_iter().collect(), 2.0 * gap);
		}
		selectors.push(y);
	}
	p
}

/// Quadratic penalty of one constraint: zero on feasible configurations (with
/// its ancillas at their best values) and at least `gap` elsewhere.
///
/// Known relations use their template. Otherwise the indicator polynomial of
/// the infeasible set is reduced to order two, unless a one-hot selection of
/// the feasible configurations needs fewer ancillas.
pub fn penalty_model<Tq: TqType>(
	constraint: &Constraint<Tq>,
	gap: f64,
	builder: &mut Builder,
) -> Polynomial<Tq> {
	if let Some(template) = Template::detect(constraint) {
		return template.polynomial(constraint.variables(), gap);
	}
	let mut reduced = indicator(constraint, gap);
	let mut trial = builder.clone();
	reduced.reduce_order(&mut trial, gap);
	if trial.ancillas() - builder.ancillas() <= constraint.configurations().len() {
		*builder = trial;
		reduced
	} else {
		one_hot(constraint, gap, builder)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::csp::{gates, operators};

	/// Brute-force minimum over the ancillas for every assignment of the
	/// constraint's variables.
	fn assert_penalty<Tq: TqType>(constraint: &Constraint<Tq>, gap: f64) {
		let mut builder = Builder::new();
		let p = penalty_model(constraint, gap, &mut builder);
		assert!(p.get_order() <= 2);
		let n = constraint.variables().len();
		let ancillas = p
			.get_qubits()
			.into_iter()
			.filter(|q| q.is_ancilla())
			.cloned()
			.collect::<Vec<_>>();
		assert!(ancillas.len() <= 16);
		for mask in 0..1usize << n {
			let config = (0..n).map(|i| mask >> i & 1 == 1).collect::<Vec<_>>();
			let best = (0..1usize << ancillas.len())
				.map(|a| {
					p.evaluate(|q| match q.label() {
						Some(l) => {
							let i = constraint.variables().iter().position(|v| v == l).unwrap();
							config[i]
						}
						None => {
							let i = ancillas.iter().position(|v| v == q).unwrap();
							a >> i & 1 == 1
						}
					})
				})
				.fold(f64::INFINITY, f64::min);
			if constraint.is_feasible(&config) {
				assert!(best.abs() < 1e-9, "{:?}: {}", config, best);
			} else {
				assert!(best >= gap - 1e-9, "{:?}: {}", config, best);
			}
		}
	}

	#[test]
	fn templates_are_detected() {
		assert_eq!(Template::detect(&gates::and_gate(["a", "b", "c"]).unwrap()), Some(Template::And));
		assert_eq!(Template::detect(&gates::or_gate(["a", "b", "c"]).unwrap()), Some(Template::Or));
		assert_eq!(Template::detect(&operators::ne(["a", "b"]).unwrap()), Some(Template::Ne));
		assert_eq!(Template::detect(&operators::eq(["a", "b"]).unwrap()), Some(Template::Eq));
		assert_eq!(Template::detect(&gates::xor_gate(["a", "b", "c"]).unwrap()), None);
	}

	#[test]
	fn template_penalties_have_the_gap() {
		assert_penalty(&gates::and_gate(["a", "b", "c"]).unwrap(), 2.0);
		assert_penalty(&gates::or_gate(["a", "b", "c"]).unwrap(), 2.0);
		assert_penalty(&operators::ne(["a", "b"]).unwrap(), 2.0);
		assert_penalty(&operators::eq(["a", "b"]).unwrap(), 1.5);
	}

	#[test]
	fn generic_penalties_have_the_gap() {
		assert_penalty(&gates::xor_gate(["a", "b", "c"]).unwrap(), 2.0);
		assert_penalty(&gates::halfadder_gate(["a", "b", "s", "c"]).unwrap(), 2.0);
		assert_penalty(&gates::fulladder_gate(["a", "b", "ci", "s", "co"]).unwrap(), 2.0);
		let scheduling = Constraint::from_fn(
			|x| if x[0] { x[1] && x[3] } else { !x[1] && x[2] },
			vec!["time", "location", "length", "mandatory"],
		)
		.unwrap();
		assert_penalty(&scheduling, 2.0);
	}

	#[test]
	fn one_hot_selection_pins_configurations() {
		let c = Constraint::from_configurations(
			vec![vec![true, false, true], vec![false, true, true]],
			vec![0u8, 1, 2],
		)
		.unwrap();
		let mut builder = Builder::new();
		let p = one_hot(&c, 3.0, &mut builder);
		assert_eq!(builder.ancillas(), 2);
		// configurations are numbered in order, (1, 0, 1) is the second
		let value = p.evaluate(|q| match q {
			Qubit::Qubit(i) => *i != 1,
			Qubit::Ancilla(a) => *a == 1,
		});
		assert!(value.abs() < 1e-9);
	}

	#[test]
	fn unsatisfiable_constraint_costs_the_gap() {
		let c = Constraint::from_configurations(Vec::new(), vec!["a", "b", "c"]).unwrap();
		let mut builder = Builder::new();
		let p = penalty_model(&c, 2.0, &mut builder);
		assert_eq!(builder.ancillas(), 0);
		assert!((p.evaluate(|_| false) - 2.0).abs() < 1e-9);
	}
}
