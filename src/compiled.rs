use crate::expr::Expr;
use crate::model::BinaryQuadraticModel;
use crate::solution::Sample;
use crate::wrapper::{Builder, Qubit};
use crate::{TcType, TqType};

/// A constraint collected from an [`Expr::Constraint`] node.
#[derive(Clone, Debug)]
pub struct LabeledConstraint<Tq, Tc>
where
	Tq: TqType,
	Tc: TcType,
{
	pub label: Tc,
	expr: Expr<Tq, Tc>,
}

impl<Tq, Tc> LabeledConstraint<Tq, Tc>
where
	Tq: TqType,
	Tc: TcType,
{
	pub fn new(label: Tc, expr: Expr<Tq, Tc>) -> Self {
		Self { label, expr }
	}

	/// Satisfied when the expression vanishes; unassigned variables make
	/// the constraint count as satisfied.
	pub fn is_satisfied(&self, sample: &Sample<Tq>) -> bool {
		match self.expr.calculate(sample) {
			Some(f) => f.abs() < 1.0e-4,
			None => true,
		}
	}
}

/// An expression reduced to a binary quadratic model over the caller's
/// variables plus ancillas.
#[derive(Clone, Debug)]
pub struct CompiledModel<Tq, Tc>
where
	Tq: TqType,
	Tc: TcType,
{
	bqm: BinaryQuadraticModel<Qubit<Tq>>,
	constraints: Vec<LabeledConstraint<Tq, Tc>>,
	builder: Builder,
}

impl<Tq, Tc> CompiledModel<Tq, Tc>
where
	Tq: TqType,
	Tc: TcType,
{
	pub(crate) fn new(
		bqm: BinaryQuadraticModel<Qubit<Tq>>,
		constraints: Vec<LabeledConstraint<Tq, Tc>>,
		builder: Builder,
	) -> Self {
		Self {
			bqm,
			constraints,
			builder,
		}
	}

	pub fn bqm(&self) -> &BinaryQuadraticModel<Qubit<Tq>> {
		&self.bqm
	}

	pub fn into_bqm(self) -> BinaryQuadraticModel<Qubit<Tq>> {
		self.bqm
	}

	pub fn constraints(&self) -> &[LabeledConstraint<Tq, Tc>] {
		&self.constraints
	}

	/// Number of ancillas introduced by order reduction.
	pub fn num_ancillas(&self) -> usize {
		self.builder.ancillas()
	}

	/// Labels of the constraints violated by `sample`.
	pub fn unsatisfied_constraints(&self, sample: &Sample<Tq>) -> Vec<&Tc> {
		self.constraints
			.iter()
			.filter(|cc| !cc.is_satisfied(sample))
			.map(|cc| &cc.label)
			.collect()
	}
}

#[test]
fn cubic_objective_gets_ancillas() {
	let hmlt: Expr<u8, ()> = Expr::Binary(0) * Expr::Binary(1) * Expr::Binary(2) * 2;
	let compiled = hmlt.compile().unwrap();
	assert_eq!(compiled.num_ancillas(), 1);
	assert_eq!(compiled.bqm().num_variables(), 4);
}
