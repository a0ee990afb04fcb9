use crate::compiled::{CompiledModel, LabeledConstraint};
use crate::error::Result;
use crate::polynomial::Polynomial;
use crate::solution::Sample;
use crate::wrapper::{Builder, Qubit};
use crate::{TcType, TqType};
use std::ops::{Add, AddAssign, BitXor, Mul, MulAssign, Neg, Sub, SubAssign};

/// Objective expression built with ordinary arithmetic operators.
///
/// ```
/// # use qubo_tutorials::Expr;
/// let hmlt: Expr<_, ()> = Expr::Binary("x") * Expr::Binary("z") * 2 - Expr::Binary("x") - Expr::Binary("z");
/// let compiled = hmlt.compile().unwrap();
/// assert_eq!(compiled.bqm().num_variables(), 2);
/// ```
#[derive(PartialEq, Clone, Debug)]
pub enum Expr<Tq, Tc>
where
	Tq: TqType,
	Tc: TcType,
{
	Add(Box<Self>, Box<Self>),
	Mul(Box<Self>, Box<Self>),
	Number(i32),
	Float(f64),
	Binary(Tq), // Qubit represented with +1, 0
	Spin(Tq),   // Qubit represented with +1, -1
	/// Contributes `expr` to the objective and is reported as unsatisfied
	/// whenever `expr` is non-zero.
	Constraint { label: Tc, expr: Box<Self> },
}

impl<Tq, Tc> Expr<Tq, Tc>
where
	Tq: TqType,
	Tc: TcType,
{
	pub fn map<F>(self, f: &mut F) -> Self
	where
		F: FnMut(Self) -> Self,
	{
		match f(self) {
			Self::Add(a, b) => Self::Add(Box::new(a.map(f)), Box::new(b.map(f))),
			Self::Mul(a, b) => Self::Mul(Box::new(a.map(f)), Box::new(b.map(f))),
			Self::Constraint { label, expr } => Self::Constraint {
				label,
				expr: Box::new(expr.map(f)),
			},
			o => o,
		}
	}

	pub(crate) fn to_polynomial(&self, constraints: &mut Vec<LabeledConstraint<Tq, Tc>>) -> Polynomial<Tq> {
		match self {
			Self::Add(lhs, rhs) => lhs.to_polynomial(constraints) + rhs.to_polynomial(constraints),
			Self::Mul(lhs, rhs) => lhs.to_polynomial(constraints) * rhs.to_polynomial(constraints),
			Self::Number(n) => Polynomial::constant(*n as f64),
			Self::Float(f) => Polynomial::constant(*f),
			Self::Binary(lb) => Polynomial::from_qubit(Qubit::new(lb.clone())),
			Self::Spin(lb) => {
				let mut p = Polynomial::from_qubit(Qubit::new(lb.clone()));
				p.scale(2.0);
				p + Polynomial::constant(-1.0)
			}
			Self::Constraint { label, expr } => {
				constraints.push(LabeledConstraint::new(label.clone(), (**expr).clone()));
				expr.to_polynomial(constraints)
			}
		}
	}

	/// Value of the expression, `None` if a variable is unassigned.
	pub fn calculate(&self, map: &Sample<Tq>) -> Option<f64> {
		match self {
			Self::Add(lhs, rhs) => Some(lhs.calculate(map)? + rhs.calculate(map)?),
			Self::Mul(lhs, rhs) => match (lhs.calculate(map), rhs.calculate(map)) {
				(Some(lhs), Some(rhs)) => Some(lhs * rhs),
				(Some(e), None) | (None, Some(e)) if e.abs() < 1.0e-6 => Some(0.0),
				_ => None,
			},
			Self::Number(n) => Some(*n as f64),
			Self::Float(f) => Some(*f),
			Self::Binary(lb) => map.get_bool(lb).map(|b| if b { 1.0 } else { 0.0 }),
			Self::Spin(lb) => map.get_bool(lb).map(|b| if b { 1.0 } else { -1.0 }),
			Self::Constraint { label: _, expr } => expr.calculate(map),
		}
	}

	/// Expand, reduce to quadratic order and collect the labelled constraints.
	pub fn compile(self) -> Result<CompiledModel<Tq, Tc>> {
		let mut constraints = Vec::new();
		let mut polynomial = self.to_polynomial(&mut constraints);
		let mut builder = Builder::new();
		polynomial.reduce_order(&mut builder, 1.0);
		Ok(CompiledModel::new(polynomial.to_bqm()?, constraints, builder))
	}

	#[inline]
	fn add(self, other: Self) -> Self {
		Self::Add(Box::new(self), Box::new(other))
	}

	#[inline]
	fn sub(self, other: Self) -> Self {
		self.add(-other)
	}

	#[inline]
	fn mul(self, other: Self) -> Self {
		Self::Mul(Box::new(self), Box::new(other))
	}
}

impl<Tq, Tc> From<f64> for Expr<Tq, Tc>
where
	Tq: TqType,
	Tc: TcType,
{
	#[inline]
	fn from(f: f64) -> Self {
		Expr::Float(f)
	}
}

impl<Tq, Tc> From<i32> for Expr<Tq, Tc>
where
	Tq: TqType,
	Tc: TcType,
{
	#[inline]
	fn from(f: i32) -> Self {
		Expr::Number(f)
	}
}

impl<Tq, Tc> Neg for Expr<Tq, Tc>
where
	Tq: TqType,
	Tc: TcType,
{
	type Output = Self;
	#[inline]
	fn neg(self) -> Self::Output {
		Self::Mul(Box::new(Expr::Number(-1)), Box::new(self))
	}
}

macro_rules! impl_binary_op_inner {
	($trait:ident, $fun:ident, $lhs:ty, $rhs:ty) => {
		impl<Tq, Tc> $trait<$rhs> for $lhs
		where
			Tq: TqType,
			Tc: TcType,
		{
			type Output = Expr<Tq, Tc>;
			#[inline]
			fn $fun(self, other: $rhs) -> Self::Output {
				Expr::$fun(
					<$lhs as Into<Self::Output>>::into(self),
					<$rhs as Into<Self::Output>>::into(other),
				)
			}
		}
	};
}

macro_rules! impl_binary_op {
	($trait:ident, $fun:ident) => {
		impl_binary_op_inner!($trait, $fun, Expr<Tq, Tc>, Expr<Tq, Tc>);
		impl_binary_op_inner!($trait, $fun, Expr<Tq, Tc>, i32);
		impl_binary_op_inner!($trait, $fun, Expr<Tq, Tc>, f64);
		impl_binary_op_inner!($trait, $fun, i32, Expr<Tq, Tc>);
		impl_binary_op_inner!($trait, $fun, f64, Expr<Tq, Tc>);
	};
}

impl_binary_op!(Add, add);
impl_binary_op!(Sub, sub);
impl_binary_op!(Mul, mul);

impl<Tq, Tc> BitXor<usize> for Expr<Tq, Tc>
where
	Tq: TqType,
	Tc: TcType,
{
	type Output = Self;
	#[inline]
	fn bitxor(self, other: usize) -> Self {
		let mut hmlt = Expr::Number(1);
		for _ in 0..other {
			hmlt *= self.clone();
		}
		hmlt
	}
}

macro_rules! impl_assign_op_inner {
	($trait:ident, $fun:ident, $fun_inner:ident, $rhs:ty) => {
		impl<Tq, Tc> $trait<$rhs> for Expr<Tq, Tc>
		where
			Tq: TqType,
			Tc: TcType,
		{
			#[inline]
			fn $fun(&mut self, other: $rhs) {
				let inner = std::mem::replace(self, Expr::Number(0));
				*self = Expr::$fun_inner(inner, <$rhs as Into<Expr<Tq, Tc>>>::into(other));
			}
		}
	};
}

macro_rules! impl_assign_op {
	($trait:ident, $fun:ident, $fun_inner:ident) => {
		impl_assign_op_inner!($trait, $fun, $fun_inner, Expr<Tq, Tc>);
		impl_assign_op_inner!($trait, $fun, $fun_inner, i32);
		impl_assign_op_inner!($trait, $fun, $fun_inner, f64);
	};
}

impl_assign_op!(AddAssign, add_assign, add);
impl_assign_op!(SubAssign, sub_assign, sub);
impl_assign_op!(MulAssign, mul_assign, mul);
