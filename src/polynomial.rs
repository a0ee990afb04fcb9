use crate::error::{Error, Result};
use crate::model::{BinaryQuadraticModel, Vartype};
use crate::wrapper::{Builder, Qubit};
use crate::TqType;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::{Add, AddAssign, Mul, MulAssign};

const EPSILON: f64 = 1.0e-12;

/// Multilinear polynomial over binary variables. Each term is keyed by its
/// set of variables (`x² = x`), the empty set holds the constant.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Polynomial<Tq>
where
	Tq: TqType,
{
	terms: BTreeMap<BTreeSet<Qubit<Tq>>, f64>,
}

impl<Tq> Polynomial<Tq>
where
	Tq: TqType,
{
	pub fn new() -> Self {
		Self {
			terms: BTreeMap::new(),
		}
	}

	pub fn constant(c: f64) -> Self {
		let mut p = Self::new();
		p.add_term(BTreeSet::new(), c);
		p
	}

	pub fn from_qubit(q: Qubit<Tq>) -> Self {
		let mut p = Self::new();
		p.add_term(Some(q).into_iter().collect(), 1.0);
		p
	}

	pub fn add_term(&mut self, set: BTreeSet<Qubit<Tq>>, coeff: f64) {
		*self.terms.entry(set).or_insert(0.0) += coeff;
	}

	pub fn terms(&self) -> impl Iterator<Item = (&BTreeSet<Qubit<Tq>>, f64)> {
		self.terms.iter().map(|(k, v)| (k, *v))
	}

	/// Highest degree among non-vanishing terms.
	pub fn get_order(&self) -> usize {
		self.terms
			.iter()
			.filter(|(_, c)| c.abs() > EPSILON)
			.map(|(set, _)| set.len())
			.max()
			.unwrap_or(0)
	}

	pub fn get_qubits(&self) -> BTreeSet<&Qubit<Tq>> {
		self.terms.keys().flat_map(|set| set.iter()).collect()
	}

	pub fn scale(&mut self, factor: f64) {
		for c in self.terms.values_mut() {
			*c *= factor;
		}
	}

	/// Value of the polynomial; unassigned variables count as zero.
	pub fn evaluate<F>(&self, mut value: F) -> f64
	where
		F: FnMut(&Qubit<Tq>) -> bool,
	{
		self.terms
			.iter()
			.filter(|(set, _)| set.iter().all(|q| value(q)))
			.map(|(_, c)| c)
			.sum()
	}

	/// Substitute `value` for `q`.
	pub fn fix_variable(&mut self, q: &Qubit<Tq>, value: bool) {
		let affected = self
			.terms
			.keys()
			.filter(|set| set.contains(q))
			.cloned()
			.collect::<Vec<_>>();
		for set in affected {
			if let Some(c) = self.terms.remove(&set) {
				if value {
					let mut rest = set;
					rest.remove(q);
					self.add_term(rest, c);
				}
			}
		}
	}

	fn drop_vanishing(&mut self) {
		self.terms.retain(|set, c| set.is_empty() || c.abs() > EPSILON);
	}

	/// Rewrite every term of degree above two into quadratic form using
	/// ancillas from `builder`. The minimum over the ancillas reproduces the
	/// original polynomial; a wrong ancilla value costs at least `margin`.
	///
	/// Negative terms `a·x1…xd` become `a·w·(x1 + … + xd − (d − 1))`.
	/// Otherwise the pair shared by most high-order terms is substituted by
	/// `w = x·y`, enforced by `M·(xy − 2xw − 2yw + 3w)`.
	pub fn reduce_order(&mut self, builder: &mut Builder, margin: f64) {
		loop {
			self.drop_vanishing();
			let high = self
				.terms
				.iter()
				.filter(|(set, _)| set.len() > 2)
				.map(|(set, c)| (set.clone(), *c))
				.collect::<Vec<_>>();
			if high.is_empty() {
				break;
			}
			if let Some((set, c)) = high.iter().find(|(_, c)| *c < 0.0) {
				self.terms.remove(set);
				let w = builder.ancilla();
				for x in set.iter() {
					self.add_term(vec![w.clone(), x.clone()].into_iter().collect(), *c);
				}
				self.add_term(
					Some(w).into_iter().collect(),
					-*c * (set.len() as f64 - 1.0),
				);
				continue;
			}
			let mut counts: BTreeMap<(&Qubit<Tq>, &Qubit<Tq>), usize> = BTreeMap::new();
			for (set, _) in high.iter() {
				let xs = set.iter().collect::<Vec<_>>();
				for i in 0..xs.len() {
					for j in i + 1..xs.len() {
						*counts.entry((xs[i], xs[j])).or_insert(0) += 1;
					}
				}
			}
			let mut best: Option<((&Qubit<Tq>, &Qubit<Tq>), usize)> = None;
			for (pair, count) in counts.into_iter() {
				if best.map_or(true, |(_, c)| count > c) {
					best = Some((pair, count));
				}
			}
			let (x, y) = match best {
				Some(((x, y), _)) => (x.clone(), y.clone()),
				None => break,
			};
			let w = builder.ancilla();
			let mut weight = margin;
			for (set, c) in high.iter() {
				if set.contains(&x) && set.contains(&y) {
					self.terms.remove(set);
					weight += c.abs();
					let mut replaced = set.clone();
					replaced.remove(&x);
					replaced.remove(&y);
					replaced.insert(w.clone());
					self.add_term(replaced, *c);
				}
			}
			self.add_term(vec![x.clone(), y.clone()].into_iter().collect(), weight);
			self.add_term(vec![x.clone(), w.clone()].into_iter().collect(), -2.0 * weight);
			self.add_term(vec![y.clone(), w.clone()].into_iter().collect(), -2.0 * weight);
			self.add_term(Some(w).into_iter().collect(), 3.0 * weight);
		}
	}

	/// Binary quadratic model of a polynomial of order at most two.
	pub fn to_bqm(&self) -> Result<BinaryQuadraticModel<Qubit<Tq>>> {
		let order = self.get_order();
		if order > 2 {
			return Err(Error::OrderTooHigh(order));
		}
		let mut bqm = BinaryQuadraticModel::new(Vartype::Binary);
		for (set, c) in self.terms.iter() {
			let xs = set.iter().cloned().collect::<Vec<_>>();
			match xs.as_slice() {
				[] => bqm.add_offset(*c),
				[x] => bqm.add_variable(x.clone(), *c),
				[x, y] => bqm.add_interaction(x.clone(), y.clone(), *c),
				// vanishing higher-order leftovers
				_ => {}
			}
		}
		Ok(bqm)
	}
}

impl<Tq> AddAssign for Polynomial<Tq>
where
	Tq: TqType,
{
	fn add_assign(&mut self, other: Self) {
		for (set, c) in other.terms {
			self.add_term(set, c);
		}
	}
}

impl<Tq> Add for Polynomial<Tq>
where
	Tq: TqType,
{
	type Output = Self;
	fn add(mut self, other: Self) -> Self {
		self += other;
		self
	}
}

impl<Tq> MulAssign for Polynomial<Tq>
where
	Tq: TqType,
{
	fn mul_assign(&mut self, other: Self) {
		let mut out = Polynomial::new();
		for (a, ca) in self.terms.iter() {
			for (b, cb) in other.terms.iter() {
				out.add_term(a.union(b).cloned().collect(), ca * cb);
			}
		}
		out.drop_vanishing();
		*self = out;
	}
}

impl<Tq> Mul for Polynomial<Tq>
where
	Tq: TqType,
{
	type Output = Self;
	fn mul(mut self, other: Self) -> Self {
		self *= other;
		self
	}
}
