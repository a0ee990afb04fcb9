use crate::error::{Error, Result};
use crate::solution::Sample;
use crate::TqType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Value domain of the variables of a model.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Vartype {
	/// Variables take values in {0, 1}.
	Binary,
	/// Variables take values in {-1, +1}.
	Spin,
}

impl Vartype {
	pub fn values(self) -> [i8; 2] {
		match self {
			Vartype::Binary => [0, 1],
			Vartype::Spin => [-1, 1],
		}
	}

	pub fn contains(self, value: i8) -> bool {
		self.values().contains(&value)
	}

	/// Value representing `true` / `false` in this domain.
	pub fn from_bool(self, b: bool) -> i8 {
		match (self, b) {
			(_, true) => 1,
			(Vartype::Binary, false) => 0,
			(Vartype::Spin, false) => -1,
		}
	}

	/// Convert a value of this domain into `target` (s = 2x - 1).
	pub fn convert(self, value: i8, target: Vartype) -> i8 {
		target.from_bool(value > 0)
	}
}

/// A quadratic objective over binary or spin variables:
/// `offset + Σ linear[v]·v + Σ quadratic[(u, v)]·u·v`.
///
/// Interactions are stored once per unordered pair with the smaller label
/// first, and every variable referenced by an interaction has a linear entry.
#[derive(Clone, Debug, PartialEq)]
pub struct BinaryQuadraticModel<Tq>
where
	Tq: TqType,
{
	linear: BTreeMap<Tq, f64>,
	quadratic: BTreeMap<(Tq, Tq), f64>,
	offset: f64,
	vartype: Vartype,
}

#[inline]
fn pair<Tq: TqType>(u: Tq, v: Tq) -> (Tq, Tq) {
	if u <= v {
		(u, v)
	} else {
		(v, u)
	}
}

impl<Tq> BinaryQuadraticModel<Tq>
where
	Tq: TqType,
{
	pub fn new(vartype: Vartype) -> Self {
		Self {
			linear: BTreeMap::new(),
			quadratic: BTreeMap::new(),
			offset: 0.0,
			vartype,
		}
	}

	/// A model with no variables, interactions or offset.
	pub fn empty(vartype: Vartype) -> Self {
		Self::new(vartype)
	}

	/// Build a binary model from QUBO coefficients. Diagonal entries become
	/// linear biases, `(u, v)` and `(v, u)` accumulate into one interaction.
	pub fn from_qubo<I>(q: I, offset: f64) -> Self
	where
		I: IntoIterator<Item = ((Tq, Tq), f64)>,
	{
		let mut bqm = Self::new(Vartype::Binary);
		for ((u, v), bias) in q {
			bqm.add_interaction(u, v, bias);
		}
		bqm.offset = offset;
		bqm
	}

	/// Build a spin model from Ising fields and couplings.
	pub fn from_ising<H, J>(h: H, j: J, offset: f64) -> Self
	where
		H: IntoIterator<Item = (Tq, f64)>,
		J: IntoIterator<Item = ((Tq, Tq), f64)>,
	{
		let mut bqm = Self::new(Vartype::Spin);
		for (v, bias) in h {
			bqm.add_variable(v, bias);
		}
		for ((u, v), bias) in j {
			bqm.add_interaction(u, v, bias);
		}
		bqm.offset = offset;
		bqm
	}

	pub fn vartype(&self) -> Vartype {
		self.vartype
	}

	pub fn offset(&self) -> f64 {
		self.offset
	}

	pub fn linear(&self) -> &BTreeMap<Tq, f64> {
		&self.linear
	}

	pub fn quadratic(&self) -> &BTreeMap<(Tq, Tq), f64> {
		&self.quadratic
	}

	pub fn variables(&self) -> impl Iterator<Item = &Tq> {
		self.linear.keys()
	}

	pub fn num_variables(&self) -> usize {
		self.linear.len()
	}

	pub fn num_interactions(&self) -> usize {
		self.quadratic.len()
	}

	pub fn contains(&self, v: &Tq) -> bool {
		self.linear.contains_key(v)
	}

	pub fn get_linear(&self, v: &Tq) -> Option<f64> {
		self.linear.get(v).copied()
	}

	pub fn get_quadratic(&self, u: &Tq, v: &Tq) -> Option<f64> {
		self.quadratic.get(&pair(u.clone(), v.clone())).copied()
	}

	pub fn add_variable(&mut self, v: Tq, bias: f64) {
		*self.linear.entry(v).or_insert(0.0) += bias;
	}

	/// Add `bias·u·v`. When `u == v` the square collapses: `x² = x` for
	/// binary variables, `s² = 1` for spins.
	pub fn add_interaction(&mut self, u: Tq, v: Tq, bias: f64) {
		if u == v {
			match self.vartype {
				Vartype::Binary => self.add_variable(u, bias),
				Vartype::Spin => {
					self.add_variable(u, 0.0);
					self.offset += bias;
				}
			}
			return;
		}
		self.add_variable(u.clone(), 0.0);
		self.add_variable(v.clone(), 0.0);
		*self.quadratic.entry(pair(u, v)).or_insert(0.0) += bias;
	}

	pub fn add_offset(&mut self, offset: f64) {
		self.offset += offset;
	}

	/// Remove a variable with all its interactions, returning its linear bias.
	pub fn remove_variable(&mut self, v: &Tq) -> Option<f64> {
		let bias = self.linear.remove(v)?;
		self.quadratic.retain(|(a, b), _| a != v && b != v);
		Some(bias)
	}

	/// Clamp `v` to `value`, folding its contributions into the neighbours'
	/// linear biases and the offset.
	pub fn fix_variable(&mut self, v: &Tq, value: i8) -> Result<()> {
		if !self.vartype.contains(value) {
			return Err(Error::InvalidParameter {
				parameter: "value",
				reason: format!("{} is not a {:?} value", value, self.vartype),
			});
		}
		let bias = self
			.linear
			.remove(v)
			.ok_or_else(|| Error::MissingVariable(format!("{:?}", v)))?;
		self.offset += bias * value as f64;
		let touching = self
			.quadratic
			.keys()
			.filter(|(a, b)| a == v || b == v)
			.cloned()
			.collect::<Vec<_>>();
		for key in touching {
			if let Some(weight) = self.quadratic.remove(&key) {
				let other = if &key.0 == v { key.1 } else { key.0 };
				self.add_variable(other, weight * value as f64);
			}
		}
		Ok(())
	}

	pub fn degree(&self, v: &Tq) -> usize {
		self.quadratic
			.keys()
			.filter(|(a, b)| a == v || b == v)
			.count()
	}

	/// Neighbourhood map `v -> {u: bias}`, both directions present.
	pub fn adjacency(&self) -> BTreeMap<&Tq, BTreeMap<&Tq, f64>> {
		let mut adj: BTreeMap<&Tq, BTreeMap<&Tq, f64>> =
			self.linear.keys().map(|v| (v, BTreeMap::new())).collect();
		for ((u, v), bias) in self.quadratic.iter() {
			adj.entry(u).or_default().insert(v, *bias);
			adj.entry(v).or_default().insert(u, *bias);
		}
		adj
	}

	/// Interactions as a set of label pairs.
	pub fn edges(&self) -> BTreeSet<(Tq, Tq)> {
		self.quadratic.keys().cloned().collect()
	}

	/// Largest absolute linear or quadratic bias.
	pub fn max_abs_bias(&self) -> f64 {
		self.linear
			.values()
			.chain(self.quadratic.values())
			.fold(0.0, |m: f64, b| m.max(b.abs()))
	}

	pub fn scale(&mut self, factor: f64) {
		for bias in self.linear.values_mut().chain(self.quadratic.values_mut()) {
			*bias *= factor;
		}
		self.offset *= factor;
	}

	pub fn energy(&self, sample: &Sample<Tq>) -> Result<f64> {
		let value = |v: &Tq| {
			sample
				.get(v)
				.map(|x| x as f64)
				.ok_or_else(|| Error::MissingVariable(format!("{:?}", v)))
		};
		let mut energy = self.offset;
		for (v, bias) in self.linear.iter() {
			energy += bias * value(v)?;
		}
		for ((u, v), bias) in self.quadratic.iter() {
			energy += bias * value(u)? * value(v)?;
		}
		Ok(energy)
	}

	/// Same objective over the other value domain.
	pub fn change_vartype(&self, target: Vartype) -> Self {
		if target == self.vartype {
			return self.clone();
		}
		let mut out = Self::new(target);
		out.offset = self.offset;
		match target {
			// x = (s + 1) / 2
			Vartype::Spin => {
				for (v, bias) in self.linear.iter() {
					out.add_variable(v.clone(), bias / 2.0);
					out.offset += bias / 2.0;
				}
				for ((u, v), bias) in self.quadratic.iter() {
					out.add_interaction(u.clone(), v.clone(), bias / 4.0);
					out.add_variable(u.clone(), bias / 4.0);
					out.add_variable(v.clone(), bias / 4.0);
					out.offset += bias / 4.0;
				}
			}
			// s = 2x - 1
			Vartype::Binary => {
				for (v, bias) in self.linear.iter() {
					out.add_variable(v.clone(), 2.0 * bias);
					out.offset -= bias;
				}
				for ((u, v), bias) in self.quadratic.iter() {
					out.add_interaction(u.clone(), v.clone(), 4.0 * bias);
					out.add_variable(u.clone(), -2.0 * bias);
					out.add_variable(v.clone(), -2.0 * bias);
					out.offset += bias;
				}
			}
		}
		out
	}

	/// QUBO form: linear biases on the diagonal.
	pub fn to_qubo(&self) -> (BTreeMap<(Tq, Tq), f64>, f64) {
		let bqm = self.change_vartype(Vartype::Binary);
		let mut q: BTreeMap<(Tq, Tq), f64> = bqm
			.linear
			.iter()
			.map(|(v, b)| ((v.clone(), v.clone()), *b))
			.collect();
		q.extend(bqm.quadratic.iter().map(|(k, b)| (k.clone(), *b)));
		(q, bqm.offset)
	}

	pub fn to_ising(&self) -> (BTreeMap<Tq, f64>, BTreeMap<(Tq, Tq), f64>, f64) {
		let bqm = self.change_vartype(Vartype::Spin);
		(bqm.linear, bqm.quadratic, bqm.offset)
	}

	/// Add the biases of `other`, converted into this model's vartype.
	pub fn update(&mut self, other: &Self) {
		let other = other.change_vartype(self.vartype);
		for (v, bias) in other.linear {
			self.add_variable(v, bias);
		}
		for ((u, v), bias) in other.quadratic {
			self.add_interaction(u, v, bias);
		}
		self.offset += other.offset;
	}

	/// Relabel variables. Labels mapped onto each other are merged.
	pub fn map_labels<Tn, F>(&self, mut f: F) -> BinaryQuadraticModel<Tn>
	where
		Tn: TqType,
		F: FnMut(&Tq) -> Tn,
	{
		let mut out = BinaryQuadraticModel::new(self.vartype);
		out.offset = self.offset;
		for (v, bias) in self.linear.iter() {
			out.add_variable(f(v), *bias);
		}
		for ((u, v), bias) in self.quadratic.iter() {
			out.add_interaction(f(u), f(v), *bias);
		}
		out
	}
}
