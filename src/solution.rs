use crate::error::{Error, Result};
use crate::model::{BinaryQuadraticModel, Vartype};
use crate::wrapper::Qubit;
use crate::TqType;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::iter::FromIterator;

/// Energies closer than this are treated as equal when selecting ground states.
pub const ENERGY_TOLERANCE: f64 = 1.0e-9;

/// One assignment of values to variables.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Sample<Tq: TqType>(BTreeMap<Tq, i8>);

impl<Tq: TqType> Sample<Tq> {
	pub fn new() -> Self {
		Self(BTreeMap::new())
	}

	pub fn insert(&mut self, v: Tq, value: i8) -> Option<i8> {
		self.0.insert(v, value)
	}

	pub fn get(&self, v: &Tq) -> Option<i8> {
		self.0.get(v).copied()
	}

	/// Whether `v` holds the "true" value (1) of either domain.
	pub fn get_bool(&self, v: &Tq) -> Option<bool> {
		self.get(v).map(|x| x > 0)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&Tq, i8)> {
		self.0.iter().map(|(k, v)| (k, *v))
	}

	pub fn keys(&self) -> impl Iterator<Item = &Tq> {
		self.0.keys()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn map_labels<Tn, F>(&self, mut f: F) -> Sample<Tn>
	where
		Tn: TqType,
		F: FnMut(&Tq) -> Tn,
	{
		self.0.iter().map(|(k, v)| (f(k), *v)).collect()
	}

	pub fn change_vartype(&self, from: Vartype, to: Vartype) -> Self {
		self.0
			.iter()
			.map(|(k, v)| (k.clone(), from.convert(*v, to)))
			.collect()
	}
}

impl<Tq: TqType> Sample<Qubit<Tq>> {
	/// Drop ancillas and unwrap the caller's labels.
	pub fn decision_variables(&self) -> Sample<Tq> {
		self.0
			.iter()
			.filter_map(|(q, v)| q.label().map(|l| (l.clone(), *v)))
			.collect()
	}
}

impl<Tq: TqType> Default for Sample<Tq> {
	fn default() -> Self {
		Self::new()
	}
}

impl<Tq: TqType> FromIterator<(Tq, i8)> for Sample<Tq> {
	fn from_iter<I: IntoIterator<Item = (Tq, i8)>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

impl<Tq: TqType> std::ops::Index<&Tq> for Sample<Tq> {
	type Output = i8;

	fn index(&self, key: &Tq) -> &Self::Output {
		&self.0[key]
	}
}

impl<Tq: TqType> fmt::Debug for Sample<Tq> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(self.0.iter()).finish()
	}
}

impl<Tq: TqType> fmt::Display for Sample<Tq> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(self, f)
	}
}

/// A distinct sample with its energy and how often it was read.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SampleRecord<Tq: TqType> {
	pub sample: Sample<Tq>,
	pub energy: f64,
	pub num_occurrences: usize,
	/// Fraction of broken chains, set by embedding composites.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub chain_break_fraction: Option<f64>,
}

impl<Tq: TqType> SampleRecord<Tq> {
	pub fn new(sample: Sample<Tq>, energy: f64) -> Self {
		Self {
			sample,
			energy,
			num_occurrences: 1,
			chain_break_fraction: None,
		}
	}
}

impl<Tq: TqType> fmt::Display for SampleRecord<Tq> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{} Energy: {} Occurrences: {}",
			self.sample, self.energy, self.num_occurrences
		)?;
		if let Some(cbf) = self.chain_break_fraction {
			write!(f, " Chain breaks: {}", cbf)?;
		}
		Ok(())
	}
}

/// Records returned by a sampler, sorted by non-decreasing energy.
#[derive(Clone, Debug, Serialize)]
pub struct SampleSet<Tq: TqType> {
	records: Vec<SampleRecord<Tq>>,
	variables: Vec<Tq>,
	vartype: Vartype,
	#[serde(skip_serializing_if = "BTreeMap::is_empty")]
	info: BTreeMap<String, serde_json::Value>,
}

impl<Tq: TqType> SampleSet<Tq> {
	/// Compute energies of `samples` under `bqm`, merge duplicates and sort.
	pub fn from_samples<I>(bqm: &BinaryQuadraticModel<Tq>, samples: I) -> Result<Self>
	where
		I: IntoIterator<Item = Sample<Tq>>,
	{
		let mut records = Vec::new();
		for sample in samples {
			let energy = bqm.energy(&sample)?;
			records.push(SampleRecord::new(sample, energy));
		}
		Ok(Self::from_records(
			records,
			bqm.variables().cloned().collect(),
			bqm.vartype(),
		))
	}

	/// Merge records with identical samples and sort them by energy. Ties
	/// keep the order of first appearance.
	pub fn from_records(
		records: Vec<SampleRecord<Tq>>,
		variables: Vec<Tq>,
		vartype: Vartype,
	) -> Self {
		let mut merged: Vec<SampleRecord<Tq>> = Vec::with_capacity(records.len());
		let mut seen: HashMap<Sample<Tq>, usize> = HashMap::new();
		for record in records {
			if let Some(&at) = seen.get(&record.sample) {
				let existing = &mut merged[at];
				existing.chain_break_fraction =
					match (existing.chain_break_fraction, record.chain_break_fraction) {
						(Some(a), Some(b)) => {
							let (na, nb) = (
								existing.num_occurrences as f64,
								record.num_occurrences as f64,
							);
							Some((a * na + b * nb) / (na + nb))
						}
						(a, b) => a.or(b),
					};
				existing.num_occurrences += record.num_occurrences;
			} else {
				seen.insert(record.sample.clone(), merged.len());
				merged.push(record);
			}
		}
		merged.sort_by(|a, b| a.energy.total_cmp(&b.energy));
		Self {
			records: merged,
			variables,
			vartype,
			info: BTreeMap::new(),
		}
	}

	/// Sort records already known to hold distinct samples. Ties keep their
	/// order.
	pub fn from_distinct_records(
		mut records: Vec<SampleRecord<Tq>>,
		variables: Vec<Tq>,
		vartype: Vartype,
	) -> Self {
		records.sort_by(|a, b| a.energy.total_cmp(&b.energy));
		Self {
			records,
			variables,
			vartype,
			info: BTreeMap::new(),
		}
	}

	pub fn records(&self) -> &[SampleRecord<Tq>] {
		&self.records
	}

	pub fn iter(&self) -> impl Iterator<Item = &SampleRecord<Tq>> {
		self.records.iter()
	}

	pub fn samples(&self) -> impl Iterator<Item = &Sample<Tq>> {
		self.records.iter().map(|r| &r.sample)
	}

	/// The lowest-energy record.
	pub fn first(&self) -> Option<&SampleRecord<Tq>> {
		self.records.first()
	}

	/// Every record sharing the minimum energy.
	pub fn lowest(&self) -> Vec<&SampleRecord<Tq>> {
		match self.first() {
			Some(first) => {
				let min = first.energy;
				self.records
					.iter()
					.take_while(|r| r.energy - min <= ENERGY_TOLERANCE)
					.collect()
			}
			None => Vec::new(),
		}
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	pub fn total_occurrences(&self) -> usize {
		self.records.iter().map(|r| r.num_occurrences).sum()
	}

	pub fn vartype(&self) -> Vartype {
		self.vartype
	}

	pub fn variables(&self) -> &[Tq] {
		&self.variables
	}

	pub fn info(&self) -> &BTreeMap<String, serde_json::Value> {
		&self.info
	}

	pub fn insert_info<V: Into<serde_json::Value>>(&mut self, key: &str, value: V) {
		self.info.insert(key.to_string(), value.into());
	}

	pub fn truncate(&mut self, n: usize) {
		self.records.truncate(n);
	}

	/// Merge records holding the same sample.
	pub fn aggregate(&self) -> Self {
		let mut out = Self::from_records(self.records.clone(), self.variables.clone(), self.vartype);
		out.info = self.info.clone();
		out
	}

	/// Same records expressed in another value domain; energies are unchanged.
	pub fn change_vartype(&self, target: Vartype) -> Self {
		let mut out = self.clone();
		for record in out.records.iter_mut() {
			record.sample = record.sample.change_vartype(self.vartype, target);
		}
		out.vartype = target;
		out
	}

	/// Relabel every sample. Fails when two variables receive the same
	/// label.
	pub fn map_labels<Tn, F>(&self, mut f: F) -> Result<SampleSet<Tn>>
	where
		Tn: TqType,
		F: FnMut(&Tq) -> Tn,
	{
		let variables = self.variables.iter().map(&mut f).collect::<Vec<_>>();
		let distinct = variables.iter().collect::<BTreeSet<_>>();
		if distinct.len() != variables.len() {
			return Err(Error::InvalidInput(format!(
				"relabelling maps {} variables onto {} labels",
				variables.len(),
				distinct.len()
			)));
		}
		let records = self
			.records
			.iter()
			.map(|r| SampleRecord {
				sample: r.sample.map_labels(&mut f),
				energy: r.energy,
				num_occurrences: r.num_occurrences,
				chain_break_fraction: r.chain_break_fraction,
			})
			.collect();
		let mut out = SampleSet::from_distinct_records(records, variables, self.vartype);
		out.info = self.info.clone();
		Ok(out)
	}
}

impl<'a, Tq: TqType> IntoIterator for &'a SampleSet<Tq> {
	type Item = &'a SampleRecord<Tq>;
	type IntoIter = std::slice::Iter<'a, SampleRecord<Tq>>;

	fn into_iter(self) -> Self::IntoIter {
		self.records.iter()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn s(x: i8, z: i8) -> Sample<&'static str> {
		vec![("x", x), ("z", z)].into_iter().collect()
	}

	#[test]
	fn records_are_merged_and_sorted() {
		let bqm = BinaryQuadraticModel::from_qubo(
			vec![(("x", "x"), -1.0), (("x", "z"), 2.0), (("z", "z"), -1.0)],
			0.0,
		);
		let set = SampleSet::from_samples(&bqm, vec![s(1, 1), s(0, 1), s(1, 0), s(0, 1)]).unwrap();
		assert_eq!(set.len(), 3);
		assert_eq!(set.total_occurrences(), 4);
		assert_eq!(set.first().unwrap().energy, -1.0);
		assert_eq!(set.first().unwrap().sample, s(0, 1));
		assert_eq!(set.first().unwrap().num_occurrences, 2);
		assert_eq!(set.lowest().len(), 2);
		assert!(set.records().windows(2).all(|w| w[0].energy <= w[1].energy));
	}

	#[test]
	fn chain_break_fraction_is_weighted() {
		let mut a = SampleRecord::new(s(0, 1), 0.0);
		a.chain_break_fraction = Some(0.0);
		a.num_occurrences = 3;
		let mut b = SampleRecord::new(s(0, 1), 0.0);
		b.chain_break_fraction = Some(1.0);
		let set = SampleSet::from_records(vec![a, b], vec!["x", "z"], Vartype::Binary);
		assert_eq!(set.first().unwrap().chain_break_fraction, Some(0.25));
	}

	#[test]
	fn aggregate_keeps_info() {
		let records = vec![
			SampleRecord::new(s(1, 0), -1.0),
			SampleRecord::new(s(1, 0), -1.0),
			SampleRecord::new(s(0, 0), 0.0),
		];
		let mut set = SampleSet::from_distinct_records(records, vec!["x", "z"], Vartype::Binary);
		set.insert_info("timing", 1);
		let merged = set.aggregate();
		assert_eq!(merged.len(), 2);
		assert_eq!(merged.total_occurrences(), 3);
		assert_eq!(merged.first().unwrap().num_occurrences, 2);
		assert_eq!(merged.info()["timing"], serde_json::json!(1));
	}

	#[test]
	fn relabelling_must_be_injective() {
		let records = vec![SampleRecord::new(s(1, 0), -1.0), SampleRecord::new(s(0, 0), 0.0)];
		let mut set = SampleSet::from_records(records, vec!["x", "z"], Vartype::Binary);
		set.insert_info("timing", 1);
		let upper = set.map_labels(|v| v.to_uppercase()).unwrap();
		assert_eq!(upper.variables(), &["X".to_string(), "Z".to_string()]);
		assert_eq!(upper.len(), 2);
		assert_eq!(upper.first().unwrap().sample[&"X".to_string()], 1);
		assert_eq!(upper.info()["timing"], serde_json::json!(1));
		assert!(matches!(set.map_labels(|_| "y"), Err(Error::InvalidInput(_))));
	}

	#[test]
	fn display_matches_dict_style() {
		let record = SampleRecord::new(s(0, 1), -1.0);
		assert_eq!(
			record.to_string(),
			"{\"x\": 0, \"z\": 1} Energy: -1 Occurrences: 1"
		);
	}

	#[test]
	fn ancillas_are_dropped() {
		let sample: Sample<Qubit<&str>> = vec![(Qubit::new("a"), 1), (Qubit::Ancilla(0), 0)]
			.into_iter()
			.collect();
		let decision = sample.decision_variables();
		assert_eq!(decision.len(), 1);
		assert_eq!(decision[&"a"], 1);
	}
}
