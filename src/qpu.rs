//! Local emulation of a structured quantum annealer.
//!
//! The emulator keeps the contract of a hardware solver: problems must live on
//! its qubits and couplers, biases are auto-scaled into the programmable
//! ranges and every read is a short anneal, so results carry the noise of a
//! fast schedule rather than the reliability of a long classical one.

use crate::error::{Error, Result};
use crate::model::{BinaryQuadraticModel, Vartype};
use crate::sampler::{anneal_reads, SampleParams, Sampler, Structured};
use crate::solution::SampleSet;
use crate::topology::Topology;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, instrument};

/// Inverse temperatures of the emulated anneal, in units of the scaled
/// problem.
const HARDWARE_BETA_RANGE: (f64, f64) = (0.1, 5.0);

/// Static description of the emulated solver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QpuProperties {
	pub chip_id: String,
	pub topology: String,
	pub num_qubits: usize,
	pub num_couplers: usize,
	pub h_range: (f64, f64),
	pub j_range: (f64, f64),
	pub extended_j_range: (f64, f64),
	pub num_reads_range: (usize, usize),
	pub default_num_sweeps: usize,
}

/// Emulated annealer over a fixed hardware graph.
#[derive(Clone, Debug)]
pub struct QpuSampler {
	topology: Topology,
	properties: QpuProperties,
}

impl QpuSampler {
	pub fn new(chip_id: &str, topology: Topology) -> Self {
		let properties = QpuProperties {
			chip_id: chip_id.to_string(),
			topology: topology.name().to_string(),
			num_qubits: topology.num_nodes(),
			num_couplers: topology.num_edges(),
			h_range: (-2.0, 2.0),
			j_range: (-1.0, 1.0),
			extended_j_range: (-2.0, 1.0),
			num_reads_range: (1, 10000),
			default_num_sweeps: 20,
		};
		Self {
			topology,
			properties,
		}
	}

	/// Emulated C16 Chimera chip.
	pub fn chimera_c16() -> Self {
		Self::new("emulated_C16", Topology::chimera(16, 16, 4))
	}

	pub fn properties(&self) -> &QpuProperties {
		&self.properties
	}

	pub fn with_default_num_sweeps(mut self, num_sweeps: usize) -> Self {
		self.properties.default_num_sweeps = num_sweeps;
		self
	}

	fn check_structure(&self, bqm: &BinaryQuadraticModel<usize>) -> Result<()> {
		if let Some(q) = bqm.variables().find(|q| !self.topology.contains(**q)) {
			return Err(Error::InvalidProblem(format!(
				"{} is not a qubit of {}",
				q, self.properties.chip_id
			)));
		}
		if let Some((a, b)) = bqm
			.quadratic()
			.keys()
			.find(|(a, b)| !self.topology.is_connected(*a, *b))
		{
			return Err(Error::InvalidProblem(format!(
				"({}, {}) is not a coupler of {}",
				a, b, self.properties.chip_id
			)));
		}
		Ok(())
	}

	/// Factor dividing the Ising biases so they fit `h_range`, and use as
	/// much of it as possible. Positive couplers are bounded by `j_range`,
	/// negative ones by the lower end of `extended_j_range`.
	fn scale_factor(&self, bqm: &BinaryQuadraticModel<usize>) -> f64 {
		let spin = bqm.change_vartype(Vartype::Spin);
		let ratio = |b: f64, (lo, hi): (f64, f64)| if b >= 0.0 { b / hi } else { b / lo };
		let j_bounds = (
			self.properties.extended_j_range.0,
			self.properties.j_range.1,
		);
		let h = spin
			.linear()
			.values()
			.map(|b| ratio(*b, self.properties.h_range));
		let j = spin.quadratic().values().map(|b| ratio(*b, j_bounds));
		h.chain(j).fold(0.0, f64::max)
	}
}

impl Default for QpuSampler {
	fn default() -> Self {
		Self::chimera_c16()
	}
}

impl Structured for QpuSampler {
	fn topology(&self) -> &Topology {
		&self.topology
	}
}

impl Sampler<usize> for QpuSampler {
	fn name(&self) -> &str {
		&self.properties.chip_id
	}

	fn parameters(&self) -> Vec<&'static str> {
		vec!["num_reads", "num_sweeps", "seed"]
	}

	#[instrument(skip_all, fields(num_qubits = bqm.num_variables(), num_couplers = bqm.num_interactions()))]
	fn sample(&self, bqm: &BinaryQuadraticModel<usize>, params: &SampleParams) -> Result<SampleSet<usize>> {
		params.check_supported(self.name(), &self.parameters())?;
		let num_reads = params.num_reads.unwrap_or(1);
		let (lo, hi) = self.properties.num_reads_range;
		if num_reads < lo || num_reads > hi {
			return Err(Error::InvalidParameter {
				parameter: "num_reads",
				reason: format!("{} is outside [{}, {}]", num_reads, lo, hi),
			});
		}
		self.check_structure(bqm)?;
		let num_sweeps = params
			.num_sweeps
			.unwrap_or(self.properties.default_num_sweeps);
		let scale = self.scale_factor(bqm);
		let mut scaled = bqm.clone();
		if scale > 0.0 {
			scaled.scale(1.0 / scale);
		}
		debug!(scale, num_reads, num_sweeps, "programming emulated chip");
		let start = Instant::now();
		let reads = anneal_reads(
			&scaled,
			num_reads,
			num_sweeps,
			Some(HARDWARE_BETA_RANGE),
			params.seed,
		)?;
		let mut response = SampleSet::from_samples(bqm, reads.into_iter().map(|r| r.sample))?;
		response.insert_info("chip_id", self.properties.chip_id.clone());
		response.insert_info("num_reads", num_reads);
		response.insert_info("scale", scale);
		response.insert_info("sampling_time_us", start.elapsed().as_micros() as u64);
		Ok(response)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn properties_of_c16() {
		let qpu = QpuSampler::default();
		assert_eq!(qpu.nodelist().len(), 2048);
		assert_eq!(qpu.edgelist().len(), 6016);
		assert_eq!(qpu.properties().extended_j_range, (-2.0, 1.0));
		let first = qpu.nodelist()[0];
		let adjacent = qpu.adjacency()[&first].iter().copied().collect::<Vec<_>>();
		assert_eq!(adjacent, vec![4, 5, 6, 7, 128]);
	}

	#[test]
	fn rejects_problems_off_the_graph() {
		let qpu = QpuSampler::default();
		let mut bqm = BinaryQuadraticModel::new(Vartype::Spin);
		bqm.add_interaction(0usize, 1usize, -1.0);
		assert!(matches!(
			qpu.sample(&bqm, &SampleParams::default()),
			Err(Error::InvalidProblem(_))
		));
		let mut far = BinaryQuadraticModel::new(Vartype::Spin);
		far.add_variable(5000usize, 1.0);
		assert!(qpu.sample(&far, &SampleParams::default()).is_err());
	}

	#[test]
	fn rejects_read_counts_out_of_range() {
		let qpu = QpuSampler::default();
		let mut bqm = BinaryQuadraticModel::new(Vartype::Spin);
		bqm.add_variable(0usize, 1.0);
		let params = SampleParams::new().with_num_reads(10001);
		assert!(qpu.sample(&bqm, &params).is_err());
		let params = SampleParams::new().with_chain_strength(2.0);
		assert!(matches!(
			qpu.sample(&bqm, &params),
			Err(Error::UnsupportedParameter { .. })
		));
	}

	#[test]
	fn coupler_signs_scale_against_their_own_bound() {
		let qpu = QpuSampler::default();
		let mut ferro = BinaryQuadraticModel::new(Vartype::Spin);
		ferro.add_interaction(0usize, 4usize, -3.0);
		assert_eq!(qpu.scale_factor(&ferro), 1.5);
		let mut anti = BinaryQuadraticModel::new(Vartype::Spin);
		anti.add_interaction(0usize, 4usize, 3.0);
		assert_eq!(qpu.scale_factor(&anti), 3.0);
		anti.add_variable(0usize, 1.0);
		assert_eq!(qpu.scale_factor(&anti), 3.0);
	}

	#[test]
	fn energies_use_unscaled_biases() {
		let qpu = QpuSampler::default();
		let mut bqm = BinaryQuadraticModel::new(Vartype::Spin);
		bqm.add_variable(0usize, 8.0);
		bqm.add_variable(4usize, 0.0);
		bqm.add_interaction(0usize, 4usize, -6.0);
		assert_eq!(qpu.scale_factor(&bqm), 4.0);
		let params = SampleParams::new().with_num_reads(200).with_seed(5);
		let response = qpu.sample(&bqm, &params).unwrap();
		assert_eq!(response.total_occurrences(), 200);
		let best = response.first().unwrap();
		assert_eq!(best.sample[&0], -1);
		assert_eq!(best.sample[&4], -1);
		assert!((best.energy - (-14.0)).abs() < 1e-9);
	}
}
