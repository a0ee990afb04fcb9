//! Sampler settings loaded from YAML or JSON.

use crate::embedding::ChainBreakMethod;
use crate::error::{Error, Result};
use crate::qpu::QpuSampler;
use crate::sampler::SampleParams;
use crate::topology::Topology;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChimeraConfig {
	pub m: usize,
	pub n: usize,
	pub t: usize,
}

impl Default for ChimeraConfig {
	fn default() -> Self {
		Self { m: 16, n: 16, t: 4 }
	}
}

/// Emulated annealer settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QpuConfig {
	pub chip_id: String,
	pub chimera: ChimeraConfig,
	pub num_sweeps: usize,
}

impl Default for QpuConfig {
	fn default() -> Self {
		Self {
			chip_id: "emulated_C16".to_string(),
			chimera: ChimeraConfig::default(),
			num_sweeps: 20,
		}
	}
}

/// Defaults applied to every sampling call. Unset values fall back to the
/// sampler's own defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
	pub num_reads: Option<usize>,
	pub num_sweeps: Option<usize>,
	pub beta_range: Option<(f64, f64)>,
	pub seed: Option<u64>,
	pub chain_strength: Option<f64>,
	pub chain_break_method: Option<ChainBreakMethod>,
	pub embedding_tries: Option<usize>,
	pub qpu: QpuConfig,
}

impl SamplerConfig {
	/// Load from a `.yaml`, `.yml` or `.json` file.
	pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		let source = std::fs::read_to_string(path)?;
		let config: Self = match path.extension().and_then(|e| e.to_str()) {
			Some("yaml") | Some("yml") => serde_yaml_ng::from_str(&source)?,
			Some("json") => serde_json::from_str(&source)?,
			_ => {
				return Err(Error::Config(format!(
					"{}: expected a .yaml, .yml or .json file",
					path.display()
				)))
			}
		};
		config.validate()?;
		debug!(path = %path.display(), "loaded sampler config");
		Ok(config)
	}

	fn validate(&self) -> Result<()> {
		let ChimeraConfig { m, n, t } = self.qpu.chimera;
		if m == 0 || n == 0 || t == 0 {
			return Err(Error::Config(format!(
				"chimera shape ({}, {}, {}) has no qubits",
				m, n, t
			)));
		}
		if self.num_reads == Some(0) {
			return Err(Error::Config("num_reads must be positive".to_string()));
		}
		Ok(())
	}

	/// Parameter bag with the sampling fields of this config.
	pub fn sample_params(&self) -> SampleParams {
		SampleParams {
			num_reads: self.num_reads,
			num_sweeps: self.num_sweeps,
			beta_range: self.beta_range,
			seed: self.seed,
			chain_strength: self.chain_strength,
			chain_break_method: self.chain_break_method,
		}
	}

	/// Emulated annealer described by the `qpu` section.
	pub fn qpu(&self) -> QpuSampler {
		let ChimeraConfig { m, n, t } = self.qpu.chimera;
		QpuSampler::new(&self.qpu.chip_id, Topology::chimera(m, n, t))
			.with_default_num_sweeps(self.qpu.num_sweeps)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sampler::Structured;
	use std::io::Write;

	#[test]
	fn yaml_overrides_defaults() {
		let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
		writeln!(
			file,
			"num_reads: 100\nseed: 9\nchain_break_method: discard\nqpu:\n  chimera:\n    m: 2\n    n: 2"
		)
		.unwrap();
		let config = SamplerConfig::from_file(file.path()).unwrap();
		assert_eq!(config.num_reads, Some(100));
		assert_eq!(config.qpu.chimera, ChimeraConfig { m: 2, n: 2, t: 4 });
		assert_eq!(config.qpu.num_sweeps, 20);
		let params = config.sample_params();
		assert_eq!(params.seed, Some(9));
		assert_eq!(params.chain_break_method, Some(ChainBreakMethod::Discard));
		assert_eq!(config.qpu().nodelist().len(), 32);
	}

	#[test]
	fn json_is_accepted() {
		let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
		write!(file, r#"{{"chain_strength": 0.25, "beta_range": [0.1, 3.0]}}"#).unwrap();
		let config = SamplerConfig::from_file(file.path()).unwrap();
		assert_eq!(config.chain_strength, Some(0.25));
		assert_eq!(config.beta_range, Some((0.1, 3.0)));
		assert_eq!(config.qpu, QpuConfig::default());
	}

	#[test]
	fn bad_files_are_config_errors() {
		let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
		writeln!(file, "num_reads = 1").unwrap();
		assert!(matches!(SamplerConfig::from_file(file.path()), Err(Error::Config(_))));
		let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
		writeln!(file, "qpu:\n  chimera:\n    t: 0").unwrap();
		assert!(matches!(SamplerConfig::from_file(file.path()), Err(Error::Config(_))));
	}
}
