//! Shared helpers for CLI commands.

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use console::style;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use qubo_tutorials::composite::EmbeddingComposite;
use qubo_tutorials::config::SamplerConfig;
use qubo_tutorials::sampler::{ExactSolver, SampleParams, Sampler, SimulatedAnnealingSampler};
use qubo_tutorials::solution::{SampleRecord, SampleSet};
use qubo_tutorials::wrapper::Qubit;
use qubo_tutorials::TqType;

/// Which sampler a command runs on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SamplerKind {
	/// Enumerate every assignment
	Exact,
	/// Simulated annealing
	Sa,
	/// Emulated Chimera annealer behind an automatic embedding
	Qpu,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	Text,
	Json,
}

/// Settings of one CLI invocation plus the JSON document being assembled.
pub struct Session {
	pub config: SamplerConfig,
	pub sampler: Option<SamplerKind>,
	pub format: OutputFormat,
	document: Map<String, Value>,
}

impl Session {
	/// Load the config file, if any, and apply the command-line overrides.
	pub fn load(
		config: Option<&Path>,
		seed: Option<u64>,
		num_reads: Option<usize>,
		sampler: Option<SamplerKind>,
		format: OutputFormat,
	) -> Result<Self> {
		let mut config = match config {
			Some(path) => SamplerConfig::from_file(path)
				.with_context(|| format!("Failed to load config: {}", path.display()))?,
			None => SamplerConfig::default(),
		};
		if seed.is_some() {
			config.seed = seed;
		}
		if num_reads.is_some() {
			config.num_reads = num_reads;
		}
		Ok(Self {
			config,
			sampler,
			format,
			document: Map::new(),
		})
	}

	/// The sampler chosen on the command line, or `default`.
	pub fn sampler<Tq: TqType + 'static>(&self, default: SamplerKind) -> Box<dyn Sampler<Tq>> {
		match self.sampler.unwrap_or(default) {
			SamplerKind::Exact => Box::new(ExactSolver::new()),
			SamplerKind::Sa => Box::new(SimulatedAnnealingSampler::new()),
			SamplerKind::Qpu => {
				let composite = EmbeddingComposite::new(self.config.qpu());
				match self.config.embedding_tries {
					Some(tries) => Box::new(composite.with_tries(tries)),
					None => Box::new(composite),
				}
			}
		}
	}

	/// Parameters from the config restricted to what `sampler` accepts, with
	/// `default_reads` when no read count was given.
	pub fn params<Tq, S>(&self, sampler: &S, default_reads: usize) -> SampleParams
	where
		Tq: TqType,
		S: Sampler<Tq> + ?Sized,
	{
		let accepted = sampler.parameters();
		let mut params = self.config.sample_params();
		for name in params.names() {
			if !accepted.contains(&name) {
				warn!("{} ignores `{}`", sampler.name(), name);
			}
		}
		if params.num_reads.is_none() {
			params.num_reads = Some(default_reads);
		}
		params.retain(&accepted);
		params
	}

	pub fn is_text(&self) -> bool {
		self.format == OutputFormat::Text
	}

	pub fn header(&self, title: &str) {
		if self.is_text() {
			println!("\n{}", style(title).cyan().bold());
		}
	}

	pub fn line<D: std::fmt::Display>(&self, text: D) {
		if self.is_text() {
			println!("{}", text);
		}
	}

	/// Print every record and the total number of reads.
	pub fn records<Tq: TqType>(&self, response: &SampleSet<Tq>) {
		if self.is_text() {
			for record in response.iter() {
				println!("  {}", record);
			}
			println!(
				"  {} distinct samples, {} reads",
				response.len(),
				response.total_occurrences()
			);
		}
	}

	/// Add `value` under `key` to the JSON document.
	pub fn record<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
		if !self.is_text() {
			let value = serde_json::to_value(value).context("Failed to serialize output")?;
			self.document.insert(key.to_string(), value);
		}
		Ok(())
	}

	/// Print the JSON document in JSON mode.
	pub fn finish(self) -> Result<()> {
		if !self.is_text() {
			let out = serde_json::to_string_pretty(&Value::Object(self.document))?;
			println!("{}", out);
		}
		Ok(())
	}
}

/// Debug label without the quotes of string labels.
pub fn label<Tq: TqType>(v: &Tq) -> String {
	format!("{:?}", v).trim_matches('"').to_string()
}

/// Sample set with printable labels, ready for JSON output.
pub fn labelled<Tq: TqType>(response: &SampleSet<Tq>) -> Result<SampleSet<String>> {
	response
		.map_labels(label)
		.context("Failed to relabel samples for output")
}

/// Sample set without ancillas in its samples.
pub fn decisions<Tq: TqType>(response: &SampleSet<Qubit<Tq>>) -> SampleSet<String> {
	let records = response
		.iter()
		.map(|r| SampleRecord {
			sample: r.sample.decision_variables().map_labels(label),
			energy: r.energy,
			num_occurrences: r.num_occurrences,
			chain_break_fraction: r.chain_break_fraction,
		})
		.collect();
	let variables = response
		.variables()
		.iter()
		.filter_map(|q| q.label())
		.map(label)
		.collect();
	SampleSet::from_records(records, variables, response.vartype())
}
