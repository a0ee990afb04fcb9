//! Error types shared by models, samplers and embeddings.

use thiserror::Error;

/// Errors raised while building models or sampling them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
	/// The model does not fit the sampler (unknown qubit, missing coupler, ...).
	#[error("Invalid problem: {0}")]
	InvalidProblem(String),

	/// A sample or embedding does not assign the named variable.
	#[error("Missing variable: {0}")]
	MissingVariable(String),

	/// Exhaustive enumeration refused.
	#[error("Too many variables for {sampler}: {count} (at most {max})")]
	TooManyVariables {
		sampler: &'static str,
		count: usize,
		max: usize,
	},

	/// A parameter was set that the sampler does not accept.
	#[error("{sampler} does not accept the parameter `{parameter}`")]
	UnsupportedParameter {
		sampler: String,
		parameter: &'static str,
	},

	/// A parameter value is out of range.
	#[error("Invalid parameter `{parameter}`: {reason}")]
	InvalidParameter {
		parameter: &'static str,
		reason: String,
	},

	/// No minor-embedding was found within the allowed tries.
	#[error("No embedding found after {tries} tries")]
	EmbeddingNotFound { tries: usize },

	/// A given embedding is not valid for the target graph.
	#[error("Invalid embedding: {0}")]
	InvalidEmbedding(String),

	/// A polynomial of order above two was turned into a quadratic model.
	#[error("Polynomial has order {0}, expected at most 2")]
	OrderTooHigh(usize),

	/// User supplied input out of range.
	#[error("Invalid input: {0}")]
	InvalidInput(String),

	/// Configuration could not be interpreted.
	#[error("Configuration error: {0}")]
	Config(String),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("YAML error: {0}")]
	Yaml(#[from] serde_yaml_ng::Error),
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
