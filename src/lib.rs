//! Small combinatorial problems written as binary quadratic models and
//! sampled exactly, by simulated annealing or through minor-embedding on an
//! emulated Chimera annealer.
//!
//! # Examples
//!
//! ## Sampling a QUBO
//! ```
//! # use qubo_tutorials::sampler::{ExactSolver, SampleParams, Sampler};
//! // NOT gate: the two lowest states have x != z
//! let q = vec![(("x", "x"), -1.0), (("x", "z"), 2.0), (("z", "x"), 0.0), (("z", "z"), -1.0)];
//! let response = ExactSolver::new().sample_qubo(q, &SampleParams::default()).unwrap();
//! for record in response.lowest() {
//! 	println!("{} energy {}", record.sample, record.energy);
//! 	# assert_ne!(record.sample[&"x"], record.sample[&"z"]);
//! }
//! # assert_eq!(response.lowest().len(), 2);
//! ```
//!
//! ## Expressions with constraints
//! ```
//! # use qubo_tutorials::Expr;
//! # use qubo_tutorials::sampler::{ExactSolver, SampleParams, Sampler};
//! let hmlt = Expr::Constraint {
//! 		label: "one_hot",
//! 		expr: Box::new((Expr::Binary(0) + Expr::Binary(1) - 1) ^ 2),
//! 	} + Expr::Binary(0) * 20;
//! let compiled = hmlt.compile().unwrap();
//! let response = ExactSolver::new().sample(compiled.bqm(), &SampleParams::default()).unwrap();
//! let best = response.first().unwrap();
//! let sample = best.sample.decision_variables();
//! // displays 0, {0: 0, 1: 1}, []
//! println!("{}, {}, {:?}", best.energy, sample, compiled.unsatisfied_constraints(&sample));
//! # assert_eq!(best.energy, 0.0);
//! # assert_eq!(sample[&1], 1);
//! # assert!(compiled.unsatisfied_constraints(&sample).is_empty());
//! ```
//!
//! ## Embedding on the annealer
//! ```
//! # use qubo_tutorials::composite::EmbeddingComposite;
//! # use qubo_tutorials::qpu::QpuSampler;
//! # use qubo_tutorials::sampler::{SampleParams, Sampler};
//! let sampler = EmbeddingComposite::new(QpuSampler::default());
//! let q = vec![(("x1", "x2"), 1.0), (("x1", "z"), -2.0), (("x2", "z"), -2.0), (("z", "z"), 3.0)];
//! let params = SampleParams::new().with_num_reads(100).with_seed(1);
//! let response = sampler.sample_qubo(q, &params).unwrap();
//! # assert_eq!(response.total_occurrences(), 100);
//! ```
use std::cmp::Ord;
use std::fmt::Debug;
use std::hash::Hash;

extern crate rand;
extern crate rayon;

pub trait LabelType: PartialEq + Eq + Clone + std::fmt::Debug {}
/// Variable labels. Sampling runs in parallel, so labels are shared across
/// threads.
pub trait TqType: LabelType + Hash + Ord + Send + Sync {}
/// Constraint labels of [`Expr::Constraint`].
pub trait TcType: LabelType + Hash + Ord {}

impl<T> LabelType for T where T: PartialEq + Eq + Clone + Debug {}
impl<T> TqType for T where T: LabelType + Hash + Ord + Send + Sync {}
impl<T> TcType for T where T: LabelType + Hash + Ord {}

mod anneal;
pub mod circuits;
pub mod compiled;
pub mod composite;
pub mod config;
pub mod csp;
pub mod embedding;
pub mod error;
mod expr;
pub mod model;
mod polynomial;
pub mod problems;
pub mod qpu;
pub mod sampler;
pub mod solution;
pub mod topology;
pub mod wrapper;

pub use error::{Error, Result};
pub use expr::Expr;
pub use model::{BinaryQuadraticModel, Vartype};
pub use polynomial::Polynomial;
pub use solution::{Sample, SampleRecord, SampleSet};
pub use wrapper::Qubit;

#[test]
fn expr_test() {
	let _: Expr<_, ()> = 2 * Expr::Binary(("a", "b")) * 3;
}
