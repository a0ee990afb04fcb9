//! Minimum vertex cover.

use super::graphs::Graph;
use crate::compiled::CompiledModel;
use crate::error::{Error, Result};
use crate::sampler::{SampleParams, Sampler};
use crate::wrapper::Qubit;
use crate::Expr;
use std::collections::BTreeSet;
use tracing::debug;

/// Objective `Σ x_v + lagrange · Σ_(u,v) (1 − x_u)(1 − x_v)`; every edge
/// term is a constraint labelled by the edge. With `lagrange > 1` its ground
/// states are the minimum vertex covers.
pub fn vertex_cover_model(graph: &Graph, lagrange: f64) -> Result<CompiledModel<usize, (usize, usize)>> {
	let mut hmlt: Expr<usize, (usize, usize)> = Expr::Number(0);
	for v in graph.nodes() {
		hmlt += Expr::Binary(v);
	}
	for (u, v, _) in graph.all_edges() {
		hmlt += lagrange
			* Expr::Constraint {
				label: (u, v),
				expr: Box::new((1 - Expr::Binary(u)) * (1 - Expr::Binary(v))),
			};
	}
	hmlt.compile()
}

/// Nodes set to 1 in the lowest-energy sample returned by `sampler`.
pub fn min_vertex_cover<S>(
	graph: &Graph,
	sampler: &S,
	lagrange: f64,
	params: &SampleParams,
) -> Result<BTreeSet<usize>>
where
	S: Sampler<Qubit<usize>> + ?Sized,
{
	let model = vertex_cover_model(graph, lagrange)?;
	let response = sampler.sample(model.bqm(), params)?;
	let best = response
		.first()
		.ok_or_else(|| Error::InvalidProblem("the sampler returned no samples".to_string()))?;
	let sample = best.sample.decision_variables();
	let uncovered = model.unsatisfied_constraints(&sample);
	if !uncovered.is_empty() {
		debug!(?uncovered, "lowest sample leaves edges uncovered");
	}
	Ok(sample
		.iter()
		.filter(|(_, value)| *value > 0)
		.map(|(v, _)| *v)
		.collect())
}

pub fn is_vertex_cover(graph: &Graph, nodes: &BTreeSet<usize>) -> bool {
	graph
		.all_edges()
		.all(|(u, v, _)| nodes.contains(&u) || nodes.contains(&v))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::problems::graphs::{circular_ladder_graph, star_graph, wheel_graph};
	use crate::sampler::{ExactSolver, SimulatedAnnealingSampler};

	#[test]
	fn star_is_covered_by_its_hub() {
		let cover = min_vertex_cover(&star_graph(4), &ExactSolver::new(), 2.0, &SampleParams::default()).unwrap();
		assert_eq!(cover, Some(0).into_iter().collect());
	}

	#[test]
	fn exact_covers_are_minimum() {
		let w5 = wheel_graph(5);
		let cover = min_vertex_cover(&w5, &ExactSolver::new(), 2.0, &SampleParams::default()).unwrap();
		assert!(is_vertex_cover(&w5, &cover));
		assert_eq!(cover.len(), 3);
		let c5 = circular_ladder_graph(5);
		let cover = min_vertex_cover(&c5, &ExactSolver::new(), 2.0, &SampleParams::default()).unwrap();
		assert!(is_vertex_cover(&c5, &cover));
		assert_eq!(cover.len(), 6);
	}

	#[test]
	fn annealing_covers_the_wheel() {
		let w5 = wheel_graph(5);
		let params = SampleParams::new().with_num_reads(20).with_seed(9);
		let cover = min_vertex_cover(&w5, &SimulatedAnnealingSampler::new(), 2.0, &params).unwrap();
		assert!(is_vertex_cover(&w5, &cover));
		assert_eq!(cover.len(), 3);
	}

	#[test]
	fn uncovered_edge_is_reported() {
		let model = vertex_cover_model(&star_graph(2), 2.0).unwrap();
		let sample = vec![(0, 0), (1, 1), (2, 0)].into_iter().collect();
		assert_eq!(model.unsatisfied_constraints(&sample).len(), 1);
	}
}
