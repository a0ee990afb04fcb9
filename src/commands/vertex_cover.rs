//! Minimum vertex cover command.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Serialize;

use qubo_tutorials::problems::{
	circular_ladder_graph, is_vertex_cover, min_vertex_cover, star_graph, wheel_graph, Graph,
};
use qubo_tutorials::sampler::{ExactSolver, SampleParams, Sampler};
use qubo_tutorials::Qubit;

use super::common::{SamplerKind, Session};

const LAGRANGE: f64 = 2.0;

#[derive(Debug, Serialize)]
struct Cover {
	sampler: String,
	nodes: usize,
	edges: usize,
	cover: Vec<usize>,
	valid: bool,
}

fn solve<S>(graph: &Graph, sampler: &S, params: &SampleParams) -> Result<Cover>
where
	S: Sampler<Qubit<usize>> + ?Sized,
{
	let cover = min_vertex_cover(graph, sampler, LAGRANGE, params)
		.with_context(|| format!("Failed to cover the graph on {}", sampler.name()))?;
	Ok(Cover {
		sampler: sampler.name().to_string(),
		nodes: graph.node_count(),
		edges: graph.edge_count(),
		valid: is_vertex_cover(graph, &cover),
		cover: cover.into_iter().collect(),
	})
}

/// Execute the vertex-cover command.
pub fn execute(session: &mut Session) -> Result<()> {
	let mut covers = BTreeMap::new();

	session.header("Star graph, exact solver");
	let exact = solve(&star_graph(4), &ExactSolver::new(), &SampleParams::default())?;
	session.line(format!("  {:?} (valid: {})", exact.cover, exact.valid));
	covers.insert("star_exact", exact);

	let sampler = session.sampler::<Qubit<usize>>(SamplerKind::Qpu);
	let params = session.params::<Qubit<usize>, _>(&*sampler, 100);
	let graphs = vec![
		("star", star_graph(4)),
		("wheel", wheel_graph(5)),
		("circular_ladder", circular_ladder_graph(5)),
	];
	for (name, graph) in graphs {
		session.header(&format!("{} graph on {}", name, sampler.name()));
		let cover = solve(&graph, &*sampler, &params)?;
		session.line(format!("  {:?} (valid: {})", cover.cover, cover.valid));
		covers.insert(name, cover);
	}
	session.record("covers", &covers)?;
	Ok(())
}
