//! Structural imbalance command.

use std::path::Path;

use anyhow::{Context, Result};

use qubo_tutorials::problems::{solve_structural_imbalance, SignedGraph};

use super::common::{SamplerKind, Session};

/// Execute the imbalance command on the network in `input`, or the bundled
/// example, optionally restricted to a year and to map regions.
pub fn execute(
	session: &mut Session,
	input: Option<&Path>,
	year: Option<i32>,
	maps: &[String],
) -> Result<()> {
	let mut graph = match input {
		Some(path) => SignedGraph::from_file(path)
			.with_context(|| format!("Failed to load network: {}", path.display()))?,
		None => SignedGraph::example()?,
	};
	if let Some(year) = year {
		graph = graph.filter_by_year(year);
	}
	if !maps.is_empty() {
		let maps = maps.iter().map(String::as_str).collect::<Vec<_>>();
		graph = graph.filter_by_map(&maps);
	}
	let sampler = session.sampler::<usize>(SamplerKind::Qpu);
	let params = session.params::<usize, _>(&*sampler, 100);
	session.header(&format!(
		"Structural imbalance of {} groups and {} relations on {}",
		graph.nodes.len(),
		graph.links.len(),
		sampler.name()
	));
	let report = solve_structural_imbalance(&graph, &*sampler, &params)?;
	for result in report.results.iter() {
		let (mut first, mut second) = (Vec::new(), Vec::new());
		for node in result.graph.nodes.iter() {
			match node.color {
				Some(1) => second.push(node.id),
				_ => first.push(node.id),
			}
		}
		let frustrated = result
			.graph
			.links
			.iter()
			.filter(|l| l.frustrated == Some(true))
			.map(|l| (l.source, l.target))
			.collect::<Vec<_>>();
		session.line(format!(
			"  {:?} | {:?}  frustrated {:?}  energy {}  {} reads ({:.1}%)",
			first, second, frustrated, result.energy, result.num_occurrences, result.percentage
		));
	}
	session.record("imbalance", &report)?;
	Ok(())
}
