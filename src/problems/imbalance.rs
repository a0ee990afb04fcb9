//! Structural imbalance of signed social networks.
//!
//! Groups are split into two colours so that as few relations as possible
//! contradict the split: friendly links across colours and hostile links
//! within one colour are frustrated. The split is the ground state of the
//! Ising model with `h = 0` and `J_uv = −sign(u, v)`.

use crate::error::{Error, Result};
use crate::model::{BinaryQuadraticModel, Vartype};
use crate::sampler::{SampleParams, Sampler};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::debug;

/// Bundled example network.
const EXAMPLE_NETWORK: &str = r#"{
	"nodes": [
		{"id": 1, "map": "North"},
		{"id": 2, "map": "North"},
		{"id": 3, "map": "North"},
		{"id": 4, "map": "South"},
		{"id": 5, "map": "South"},
		{"id": 6, "map": "South"}
	],
	"links": [
		{"source": 1, "target": 2, "sign": 1, "event_year": 2010},
		{"source": 2, "target": 3, "sign": 1, "event_year": 2011},
		{"source": 1, "target": 3, "sign": -1, "event_year": 2012},
		{"source": 4, "target": 5, "sign": 1, "event_year": 2010},
		{"source": 5, "target": 6, "sign": -1, "event_year": 2013},
		{"source": 4, "target": 6, "sign": -1, "event_year": 2013},
		{"source": 3, "target": 4, "sign": -1, "event_year": 2014},
		{"source": 2, "target": 5, "sign": -1, "event_year": 2014}
	]
}"#;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignedNode {
	pub id: usize,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub color: Option<u8>,
	#[serde(flatten)]
	pub attributes: BTreeMap<String, serde_json::Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignedLink {
	pub source: usize,
	pub target: usize,
	/// Positive for friendly relations, negative for hostile ones.
	pub sign: i8,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub event_year: Option<i32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub frustrated: Option<bool>,
	#[serde(flatten)]
	pub attributes: BTreeMap<String, serde_json::Value>,
}

/// A signed network in node-link form.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SignedGraph {
	#[serde(default)]
	pub nodes: Vec<SignedNode>,
	#[serde(default)]
	pub links: Vec<SignedLink>,
}

impl SignedGraph {
	pub fn example() -> Result<Self> {
		Self::from_json(EXAMPLE_NETWORK)
	}

	pub fn from_json(s: &str) -> Result<Self> {
		let graph: Self = serde_json::from_str(s)?;
		graph.validate()?;
		Ok(graph)
	}

	/// Read a network from a `.json`, `.yaml` or `.yml` file.
	pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		let source = std::fs::read_to_string(path)?;
		let graph: Self = match path.extension().and_then(|e| e.to_str()) {
			Some("yaml") | Some("yml") => serde_yaml_ng::from_str(&source)?,
			Some("json") => serde_json::from_str(&source)?,
			_ => {
				return Err(Error::InvalidInput(format!(
					"unknown network format: {}",
					path.display()
				)))
			}
		};
		graph.validate()?;
		Ok(graph)
	}

	fn validate(&self) -> Result<()> {
		let ids = self.nodes.iter().map(|n| n.id).collect::<BTreeSet<_>>();
		if ids.len() != self.nodes.len() {
			return Err(Error::InvalidInput("duplicate node id".to_string()));
		}
		if let Some(link) = self
			.links
			.iter()
			.find(|l| !ids.contains(&l.source) || !ids.contains(&l.target))
		{
			return Err(Error::InvalidInput(format!(
				"link ({}, {}) references an unknown node",
				link.source, link.target
			)));
		}
		Ok(())
	}

	/// Links of events in or before `year`, with the nodes they touch.
	/// Links without a year are dropped.
	pub fn filter_by_year(&self, year: i32) -> Self {
		let links = self
			.links
			.iter()
			.filter(|l| l.event_year.map_or(false, |y| y <= year))
			.cloned()
			.collect::<Vec<_>>();
		let touched = links
			.iter()
			.flat_map(|l| vec![l.source, l.target])
			.collect::<BTreeSet<_>>();
		Self {
			nodes: self
				.nodes
				.iter()
				.filter(|n| touched.contains(&n.id))
				.cloned()
				.collect(),
			links,
		}
	}

	/// Nodes whose `map` attribute is one of `maps`, with the links among
	/// them.
	pub fn filter_by_map(&self, maps: &[&str]) -> Self {
		let nodes = self
			.nodes
			.iter()
			.filter(|n| {
				n.attributes
					.get("map")
					.and_then(|m| m.as_str())
					.map_or(false, |m| maps.contains(&m))
			})
			.cloned()
			.collect::<Vec<_>>();
		let ids = nodes.iter().map(|n| n.id).collect::<BTreeSet<_>>();
		Self {
			links: self
				.links
				.iter()
				.filter(|l| ids.contains(&l.source) && ids.contains(&l.target))
				.cloned()
				.collect(),
			nodes,
		}
	}

	/// Ising model with `h = 0` on every node and `J_uv = −sign(u, v)`,
	/// accumulated over repeated links.
	pub fn to_ising(&self) -> BinaryQuadraticModel<usize> {
		let mut bqm = BinaryQuadraticModel::new(Vartype::Spin);
		for node in self.nodes.iter() {
			bqm.add_variable(node.id, 0.0);
		}
		for link in self.links.iter().filter(|l| l.source != l.target) {
			bqm.add_interaction(link.source, link.target, -(link.sign as f64));
		}
		bqm
	}
}

/// One distinct colouring found by the sampler.
#[derive(Clone, Debug, Serialize)]
pub struct ImbalanceResult {
	/// The network with `color` set on nodes and `frustrated` on links.
	pub graph: SignedGraph,
	pub energy: f64,
	#[serde(rename = "numOfFrustratedLinks")]
	pub num_frustrated: usize,
	#[serde(rename = "numOfOccurrences")]
	pub num_occurrences: usize,
	#[serde(rename = "percentageOfOccurrences")]
	pub percentage: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct ImbalanceReport {
	pub results: Vec<ImbalanceResult>,
	#[serde(rename = "numberOfReads")]
	pub number_of_reads: usize,
}

fn is_frustrated(sign: i8, cu: u8, cv: u8) -> bool {
	(sign > 0 && cu != cv) || (sign < 0 && cu == cv)
}

/// Sample the imbalance model of `graph` and annotate the network once per
/// distinct colouring, lowest energy first.
pub fn solve_structural_imbalance<S>(
	graph: &SignedGraph,
	sampler: &S,
	params: &SampleParams,
) -> Result<ImbalanceReport>
where
	S: Sampler<usize> + ?Sized,
{
	if graph.nodes.is_empty() {
		return Err(Error::InvalidInput(
			"filtered network has no nodes to solve the problem on".to_string(),
		));
	}
	let bqm = graph.to_ising();
	let response = sampler.sample(&bqm, params)?;
	let total = response.total_occurrences();
	let mut results = Vec::with_capacity(response.len());
	for record in response.iter() {
		let colors = record
			.sample
			.iter()
			.map(|(v, value)| (*v, if value > 0 { 1u8 } else { 0u8 }))
			.collect::<BTreeMap<usize, u8>>();
		let mut annotated = graph.clone();
		for node in annotated.nodes.iter_mut() {
			node.color = colors.get(&node.id).copied();
		}
		let mut num_frustrated = 0;
		for link in annotated.links.iter_mut() {
			let frustrated = match (colors.get(&link.source), colors.get(&link.target)) {
				(Some(cu), Some(cv)) => is_frustrated(link.sign, *cu, *cv),
				_ => false,
			};
			if frustrated {
				num_frustrated += 1;
			}
			link.frustrated = Some(frustrated);
		}
		results.push(ImbalanceResult {
			graph: annotated,
			energy: record.energy,
			num_frustrated,
			num_occurrences: record.num_occurrences,
			percentage: 100.0 * record.num_occurrences as f64 / total.max(1) as f64,
		});
	}
	debug!(
		colourings = results.len(),
		reads = total,
		"structural imbalance solved"
	);
	Ok(ImbalanceReport {
		results,
		number_of_reads: total,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sampler::{ExactSolver, SimulatedAnnealingSampler};

	#[test]
	fn example_network_parses() {
		let g = SignedGraph::example().unwrap();
		assert_eq!(g.nodes.len(), 6);
		assert_eq!(g.links.len(), 8);
		let bqm = g.to_ising();
		assert_eq!(bqm.get_quadratic(&1, &3), Some(1.0));
		assert_eq!(bqm.get_linear(&1), Some(0.0));
	}

	#[test]
	fn unknown_nodes_are_rejected() {
		let s = r#"{"nodes": [{"id": 1}], "links": [{"source": 1, "target": 2, "sign": 1}]}"#;
		assert!(matches!(SignedGraph::from_json(s), Err(Error::InvalidInput(_))));
	}

	#[test]
	fn filters_keep_consistent_subgraphs() {
		let g = SignedGraph::example().unwrap();
		let early = g.filter_by_year(2011);
		assert_eq!(early.links.len(), 3);
		assert_eq!(early.nodes.len(), 5);
		let south = g.filter_by_map(&["South"]);
		assert_eq!(south.nodes.len(), 3);
		assert_eq!(south.links.len(), 3);
		assert!(g.filter_by_year(2000).nodes.is_empty());
	}

	#[test]
	fn exact_split_frustrates_one_link() {
		let g = SignedGraph::example().unwrap();
		let report = solve_structural_imbalance(&g, &ExactSolver::new(), &SampleParams::default()).unwrap();
		assert_eq!(report.number_of_reads, 64);
		let best = &report.results[0];
		assert_eq!(best.num_frustrated, 1);
		assert!((best.energy - (2.0 * 1.0 - 8.0)).abs() < 1e-9);
		for result in report.results.iter() {
			let expected = 2.0 * result.num_frustrated as f64 - g.links.len() as f64;
			assert!((result.energy - expected).abs() < 1e-9);
		}
		let json = serde_json::to_value(&report).unwrap();
		assert!(json["results"][0]["graph"]["nodes"][0]["color"].is_number());
		assert!(json["results"][0]["graph"]["links"][0]["frustrated"].is_boolean());
	}

	#[test]
	fn annealing_percentages_add_up() {
		let g = SignedGraph::example().unwrap();
		let params = SampleParams::new().with_num_reads(50).with_seed(17);
		let report =
			solve_structural_imbalance(&g, &SimulatedAnnealingSampler::new(), &params).unwrap();
		assert_eq!(report.number_of_reads, 50);
		let total: f64 = report.results.iter().map(|r| r.percentage).sum();
		assert!((total - 100.0).abs() < 1e-9);
		assert_eq!(report.results[0].num_frustrated, 1);
	}

	#[test]
	fn empty_network_is_an_error() {
		let g = SignedGraph::default();
		assert!(solve_structural_imbalance(&g, &ExactSolver::new(), &SampleParams::default()).is_err());
	}
}
