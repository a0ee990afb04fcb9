extern crate qubo_tutorials;
use qubo_tutorials::circuits::{factor, multi_gate_csp, validate_samples};
use qubo_tutorials::composite::{EmbeddingComposite, FixedEmbeddingComposite};
use qubo_tutorials::config::SamplerConfig;
use qubo_tutorials::csp::{stitch, ConstraintSatisfactionProblem};
use qubo_tutorials::embedding::Embedding;
use qubo_tutorials::problems::{is_vertex_cover, min_vertex_cover, solve_structural_imbalance, star_graph, SignedGraph};
use qubo_tutorials::qpu::QpuSampler;
use qubo_tutorials::sampler::{ExactSolver, SampleParams, Sampler, SimulatedAnnealingSampler};
use qubo_tutorials::Expr;
use std::io::Write;

#[test]
fn assignment_with_one_hot_constraints() {
	let cost = [[1.0, 4.0, 5.0], [3.0, 1.0, 6.0], [4.0, 5.0, 1.0]];
	let n = 3usize;
	let rows = (0..n).fold(Expr::Number(0), |exp, w| {
		let inner = (0..n).fold(Expr::Number(-1), |e, j| e + Expr::Binary((w, j)));
		exp + Expr::Constraint {
			label: format!("worker {}", w),
			expr: Box::new(inner.clone() * inner),
		}
	});
	let cols = (0..n).fold(Expr::Number(0), |exp, j| {
		let inner = (0..n).fold(Expr::Number(-1), |e, w| e + Expr::Binary((w, j)));
		exp + Expr::Constraint {
			label: format!("job {}", j),
			expr: Box::new(inner.clone() * inner),
		}
	});
	let mut costs = Expr::Number(0);
	for w in 0..n {
		for j in 0..n {
			costs += Expr::Float(cost[w][j]) * Expr::Binary((w, j));
		}
	}
	let hmlt = Expr::Number(10) * (rows + cols) + costs;
	let compiled = hmlt.compile().unwrap();
	assert_eq!(compiled.num_ancillas(), 0);
	let response = ExactSolver::new()
		.sample(compiled.bqm(), &SampleParams::default())
		.unwrap();
	let best = response.first().unwrap();
	assert!((best.energy - 3.0).abs() < 1e-9);
	let sample = best.sample.decision_variables();
	assert!(compiled.unsatisfied_constraints(&sample).is_empty());
	for w in 0..n {
		assert_eq!(sample[&(w, w)], 1);
	}
}

#[test]
fn not_gate_on_a_fixed_embedding() {
	let embedding: Embedding<&str> = vec![("x", vec![0]), ("z", vec![4])].into_iter().collect();
	let sampler = FixedEmbeddingComposite::new(QpuSampler::default(), embedding).unwrap();
	let q = vec![(("x", "x"), -1.0), (("x", "z"), 2.0), (("z", "x"), 0.0), (("z", "z"), -1.0)];
	let params = SampleParams::new().with_num_reads(1000).with_seed(2);
	let response = sampler.sample_qubo(q, &params).unwrap();
	assert_eq!(response.total_occurrences(), 1000);
	for record in response.lowest() {
		assert_eq!(record.energy, -1.0);
		assert_ne!(record.sample[&"x"], record.sample[&"z"]);
		assert_eq!(record.chain_break_fraction, Some(0.0));
	}
}

#[test]
fn scheduling_by_annealing() {
	let mut csp = ConstraintSatisfactionProblem::new();
	csp.add_constraint_fn(
		|x| if x[0] { x[1] && x[3] } else { !x[1] && x[2] },
		vec!["time", "location", "length", "mandatory"],
	)
	.unwrap();
	let bqm = stitch(&csp, 2.0).unwrap();
	let params = SampleParams::new().with_num_reads(200).with_seed(8);
	let response = SimulatedAnnealingSampler::new().sample(&bqm, &params).unwrap();
	let best = response.first().unwrap();
	assert!(best.energy.abs() < 1e-9);
	for record in response.lowest() {
		assert!(csp.check(&record.sample.decision_variables()).unwrap());
	}
}

#[test]
fn gate_circuit_on_the_embedded_annealer() {
	let csp = multi_gate_csp().unwrap();
	let bqm = stitch(&csp, 2.0).unwrap();
	let sampler = EmbeddingComposite::new(QpuSampler::default());
	let params = SampleParams::new().with_num_reads(500).with_seed(4);
	let response = sampler.sample(&bqm, &params).unwrap();
	let validation = validate_samples(&csp, &response).unwrap();
	assert_eq!(validation.valid + validation.invalid, 500);
	assert_eq!(validation.points.len(), 500);
	assert!(validation.valid > 0);
	assert!(response.info().contains_key("embedding"));
}

#[test]
fn vertex_cover_on_the_embedded_annealer() {
	let graph = star_graph(4);
	let sampler = EmbeddingComposite::new(QpuSampler::default());
	let params = SampleParams::new().with_num_reads(200).with_seed(6);
	let cover = min_vertex_cover(&graph, &sampler, 2.0, &params).unwrap();
	assert!(is_vertex_cover(&graph, &cover));
}

#[test]
fn imbalance_on_a_configured_chip() {
	let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
	writeln!(
		file,
		"num_reads: 200\nseed: 12\nqpu:\n  chip_id: small\n  num_sweeps: 100\n  chimera:\n    m: 4\n    n: 4"
	)
	.unwrap();
	let config = SamplerConfig::from_file(file.path()).unwrap();
	let sampler = EmbeddingComposite::new(config.qpu());
	let graph = SignedGraph::example().unwrap();
	let report = solve_structural_imbalance(&graph, &sampler, &config.sample_params()).unwrap();
	assert_eq!(report.number_of_reads, 200);
	let best = &report.results[0];
	assert_eq!(best.num_frustrated, 1);
	assert!((best.energy + 6.0).abs() < 1e-9);
}

#[test]
fn factoring_by_annealing() {
	let params = SampleParams::new().with_num_reads(200).with_seed(21);
	let report = factor(21, &SimulatedAnnealingSampler::new(), &params).unwrap();
	assert_eq!(report.p, 21);
	assert_eq!(report.number_of_reads, 200);
	for f in report.results.iter() {
		assert_eq!(f.valid, f.a as u16 * f.b as u16 == 21);
	}
}
