//! Command-line front end: one subcommand per tutorial problem.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::common::{OutputFormat, SamplerKind, Session};
use commands::{circuit, diagnose, factor, gates, imbalance, scheduling, vertex_cover};

/// Small combinatorial problems sampled as binary quadratic models
#[derive(Parser, Debug)]
#[command(name = "qubo-tutorials")]
#[command(author, version, about, long_about = None)]
struct Cli {
	/// Increase verbosity (-v, -vv, -vvv)
	#[arg(short, long, action = clap::ArgAction::Count, global = true)]
	verbose: u8,

	/// Sampler settings (YAML or JSON)
	#[arg(short, long, global = true, env = "QUBO_TUTORIALS_CONFIG")]
	config: Option<PathBuf>,

	/// Sampler to use instead of the command's default
	#[arg(short, long, value_enum, global = true)]
	sampler: Option<SamplerKind>,

	/// Number of reads
	#[arg(short, long, global = true)]
	num_reads: Option<usize>,

	/// Random seed for reproducible sampling
	#[arg(long, global = true)]
	seed: Option<u64>,

	/// Output format
	#[arg(short, long, value_enum, default_value = "text", global = true)]
	format: OutputFormat,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Sample the NOT gate QUBO
	NotGate,

	/// Sample the AND gate with automatic and fixed embeddings
	AndGate,

	/// Solve the meeting scheduling constraint
	Scheduling,

	/// Minimum vertex cover of small graphs
	VertexCover,

	/// Sample a seven gate circuit in two formulations
	Circuit {
		/// Write the energy of every read to this JSON file
		#[arg(long)]
		plot_out: Option<PathBuf>,
	},

	/// Factor a number below 64 with a 3 bit multiplier circuit
	Factor {
		/// Product to factor
		#[arg(value_parser = clap::value_parser!(u8).range(0..64))]
		p: u8,
	},

	/// Find the fewest faulty gates of the 3 bit multiplier that explain a
	/// reading `a * b = p`
	Diagnose {
		/// Multiplicand
		#[arg(value_parser = clap::value_parser!(u8).range(0..8))]
		a: u8,
		/// Multiplier
		#[arg(value_parser = clap::value_parser!(u8).range(0..8))]
		b: u8,
		/// Observed product
		#[arg(value_parser = clap::value_parser!(u8).range(0..64))]
		p: u8,
	},

	/// Two-colour a signed social network with as few frustrated relations
	/// as possible
	Imbalance {
		/// Network in node-link form (JSON or YAML); the bundled example if
		/// omitted
		#[arg(short, long)]
		input: Option<PathBuf>,

		/// Keep relations of events up to this year
		#[arg(long)]
		year: Option<i32>,

		/// Keep groups of these map regions
		#[arg(long = "map")]
		maps: Vec<String>,
	},
}

fn run(cli: Cli) -> anyhow::Result<()> {
	let mut session = Session::load(
		cli.config.as_deref(),
		cli.seed,
		cli.num_reads,
		cli.sampler,
		cli.format,
	)?;
	match cli.command {
		Commands::NotGate => gates::execute_not(&mut session)?,
		Commands::AndGate => gates::execute_and(&mut session)?,
		Commands::Scheduling => scheduling::execute(&mut session)?,
		Commands::VertexCover => vertex_cover::execute(&mut session)?,
		Commands::Circuit { plot_out } => circuit::execute(&mut session, plot_out.as_deref())?,
		Commands::Factor { p } => factor::execute(&mut session, p)?,
		Commands::Diagnose { a, b, p } => diagnose::execute(&mut session, a, b, p)?,
		Commands::Imbalance { input, year, maps } => {
			imbalance::execute(&mut session, input.as_deref(), year, &maps)?
		}
	}
	session.finish()
}

fn main() {
	let cli = Cli::parse();

	let filter = match cli.verbose {
		0 => "warn",
		1 => "info",
		2 => "debug",
		_ => "trace",
	};
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::new(filter))
		.with_target(false)
		.with_writer(std::io::stderr)
		.init();

	if let Err(e) = run(cli) {
		eprintln!("{} {:#}", style("Error:").red().bold(), e);
		std::process::exit(1);
	}
}
