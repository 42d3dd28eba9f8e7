//! girder: build the working directory's native sources.
//!
//! The binary registers the repository's declarative recipe (sources and
//! headers feeding objects feeding the executable) and hands the requested
//! target to the engine. With no target it builds the recipe's default task.

mod output;
mod recipe;

use anyhow::Result;
use clap::Parser;
use girder_lib::{ExecuteConfig, Registry, run_target};
use tracing_subscriber::EnvFilter;

/// Declarative build runner.
#[derive(Parser)]
#[command(name = "girder")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Target to build (defaults to the recipe's default task)
  target: Option<String>,

  /// List the registered providers and tasks instead of building
  #[arg(short, long)]
  list: bool,

  /// Re-run every step even when outputs are up to date
  #[arg(short, long)]
  force: bool,

  /// Print the run summary as JSON
  #[arg(long)]
  json: bool,

  /// Enable verbose output
  #[arg(short, long)]
  verbose: bool,
}

fn main() {
  let cli = Cli::parse();

  // Initialize logging; logs go to stderr so --json output stays clean.
  let filter = if cli.verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::from_default_env()
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  if let Err(err) = run(&cli) {
    output::print_error(&format!("{err}"));
    std::process::exit(1);
  }
}

fn run(cli: &Cli) -> Result<()> {
  let mut registry = Registry::new();
  recipe::register(&mut registry)?;

  if cli.list {
    output::print_entries(&registry);
    return Ok(());
  }

  let config = ExecuteConfig { force: cli.force };
  let outcome = run_target(&registry, cli.target.as_deref(), &config)?;

  if cli.json {
    println!("{}", serde_json::to_string_pretty(&outcome.summary)?);
  } else {
    output::print_summary(&outcome.summary);
  }
  Ok(())
}
