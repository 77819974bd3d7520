//! Sweep - parameter-sweep job generation and failure checking for SLURM.

mod commands;

use clap::Parser;
use miette::Result;
use sweep_cli::{Args, Command};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins over -v
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Parsed arguments: {:?}", args);

    match &args.command {
        Command::Params(params) => commands::params(params),
        Command::Scripts(scripts) => commands::scripts(scripts),
        Command::Check(check) => commands::check(check),
    }
}
