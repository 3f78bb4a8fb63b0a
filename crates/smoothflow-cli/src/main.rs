//! smoothflow - randomized-smoothing certification CLI
//!
//! Usage:
//!   smoothflow fit --data train.json -o model.json
//!   smoothflow certify --data test.json --model model.json \
//!       --certify_method RotationZ --sigma 0.05 --experiment_name run1
//!   smoothflow bound --n_a 990 --N 1000 --sigma 0.5 --certify_method Translation

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod output;

use commands::{bound, certify, fit};

/// smoothflow - certify point-cloud classifiers against parametric perturbations
#[derive(Parser)]
#[command(name = "smoothflow")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log filter, e.g. `info` or `smoothflow=debug`
    #[arg(long, global = true, default_value = "info")]
    log: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Certify a chunk of a labeled dataset
    Certify(certify::CertifyArgs),

    /// Fit the reference radial-profile classifier
    Fit(fit::FitArgs),

    /// Clopper-Pearson bound and certified radius for given vote counts
    Bound(bound::BoundArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::Certify(args) => certify::run(args),
        Commands::Fit(args) => fit::run(args),
        Commands::Bound(args) => bound::run(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            e.exit_code()
        }
    }
}
