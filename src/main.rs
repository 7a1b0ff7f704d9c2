//! # tabletop
//!
//! Runs randomized sessions of several seats sharing one in-memory table and
//! checks that every replica converges.
//!
//! ```text
//! tabletop --seats 4 --rounds 500 --seed 7
//! RUST_LOG=tabletop_engine=debug tabletop --seats 2
//! ```

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

pub mod simulation;

use simulation::{SimulationConfig, SimulationError};

#[derive(Parser)]
#[command(name = "tabletop")]
#[command(about = "Simulate seats dragging, flipping and dealing on a shared table")]
#[command(version)]
struct Cli {
    /// Number of connected replicas; seats beyond the fourth spectate
    #[arg(long, default_value_t = 4)]
    seats: usize,

    /// Gestures to perform across all seats
    #[arg(long, default_value_t = 200)]
    rounds: usize,

    /// Seed for gestures and deals
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Delay between steps of an animated flip, in milliseconds
    #[arg(long, default_value_t = 100)]
    flip_delay: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = SimulationConfig {
        seats: cli.seats,
        rounds: cli.rounds,
        seed: cli.seed,
        flip_delay_ms: cli.flip_delay,
    };

    match simulation::run(config).await {
        Ok(stats) => {
            stats.print();
            ExitCode::SUCCESS
        }
        Err(err @ SimulationError::Engine(_)) => {
            tracing::error!(error = %err, "simulation aborted");
            ExitCode::FAILURE
        }
        Err(err) => {
            tracing::error!(error = %err, "replicas are inconsistent");
            ExitCode::from(2)
        }
    }
}
