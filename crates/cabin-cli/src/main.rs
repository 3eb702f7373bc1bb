//! Cabin CLI - inspect and exercise the arbitration engine.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cabin")]
#[command(author, version, about = "Cabin IVI resource arbitration CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a configuration and dump the engine state
    Inspect(commands::inspect::InspectArgs),

    /// Replay a scenario of resource operations and print the events
    Simulate(commands::simulate::SimulateArgs),
}

fn main() -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect(args) => {
            tracing::debug!("dispatching inspect");
            commands::inspect::run(args)
        }
        Commands::Simulate(args) => {
            tracing::debug!("dispatching simulate");
            commands::simulate::run(args)
        }
    }
}
