//! spill CLI
//!
//! Sends messages through the spill dispatcher, or shows how a message would
//! be routed without sending it.

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

/// spill: queue messages with transparent S3 offload for large bodies.
#[derive(Parser, Debug)]
#[command(name = "spill", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, env = "SPILL_CONFIG", default_value = "spill.toml", global = true)]
    config: PathBuf,

    /// Output format.
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send a message, offloading the body to S3 when it is too large.
    Send(commands::message::MessageArgs),
    /// Measure a message and print its route without contacting AWS.
    Plan(commands::message::MessageArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let file_config = config::FileConfig::load(&cli.config)?;

    match cli.command {
        Command::Send(args) => commands::send::run(file_config, &args, &cli.format).await,
        Command::Plan(args) => commands::plan::run(file_config, &args, &cli.format),
    }
}
