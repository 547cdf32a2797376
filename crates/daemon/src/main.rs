//! driftdrop daemon - always-on coordination service.
//!
//! The daemon accepts one WebSocket connection per peer and coordinates:
//! - presence propagation across all connected peers
//! - share fan-out with per-recipient outcomes
//! - consent-gated chat session negotiation
//!
//! It also fronts the content store (uploads, text shares, downloads).

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod commands;
mod handlers;

/// driftdrop daemon - anonymous peer coordination service
#[derive(Parser)]
#[command(name = "driftdrop-daemon")]
#[command(about = "Coordination service for anonymous peer sharing", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the coordination service
    Run {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<String>,

        /// Override the bind address (e.g. 0.0.0.0:8001)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Show service status
    Status {
        /// Address of the running service (defaults to the configured bind address)
        #[arg(short, long)]
        addr: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run { config, bind } => {
            info!("Starting driftdrop daemon...");
            commands::run::execute(config, bind).await
        }
        Commands::Status { addr } => commands::status::execute(addr).await,
    }
}
