//! guardian - Supply Chain Guardian CLI
//!
//! Conversational agent over a live supply-chain network snapshot, with
//! agent replies steering a map camera.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod cli;
mod commands;
mod config;
mod error;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::from_default_env()
                .add_directive("guardian=info".parse()?)
                .add_directive("guardian_core=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = config::Config::load()?;

    // Execute command
    match cli.command {
        Commands::Chat { no_refresh } => commands::chat::execute(no_refresh, &config).await,
        Commands::Snapshot { json } => commands::snapshot::execute(json, &config).await,
        Commands::Parse { text } => commands::parse::execute(&text, &config),
        Commands::Locate { id } => commands::locate::execute(&id, &config).await,
        Commands::Doctor => commands::doctor::execute(&config).await,
        Commands::Version => {
            println!("guardian {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
