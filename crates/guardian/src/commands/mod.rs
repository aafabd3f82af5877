//! Command implementations for the guardian CLI.
//!
//! Each submodule implements the logic for one command. Shared wiring of the
//! HTTP backends into the core lives here.

pub mod chat;
pub mod doctor;
pub mod locate;
pub mod parse;
pub mod snapshot;

use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use guardian_core::client::{HttpAgentBackend, HttpDataSource};
use guardian_core::summary::SnapshotSummary;
use guardian_core::types::{AgentMessage, CameraState, Role};
use guardian_core::{Refresher, Snapshot, SnapshotStore};

use crate::config::Config;

/// Data backend, store and refresher built from config.
pub fn build_refresher(config: &Config) -> Result<Arc<Refresher>> {
    let data = HttpDataSource::new(&config.backend.url, config.backend_timeout())
        .context("Failed to create data backend client")?;
    let store = Arc::new(SnapshotStore::new(config.zoom_defaults()));
    Ok(Arc::new(Refresher::new(Arc::new(data), store)))
}

pub fn build_agent(config: &Config) -> Result<Arc<HttpAgentBackend>> {
    let agent = HttpAgentBackend::new(
        &config.agent.url,
        &config.agent.app_name,
        config.agent_timeout(),
    )
    .context("Failed to create agent backend client")?;
    Ok(Arc::new(agent))
}

pub fn print_message(message: &AgentMessage) {
    let time = message
        .timestamp
        .with_timezone(&chrono::Local)
        .format("%H:%M:%S")
        .to_string();
    match message.role {
        Role::User => println!(
            "{} {} {}",
            time.dimmed(),
            "you".cyan().bold(),
            message.content
        ),
        Role::Agent if message.is_error => println!(
            "{} {} {}",
            time.dimmed(),
            "agent".red().bold(),
            message.content.red()
        ),
        Role::Agent => println!(
            "{} {} {}",
            time.dimmed(),
            "agent".green().bold(),
            message.content
        ),
    }
}

pub fn print_camera(camera: &CameraState) {
    println!(
        "  {} center {} zoom {}",
        "⌖ map".magenta(),
        camera.center,
        camera.zoom
    );
}

pub fn print_summary(snapshot: &Snapshot) {
    let summary = SnapshotSummary::from(snapshot);
    println!(
        "  Active Shipments: {}",
        summary.active_shipments.to_string().bold()
    );
    println!("  Delay Impact:     {}", summary.delayed_count.to_string().yellow().bold());
    println!("  Value at Risk:    {}", format_usd(summary.value_at_risk).red().bold());
    println!("  Nodes:            {}", summary.node_count);
    println!("  Disruptions:      {}", summary.disruption_count);
    println!(
        "  As of:            {}",
        snapshot.timestamp.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S")
    );
}

/// Compact currency, e.g. `$1.2M`.
pub fn format_usd(value: f64) -> String {
    let abs = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };
    if abs >= 1_000_000_000.0 {
        format!("{}${:.1}B", sign, abs / 1_000_000_000.0)
    } else if abs >= 1_000_000.0 {
        format!("{}${:.1}M", sign, abs / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{}${:.1}K", sign, abs / 1_000.0)
    } else {
        format!("{}${:.0}", sign, abs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_usd_compact() {
        assert_eq!(format_usd(0.0), "$0");
        assert_eq!(format_usd(950.0), "$950");
        assert_eq!(format_usd(12_500.0), "$12.5K");
        assert_eq!(format_usd(3_400_000.0), "$3.4M");
        assert_eq!(format_usd(2_000_000_000.0), "$2.0B");
        assert_eq!(format_usd(-1_500.0), "-$1.5K");
    }

    #[test]
    fn test_build_clients_from_default_config() {
        let config = Config::default();
        assert!(build_refresher(&config).is_ok());
        assert!(build_agent(&config).is_ok());
    }
}
