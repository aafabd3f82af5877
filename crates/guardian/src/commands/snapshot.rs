//! One-shot snapshot fetch.

use anyhow::Result;
use colored::Colorize;
use guardian_core::refresh::RefreshOutcome;

use super::{build_refresher, print_summary};
use crate::config::Config;
use crate::error::GuardianError;

pub async fn execute(json: bool, config: &Config) -> Result<()> {
    let refresher = build_refresher(config)?;

    if let RefreshOutcome::Failed { error, .. } = refresher.refresh().await {
        return Err(GuardianError::SnapshotUnavailable(error.to_string()).into());
    }
    let Some(snapshot) = refresher.store().get().await else {
        return Err(GuardianError::SnapshotUnavailable("no snapshot applied".into()).into());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(snapshot.as_ref())?);
        return Ok(());
    }

    println!("{}", format!("Network snapshot ({})", config.backend.url).cyan().bold());
    println!("{}", "─".repeat(50));
    print_summary(&snapshot);

    if !snapshot.disruptions.is_empty() {
        println!();
        println!("{}", "Disruptions:".cyan());
        for d in &snapshot.disruptions {
            println!(
                "  {} {} ({:.0} m radius){}",
                d.id.bold(),
                d.kind.as_deref().unwrap_or("unknown"),
                d.radius_m,
                d.description
                    .as_deref()
                    .map(|s| format!(": {}", s))
                    .unwrap_or_default()
            );
        }
    }

    let impacted: Vec<_> = snapshot
        .shipments
        .iter()
        .filter(|s| s.status.is_impacted())
        .collect();
    if !impacted.is_empty() {
        println!();
        println!("{}", "Impacted shipments:".cyan());
        for s in impacted {
            let location = s
                .coordinates
                .map(|c| c.to_string())
                .unwrap_or_else(|| "unlocated".to_string());
            println!(
                "  {} {} {} → {} at {}",
                s.id.bold(),
                s.status.to_string().yellow(),
                s.mode.as_deref().unwrap_or("-"),
                s.destination_id.as_deref().unwrap_or("?"),
                location
            );
        }
    }

    Ok(())
}
