//! Diagnostics command.

use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use guardian_core::client::{DataSource, HttpDataSource};

use crate::config::Config;
use crate::error::GuardianError;

pub async fn execute(config: &Config) -> Result<()> {
    println!("{}", "guardian Doctor".cyan().bold());
    println!("{}", "─".repeat(50));
    println!();

    let mut issues = Vec::new();

    // Check config file
    print!("  Config file: ");
    let config_path = Config::config_path();
    if config_path.exists() {
        println!("{}", "✓ exists".green());
    } else {
        println!("{}", "○ not found (using defaults)".yellow());
    }

    // Check data backend endpoints
    println!();
    println!("  {} ({}):", "Data backend".cyan(), config.backend.url);
    let data = HttpDataSource::new(&config.backend.url, config.backend_timeout())
        .map_err(GuardianError::Core)?;

    print!("    /shipments: ");
    report(data.fetch_shipments().await.map(|v| v.len()), &mut issues, "Cannot fetch shipments");
    print!("    /network/nodes: ");
    report(data.fetch_nodes().await.map(|v| v.len()), &mut issues, "Cannot fetch network nodes");
    print!("    /network/disruptions: ");
    report(
        data.fetch_disruptions().await.map(|v| v.len()),
        &mut issues,
        "Cannot fetch disruptions",
    );

    // Check agent reachability
    println!();
    print!("  {} ({}): ", "Agent".cyan(), config.agent.url);
    match check_reachable(&config.agent.url).await {
        Ok(_) => println!("{}", "✓ reachable".green()),
        Err(e) => {
            println!("{}", format!("✗ {}", e).red());
            issues.push("Cannot reach the agent service");
        }
    }
    println!("    app: {}  user: {}", config.agent.app_name, config.agent.user_id);

    // Summary
    println!();
    if issues.is_empty() {
        println!("{}", "✓ All checks passed".green().bold());
    } else {
        println!("{}", format!("✗ {} issue(s) found:", issues.len()).red().bold());
        for issue in &issues {
            println!("  • {}", issue);
        }
    }

    Ok(())
}

fn report(
    result: guardian_core::Result<usize>,
    issues: &mut Vec<&'static str>,
    issue: &'static str,
) {
    match result {
        Ok(count) => println!("{}", format!("✓ {} record(s)", count).green()),
        Err(e) => {
            println!("{}", format!("✗ {}", e).red());
            issues.push(issue);
        }
    }
}

/// Any HTTP response counts as reachable.
async fn check_reachable(url: &str) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;

    client.get(url).send().await?;

    Ok(())
}
