//! Offline directive parsing.

use anyhow::Result;
use colored::Colorize;
use guardian_core::ViewDirective;
use guardian_core::directive::{DirectiveIssue, DirectiveParser};

use crate::config::Config;

pub fn execute(text: &str, config: &Config) -> Result<()> {
    let parsed = DirectiveParser::new(config.view.coordinate_zoom).parse(text);

    println!("{}", "Display text:".cyan());
    println!("  {}", parsed.text);
    println!();

    print!("{} ", "Directive:".cyan());
    match &parsed.directive {
        Some(ViewDirective::ByEntityId { target_id }) => {
            println!("{} {}", "entity".green(), target_id.bold())
        }
        Some(ViewDirective::ByCoordinates { lat, lng, zoom }) => println!(
            "{} lat {} lng {} zoom {}",
            "coordinates".green(),
            lat,
            lng,
            zoom
        ),
        None => println!("{}", "none".dimmed()),
    }

    match &parsed.issue {
        Some(issue @ DirectiveIssue::InvalidJson(_)) => {
            println!("  {} {} (marker kept)", "!".yellow(), issue)
        }
        Some(issue) => println!("  {} {} (marker removed)", "!".yellow(), issue),
        None => {}
    }

    Ok(())
}
