//! Interactive agent session.
//!
//! Lines typed at the prompt are sent to the agent; `/`-prefixed lines are
//! local commands. The snapshot keeps refreshing in the background.

use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use guardian_core::refresh::RefreshOutcome;
use guardian_core::{ConversationController, TurnOutcome};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{build_agent, build_refresher, print_camera, print_message, print_summary};
use crate::config::Config;

const HELP: &str =
    "/summary  stat cards   /camera  map focus   /reconnect  retry agent session   /quit";

/// A local command typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Quit,
    Help,
    Summary,
    Camera,
    Reconnect,
    Unknown(&'a str),
    Message(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    let trimmed = line.trim();
    match trimmed {
        "/quit" | "/exit" => Input::Quit,
        "/help" => Input::Help,
        "/summary" => Input::Summary,
        "/camera" => Input::Camera,
        "/reconnect" => Input::Reconnect,
        cmd if cmd.starts_with('/') => Input::Unknown(cmd),
        _ => Input::Message(line),
    }
}

pub async fn execute(no_refresh: bool, config: &Config) -> Result<()> {
    let refresher = build_refresher(config)?;
    let agent = build_agent(config)?;
    let controller =
        ConversationController::new(agent, refresher.clone(), config.controller_options());

    println!("{}", "Supply Guardian".red().bold());
    println!("{}", "─".repeat(50));

    let report = controller.initialize().await;
    match &report.refresh {
        RefreshOutcome::Failed { error, .. } => {
            println!("  {} {}", "○ snapshot unavailable:".yellow(), error)
        }
        _ => {
            if let Some(snapshot) = controller.snapshot().await {
                print_summary(&snapshot);
            }
        }
    }
    println!();
    for message in controller.transcript().await {
        print_message(&message);
    }

    let _refresh_loop =
        (!no_refresh).then(|| refresher.clone().spawn_interval(config.refresh_interval()));

    println!("{}", HELP.dimmed());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match classify(&line) {
            Input::Quit => break,
            Input::Help => println!("{}", HELP.dimmed()),
            Input::Summary => match controller.snapshot().await {
                Some(snapshot) => print_summary(&snapshot),
                None => println!("{}", "○ no snapshot yet".yellow()),
            },
            Input::Camera => match controller.camera().await {
                Some(camera) => print_camera(&camera),
                None => println!("{}", "○ map has not moved yet".dimmed()),
            },
            Input::Reconnect => {
                if controller.session().is_some() {
                    println!("{}", "✓ session already active".green());
                } else if controller.start_session().await.is_ok() {
                    if let Some(message) = controller.transcript().await.last() {
                        print_message(message);
                    }
                } else {
                    println!("{}", "✗ agent still unavailable".red());
                }
            }
            Input::Unknown(cmd) => println!("{} {}", "unknown command:".yellow(), cmd),
            Input::Message(text) => send(&controller, text).await,
        }
    }

    Ok(())
}

async fn send(controller: &ConversationController, text: &str) {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.red} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("thinking...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let outcome = controller.send_message(text).await;
    spinner.finish_and_clear();

    match outcome {
        TurnOutcome::Ignored => {}
        TurnOutcome::NoSession => {
            println!("{}", "○ no agent session, try /reconnect".yellow())
        }
        TurnOutcome::Busy => println!("{}", "○ still waiting for the last reply".yellow()),
        TurnOutcome::Silent => println!("{}", "(no reply)".dimmed()),
        TurnOutcome::Failed { message } => print_message(&message),
        TurnOutcome::Replied { message, camera, .. } => {
            print_message(&message);
            if let Some(camera) = camera {
                print_camera(&camera);
            }
        }
    }
}
