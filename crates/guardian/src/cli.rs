//! CLI argument definitions using clap derive macros.

use clap::{Parser, Subcommand};

/// Supply Guardian
///
/// Chat with the supply-chain agent over a live network snapshot.
#[derive(Parser, Debug)]
#[command(name = "guardian")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive agent session with live snapshot refresh
    Chat {
        /// Disable the periodic snapshot refresh
        #[arg(long)]
        no_refresh: bool,
    },

    /// Fetch one snapshot and show the headline figures
    Snapshot {
        /// Output the canonical snapshot as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Parse an agent reply for a view directive (offline)
    Parse {
        /// Reply text, e.g. 'Rerouted. [VIEW: {"target_id": "S1"}]'
        text: String,
    },

    /// Resolve an entity id to a camera position against a fresh snapshot
    Locate {
        /// Shipment, node or disruption id
        id: String,
    },

    /// Run diagnostics
    Doctor,

    /// Show version
    Version,
}
