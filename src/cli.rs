//! CLI command definitions using clap.

use clap::{Parser, Subcommand};

/// Beamtime DOI reconciliation service.
#[derive(Parser, Debug)]
#[command(name = "beamtime-doi")]
#[command(version)]
#[command(about = "Reconciles beamtime dataset records against the DOI registration service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the reconciliation loop until interrupted
    Run {
        /// Poll interval in seconds between reconciliation ticks
        #[arg(short, long, default_value_t = 300)]
        interval: u64,

        /// Maximum concurrent registration calls within one tick
        #[arg(short, long, default_value_t = 4)]
        workers: usize,

        /// Run the remote drift audit every N ticks (0 disables)
        #[arg(long, default_value_t = 12)]
        audit_every: u64,

        /// Dry-run mode: no registration API calls, in-memory state only
        #[arg(short, long, default_value_t = false)]
        dry_run: bool,
    },

    /// Run exactly one reconciliation tick and exit.
    ///
    /// Exits non-zero if any record is left blocked on a permanent failure.
    Once {
        /// Maximum concurrent registration calls
        #[arg(short, long, default_value_t = 4)]
        workers: usize,

        /// Dry-run mode: no registration API calls, in-memory state only
        #[arg(short, long, default_value_t = false)]
        dry_run: bool,
    },
}
