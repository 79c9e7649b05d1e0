//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// gridbroker - grid capacity reservation broker.
#[derive(Parser, Debug, Clone)]
#[command(name = "gridbroker")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// JSON snapshot serving the directory, reservations and wallet.
    #[arg(short, long, env = "GRIDBROKER_SNAPSHOT", default_value = "grid-snapshot.json")]
    pub snapshot: PathBuf,

    /// Optional JSON configuration file.
    #[arg(short, long, env = "GRIDBROKER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Explorer base URL for reservation links.
    #[arg(long, env = "GRIDBROKER_EXPLORER_URL")]
    pub explorer_url: Option<String>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// What `wait` waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum WaitMode {
    /// Payment, then deployment.
    #[default]
    Full,
    /// Only until the payment is seen.
    Payment,
    /// Only deployment of an already paid reservation.
    Deployment,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show the per-node resource units and cost of a reservation.
    Cost {
        /// Reservation id.
        reservation_id: u64,
    },

    /// Pay every farmer hosting part of a reservation.
    ///
    /// Each payment is attempted once. Payments with an unknown outcome are
    /// reported and must be checked by hand before trying again.
    Payout {
        /// Reservation id.
        reservation_id: u64,

        /// Only show the payments that would be made.
        #[arg(long)]
        dry_run: bool,
    },

    /// Check that the customer's payment reached our farms.
    VerifyPayment {
        /// Reservation id.
        reservation_id: u64,

        /// Farms to check, by id (comma-separated).
        #[arg(long, value_delimiter = ',')]
        farm: Vec<u64>,

        /// Check every farm owned by this identity instead.
        #[arg(long, env = "GRIDBROKER_OWNER", conflicts_with = "farm")]
        owner: Option<u64>,
    },

    /// Wait for a reservation to be paid and deployed.
    Wait {
        /// Reservation id.
        reservation_id: u64,

        /// Which part of the lifecycle to wait for.
        #[arg(short, long, value_enum, default_value_t = WaitMode::Full)]
        mode: WaitMode,

        /// Poll interval in milliseconds.
        #[arg(long, env = "GRIDBROKER_POLL_INTERVAL_MS")]
        poll_interval_ms: Option<u64>,
    },
}
