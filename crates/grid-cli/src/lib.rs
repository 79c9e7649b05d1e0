//! # grid-cli
//!
//! `gridbroker` command-line interface.
//!
//! Provides commands for:
//! - Pricing a reservation per node (`cost`)
//! - Paying farmers for a reservation (`payout`)
//! - Checking that a farmer was paid (`verify-payment`)
//! - Waiting for payment and deployment (`wait`)
//!
//! # Architecture
//!
//! Every collaborator (directory, reservation service, ledger wallet) is
//! served by a [`SnapshotBackend`] reading a JSON snapshot file. The file is
//! re-read on every lookup, so another process may update it while `wait`
//! is polling.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod snapshot;

pub use cli::{Cli, Commands, Format, WaitMode};
pub use config::BrokerConfig;
pub use error::CliError;
pub use output::OutputFormat;
pub use snapshot::{Snapshot, SnapshotBackend, WalletSnapshot};
