//! # grid-core
//!
//! Primitives shared by the grid capacity broker.
//!
//! This crate provides:
//!
//! - [`Amount`] — Non-negative token amount with exact decimal precision
//! - [`ResourceUnits`] — Normalized CRU/MRU/SRU/HRU vector with its workload ids
//! - [`Reservation`] — Reservation record and its typed workloads
//! - [`Node`] / [`Farm`] — Directory records with per-currency prices
//! - [`LedgerTransaction`] — Observed ledger transfers
//!
//! The remote services this broker talks to are modelled as traits
//! ([`DirectoryService`], [`ReservationService`], [`LedgerWallet`]) so callers
//! inject concrete clients, and tests inject fakes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod amount;
pub mod directory;
pub mod error;
pub mod ids;
pub mod ledger;
pub mod reservation;
pub mod units;
pub mod workload;

pub use amount::Amount;
pub use directory::{DirectoryService, Farm, Node, ResourceCapacity, ResourcePrice, WalletAddress};
pub use error::{GridError, Result};
pub use ids::{FarmId, NodeId, OwnerId, ReservationId, WorkloadId};
pub use ledger::{CoinOutput, LedgerTransaction, LedgerWallet};
pub use reservation::{
    DataReservation, NextAction, Reservation, ReservationService, ResultState, WorkloadResult,
};
pub use units::ResourceUnits;
pub use workload::{
    Container, ContainerCapacity, DiskType, KubernetesNode, Network, NetworkResource, Volume,
    Workload, WorkloadKind, Zdb,
};
