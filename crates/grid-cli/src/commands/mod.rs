//! CLI command implementations.
//!
//! Each submodule implements a specific CLI command:
//! - [`cost`] - Per-node resource units and cost
//! - [`payout`] - Farmer payouts
//! - [`verify`] - Payment verification
//! - [`wait`] - Payment and deployment wait

pub mod cost;
pub mod payout;
pub mod verify;
pub mod wait;

pub use cost::CostCommand;
pub use payout::PayoutCommand;
pub use verify::VerifyCommand;
pub use wait::WaitCommand;
