//! # grid-accounting
//!
//! Turns a reservation into money.
//!
//! This crate provides:
//!
//! - Workload classification per node ([`classify`])
//! - Workload to resource-unit conversion ([`convert`])
//! - Per-node aggregation ([`aggregate`])
//! - Pricing against farm price tables ([`PricingEngine`])
//! - Farmer payouts over a ledger wallet ([`PayoutPlanner`])
//! - Verification that a customer paid a farmer ([`PaymentReconciler`])
//!
//! ```text
//! Reservation ─► classify ─► convert ─► aggregate ─► PricingEngine ─┬─► PayoutPlanner
//!                                                                   └─► PaymentReconciler
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregate;
pub mod classify;
pub mod convert;
pub mod error;
pub mod payout;
pub mod pricing;
pub mod reconcile;

pub use aggregate::{aggregate, NodeAggregate, NodePricing};
pub use classify::{classify, NodeWorkloads};
pub use convert::to_resource_units;
pub use error::{AccountingError, Result};
pub use payout::{reference_message, AmbiguousPayout, PayoutBatch, PayoutInstruction, PayoutPlanner, SentPayout};
pub use pricing::PricingEngine;
pub use reconcile::{match_transactions, ExpectedPayment, PaymentReconciler, ReconciliationReport};
