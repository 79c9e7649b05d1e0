//! Error types for grid-accounting.

use grid_core::{FarmId, GridError, NodeId, WorkloadId};
use thiserror::Error;

/// Result type alias for accounting operations.
pub type Result<T> = std::result::Result<T, AccountingError>;

/// Errors that abort an accounting pass.
///
/// None of these are retried internally. Directory misses and malformed
/// workloads point at upstream data problems; ledger failures may have moved
/// coins and need a human.
#[derive(Debug, Error)]
pub enum AccountingError {
    /// The reservation is structurally broken.
    #[error("invalid reservation: {0}")]
    InvalidReservation(String),

    /// A volume or key-value store uses a media class that cannot be billed.
    #[error("workload {workload_id}: unsupported media class {media_class:?}")]
    UnsupportedMediaClass {
        /// Offending workload.
        workload_id: WorkloadId,
        /// The class as recorded.
        media_class: String,
    },

    /// A kubernetes node uses an unknown size tier.
    #[error("workload {workload_id}: unsupported size tier {tier}")]
    UnsupportedTier {
        /// Offending workload.
        workload_id: WorkloadId,
        /// The tier as recorded.
        tier: u8,
    },

    /// The directory has no such node.
    #[error("node not found: {node_id}")]
    NodeNotFound {
        /// Missing node.
        node_id: String,
    },

    /// The directory has no such farm.
    #[error("farm not found: {farm_id}")]
    FarmNotFound {
        /// Missing farm.
        farm_id: u64,
    },

    /// The farm publishes no prices.
    #[error("farm {farm_id} publishes no resource prices")]
    MissingPriceTable {
        /// Farm without prices.
        farm_id: FarmId,
    },

    /// The farm publishes no payout wallet.
    #[error("farm {farm_id} publishes no wallet address")]
    MissingWallet {
        /// Farm without a wallet.
        farm_id: FarmId,
    },

    /// Cost computation overflowed.
    #[error("cost overflow on node {node_id}")]
    AmountOverflow {
        /// Node being priced.
        node_id: NodeId,
    },

    /// A payout was requested for an aggregate that was never priced.
    #[error("node {node_id} has not been priced")]
    NotPriced {
        /// Unpriced node.
        node_id: NodeId,
    },

    /// The ledger did not say whether a payment went through.
    #[error("payment of {amount} to {recipient} ({reference}) has unknown outcome: {reason}")]
    PaymentAmbiguous {
        /// Intended recipient.
        recipient: String,
        /// Intended amount.
        amount: String,
        /// Reference message.
        reference: String,
        /// What the ledger reported.
        reason: String,
    },

    /// The ledger refused some payments outright.
    #[error("{count} payment(s) rejected by the ledger")]
    PaymentRejected {
        /// Number of refused payments.
        count: usize,
    },

    /// A collaborator failed in some other way.
    #[error(transparent)]
    Service(GridError),
}

impl From<GridError> for AccountingError {
    fn from(e: GridError) -> Self {
        match e {
            GridError::NodeNotFound { node_id } => Self::NodeNotFound { node_id },
            GridError::FarmNotFound { farm_id } => Self::FarmNotFound { farm_id },
            GridError::InvalidReservation(msg) => Self::InvalidReservation(msg),
            other => Self::Service(other),
        }
    }
}
