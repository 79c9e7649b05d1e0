//! Error types for grid-lifecycle.

use grid_core::{GridError, NextAction, ReservationId};
use thiserror::Error;

use crate::report::FailureReport;
use crate::state::LifecycleState;

/// Result type alias for lifecycle operations.
pub type Result<T> = std::result::Result<T, LifecycleError>;

/// Ways a watch can end without a deployment.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The provisioning deadline passed; the reservation was cancelled.
    #[error("reservation {} expired before deployment", .0.reservation_id)]
    ReservationExpired(Box<FailureReport>),

    /// A workload failed; the reservation was cancelled.
    #[error("reservation {} failed to deploy", .0.reservation_id)]
    ReservationFailed(Box<FailureReport>),

    /// The reservation is not waiting for payment or deployment.
    #[error("reservation {reservation_id} is not active (next action {next_action})")]
    NotActive {
        /// Reservation concerned.
        reservation_id: ReservationId,
        /// What the directory reports.
        next_action: NextAction,
    },

    /// The state machine was asked to make an impossible move.
    #[error("invalid state transition from {from} to {to}")]
    InvalidTransition {
        /// Current state.
        from: LifecycleState,
        /// Requested state.
        to: LifecycleState,
    },

    /// The reservation could not be fetched.
    #[error("reservation service: {0}")]
    Service(#[from] GridError),
}

impl LifecycleError {
    /// The failure report, for expired or failed reservations.
    #[must_use]
    pub fn report(&self) -> Option<&FailureReport> {
        match self {
            Self::ReservationExpired(r) | Self::ReservationFailed(r) => Some(&**r),
            _ => None,
        }
    }
}
