//! Error types for grid-core.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, GridError>;

/// Errors raised by core types and by the remote collaborators.
#[derive(Debug, Error)]
pub enum GridError {
    /// Invalid amount (negative, malformed, or overflowing).
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// The reservation record is structurally broken.
    #[error("invalid reservation: {0}")]
    InvalidReservation(String),

    /// The directory has no such node.
    #[error("node not found: {node_id}")]
    NodeNotFound {
        /// Node that was looked up.
        node_id: String,
    },

    /// The directory has no such farm.
    #[error("farm not found: {farm_id}")]
    FarmNotFound {
        /// Farm that was looked up.
        farm_id: u64,
    },

    /// The reservation service has no such reservation.
    #[error("reservation not found: {reservation_id}")]
    ReservationNotFound {
        /// Reservation that was looked up.
        reservation_id: u64,
    },

    /// A remote service call failed (transport, timeout, server error).
    #[error("{service} unavailable: {message}")]
    Unavailable {
        /// Which collaborator failed.
        service: &'static str,
        /// Description of the failure.
        message: String,
    },
}

impl GridError {
    /// Create an invalid reservation error.
    #[must_use]
    pub fn invalid_reservation(message: impl Into<String>) -> Self {
        Self::InvalidReservation(message.into())
    }

    /// Create a node-not-found error.
    #[must_use]
    pub fn node_not_found(node_id: impl Into<String>) -> Self {
        Self::NodeNotFound {
            node_id: node_id.into(),
        }
    }

    /// Create a service-unavailable error.
    #[must_use]
    pub fn unavailable(service: &'static str, message: impl Into<String>) -> Self {
        Self::Unavailable {
            service,
            message: message.into(),
        }
    }
}
