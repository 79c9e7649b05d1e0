//! Lifecycle states of a watched reservation.

use grid_core::NextAction;
use serde::{Deserialize, Serialize};

/// Where a watched reservation currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    /// Waiting for the customer's payment.
    PaymentPending,
    /// Paid; waiting for nodes to post results.
    Provisioning,
    /// Every workload posted a result.
    Finished,
    /// The provisioning deadline passed.
    Expired,
    /// A workload reported an error.
    Failed,
    /// Cancelled after expiry or failure.
    Cancelled,
}

impl LifecycleState {
    /// Entry state for a freshly fetched reservation.
    ///
    /// Returns `None` for anything that is neither waiting for payment nor
    /// deploying.
    #[must_use]
    pub const fn from_next_action(action: NextAction) -> Option<Self> {
        match action {
            NextAction::Pay => Some(Self::PaymentPending),
            NextAction::Deploy => Some(Self::Provisioning),
            _ => None,
        }
    }

    /// Checks if a transition to the target state is valid.
    #[must_use]
    pub const fn can_transition_to(&self, target: &Self) -> bool {
        use LifecycleState::{Cancelled, Expired, Failed, Finished, PaymentPending, Provisioning};

        matches!(
            (self, target),
            (PaymentPending, Provisioning | Expired)
                | (Provisioning, Finished | Expired | Failed)
                | (Expired | Failed, Cancelled)
        )
    }

    /// No further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled)
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PaymentPending => write!(f, "PAYMENT_PENDING"),
            Self::Provisioning => write!(f, "PROVISIONING"),
            Self::Finished => write!(f, "FINISHED"),
            Self::Expired => write!(f, "EXPIRED"),
            Self::Failed => write!(f, "FAILED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}
