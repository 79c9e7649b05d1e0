//! # grid-lifecycle
//!
//! Drives a reservation from payment to deployment.
//!
//! ```text
//!              next_action != PAY
//! PAYMENT_PENDING ──────────────► PROVISIONING ──► FINISHED
//!        │                          │      │
//!        │ deadline                 │      │ ERROR result
//!        ▼                          ▼      ▼
//!     EXPIRED ◄─────────────────────┘   FAILED
//!        │                                 │
//!        └──────────► CANCELLED ◄──────────┘
//! ```
//!
//! [`ReservationWatcher`] polls the reservation service, cancels the
//! reservation exactly once when it expires or fails, and surfaces a
//! [`FailureReport`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod error;
pub mod report;
pub mod state;
pub mod watcher;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::WatchConfig;
pub use error::{LifecycleError, Result};
pub use report::{FailureKind, FailureReport};
pub use state::LifecycleState;
pub use watcher::{Deployment, ReservationWatcher};
