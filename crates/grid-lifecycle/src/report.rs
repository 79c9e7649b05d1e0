//! User-facing report for a reservation that did not deploy.

use std::fmt;

use grid_core::{ReservationId, WorkloadResult};
use serde::{Deserialize, Serialize};

use crate::state::LifecycleState;

/// Why the reservation was given up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The provisioning deadline passed.
    Expired,
    /// A workload reported an error.
    Failed,
}

/// Itemized account of a failed or expired reservation.
///
/// Renders as markdown: a heading naming the reservation, one line per error
/// result, and a link to the reservation in the explorer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    /// Reservation concerned.
    pub reservation_id: ReservationId,
    /// Expired or failed.
    pub kind: FailureKind,
    /// Results in the error state at the time of the last poll.
    pub errors: Vec<WorkloadResult>,
    /// Explorer link to the reservation.
    pub link: String,
    /// States the watcher went through, ending in `CANCELLED`.
    pub history: Vec<LifecycleState>,
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FailureKind::Expired => writeln!(
                f,
                "# Sorry your reservation ```{}``` failed to deploy in time:",
                self.reservation_id
            )?,
            FailureKind::Failed => writeln!(
                f,
                "# Sorry your reservation ```{}``` has failed:",
                self.reservation_id
            )?,
        }
        for result in &self.errors {
            writeln!(f, "\n### {}: ```{}```", result.category, result.message)?;
        }
        write!(f, "\nFull reservation info: {}", self.link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_core::{ResultState, WorkloadId};

    fn error(id: u64, category: &str, message: &str) -> WorkloadResult {
        WorkloadResult {
            workload_id: WorkloadId(id),
            category: category.into(),
            state: ResultState::Error,
            message: message.into(),
            epoch: 0,
        }
    }

    #[test]
    fn failed_report_lists_every_error() {
        let report = FailureReport {
            reservation_id: ReservationId(31),
            kind: FailureKind::Failed,
            errors: vec![
                error(1, "CONTAINER", "flist not found"),
                error(2, "VOLUME", "no space left"),
            ],
            link: "https://explorer/reservations/31".into(),
            history: vec![LifecycleState::Provisioning, LifecycleState::Failed, LifecycleState::Cancelled],
        };
        let text = report.to_string();
        assert!(text.starts_with("# Sorry your reservation ```31``` has failed:"));
        assert!(text.contains("### CONTAINER: ```flist not found```"));
        assert!(text.contains("### VOLUME: ```no space left```"));
        assert!(text.ends_with("https://explorer/reservations/31"));
    }

    #[test]
    fn expired_report_without_errors() {
        let report = FailureReport {
            reservation_id: ReservationId(4),
            kind: FailureKind::Expired,
            errors: Vec::new(),
            link: "l".into(),
            history: Vec::new(),
        };
        assert_eq!(
            report.to_string(),
            "# Sorry your reservation ```4``` failed to deploy in time:\n\nFull reservation info: l"
        );
    }
}
