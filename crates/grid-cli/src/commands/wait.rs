//! Wait command implementation.

use std::io::Write;
use std::sync::Arc;

use grid_core::ReservationId;
use grid_lifecycle::{LifecycleState, ReservationWatcher, WatchConfig};

use crate::cli::WaitMode;
use crate::error::CliError;
use crate::output::{OutputFormat, WaitReport};
use crate::snapshot::SnapshotBackend;

/// Wait command executor.
pub struct WaitCommand {
    watcher: ReservationWatcher<SnapshotBackend>,
}

impl WaitCommand {
    /// Create a new wait command.
    #[must_use]
    pub fn new(backend: Arc<SnapshotBackend>, config: WatchConfig) -> Self {
        Self {
            watcher: ReservationWatcher::new(backend, config),
        }
    }

    /// Execute the wait command.
    ///
    /// # Errors
    ///
    /// Returns an error if the reservation expires, fails, is not active, or
    /// output fails. Expired and failed reservations are cancelled first.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        reservation_id: u64,
        mode: WaitMode,
    ) -> Result<(), CliError> {
        let report = self.wait(ReservationId(reservation_id), mode).await?;
        format.write(writer, &report)
    }

    /// Wait according to `mode`.
    ///
    /// # Errors
    ///
    /// As [`Self::execute`].
    pub async fn wait(&self, id: ReservationId, mode: WaitMode) -> Result<WaitReport, CliError> {
        let report = match mode {
            WaitMode::Payment => {
                let reservation = self.watcher.wait_for_payment(id).await?;
                WaitReport {
                    reservation_id: id,
                    state: LifecycleState::Provisioning,
                    next_action: Some(reservation.next_action),
                    results: reservation.results,
                }
            }
            WaitMode::Deployment | WaitMode::Full => {
                let deployment = if mode == WaitMode::Full {
                    self.watcher.run(id).await?
                } else {
                    self.watcher.wait_for_deployment(id).await?
                };
                WaitReport {
                    reservation_id: id,
                    state: LifecycleState::Finished,
                    next_action: None,
                    results: deployment.results,
                }
            }
        };
        Ok(report)
    }
}
