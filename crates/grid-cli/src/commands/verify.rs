//! Verify-payment command implementation.

use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;

use grid_accounting::PaymentReconciler;
use grid_core::{DirectoryService, FarmId, OwnerId, ReservationId};

use crate::error::CliError;
use crate::output::{OutputFormat, VerifyReport};
use crate::snapshot::SnapshotBackend;

/// Whose farms to check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FarmSelection {
    /// These farms.
    Farms(Vec<u64>),
    /// Every farm this identity owns.
    Owner(u64),
}

/// Verify-payment command executor.
pub struct VerifyCommand {
    backend: Arc<SnapshotBackend>,
}

impl VerifyCommand {
    /// Create a new verify command.
    #[must_use]
    pub const fn new(backend: Arc<SnapshotBackend>) -> Self {
        Self { backend }
    }

    /// Execute the verify command.
    ///
    /// # Errors
    ///
    /// Returns an error if reconciliation or output fails.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        reservation_id: u64,
        selection: &FarmSelection,
    ) -> Result<(), CliError> {
        let report = self.verify(ReservationId(reservation_id), selection).await?;
        format.write(writer, &report)
    }

    /// Reconcile the reservation's payments for the selected farms.
    ///
    /// # Errors
    ///
    /// Returns an error if the selection is empty or reconciliation fails.
    pub async fn verify(
        &self,
        reservation_id: ReservationId,
        selection: &FarmSelection,
    ) -> Result<VerifyReport, CliError> {
        let farms: HashSet<FarmId> = match selection {
            FarmSelection::Farms(ids) if ids.is_empty() => {
                return Err(CliError::InvalidArgument(
                    "pass --farm or --owner (or set owner_id in the config)".into(),
                ));
            }
            FarmSelection::Farms(ids) => ids.iter().copied().map(FarmId).collect(),
            FarmSelection::Owner(owner) => self
                .backend
                .farms_owned_by(OwnerId(*owner))
                .await?
                .into_iter()
                .map(|f| f.id)
                .collect(),
        };

        let reconciler = PaymentReconciler::new(
            Arc::clone(&self.backend),
            Arc::clone(&self.backend),
            Arc::clone(&self.backend),
        );
        let report = reconciler.reconcile(reservation_id, &farms).await?;
        Ok(VerifyReport {
            reservation_id,
            settled: report.is_settled(),
            report,
        })
    }
}
