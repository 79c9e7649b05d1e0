//! Cost command implementation.

use std::io::Write;
use std::sync::Arc;

use grid_accounting::{AccountingError, PricingEngine};
use grid_core::{Amount, ReservationId, ReservationService};

use crate::error::CliError;
use crate::output::{CostReport, OutputFormat};
use crate::snapshot::SnapshotBackend;

/// Cost command executor.
pub struct CostCommand {
    backend: Arc<SnapshotBackend>,
}

impl CostCommand {
    /// Create a new cost command.
    #[must_use]
    pub const fn new(backend: Arc<SnapshotBackend>) -> Self {
        Self { backend }
    }

    /// Execute the cost command.
    ///
    /// # Errors
    ///
    /// Returns an error if the reservation cannot be priced or output fails.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        reservation_id: u64,
    ) -> Result<(), CliError> {
        let report = self.fetch_cost(ReservationId(reservation_id)).await?;
        format.write(writer, &report)
    }

    /// Price a reservation node by node.
    ///
    /// # Errors
    ///
    /// Returns an error if the reservation cannot be priced.
    pub async fn fetch_cost(&self, reservation_id: ReservationId) -> Result<CostReport, CliError> {
        let reservation = self.backend.get_reservation(reservation_id).await?;
        let engine = PricingEngine::new(Arc::clone(&self.backend));
        let nodes = engine.price_reservation(&reservation).await?;

        let mut total = Amount::ZERO;
        for node in &nodes {
            if let Some(cost) = node.total_cost() {
                total = total.checked_add(cost).ok_or_else(|| AccountingError::AmountOverflow {
                    node_id: node.node_id.clone(),
                })?;
            }
        }

        Ok(CostReport {
            reservation_id,
            currency: reservation.primary_currency().map(str::to_string),
            nodes,
            total,
        })
    }
}
