//! Payout command implementation.

use std::io::Write;
use std::sync::Arc;

use grid_accounting::{PayoutPlanner, PricingEngine};
use grid_core::{ReservationId, ReservationService};

use crate::error::CliError;
use crate::output::{OutputFormat, PayoutReport};
use crate::snapshot::SnapshotBackend;

/// Payout command executor.
pub struct PayoutCommand {
    backend: Arc<SnapshotBackend>,
}

impl PayoutCommand {
    /// Create a new payout command.
    #[must_use]
    pub const fn new(backend: Arc<SnapshotBackend>) -> Self {
        Self { backend }
    }

    /// Execute the payout command.
    ///
    /// # Errors
    ///
    /// Returns an error if pricing fails or output fails. Payments that were
    /// rejected or have an unknown outcome are written out first, then
    /// returned as an error.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        reservation_id: u64,
        dry_run: bool,
    ) -> Result<(), CliError> {
        let report = self.pay(ReservationId(reservation_id), dry_run).await?;
        format.write(writer, &report)?;
        outcome(&report)
    }

    /// Price the reservation and, unless `dry_run`, pay every farmer.
    ///
    /// # Errors
    ///
    /// Returns an error if the reservation cannot be priced.
    pub async fn pay(&self, reservation_id: ReservationId, dry_run: bool) -> Result<PayoutReport, CliError> {
        let reservation = self.backend.get_reservation(reservation_id).await?;
        let priced = PricingEngine::new(Arc::clone(&self.backend))
            .price_reservation(&reservation)
            .await?;

        let planner = PayoutPlanner::new(Arc::clone(&self.backend));
        let planned = planner.plan(reservation_id, &priced)?;
        let batch = if dry_run {
            None
        } else {
            Some(planner.payout(reservation_id, &priced).await?)
        };

        Ok(PayoutReport {
            reservation_id,
            planned,
            batch,
        })
    }
}

/// Ambiguous payments must be reconciled by hand before anything is resent.
fn outcome(report: &PayoutReport) -> Result<(), CliError> {
    match &report.batch {
        Some(batch) => batch.ensure_complete().map_err(CliError::from),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures::snapshot;
    use crate::cli::Format;
    use grid_accounting::{AccountingError, AmbiguousPayout, PayoutBatch, PayoutInstruction};
    use grid_core::{FarmId, LedgerWallet, NodeId};

    #[tokio::test]
    async fn dry_run_sends_nothing() {
        let backend = Arc::new(SnapshotBackend::in_memory(snapshot()));
        let cmd = PayoutCommand::new(Arc::clone(&backend));
        let report = cmd.pay(ReservationId(5), true).await.unwrap();
        assert_eq!(report.planned.len(), 1);
        assert!(report.batch.is_none());
        assert!(backend.transactions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn payout_records_transaction() {
        let backend = Arc::new(SnapshotBackend::in_memory(snapshot()));
        let cmd = PayoutCommand::new(Arc::clone(&backend));
        let report = cmd.pay(ReservationId(5), false).await.unwrap();

        let batch = report.batch.unwrap();
        assert_eq!(batch.sent.len(), 1);
        assert!(batch.is_complete());

        let txs = backend.transactions().await.unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].message(), Some("5-1"));
    }

    #[tokio::test]
    async fn rejected_payout_fails_after_reporting() {
        let mut s = snapshot();
        s.farms[0].wallet_addresses[0].address = " ".into();
        let cmd = PayoutCommand::new(Arc::new(SnapshotBackend::in_memory(s)));

        let mut out = Vec::new();
        let err = cmd
            .execute(&mut out, &OutputFormat::new(Format::Table), 5, false)
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Accounting(AccountingError::PaymentRejected { count: 1 })));
        assert!(String::from_utf8(out).unwrap().contains("rejected"));
    }

    #[test]
    fn ambiguous_payout_is_an_error() {
        let instruction = PayoutInstruction {
            node_id: NodeId::new("node-1"),
            farm_id: FarmId(3),
            recipient: "farmer-wallet".into(),
            amount: "3.6".parse().unwrap(),
            reference: "5-1".into(),
        };
        let report = PayoutReport {
            reservation_id: ReservationId(5),
            planned: vec![instruction.clone()],
            batch: Some(PayoutBatch {
                ambiguous: vec![AmbiguousPayout {
                    instruction,
                    reason: "ledger unavailable: connection reset".into(),
                }],
                ..PayoutBatch::default()
            }),
        };

        let err = outcome(&report).unwrap_err();
        assert!(matches!(err, CliError::Accounting(AccountingError::PaymentAmbiguous { .. })));
        assert!(err.to_string().contains("unknown outcome"));
    }

    #[test]
    fn dry_run_is_never_an_error() {
        let report = PayoutReport {
            reservation_id: ReservationId(5),
            planned: Vec::new(),
            batch: None,
        };
        assert!(outcome(&report).is_ok());
    }
}
