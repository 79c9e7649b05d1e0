//! Verification that a customer's payment reached a farmer's wallet.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use grid_core::{
    Amount, DirectoryService, FarmId, LedgerTransaction, LedgerWallet, OwnerId, ReservationId,
    ReservationService,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::payout::reference_message;
use crate::pricing::PricingEngine;

/// A payment the farmer should find on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExpectedPayment {
    /// Reference message carried in the transaction data.
    pub message: String,
    /// Exact amount paid to the farmer's addresses.
    pub amount: Amount,
}

/// Result of matching expected payments against the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Everything that was expected.
    pub expected: Vec<ExpectedPayment>,
    /// Expected payments paired with the transaction that settled them.
    pub matched: Vec<(ExpectedPayment, String)>,
    /// Expected payments with no matching transaction.
    pub missing: Vec<ExpectedPayment>,
}

impl ReconciliationReport {
    /// True when nothing is missing.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Match transactions against a set of expected payments.
///
/// Each transaction settles at most one pending entry, and only when both its
/// message and the value paid to `addresses` are exactly equal. The input set
/// is never modified; matching works on a private pending copy.
#[must_use]
pub fn match_transactions<S: AsRef<str>>(
    expected: &BTreeSet<ExpectedPayment>,
    transactions: &[LedgerTransaction],
    addresses: &[S],
) -> ReconciliationReport {
    let mut pending = expected.clone();
    let mut matched = Vec::new();

    for tx in transactions {
        if pending.is_empty() {
            break;
        }
        let Some(message) = tx.message() else {
            continue;
        };
        let amount = match tx.value_to(addresses) {
            Ok(amount) => amount,
            Err(e) => {
                warn!(tx_id = %tx.id, error = %e, "skipping transaction");
                continue;
            }
        };
        let key = ExpectedPayment {
            message: message.to_string(),
            amount,
        };
        if pending.remove(&key) {
            debug!(tx_id = %tx.id, message = %key.message, amount = %key.amount, "payment matched");
            matched.push((key, tx.id.clone()));
        }
    }

    ReconciliationReport {
        expected: expected.iter().cloned().collect(),
        matched,
        missing: pending.into_iter().collect(),
    }
}

/// Checks the ledger for a reservation's farmer payments.
pub struct PaymentReconciler<D, R, W> {
    pricing: PricingEngine<D>,
    reservations: Arc<R>,
    wallet: Arc<W>,
}

impl<D, R, W> PaymentReconciler<D, R, W>
where
    D: DirectoryService,
    R: ReservationService,
    W: LedgerWallet,
{
    /// Create a reconciler over the given collaborators.
    pub fn new(directory: Arc<D>, reservations: Arc<R>, wallet: Arc<W>) -> Self {
        Self {
            pricing: PricingEngine::new(directory),
            reservations,
            wallet,
        }
    }

    /// Payments expected for the nodes of `reservation_id` hosted on `farms`.
    ///
    /// # Errors
    ///
    /// Reservation fetch, aggregation and pricing errors.
    pub async fn expected_payments(
        &self,
        reservation_id: ReservationId,
        farms: &HashSet<FarmId>,
    ) -> Result<BTreeSet<ExpectedPayment>> {
        let reservation = self.reservations.get_reservation(reservation_id).await?;
        let priced = self.pricing.price_reservation(&reservation).await?;

        Ok(priced
            .iter()
            .filter(|node| node.is_billable())
            .filter_map(|node| {
                let pricing = node.pricing.as_ref()?;
                farms.contains(&pricing.farm_id).then(|| ExpectedPayment {
                    message: reference_message(reservation_id, &node.units),
                    amount: pricing.total_cost,
                })
            })
            .collect())
    }

    /// Full reconciliation report for the caller's farms.
    ///
    /// # Errors
    ///
    /// Collaborator and pricing errors.
    pub async fn reconcile(
        &self,
        reservation_id: ReservationId,
        farms: &HashSet<FarmId>,
    ) -> Result<ReconciliationReport> {
        let expected = self.expected_payments(reservation_id, farms).await?;
        let addresses = self.wallet.addresses().await?;
        let transactions = self.wallet.transactions().await?;

        let report = match_transactions(&expected, &transactions, &addresses);
        info!(
            reservation_id = %reservation_id,
            expected = report.expected.len(),
            matched = report.matched.len(),
            missing = report.missing.len(),
            "reconciled payments"
        );
        Ok(report)
    }

    /// True iff every expected payment for the caller's farms is on the ledger.
    ///
    /// # Errors
    ///
    /// Collaborator and pricing errors.
    pub async fn verify_payment(
        &self,
        reservation_id: ReservationId,
        farms: &HashSet<FarmId>,
    ) -> Result<bool> {
        Ok(self.reconcile(reservation_id, farms).await?.is_settled())
    }

    /// [`Self::verify_payment`] for the farms `owner` holds in the directory.
    ///
    /// # Errors
    ///
    /// Collaborator and pricing errors.
    pub async fn verify_payment_for_owner(
        &self,
        reservation_id: ReservationId,
        owner: OwnerId,
    ) -> Result<bool> {
        let farms: HashSet<FarmId> = self
            .pricing
            .directory()
            .farms_owned_by(owner)
            .await?
            .into_iter()
            .map(|f| f.id)
            .collect();
        self.verify_payment(reservation_id, &farms).await
    }
}
