//! Farmer payouts.
//!
//! One ledger payment per priced node. Submissions are never retried: a
//! payment whose outcome is unknown is reported, not resent.

use std::sync::Arc;

use grid_core::{Amount, FarmId, LedgerTransaction, LedgerWallet, NodeId, ReservationId, ResourceUnits};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::aggregate::NodeAggregate;
use crate::error::{AccountingError, Result};

/// Reference message attached to a payment: the reservation id followed by
/// the sorted workload ids, all joined by `-`.
#[must_use]
pub fn reference_message(reservation_id: ReservationId, units: &ResourceUnits) -> String {
    if units.workload_ids.is_empty() {
        return reservation_id.to_string();
    }
    format!("{reservation_id}-{}", units.joined_workload_ids())
}

/// A single payment to submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutInstruction {
    /// Node being paid for.
    pub node_id: NodeId,
    /// Farm receiving the payment.
    pub farm_id: FarmId,
    /// Farm wallet address.
    pub recipient: String,
    /// Amount owed.
    pub amount: Amount,
    /// Reference message.
    pub reference: String,
}

/// A payment the ledger accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentPayout {
    /// What was sent.
    pub instruction: PayoutInstruction,
    /// The resulting transaction.
    pub transaction: LedgerTransaction,
}

/// A payment whose outcome is unknown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmbiguousPayout {
    /// What was attempted.
    pub instruction: PayoutInstruction,
    /// What the ledger said.
    pub reason: String,
}

impl AmbiguousPayout {
    /// The matching error value.
    #[must_use]
    pub fn to_error(&self) -> AccountingError {
        AccountingError::PaymentAmbiguous {
            recipient: self.instruction.recipient.clone(),
            amount: self.instruction.amount.to_canonical_string(),
            reference: self.instruction.reference.clone(),
            reason: self.reason.clone(),
        }
    }
}

/// Outcome of a payout run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayoutBatch {
    /// Accepted payments.
    pub sent: Vec<SentPayout>,
    /// Payments the ledger cleanly refused.
    pub rejected: Vec<PayoutInstruction>,
    /// Payments in an unknown state.
    pub ambiguous: Vec<AmbiguousPayout>,
}

impl PayoutBatch {
    /// True if every payment was accepted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty() && self.ambiguous.is_empty()
    }

    /// Fail unless every payment was accepted.
    ///
    /// # Errors
    ///
    /// [`AccountingError::PaymentAmbiguous`] for the first payment with an
    /// unknown outcome; these need manual reconciliation and take precedence.
    /// Otherwise [`AccountingError::PaymentRejected`] if any was refused.
    pub fn ensure_complete(&self) -> Result<()> {
        if let Some(ambiguous) = self.ambiguous.first() {
            return Err(ambiguous.to_error());
        }
        if !self.rejected.is_empty() {
            return Err(AccountingError::PaymentRejected {
                count: self.rejected.len(),
            });
        }
        Ok(())
    }
}

/// Builds and submits farmer payments.
#[derive(Debug)]
pub struct PayoutPlanner<W> {
    wallet: Arc<W>,
}

impl<W: LedgerWallet> PayoutPlanner<W> {
    /// Create a planner paying from `wallet`.
    pub fn new(wallet: Arc<W>) -> Self {
        Self { wallet }
    }

    /// Build one instruction per billable priced aggregate.
    ///
    /// # Errors
    ///
    /// [`AccountingError::NotPriced`] if a billable aggregate has no pricing.
    pub fn plan(
        &self,
        reservation_id: ReservationId,
        aggregates: &[NodeAggregate],
    ) -> Result<Vec<PayoutInstruction>> {
        aggregates
            .iter()
            .filter(|node| node.is_billable())
            .map(|node| {
                let pricing = node.pricing.as_ref().ok_or_else(|| AccountingError::NotPriced {
                    node_id: node.node_id.clone(),
                })?;
                Ok(PayoutInstruction {
                    node_id: node.node_id.clone(),
                    farm_id: pricing.farm_id,
                    recipient: pricing.wallet_address.clone(),
                    amount: pricing.total_cost,
                    reference: reference_message(reservation_id, &node.units),
                })
            })
            .collect()
    }

    /// Plan and submit payments, one attempt each.
    ///
    /// # Errors
    ///
    /// Only planning errors. Ledger failures are recorded in the batch.
    pub async fn payout(
        &self,
        reservation_id: ReservationId,
        aggregates: &[NodeAggregate],
    ) -> Result<PayoutBatch> {
        let instructions = self.plan(reservation_id, aggregates)?;
        let mut batch = PayoutBatch::default();

        for instruction in instructions {
            let amount = instruction.amount.to_canonical_string();
            match self
                .wallet
                .send_coins(&instruction.recipient, &amount, &instruction.reference)
                .await
            {
                Ok((transaction, true)) => {
                    info!(
                        reservation_id = %reservation_id,
                        recipient = %instruction.recipient,
                        amount = %amount,
                        tx_id = %transaction.id,
                        "payout sent"
                    );
                    batch.sent.push(SentPayout {
                        instruction,
                        transaction,
                    });
                }
                Ok((_, false)) => {
                    warn!(
                        reservation_id = %reservation_id,
                        recipient = %instruction.recipient,
                        amount = %amount,
                        "payout rejected by ledger"
                    );
                    batch.rejected.push(instruction);
                }
                Err(e) => {
                    let ambiguous = AmbiguousPayout {
                        instruction,
                        reason: e.to_string(),
                    };
                    warn!(reservation_id = %reservation_id, error = %ambiguous.to_error(), "payout outcome unknown");
                    batch.ambiguous.push(ambiguous);
                }
            }
        }
        Ok(batch)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::aggregate::NodePricing;
    use crate::pricing::tests::amount;
    use grid_core::{GridError, WorkloadId};

    /// Records submissions; behaviour per recipient.
    #[derive(Default)]
    pub(crate) struct FakeWallet {
        pub addresses: Vec<String>,
        pub transactions: Vec<LedgerTransaction>,
        pub reject: Vec<String>,
        pub fail: Vec<String>,
        pub sent: Mutex<Vec<(String, String, String)>>,
    }

    impl LedgerWallet for FakeWallet {
        async fn addresses(&self) -> grid_core::Result<Vec<String>> {
            Ok(self.addresses.clone())
        }

        async fn transactions(&self) -> grid_core::Result<Vec<LedgerTransaction>> {
            Ok(self.transactions.clone())
        }

        async fn send_coins(
            &self,
            recipient: &str,
            amount: &str,
            data: &str,
        ) -> grid_core::Result<(LedgerTransaction, bool)> {
            self.sent
                .lock()
                .expect("lock")
                .push((recipient.into(), amount.into(), data.into()));
            if self.fail.iter().any(|r| r == recipient) {
                return Err(GridError::unavailable("ledger", "connection reset"));
            }
            let tx = LedgerTransaction {
                id: format!("tx-{recipient}"),
                coin_outputs: Vec::new(),
                data: data.as_bytes().to_vec(),
            };
            Ok((tx, !self.reject.iter().any(|r| r == recipient)))
        }
    }

    fn priced(node: &str, ids: &[u64], wallet: &str, total: &str) -> NodeAggregate {
        let mut agg = NodeAggregate::new(NodeId::new(node));
        for id in ids {
            agg.units.merge(&ResourceUnits::for_workload(WorkloadId(*id)));
        }
        agg.pricing = Some(NodePricing {
            farm_id: FarmId(1),
            wallet_address: wallet.into(),
            currency: "TFT".into(),
            cru_cost: amount(total),
            sru_cost: Amount::ZERO,
            hru_cost: Amount::ZERO,
            mru_cost: Amount::ZERO,
            total_cost: amount(total),
        });
        agg
    }

    #[test]
    fn reference_message_sorts_ids() {
        let mut units = ResourceUnits::for_workload(WorkloadId(9));
        units.merge(&ResourceUnits::for_workload(WorkloadId(2)));
        units.merge(&ResourceUnits::for_workload(WorkloadId(13)));
        assert_eq!(reference_message(ReservationId(44), &units), "44-2-9-13");
    }

    #[test]
    fn plan_requires_pricing() {
        let planner = PayoutPlanner::new(Arc::new(FakeWallet::default()));
        let mut agg = NodeAggregate::new(NodeId::new("n1"));
        agg.units.merge(&ResourceUnits::for_workload(WorkloadId(1)));
        let err = planner.plan(ReservationId(1), &[agg]).unwrap_err();
        assert!(matches!(err, AccountingError::NotPriced { .. }));
    }

    #[test]
    fn plan_skips_network_only_nodes() {
        let planner = PayoutPlanner::new(Arc::new(FakeWallet::default()));
        let aggs = [NodeAggregate::new(NodeId::new("gw")), priced("n1", &[3], "w1", "2.5")];
        let plan = planner.plan(ReservationId(8), &aggs).expect("plan");
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].reference, "8-3");
        assert_eq!(plan[0].amount, amount("2.5"));
    }

    #[tokio::test]
    async fn payout_sorts_outcomes() {
        let wallet = Arc::new(FakeWallet {
            reject: vec!["w2".into()],
            fail: vec!["w3".into()],
            ..FakeWallet::default()
        });
        let planner = PayoutPlanner::new(Arc::clone(&wallet));
        let aggs = [
            priced("n1", &[1], "w1", "3.60"),
            priced("n2", &[2], "w2", "1"),
            priced("n3", &[3, 4], "w3", "0.5"),
        ];

        let batch = planner.payout(ReservationId(7), &aggs).await.expect("payout");
        assert_eq!(batch.sent.len(), 1);
        assert_eq!(batch.sent[0].transaction.id, "tx-w1");
        assert_eq!(batch.rejected.len(), 1);
        assert_eq!(batch.rejected[0].recipient, "w2");
        assert_eq!(batch.ambiguous.len(), 1);
        assert!(!batch.is_complete());

        let err = batch.ambiguous[0].to_error();
        assert!(err.to_string().contains("7-3-4"));
        assert!(matches!(
            batch.ensure_complete(),
            Err(AccountingError::PaymentAmbiguous { ref reference, .. }) if reference == "7-3-4"
        ));

        let sent = wallet.sent.lock().expect("lock");
        assert_eq!(sent.len(), 3, "each payment is attempted exactly once");
        assert_eq!(sent[0], ("w1".into(), "3.6".into(), "7-1".into()));
    }

    #[tokio::test]
    async fn rejected_payments_leave_batch_incomplete() {
        let wallet = Arc::new(FakeWallet {
            reject: vec!["w2".into()],
            ..FakeWallet::default()
        });
        let planner = PayoutPlanner::new(wallet);
        let aggs = [priced("n1", &[1], "w1", "1"), priced("n2", &[2], "w2", "1")];

        let batch = planner.payout(ReservationId(7), &aggs).await.expect("payout");
        assert!(matches!(
            batch.ensure_complete(),
            Err(AccountingError::PaymentRejected { count: 1 })
        ));
    }

    #[tokio::test]
    async fn accepted_payments_are_complete() {
        let planner = PayoutPlanner::new(Arc::new(FakeWallet::default()));
        let batch = planner
            .payout(ReservationId(7), &[priced("n1", &[1], "w1", "1")])
            .await
            .expect("payout");
        assert!(batch.ensure_complete().is_ok());
    }
}
