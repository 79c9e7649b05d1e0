//! JSON snapshot backend serving every collaborator.

use std::path::{Path, PathBuf};

use grid_core::{
    CoinOutput, DirectoryService, Farm, FarmId, GridError, LedgerTransaction, LedgerWallet,
    NextAction, Node, NodeId, OwnerId, Reservation, ReservationId, ReservationService,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Wallet part of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSnapshot {
    /// Addresses the wallet owns.
    #[serde(default)]
    pub addresses: Vec<String>,
    /// Transactions the wallet has seen or sent.
    #[serde(default)]
    pub transactions: Vec<LedgerTransaction>,
}

/// Everything the broker reads from the outside world.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Directory nodes.
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Directory farms.
    #[serde(default)]
    pub farms: Vec<Farm>,
    /// Reservation records.
    #[serde(default)]
    pub reservations: Vec<Reservation>,
    /// Our ledger wallet.
    #[serde(default)]
    pub wallet: WalletSnapshot,
}

/// Directory, reservation service and ledger wallet over one [`Snapshot`].
///
/// When backed by a file, every call re-reads it and every mutation writes it
/// back, so the file stays the source of truth.
#[derive(Debug)]
pub struct SnapshotBackend {
    state: Mutex<Snapshot>,
    path: Option<PathBuf>,
    default_currency: Option<String>,
}

impl SnapshotBackend {
    /// A backend over an in-memory snapshot.
    #[must_use]
    pub fn in_memory(snapshot: Snapshot) -> Self {
        Self {
            state: Mutex::new(snapshot),
            path: None,
            default_currency: None,
        }
    }

    /// A backend over the snapshot file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn open(path: impl Into<PathBuf>) -> grid_core::Result<Self> {
        let path = path.into();
        let snapshot = read_snapshot(&path).await?;
        info!(
            path = %path.display(),
            nodes = snapshot.nodes.len(),
            farms = snapshot.farms.len(),
            reservations = snapshot.reservations.len(),
            "loaded snapshot"
        );
        Ok(Self {
            state: Mutex::new(snapshot),
            path: Some(path),
            default_currency: None,
        })
    }

    /// Assume `currency` for reservations that list no currency.
    #[must_use]
    pub fn with_default_currency(mut self, currency: Option<String>) -> Self {
        self.default_currency = currency;
        self
    }

    /// A copy of the current snapshot.
    pub async fn snapshot(&self) -> grid_core::Result<Snapshot> {
        self.refresh().await?;
        Ok(self.state.lock().await.clone())
    }

    async fn refresh(&self) -> grid_core::Result<()> {
        if let Some(path) = &self.path {
            let snapshot = read_snapshot(path).await?;
            *self.state.lock().await = snapshot;
        }
        Ok(())
    }

    async fn store(&self, snapshot: &Snapshot) -> grid_core::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let raw = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| GridError::unavailable("snapshot", e.to_string()))?;
        tokio::fs::write(path, raw)
            .await
            .map_err(|e| GridError::unavailable("snapshot", format!("{}: {e}", path.display())))
    }
}

async fn read_snapshot(path: &Path) -> grid_core::Result<Snapshot> {
    let raw = tokio::fs::read(path)
        .await
        .map_err(|e| GridError::unavailable("snapshot", format!("{}: {e}", path.display())))?;
    serde_json::from_slice(&raw)
        .map_err(|e| GridError::unavailable("snapshot", format!("{}: {e}", path.display())))
}

impl DirectoryService for SnapshotBackend {
    async fn get_node(&self, node_id: &NodeId) -> grid_core::Result<Node> {
        self.refresh().await?;
        self.state
            .lock()
            .await
            .nodes
            .iter()
            .find(|n| &n.node_id == node_id)
            .cloned()
            .ok_or_else(|| GridError::node_not_found(node_id.as_str()))
    }

    async fn get_farm(&self, farm_id: FarmId) -> grid_core::Result<Farm> {
        self.refresh().await?;
        self.state
            .lock()
            .await
            .farms
            .iter()
            .find(|f| f.id == farm_id)
            .cloned()
            .ok_or(GridError::FarmNotFound { farm_id: farm_id.0 })
    }

    async fn farms_owned_by(&self, owner: OwnerId) -> grid_core::Result<Vec<Farm>> {
        self.refresh().await?;
        Ok(self
            .state
            .lock()
            .await
            .farms
            .iter()
            .filter(|f| f.threebot_id == owner)
            .cloned()
            .collect())
    }
}

impl ReservationService for SnapshotBackend {
    async fn get_reservation(&self, id: ReservationId) -> grid_core::Result<Reservation> {
        self.refresh().await?;
        let mut reservation = self
            .state
            .lock()
            .await
            .reservations
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(GridError::ReservationNotFound { reservation_id: id.0 })?;
        if reservation.data_reservation.currencies.is_empty() {
            if let Some(currency) = &self.default_currency {
                reservation.data_reservation.currencies.push(currency.clone());
            }
        }
        Ok(reservation)
    }

    async fn cancel_reservation(&self, id: ReservationId) -> grid_core::Result<()> {
        self.refresh().await?;
        let mut state = self.state.lock().await;
        let reservation = state
            .reservations
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(GridError::ReservationNotFound { reservation_id: id.0 })?;
        reservation.next_action = NextAction::Delete;
        info!(reservation_id = %id, "reservation cancelled");
        self.store(&state).await
    }
}

impl LedgerWallet for SnapshotBackend {
    async fn addresses(&self) -> grid_core::Result<Vec<String>> {
        self.refresh().await?;
        Ok(self.state.lock().await.wallet.addresses.clone())
    }

    async fn transactions(&self) -> grid_core::Result<Vec<LedgerTransaction>> {
        self.refresh().await?;
        Ok(self.state.lock().await.wallet.transactions.clone())
    }

    async fn send_coins(
        &self,
        recipient: &str,
        amount: &str,
        data: &str,
    ) -> grid_core::Result<(LedgerTransaction, bool)> {
        let value = amount.parse()?;
        let tx = LedgerTransaction {
            id: uuid::Uuid::new_v4().to_string(),
            coin_outputs: vec![CoinOutput {
                address: recipient.to_string(),
                value,
            }],
            data: data.as_bytes().to_vec(),
        };
        if recipient.trim().is_empty() {
            debug!(amount, "refusing payment without recipient");
            return Ok((tx, false));
        }

        self.refresh().await?;
        let mut state = self.state.lock().await;
        state.wallet.transactions.push(tx.clone());
        self.store(&state).await?;
        debug!(tx_id = %tx.id, recipient, amount, "recorded payment");
        Ok((tx, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_core::DataReservation;

    fn reservation(id: u64) -> Reservation {
        Reservation {
            id: ReservationId(id),
            customer_tid: OwnerId(1),
            next_action: NextAction::Pay,
            data_reservation: DataReservation::default(),
            results: Vec::new(),
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot {
            reservations: vec![reservation(1)],
            ..Snapshot::default()
        }
    }

    #[tokio::test]
    async fn default_currency_fills_empty_lists() {
        let backend = SnapshotBackend::in_memory(snapshot()).with_default_currency(Some("TFT".into()));
        let r = backend.get_reservation(ReservationId(1)).await.unwrap();
        assert_eq!(r.primary_currency(), Some("TFT"));
    }

    #[tokio::test]
    async fn missing_reservation_is_not_found() {
        let backend = SnapshotBackend::in_memory(snapshot());
        let err = backend.get_reservation(ReservationId(2)).await.unwrap_err();
        assert!(matches!(err, GridError::ReservationNotFound { reservation_id: 2 }));
    }

    #[tokio::test]
    async fn cancel_marks_delete_and_persists() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), serde_json::to_vec(&snapshot()).unwrap()).unwrap();

        let backend = SnapshotBackend::open(file.path()).await.unwrap();
        backend.cancel_reservation(ReservationId(1)).await.unwrap();

        let reopened = SnapshotBackend::open(file.path()).await.unwrap();
        let r = reopened.get_reservation(ReservationId(1)).await.unwrap();
        assert_eq!(r.next_action, NextAction::Delete);
    }

    #[tokio::test]
    async fn sent_coins_show_up_as_transactions() {
        let backend = SnapshotBackend::in_memory(snapshot());
        let (tx, accepted) = backend.send_coins("farmer", "3.6", "1-2").await.unwrap();
        assert!(accepted);
        assert_eq!(tx.message(), Some("1-2"));

        let txs = backend.transactions().await.unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].value_to(&["farmer"]).unwrap(), "3.6".parse().unwrap());
    }

    #[tokio::test]
    async fn blank_recipient_is_rejected() {
        let backend = SnapshotBackend::in_memory(snapshot());
        let (_, accepted) = backend.send_coins(" ", "1", "x").await.unwrap();
        assert!(!accepted);
        assert!(backend.transactions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn file_changes_are_picked_up() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), serde_json::to_vec(&snapshot()).unwrap()).unwrap();
        let backend = SnapshotBackend::open(file.path()).await.unwrap();

        let mut updated = snapshot();
        updated.reservations[0].next_action = NextAction::Deploy;
        std::fs::write(file.path(), serde_json::to_vec(&updated).unwrap()).unwrap();

        let r = backend.get_reservation(ReservationId(1)).await.unwrap();
        assert_eq!(r.next_action, NextAction::Deploy);
    }
}
