//! Groups a reservation's workloads by hosting node and kind.

use std::collections::{BTreeMap, HashSet};

use grid_core::{NodeId, Reservation, Workload, WorkloadId, WorkloadKind};

use crate::error::{AccountingError, Result};

/// Workloads scheduled on one node, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeWorkloads {
    by_kind: BTreeMap<WorkloadKind, Vec<Workload>>,
}

impl NodeWorkloads {
    fn push(&mut self, workload: Workload) {
        self.by_kind.entry(workload.kind()).or_default().push(workload);
    }

    /// Workloads of the given kind, in reservation order.
    #[must_use]
    pub fn of_kind(&self, kind: WorkloadKind) -> &[Workload] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    /// All workloads on the node.
    pub fn iter(&self) -> impl Iterator<Item = &Workload> {
        self.by_kind.values().flatten()
    }

    /// Number of workloads on the node.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_kind.values().map(Vec::len).sum()
    }

    /// True if the node hosts nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Classify a reservation's workloads per node.
///
/// Network resources land under the node named by each resource; every other
/// workload under its own node. Nodes hosting nothing get no entry.
///
/// # Errors
///
/// [`AccountingError::InvalidReservation`] when the payload carries a
/// workload kind this broker cannot bill, a workload has no node, or a
/// workload id is used twice.
pub fn classify(reservation: &Reservation) -> Result<BTreeMap<NodeId, NodeWorkloads>> {
    check_known_kinds(reservation)?;
    check_unique_ids(reservation)?;

    let mut mapping: BTreeMap<NodeId, NodeWorkloads> = BTreeMap::new();
    for workload in reservation.workloads() {
        if workload.node_id().is_blank() {
            return Err(AccountingError::InvalidReservation(format!(
                "{} workload {} has no node id",
                workload.kind(),
                workload.workload_id()
            )));
        }
        mapping
            .entry(workload.node_id().clone())
            .or_default()
            .push(workload);
    }
    Ok(mapping)
}

fn check_known_kinds(reservation: &Reservation) -> Result<()> {
    match reservation.data_reservation.unrecognized_workloads().next() {
        Some((kind, count)) => Err(AccountingError::InvalidReservation(format!(
            "reservation {}: unrecognized workload kind {kind:?} ({count} workloads)",
            reservation.id
        ))),
        None => Ok(()),
    }
}

fn check_unique_ids(reservation: &Reservation) -> Result<()> {
    let data = &reservation.data_reservation;
    let ids = data
        .zdbs
        .iter()
        .map(|w| w.workload_id)
        .chain(data.volumes.iter().map(|w| w.workload_id))
        .chain(data.containers.iter().map(|w| w.workload_id))
        .chain(data.networks.iter().map(|w| w.workload_id))
        .chain(data.kubernetes.iter().map(|w| w.workload_id));

    let mut seen: HashSet<WorkloadId> = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(AccountingError::InvalidReservation(format!(
                "reservation {}: workload id {id} is used more than once",
                reservation.id
            )));
        }
    }
    Ok(())
}
