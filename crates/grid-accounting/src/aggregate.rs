//! Per-node resource aggregation.

use std::fmt;

use grid_core::{Amount, FarmId, NodeId, Reservation, ResourceUnits};
use serde::{Deserialize, Serialize};

use crate::classify::classify;
use crate::convert::to_resource_units;
use crate::error::Result;

/// Cost annotation added by the pricing engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePricing {
    /// Farm hosting the node.
    pub farm_id: FarmId,
    /// Wallet the farmer is paid to.
    pub wallet_address: String,
    /// Currency of the prices used.
    pub currency: String,
    /// Compute cost.
    pub cru_cost: Amount,
    /// SSD cost.
    pub sru_cost: Amount,
    /// HDD cost.
    pub hru_cost: Amount,
    /// Memory cost.
    pub mru_cost: Amount,
    /// Sum of the four class costs.
    pub total_cost: Amount,
}

/// Resource units consumed on one node by one reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAggregate {
    /// Node the units are consumed on.
    pub node_id: NodeId,
    /// Summed units and the workloads they came from.
    pub units: ResourceUnits,
    /// Set once the aggregate has been priced.
    pub pricing: Option<NodePricing>,
}

impl NodeAggregate {
    /// An unpriced, empty aggregate for `node_id`.
    #[must_use]
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            units: ResourceUnits::zero(),
            pricing: None,
        }
    }

    /// True if at least one billable workload runs on the node.
    #[must_use]
    pub fn is_billable(&self) -> bool {
        !self.units.workload_ids.is_empty()
    }

    /// Total cost, once priced.
    #[must_use]
    pub fn total_cost(&self) -> Option<Amount> {
        self.pricing.as_ref().map(|p| p.total_cost)
    }
}

impl fmt::Display for NodeAggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let u = &self.units;
        writeln!(f, "Resource units for node {}:", self.node_id)?;
        match &self.pricing {
            None => write!(f, "  {u}"),
            Some(p) => {
                writeln!(f, "  farm {} ({})", p.farm_id, p.currency)?;
                writeln!(f, "  CRU: {:>8} cost {}", u.cru.normalize(), p.cru_cost)?;
                writeln!(f, "  SRU: {:>8} cost {}", u.sru.normalize(), p.sru_cost)?;
                writeln!(f, "  HRU: {:>8} cost {}", u.hru.normalize(), p.hru_cost)?;
                writeln!(f, "  MRU: {:>8} cost {}", u.mru.normalize(), p.mru_cost)?;
                write!(f, "  total {} to {}", p.total_cost, p.wallet_address)
            }
        }
    }
}

/// Sum the resource units of every workload in a reservation, per node.
///
/// One aggregate per node that hosts anything (including nodes that only
/// carry network resources), ordered by node id. The result does not depend
/// on the order workloads appear in the reservation.
///
/// # Errors
///
/// Any classification or conversion error aborts the whole pass.
pub fn aggregate(reservation: &Reservation) -> Result<Vec<NodeAggregate>> {
    let per_node = classify(reservation)?;
    let mut aggregates = Vec::with_capacity(per_node.len());
    for (node_id, workloads) in per_node {
        let mut node = NodeAggregate::new(node_id);
        for workload in workloads.iter() {
            if let Some(units) = to_resource_units(workload)? {
                node.units.merge(&units);
            }
        }
        aggregates.push(node);
    }
    Ok(aggregates)
}
