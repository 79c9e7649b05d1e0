//! Normalized resource-unit vectors.
//!
//! Every billable workload reduces to four quantities:
//!
//! - **CRU**: compute units (virtual cores)
//! - **MRU**: memory units (GiB)
//! - **SRU**: solid-state storage units (GiB)
//! - **HRU**: spinning-disk storage units (GiB)
//!
//! A vector also remembers which workloads it summarizes, so that the payment
//! reference for a node can be rebuilt from the aggregate alone.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::{Add, AddAssign};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::WorkloadId;

/// Resource units consumed by one or more workloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceUnits {
    /// Compute units.
    pub cru: Decimal,
    /// Memory units.
    pub mru: Decimal,
    /// Solid-state storage units.
    pub sru: Decimal,
    /// Spinning-disk storage units.
    pub hru: Decimal,
    /// Workloads summarized by this vector, kept sorted.
    pub workload_ids: BTreeSet<WorkloadId>,
}

impl ResourceUnits {
    /// An empty vector.
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    /// A vector attributed to a single workload.
    #[must_use]
    pub fn for_workload(workload_id: WorkloadId) -> Self {
        Self {
            workload_ids: BTreeSet::from([workload_id]),
            ..Self::default()
        }
    }

    /// Set compute units.
    #[must_use]
    pub fn with_cru(mut self, cru: impl Into<Decimal>) -> Self {
        self.cru = cru.into();
        self
    }

    /// Set memory units.
    #[must_use]
    pub fn with_mru(mut self, mru: impl Into<Decimal>) -> Self {
        self.mru = mru.into();
        self
    }

    /// Set solid-state storage units.
    #[must_use]
    pub fn with_sru(mut self, sru: impl Into<Decimal>) -> Self {
        self.sru = sru.into();
        self
    }

    /// Set spinning-disk storage units.
    #[must_use]
    pub fn with_hru(mut self, hru: impl Into<Decimal>) -> Self {
        self.hru = hru.into();
        self
    }

    /// Merge another vector into this one.
    ///
    /// Numeric fields are summed; workload id sets are unioned.
    pub fn merge(&mut self, other: &Self) {
        self.cru += other.cru;
        self.mru += other.mru;
        self.sru += other.sru;
        self.hru += other.hru;
        self.workload_ids.extend(other.workload_ids.iter().copied());
    }

    /// True when no units and no workloads are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workload_ids.is_empty()
            && self.cru.is_zero()
            && self.mru.is_zero()
            && self.sru.is_zero()
            && self.hru.is_zero()
    }

    /// Workload ids in ascending order, joined with `-`.
    #[must_use]
    pub fn joined_workload_ids(&self) -> String {
        self.workload_ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("-")
    }
}

impl AddAssign<&ResourceUnits> for ResourceUnits {
    fn add_assign(&mut self, rhs: &ResourceUnits) {
        self.merge(rhs);
    }
}

impl Add for ResourceUnits {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self.merge(&rhs);
        self
    }
}

impl fmt::Display for ResourceUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CRU={} MRU={} SRU={} HRU={}",
            self.cru.normalize(),
            self.mru.normalize(),
            self.sru.normalize(),
            self.hru.normalize()
        )
    }
}
