//! Workload to resource-unit conversion.
//!
//! | kind       | CRU | MRU            | SRU        | HRU        |
//! |------------|-----|----------------|------------|------------|
//! | container  | cpu | memory / 1024  | -          | -          |
//! | volume     | -   | -              | size (SSD) | size (HDD) |
//! | zdb        | -   | -              | size (SSD) | size (HDD) |
//! | kubernetes | tier table below                              |
//!
//! Kubernetes tiers: `1` is 1 CRU, 2 MRU, 50 SRU; `2` is 2 CRU, 4 MRU,
//! 100 SRU.

use grid_core::{DiskType, ResourceUnits, Workload, WorkloadId};
use rust_decimal::Decimal;

use crate::error::{AccountingError, Result};

/// MiB per memory unit.
const MIB_PER_MRU: u64 = 1024;

/// Convert one workload into the units it consumes.
///
/// Network resources consume no billable capacity and yield `None`.
///
/// # Errors
///
/// [`AccountingError::UnsupportedMediaClass`] for storage on an unknown media
/// class, [`AccountingError::UnsupportedTier`] for an unknown kubernetes tier.
pub fn to_resource_units(workload: &Workload) -> Result<Option<ResourceUnits>> {
    let units = match workload {
        Workload::Container(c) => ResourceUnits::for_workload(c.workload_id)
            .with_cru(c.capacity.cpu)
            .with_mru(Decimal::from(c.capacity.memory) / Decimal::from(MIB_PER_MRU)),
        Workload::Volume(v) => storage_units(v.workload_id, v.size, &v.disk_type)?,
        Workload::Zdb(z) => storage_units(z.workload_id, z.size, &z.disk_type)?,
        Workload::Kubernetes(k) => {
            let (cru, mru, sru) = match k.size {
                1 => (1, 2, 50),
                2 => (2, 4, 100),
                tier => {
                    return Err(AccountingError::UnsupportedTier {
                        workload_id: k.workload_id,
                        tier,
                    });
                }
            };
            ResourceUnits::for_workload(k.workload_id)
                .with_cru(cru)
                .with_mru(mru)
                .with_sru(sru)
        }
        Workload::Network { .. } => return Ok(None),
    };
    Ok(Some(units))
}

fn storage_units(workload_id: WorkloadId, size: u64, disk_type: &DiskType) -> Result<ResourceUnits> {
    let units = ResourceUnits::for_workload(workload_id);
    match disk_type {
        DiskType::Ssd => Ok(units.with_sru(size)),
        DiskType::Hdd => Ok(units.with_hru(size)),
        DiskType::Other(class) => Err(AccountingError::UnsupportedMediaClass {
            workload_id,
            media_class: class.clone(),
        }),
    }
}
