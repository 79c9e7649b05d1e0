//! Workload records carried by a reservation.
//!
//! The set of workload kinds is closed. Every kind except networks is pinned
//! to a single node; a network spans nodes through its
//! [`NetworkResource`] entries.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GridError;
use crate::ids::{NodeId, WorkloadId};

/// Storage media class of a volume or key-value store.
///
/// Unknown classes are kept verbatim so they can be reported, not dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DiskType {
    /// Solid-state disk.
    Ssd,
    /// Spinning disk.
    Hdd,
    /// Any class this broker cannot bill.
    Other(String),
}

impl From<String> for DiskType {
    fn from(s: String) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "SSD" => Self::Ssd,
            "HDD" => Self::Hdd,
            _ => Self::Other(s),
        }
    }
}

impl From<DiskType> for String {
    fn from(d: DiskType) -> Self {
        d.to_string()
    }
}

impl fmt::Display for DiskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ssd => write!(f, "SSD"),
            Self::Hdd => write!(f, "HDD"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

/// Compute capacity requested by a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerCapacity {
    /// Virtual cores.
    pub cpu: u32,
    /// Memory in MiB.
    pub memory: u64,
}

/// A container workload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    /// Workload id.
    pub workload_id: WorkloadId,
    /// Hosting node.
    pub node_id: NodeId,
    /// Flist (image) the container boots from.
    #[serde(default)]
    pub flist: String,
    /// Requested capacity.
    pub capacity: ContainerCapacity,
}

/// A storage volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    /// Workload id.
    pub workload_id: WorkloadId,
    /// Hosting node.
    pub node_id: NodeId,
    /// Size in GiB.
    pub size: u64,
    /// Media class.
    #[serde(rename = "type")]
    pub disk_type: DiskType,
}

/// A key-value store (0-db) namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zdb {
    /// Workload id.
    pub workload_id: WorkloadId,
    /// Hosting node.
    pub node_id: NodeId,
    /// Size in GiB.
    pub size: u64,
    /// Media class.
    pub disk_type: DiskType,
}

/// A kubernetes cluster node (virtual machine of a fixed size tier).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KubernetesNode {
    /// Workload id.
    pub workload_id: WorkloadId,
    /// Hosting node.
    pub node_id: NodeId,
    /// Size tier.
    pub size: u8,
}

/// The slice of a network that lives on one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkResource {
    /// Hosting node.
    pub node_id: NodeId,
    /// Subnet assigned on that node.
    #[serde(default)]
    pub iprange: String,
}

/// A private network spanning several nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    /// Workload id.
    pub workload_id: WorkloadId,
    /// Network name.
    pub name: String,
    /// Per-node slices.
    #[serde(default)]
    pub network_resources: Vec<NetworkResource>,
}

/// Workload kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadKind {
    /// Container.
    Container,
    /// Volume.
    Volume,
    /// Key-value store.
    Zdb,
    /// Kubernetes node.
    Kubernetes,
    /// Network resource.
    Network,
}

impl WorkloadKind {
    /// Every kind, in classification order.
    pub const ALL: [Self; 5] = [
        Self::Zdb,
        Self::Volume,
        Self::Container,
        Self::Network,
        Self::Kubernetes,
    ];

    /// Tag used on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::Volume => "volume",
            Self::Zdb => "zdb",
            Self::Kubernetes => "kubernetes",
            Self::Network => "network",
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkloadKind {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| GridError::invalid_reservation(format!("unknown workload kind: {s}")))
    }
}

/// A node-scoped workload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Workload {
    /// Container.
    Container(Container),
    /// Volume.
    Volume(Volume),
    /// Key-value store.
    Zdb(Zdb),
    /// Kubernetes node.
    Kubernetes(KubernetesNode),
    /// Network resource, with the id of the network it belongs to.
    Network {
        /// Owning network workload.
        workload_id: WorkloadId,
        /// The per-node slice.
        resource: NetworkResource,
    },
}

impl Workload {
    /// Kind tag.
    #[must_use]
    pub const fn kind(&self) -> WorkloadKind {
        match self {
            Self::Container(_) => WorkloadKind::Container,
            Self::Volume(_) => WorkloadKind::Volume,
            Self::Zdb(_) => WorkloadKind::Zdb,
            Self::Kubernetes(_) => WorkloadKind::Kubernetes,
            Self::Network { .. } => WorkloadKind::Network,
        }
    }

    /// Hosting node.
    #[must_use]
    pub const fn node_id(&self) -> &NodeId {
        match self {
            Self::Container(c) => &c.node_id,
            Self::Volume(v) => &v.node_id,
            Self::Zdb(z) => &z.node_id,
            Self::Kubernetes(k) => &k.node_id,
            Self::Network { resource, .. } => &resource.node_id,
        }
    }

    /// Workload id (for network resources, the owning network's id).
    #[must_use]
    pub const fn workload_id(&self) -> WorkloadId {
        match self {
            Self::Container(c) => c.workload_id,
            Self::Volume(v) => v.workload_id,
            Self::Zdb(z) => z.workload_id,
            Self::Kubernetes(k) => k.workload_id,
            Self::Network { workload_id, .. } => *workload_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("SSD", DiskType::Ssd ; "upper ssd")]
    #[test_case("hdd", DiskType::Hdd ; "lower hdd")]
    #[test_case("NVME", DiskType::Other("NVME".into()) ; "unknown kept verbatim")]
    fn disk_type_from_string(input: &str, expected: DiskType) {
        assert_eq!(DiskType::from(input.to_string()), expected);
    }

    #[test]
    fn disk_type_serde_roundtrip_keeps_unknown() {
        let json = serde_json::to_string(&DiskType::Other("tape".into())).expect("serialize");
        assert_eq!(json, r#""tape""#);
        let back: DiskType = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, DiskType::Other("tape".into()));
    }

    #[test]
    fn volume_uses_type_field() {
        let v: Volume = serde_json::from_str(
            r#"{"workload_id": 3, "node_id": "n1", "size": 10, "type": "SSD"}"#,
        )
        .expect("deserialize");
        assert_eq!(v.disk_type, DiskType::Ssd);
    }

    #[test]
    fn workload_kind_parses_known_tags() {
        for kind in WorkloadKind::ALL {
            assert_eq!(kind.as_str().parse::<WorkloadKind>().expect("known"), kind);
        }
    }

    #[test]
    fn workload_kind_rejects_unknown_tag() {
        let err = "gateway".parse::<WorkloadKind>().unwrap_err();
        assert!(matches!(err, GridError::InvalidReservation(_)));
    }

    #[test]
    fn tagged_workload_rejects_unknown_kind() {
        let result = serde_json::from_str::<Workload>(r#"{"kind": "gateway", "node_id": "n1"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn network_workload_reports_resource_node() {
        let w = Workload::Network {
            workload_id: WorkloadId(9),
            resource: NetworkResource {
                node_id: NodeId::new("n2"),
                iprange: "10.1.2.0/24".into(),
            },
        };
        assert_eq!(w.kind(), WorkloadKind::Network);
        assert_eq!(w.node_id().as_str(), "n2");
        assert_eq!(w.workload_id(), WorkloadId(9));
    }
}
