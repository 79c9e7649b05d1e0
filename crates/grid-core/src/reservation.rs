//! Reservation records and the reservation service.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ids::{OwnerId, ReservationId, WorkloadId};
use crate::workload::{Container, KubernetesNode, Network, Volume, Workload, Zdb};

/// What the directory expects to happen next to a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NextAction {
    /// Being created.
    Create,
    /// Waiting for signatures.
    Sign,
    /// Waiting for the customer's payment.
    Pay,
    /// Paid; nodes are provisioning.
    Deploy,
    /// Scheduled for deletion.
    Delete,
    /// Rejected by the directory.
    Invalid,
    /// Deleted.
    Deleted,
}

impl fmt::Display for NextAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Create => "CREATE",
            Self::Sign => "SIGN",
            Self::Pay => "PAY",
            Self::Deploy => "DEPLOY",
            Self::Delete => "DELETE",
            Self::Invalid => "INVALID",
            Self::Deleted => "DELETED",
        };
        f.write_str(s)
    }
}

/// State reported by a node for one provisioned workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultState {
    /// Provisioned.
    Ok,
    /// Provisioning failed.
    Error,
    /// Decommissioned.
    Deleted,
}

/// A provisioning result posted by a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadResult {
    /// Workload the result is for.
    pub workload_id: WorkloadId,
    /// Workload kind as reported by the node.
    pub category: String,
    /// Outcome.
    pub state: ResultState,
    /// Free-form message (error text on failure).
    #[serde(default)]
    pub message: String,
    /// Epoch seconds the result was posted.
    #[serde(default)]
    pub epoch: i64,
}

impl WorkloadResult {
    /// Returns true if this result reports a failure.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.state == ResultState::Error
    }
}

/// The workload payload of a reservation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataReservation {
    /// Containers.
    #[serde(default)]
    pub containers: Vec<Container>,
    /// Volumes.
    #[serde(default)]
    pub volumes: Vec<Volume>,
    /// Key-value stores.
    #[serde(default)]
    pub zdbs: Vec<Zdb>,
    /// Kubernetes nodes.
    #[serde(default)]
    pub kubernetes: Vec<KubernetesNode>,
    /// Networks.
    #[serde(default)]
    pub networks: Vec<Network>,
    /// Epoch seconds after which an unprovisioned reservation is abandoned.
    pub expiration_provisioning: i64,
    /// Epoch seconds at which the reservation ends.
    #[serde(default)]
    pub expiration_reservation: i64,
    /// Accepted settlement currencies, most preferred first.
    #[serde(default)]
    pub currencies: Vec<String>,
    /// Fields this broker does not model, kept so that unknown workload
    /// lists are noticed instead of dropped.
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub unrecognized: BTreeMap<String, serde_json::Value>,
}

impl DataReservation {
    /// Unknown workload lists that carry at least one entry, with their
    /// lengths.
    pub fn unrecognized_workloads(&self) -> impl Iterator<Item = (&str, usize)> {
        self.unrecognized.iter().filter_map(|(key, value)| match value {
            serde_json::Value::Array(items) if !items.is_empty() => {
                Some((key.as_str(), items.len()))
            }
            _ => None,
        })
    }
}

/// A capacity reservation as stored by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Reservation id.
    pub id: ReservationId,
    /// Customer that created the reservation.
    pub customer_tid: OwnerId,
    /// Next expected step.
    pub next_action: NextAction,
    /// Workloads and deadlines.
    pub data_reservation: DataReservation,
    /// Provisioning results posted so far.
    #[serde(default)]
    pub results: Vec<WorkloadResult>,
}

impl Reservation {
    /// Provisioning deadline in epoch seconds.
    #[must_use]
    pub const fn expiration_provisioning(&self) -> i64 {
        self.data_reservation.expiration_provisioning
    }

    /// True once `now` is past the provisioning deadline.
    #[must_use]
    pub const fn is_expired(&self, now: i64) -> bool {
        self.data_reservation.expiration_provisioning < now
    }

    /// Preferred settlement currency, if any.
    #[must_use]
    pub fn primary_currency(&self) -> Option<&str> {
        self.data_reservation.currencies.first().map(String::as_str)
    }

    /// Number of results needed before the reservation counts as deployed.
    ///
    /// Every node-scoped workload posts one result; a network posts one per
    /// node it spans.
    #[must_use]
    pub fn expected_result_count(&self) -> usize {
        let data = &self.data_reservation;
        data.volumes.len()
            + data.zdbs.len()
            + data.containers.len()
            + data.kubernetes.len()
            + data
                .networks
                .iter()
                .map(|n| n.network_resources.len())
                .sum::<usize>()
    }

    /// Results in the error state.
    pub fn error_results(&self) -> impl Iterator<Item = &WorkloadResult> {
        self.results.iter().filter(|r| r.is_error())
    }

    /// True if any workload failed to provision.
    #[must_use]
    pub fn has_failed(&self) -> bool {
        self.results.iter().any(WorkloadResult::is_error)
    }

    /// True once enough results have been posted.
    #[must_use]
    pub fn is_deployed(&self) -> bool {
        self.results.len() >= self.expected_result_count()
    }

    /// Flattens the payload into node-scoped workloads.
    ///
    /// Network resources come out once per node slice.
    pub fn workloads(&self) -> impl Iterator<Item = Workload> + '_ {
        let data = &self.data_reservation;
        let zdbs = data.zdbs.iter().cloned().map(Workload::Zdb);
        let volumes = data.volumes.iter().cloned().map(Workload::Volume);
        let containers = data.containers.iter().cloned().map(Workload::Container);
        let networks = data.networks.iter().flat_map(|n| {
            n.network_resources.iter().map(|r| Workload::Network {
                workload_id: n.workload_id,
                resource: r.clone(),
            })
        });
        let kubernetes = data.kubernetes.iter().cloned().map(Workload::Kubernetes);
        zdbs.chain(volumes)
            .chain(containers)
            .chain(networks)
            .chain(kubernetes)
    }
}

/// Access to reservation records held by the directory.
pub trait ReservationService: Send + Sync {
    /// Fetch the current state of a reservation.
    fn get_reservation(
        &self,
        id: ReservationId,
    ) -> impl Future<Output = Result<Reservation>> + Send;

    /// Ask the directory to cancel (delete) a reservation.
    fn cancel_reservation(&self, id: ReservationId) -> impl Future<Output = Result<()>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::NodeId;
    use crate::workload::{ContainerCapacity, DiskType, NetworkResource, WorkloadKind};

    fn sample() -> Reservation {
        Reservation {
            id: ReservationId(7),
            customer_tid: OwnerId(1),
            next_action: NextAction::Deploy,
            data_reservation: DataReservation {
                containers: vec![Container {
                    workload_id: WorkloadId(1),
                    node_id: NodeId::new("n1"),
                    flist: String::new(),
                    capacity: ContainerCapacity { cpu: 1, memory: 1024 },
                }],
                volumes: vec![Volume {
                    workload_id: WorkloadId(2),
                    node_id: NodeId::new("n1"),
                    size: 10,
                    disk_type: DiskType::Ssd,
                }],
                networks: vec![Network {
                    workload_id: WorkloadId(3),
                    name: "net".into(),
                    network_resources: vec![
                        NetworkResource {
                            node_id: NodeId::new("n1"),
                            iprange: String::new(),
                        },
                        NetworkResource {
                            node_id: NodeId::new("n2"),
                            iprange: String::new(),
                        },
                    ],
                }],
                expiration_provisioning: 1_000,
                currencies: vec!["TFT".into()],
                ..DataReservation::default()
            },
            results: Vec::new(),
        }
    }

    fn result(id: u64, state: ResultState) -> WorkloadResult {
        WorkloadResult {
            workload_id: WorkloadId(id),
            category: "container".into(),
            state,
            message: String::new(),
            epoch: 0,
        }
    }

    #[test]
    fn expected_count_includes_each_network_resource() {
        assert_eq!(sample().expected_result_count(), 4);
    }

    #[test]
    fn workloads_flatten_network_per_node() {
        let r = sample();
        let kinds: Vec<_> = r.workloads().map(|w| w.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                WorkloadKind::Volume,
                WorkloadKind::Container,
                WorkloadKind::Network,
                WorkloadKind::Network,
            ]
        );
    }

    #[test]
    fn deployed_once_results_reach_expected() {
        let mut r = sample();
        assert!(!r.is_deployed());
        r.results = (0..4).map(|i| result(i, ResultState::Ok)).collect();
        assert!(r.is_deployed());
    }

    #[test]
    fn failed_when_any_result_is_error() {
        let mut r = sample();
        r.results = vec![result(1, ResultState::Ok), result(2, ResultState::Error)];
        assert!(r.has_failed());
        assert_eq!(r.error_results().count(), 1);
    }

    #[test]
    fn expiry_is_strictly_after_deadline() {
        let r = sample();
        assert!(!r.is_expired(1_000));
        assert!(r.is_expired(1_001));
    }

    #[test]
    fn unknown_workload_list_is_kept() {
        let data: DataReservation = serde_json::from_str(
            r#"{
                "containers": [],
                "gateways": [{"workload_id": 2, "node_id": "a"}],
                "signing_request_provision": {"quorum_min": 0},
                "proxies": [],
                "expiration_provisioning": 10
            }"#,
        )
        .expect("json");
        let unknown: Vec<_> = data.unrecognized_workloads().collect();
        assert_eq!(unknown, vec![("gateways", 1)]);
        assert_eq!(data.unrecognized.len(), 3);
    }

    #[test]
    fn known_fields_are_not_unrecognized() {
        let data: DataReservation =
            serde_json::from_str(r#"{"expiration_provisioning": 10, "currencies": ["TFT"]}"#)
                .expect("json");
        assert!(data.unrecognized.is_empty());
        let back = serde_json::to_value(&data).expect("json");
        assert!(back.get("unrecognized").is_none());
    }

    #[test]
    fn next_action_wire_format() {
        assert_eq!(serde_json::to_string(&NextAction::Pay).expect("json"), r#""PAY""#);
        let parsed: NextAction = serde_json::from_str(r#""DEPLOY""#).expect("json");
        assert_eq!(parsed, NextAction::Deploy);
    }
}
