use serde::{Deserialize, Serialize};

#[derive(Serialize, Debug)]
pub(crate) struct LoginRequest<'a> {
    pub auth: LoginCredentials<'a>,
}

#[derive(Serialize, Debug)]
pub(crate) struct LoginCredentials<'a> {
    pub login: &'a str,
    pub password: &'a str,
}

#[derive(Deserialize, Debug)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub token: String,
}

#[derive(Serialize, Debug)]
pub(crate) struct KubeconfigRequest {
    pub config: KubeconfigOptions,
}

#[derive(Serialize, Debug)]
pub(crate) struct KubeconfigOptions {
    #[serde(rename = "expirationSeconds")]
    pub expiration_seconds: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Domain {
    pub id: String,
    pub name: String,
    pub status: String,
    pub enabled: bool,
    pub area: Area,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Area {
    pub name: String,
    pub tag: String,
    pub regions: Vec<Region>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Region {
    pub name: String,
    pub status: String,
    pub region: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub domain_id: String,
    pub enabled: bool,
    pub default: bool,
    pub description: String,
}

/// A Gardener shoot cluster as returned by the list endpoint.
///
/// Only the parts shown by the CLI are typed; the rest of the object is kept
/// untouched so nothing is lost when printing.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct ShootCluster {
    pub metadata: ShootMetadata,
    pub spec: serde_json::Value,
    pub status: ShootStatus,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct ShootMetadata {
    pub name: String,
    pub uid: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ShootStatus {
    pub hibernated: bool,
    pub conditions: Vec<Condition>,
    pub advertised_addresses: Vec<AdvertisedAddress>,
    pub last_operation: Option<LastOperation>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    pub message: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct AdvertisedAddress {
    pub name: String,
    pub url: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct LastOperation {
    pub progress: i16,
    pub state: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Floating IP pool every new cluster is attached to.
pub const FLOATING_POOL_NAME: &str = "ext-net";

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ShootClusterRequest {
    pub shoot: ShootClusterSpec,
}

impl ShootClusterRequest {
    /// A single worker group cluster, optionally hibernated on a schedule.
    pub fn new(
        name: &str,
        kubernetes_version: &str,
        worker: Worker,
        hibernation: Option<HibernationSchedule>,
    ) -> Self {
        Self {
            shoot: ShootClusterSpec {
                name: name.to_string(),
                kubernetes: KubernetesVersion {
                    version: kubernetes_version.to_string(),
                },
                provider: Provider {
                    infrastructure_config: InfrastructureConfig {
                        floating_pool_name: FLOATING_POOL_NAME.to_string(),
                    },
                    workers: vec![worker],
                },
                hibernation: hibernation.map(|schedule| HibernationSchedules {
                    schedules: vec![schedule],
                }),
            },
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ShootClusterSpec {
    pub name: String,
    pub kubernetes: KubernetesVersion,
    pub provider: Provider,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hibernation: Option<HibernationSchedules>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct KubernetesVersion {
    pub version: String,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub infrastructure_config: InfrastructureConfig,
    pub workers: Vec<Worker>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InfrastructureConfig {
    pub floating_pool_name: String,
}

/// A worker group. An empty name lets the API pick one.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct Worker {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub minimum: u16,
    pub maximum: u16,
    pub machine: Machine,
    pub volume: Volume,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct Machine {
    #[serde(rename = "type")]
    pub kind: String,
    pub image: MachineImage,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct MachineImage {
    pub name: String,
    pub version: String,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct Volume {
    pub size: String,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct HibernationSchedules {
    pub schedules: Vec<HibernationSchedule>,
}

/// Start and end in cron format, e.g. `00 18 * * 1,2,3,4,5`.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct HibernationSchedule {
    pub start: String,
    pub end: String,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct WorkerGroupRequest {
    pub worker: Worker,
}
