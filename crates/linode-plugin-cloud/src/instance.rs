//! Instance data model
//!
//! `RemoteInstance` mirrors the provider's view of a linode and is fetched
//! fresh on every operation. `InstanceSpec` is the desired state handed in by
//! the orchestrator. `ResourceContext` and `ResourceProperties` are what gets
//! written back into the node instance's runtime properties.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CloudError;

/// Instance type used when the blueprint does not name one
pub const DEFAULT_INSTANCE_TYPE: &str = "g6-nanode-1";

/// Prefix for labels generated when the blueprint does not name one
pub const GENERATED_LABEL_PREFIX: &str = "linode-plugin";

/// Provider-assigned linode identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(u64);

impl InstanceId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for InstanceId {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(InstanceId)
            .map_err(|_| CloudError::InvalidConfig(format!("'{}' is not a valid linode id", s)))
    }
}

impl From<u64> for InstanceId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Status reported by the provider for a linode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    Running,
    Offline,
    Booting,
    Rebooting,
    ShuttingDown,
    Provisioning,
    Deleting,
    Migrating,
    Rebuilding,
    Cloning,
    Restoring,
    Stopped,
    Resizing,
    #[serde(other)]
    Unknown,
}

/// How the reconciler treats a status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusPhase {
    /// Fully booted
    Running,
    /// Fully stopped
    Offline,
    /// Converging on its own; come back later
    Transitional,
    /// Anything the lifecycle does not model
    Unmodeled,
}

impl InstanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Running => "running",
            InstanceStatus::Offline => "offline",
            InstanceStatus::Booting => "booting",
            InstanceStatus::Rebooting => "rebooting",
            InstanceStatus::ShuttingDown => "shutting_down",
            InstanceStatus::Provisioning => "provisioning",
            InstanceStatus::Deleting => "deleting",
            InstanceStatus::Migrating => "migrating",
            InstanceStatus::Rebuilding => "rebuilding",
            InstanceStatus::Cloning => "cloning",
            InstanceStatus::Restoring => "restoring",
            InstanceStatus::Stopped => "stopped",
            InstanceStatus::Resizing => "resizing",
            InstanceStatus::Unknown => "unknown",
        }
    }

    pub fn phase(&self) -> StatusPhase {
        match self {
            InstanceStatus::Running => StatusPhase::Running,
            InstanceStatus::Offline => StatusPhase::Offline,
            InstanceStatus::Provisioning
            | InstanceStatus::Booting
            | InstanceStatus::ShuttingDown => StatusPhase::Transitional,
            _ => StatusPhase::Unmodeled,
        }
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hardware specs of a linode
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSpecs {
    /// Disk size in MB
    pub disk: u64,
    /// Memory in MB
    pub memory: u64,
    pub vcpus: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupsInfo {
    pub enabled: bool,
}

/// A linode as reported by the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteInstance {
    pub id: InstanceId,

    pub label: String,

    /// Image the linode was deployed from, if any
    #[serde(default)]
    pub image: Option<String>,

    #[serde(rename = "type", default)]
    pub instance_type: Option<String>,

    pub region: String,

    #[serde(default)]
    pub specs: InstanceSpecs,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub created: Option<NaiveDateTime>,

    #[serde(default)]
    pub backups: BackupsInfo,

    pub status: InstanceStatus,

    #[serde(default)]
    pub ipv4: Vec<String>,
}

/// Desired state of a linode, as declared on the blueprint node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceSpec {
    /// Label for the new linode; generated when absent
    #[serde(default)]
    pub label: Option<String>,

    /// Region id; the first region in the catalog when absent
    #[serde(default)]
    pub region: Option<String>,

    /// Image id; the first image in the catalog when absent
    #[serde(default)]
    pub image: Option<String>,

    /// Instance type id; the first type in the catalog when explicitly null
    #[serde(default = "default_instance_type")]
    pub instance_type: Option<String>,

    #[serde(default)]
    pub backups: bool,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub root_pass: Option<String>,

    #[serde(default)]
    pub authorized_keys: Vec<String>,

    /// Pre-existing linode to adopt instead of creating one
    #[serde(default)]
    pub existing_id: Option<InstanceId>,

    /// Create a new linode when `existing_id` is not found
    #[serde(default)]
    pub create_if_missing: bool,
}

fn default_instance_type() -> Option<String> {
    Some(DEFAULT_INSTANCE_TYPE.to_string())
}

impl Default for InstanceSpec {
    fn default() -> Self {
        Self {
            label: None,
            region: None,
            image: None,
            instance_type: default_instance_type(),
            backups: false,
            tags: Vec::new(),
            root_pass: None,
            authorized_keys: Vec::new(),
            existing_id: None,
            create_if_missing: false,
        }
    }
}

/// Fully resolved create request sent to the provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateInstanceRequest {
    pub label: String,
    pub region: String,
    pub image: String,
    #[serde(rename = "type")]
    pub instance_type: String,
    pub backups_enabled: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_pass: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authorized_keys: Vec<String>,
    /// Leave the new linode offline when `Some(false)`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booted: Option<bool>,
}

/// Generate a label for a linode the blueprint did not name
pub fn generate_label() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{}-{}", GENERATED_LABEL_PREFIX, &id[..8])
}

/// Identity of the node instance an operation runs for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeContext {
    pub node_instance_id: String,
    pub node_id: String,
    pub deployment_id: String,
    pub blueprint_id: String,

    /// How many times the orchestrator has already retried this operation
    #[serde(default)]
    pub retry_number: u32,
}

/// Correlation record written once when a linode is first used
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceContext {
    pub uuid: Uuid,
    pub node_instance_id: String,
    pub node_id: String,
    pub deployment_id: String,
    pub blueprint_id: String,
}

impl ResourceContext {
    pub fn new(node: &NodeContext) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            node_instance_id: node.node_instance_id.clone(),
            node_id: node.node_id.clone(),
            deployment_id: node.deployment_id.clone(),
            blueprint_id: node.blueprint_id.clone(),
        }
    }
}

/// Snapshot of provider-reported attributes for downstream consumers.
///
/// The id is deliberately absent; `resource_id` is the single place it lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceProperties {
    pub label: String,
    pub image: Option<String>,
    #[serde(rename = "type")]
    pub instance_type: Option<String>,
    pub region: String,
    pub disk: u64,
    pub memory: u64,
    pub vcpus: u32,
    pub tags: Vec<String>,
    pub created: Option<String>,
    pub backups: bool,
}

impl From<&RemoteInstance> for ResourceProperties {
    fn from(instance: &RemoteInstance) -> Self {
        Self {
            label: instance.label.clone(),
            image: instance.image.clone(),
            instance_type: instance.instance_type.clone(),
            region: instance.region.clone(),
            disk: instance.specs.disk,
            memory: instance.specs.memory,
            vcpus: instance.specs.vcpus,
            tags: instance.tags.clone(),
            created: instance
                .created
                .map(|c| c.format("%Y-%m-%dT%H:%M:%S").to_string()),
            backups: instance.backups.enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSTANCE_JSON: &str = r#"{
        "id": 123,
        "label": "web-01",
        "group": "",
        "status": "running",
        "created": "2018-01-01T00:01:01",
        "updated": "2018-01-01T00:01:01",
        "type": "g6-standard-1",
        "ipv4": ["203.0.113.1"],
        "image": "linode/debian12",
        "region": "us-east",
        "specs": {"disk": 51200, "memory": 2048, "vcpus": 1, "gpus": 0, "transfer": 2000},
        "backups": {"enabled": true, "available": false, "schedule": {"day": null, "window": null}},
        "hypervisor": "kvm",
        "watchdog_enabled": true,
        "tags": ["prod"]
    }"#;

    #[test]
    fn test_remote_instance_from_api_json() {
        let instance: RemoteInstance = serde_json::from_str(INSTANCE_JSON).unwrap();
        assert_eq!(instance.id, InstanceId::new(123));
        assert_eq!(instance.status, InstanceStatus::Running);
        assert_eq!(instance.instance_type.as_deref(), Some("g6-standard-1"));
        assert_eq!(instance.specs.memory, 2048);
        assert!(instance.backups.enabled);
    }

    #[test]
    fn test_unmodeled_status_deserializes_as_unknown() {
        let status: InstanceStatus = serde_json::from_str("\"billing_suspension\"").unwrap();
        assert_eq!(status, InstanceStatus::Unknown);
        assert_eq!(status.phase(), StatusPhase::Unmodeled);
    }

    #[test]
    fn test_status_phases() {
        assert_eq!(InstanceStatus::Running.phase(), StatusPhase::Running);
        assert_eq!(InstanceStatus::Offline.phase(), StatusPhase::Offline);
        assert_eq!(InstanceStatus::ShuttingDown.phase(), StatusPhase::Transitional);
        assert_eq!(InstanceStatus::Provisioning.phase(), StatusPhase::Transitional);
        assert_eq!(InstanceStatus::Booting.phase(), StatusPhase::Transitional);
        assert_eq!(InstanceStatus::Rebooting.phase(), StatusPhase::Unmodeled);
    }

    #[test]
    fn test_resource_properties_snapshot() {
        let instance: RemoteInstance = serde_json::from_str(INSTANCE_JSON).unwrap();
        let props = ResourceProperties::from(&instance);

        let json = serde_json::to_value(&props).unwrap();
        assert_eq!(json["type"], "g6-standard-1");
        assert_eq!(json["created"], "2018-01-01T00:01:01");
        assert_eq!(json["backups"], true);
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_instance_spec_defaults() {
        let spec: InstanceSpec =
            serde_json::from_str(r#"{"region": "us-east", "image": "linux-x"}"#).unwrap();
        assert_eq!(spec.instance_type.as_deref(), Some(DEFAULT_INSTANCE_TYPE));
        assert!(!spec.backups);
        assert!(spec.existing_id.is_none());
    }

    #[test]
    fn test_generated_label_shape() {
        let label = generate_label();
        assert!(label.starts_with("linode-plugin-"));
        assert_eq!(label.len(), "linode-plugin-".len() + 8);
    }

    #[test]
    fn test_instance_id_parse() {
        assert_eq!("123".parse::<InstanceId>().unwrap(), InstanceId::new(123));
        assert!("abc".parse::<InstanceId>().is_err());
    }
}
