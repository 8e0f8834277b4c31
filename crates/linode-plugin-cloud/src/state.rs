//! Node instance state
//!
//! Each node instance owns a runtime-properties map that survives between
//! operation invocations. The lifecycle writes into it through the
//! [`ContextRecorder`] capability; [`StateManager`] persists it under
//! `.linode-plugin/<node_instance_id>.json`.

use crate::error::{CloudError, Result};
use crate::instance::{InstanceId, ResourceContext, ResourceProperties};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;

const STATE_VERSION: u32 = 1;
const STATE_DIR: &str = ".linode-plugin";

pub const RESOURCE_ID_KEY: &str = "resource_id";
pub const RESOURCE_CONTEXT_KEY: &str = "resource_context";
pub const RESOURCE_PROPERTIES_KEY: &str = "resource_properties";

/// Writes the lifecycle makes into orchestrator-managed durable state
pub trait ContextRecorder {
    /// Linode recorded by an earlier operation, if any. A recorded value that
    /// is not a linode id is an error, never absence.
    fn resource_id(&self) -> Result<Option<InstanceId>>;

    fn record_resource_id(&mut self, id: InstanceId) -> Result<()>;

    fn resource_context(&self) -> Option<ResourceContext>;

    fn record_creation(&mut self, context: ResourceContext) -> Result<()>;

    fn record_properties(&mut self, properties: ResourceProperties) -> Result<()>;

    /// Forget the linode, its context and its properties
    fn retract(&mut self) -> Result<()>;
}

/// Durable state of one node instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInstanceState {
    /// State file version
    pub version: u32,

    pub node_instance_id: String,

    /// Last modified timestamp
    pub updated_at: DateTime<Utc>,

    pub runtime_properties: Map<String, Value>,
}

impl NodeInstanceState {
    pub fn new(node_instance_id: impl Into<String>) -> Self {
        Self {
            version: STATE_VERSION,
            node_instance_id: node_instance_id.into(),
            updated_at: Utc::now(),
            runtime_properties: Map::new(),
        }
    }

    pub fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.runtime_properties.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("Ignoring malformed runtime property '{}': {}", key, e);
                None
            }
        }
    }

    /// Like [`get`](Self::get), but a value of the wrong shape is a `StateError`
    pub fn try_get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(value) = self.runtime_properties.get(key) else {
            return Ok(None);
        };
        serde_json::from_value(value.clone()).map(Some).map_err(|e| {
            CloudError::StateError(format!(
                "runtime property '{}' of {} is malformed: {}",
                key, self.node_instance_id, e
            ))
        })
    }

    pub fn set<T: Serialize>(&mut self, key: impl Into<String>, value: &T) -> Result<()> {
        self.runtime_properties
            .insert(key.into(), serde_json::to_value(value)?);
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let removed = self.runtime_properties.remove(key);
        if removed.is_some() {
            self.updated_at = Utc::now();
        }
        removed
    }
}

impl ContextRecorder for NodeInstanceState {
    fn resource_id(&self) -> Result<Option<InstanceId>> {
        self.try_get(RESOURCE_ID_KEY)
    }

    fn record_resource_id(&mut self, id: InstanceId) -> Result<()> {
        tracing::info!("Using resource {}", id);
        self.set(RESOURCE_ID_KEY, &id)
    }

    fn resource_context(&self) -> Option<ResourceContext> {
        self.get(RESOURCE_CONTEXT_KEY)
    }

    fn record_creation(&mut self, context: ResourceContext) -> Result<()> {
        tracing::debug!("Setting linode context {}", context.uuid);
        self.set(RESOURCE_CONTEXT_KEY, &context)
    }

    fn record_properties(&mut self, properties: ResourceProperties) -> Result<()> {
        tracing::debug!("Setting linode properties for {}", properties.label);
        self.set(RESOURCE_PROPERTIES_KEY, &properties)
    }

    fn retract(&mut self) -> Result<()> {
        for key in [RESOURCE_ID_KEY, RESOURCE_CONTEXT_KEY, RESOURCE_PROPERTIES_KEY] {
            self.remove(key);
        }
        Ok(())
    }
}

/// Reads and writes node instance state files
pub struct StateManager {
    root: PathBuf,
}

impl StateManager {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn state_dir(&self) -> PathBuf {
        self.root.join(STATE_DIR)
    }

    fn state_path(&self, node_instance_id: &str) -> Result<PathBuf> {
        if node_instance_id.is_empty()
            || node_instance_id.contains(['/', '\\'])
            || node_instance_id.starts_with('.')
        {
            return Err(CloudError::InvalidConfig(format!(
                "invalid node instance id '{}'",
                node_instance_id
            )));
        }
        Ok(self.state_dir().join(format!("{}.json", node_instance_id)))
    }

    async fn ensure_state_dir(&self) -> Result<()> {
        let dir = self.state_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
            tracing::debug!("Created state directory: {}", dir.display());
        }
        Ok(())
    }

    /// Load the state of a node instance, empty when none was saved yet
    pub async fn load(&self, node_instance_id: &str) -> Result<NodeInstanceState> {
        let path = self.state_path(node_instance_id)?;
        if !path.exists() {
            tracing::debug!("No state for {}, starting empty", node_instance_id);
            return Ok(NodeInstanceState::new(node_instance_id));
        }

        let content = fs::read_to_string(&path).await?;
        let state: NodeInstanceState = serde_json::from_str(&content)?;

        if state.version > STATE_VERSION {
            return Err(CloudError::StateError(format!(
                "State file version {} is newer than supported version {}",
                state.version, STATE_VERSION
            )));
        }
        if state.node_instance_id != node_instance_id {
            return Err(CloudError::StateError(format!(
                "State file {} belongs to node instance '{}'",
                path.display(),
                state.node_instance_id
            )));
        }

        tracing::debug!(
            "Loaded state for {} with {} runtime properties",
            node_instance_id,
            state.runtime_properties.len()
        );
        Ok(state)
    }

    /// Save the state, keeping the previous file as a backup
    pub async fn save(&self, state: &NodeInstanceState) -> Result<()> {
        self.ensure_state_dir().await?;

        let path = self.state_path(&state.node_instance_id)?;
        let backup = path.with_extension("json.backup");

        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&path, &backup).await?;
        }

        let content = serde_json::to_string_pretty(state)?;
        fs::write(&path, content).await?;

        tracing::debug!("Saved state for {}", state.node_instance_id);
        Ok(())
    }
}
