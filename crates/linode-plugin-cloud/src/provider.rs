//! Provider trait definition

use crate::error::Result;
use crate::instance::{CreateInstanceRequest, InstanceId, InstanceStatus, RemoteInstance};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Operations the lifecycle needs from the cloud provider
///
/// Implementations issue exactly one remote call per method and never retry;
/// retry policy belongs to the reconciler.
#[async_trait]
pub trait LinodeProvider: Send + Sync {
    /// All linodes visible to the credential
    async fn list_instances(&self) -> Result<Vec<RemoteInstance>>;

    /// Fetch a single linode by id
    async fn get_instance(&self, id: InstanceId) -> Result<RemoteInstance>;

    async fn create_instance(&self, request: &CreateInstanceRequest) -> Result<RemoteInstance>;

    async fn boot(&self, id: InstanceId) -> Result<()>;

    async fn shutdown(&self, id: InstanceId) -> Result<()>;

    async fn destroy(&self, id: InstanceId) -> Result<()>;

    async fn get_status(&self, id: InstanceId) -> Result<InstanceStatus> {
        Ok(self.get_instance(id).await?.status)
    }

    /// Image ids usable for new linodes
    async fn fetch_images(&self) -> Result<Vec<String>>;

    /// Region ids usable for new linodes
    async fn fetch_regions(&self) -> Result<Vec<String>>;

    /// Instance type ids offered in `region`
    async fn fetch_instance_types(&self, region: &str) -> Result<Vec<String>>;
}

/// Retry interval policy for operations that are still converging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Give up after this many retries (unbounded when `None`). A cap makes a
    /// still-converging linode fatal instead of always yielding a retry.
    pub max_attempts: Option<u32>,

    /// Delay suggested for the first retry
    pub initial_delay: Duration,

    /// Upper bound for the suggested delay
    pub max_delay: Duration,

    /// Backoff multiplier
    pub backoff_multiplier: f64,
}

/// Interval the orchestrator is asked to wait before re-invoking
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(30);

impl Default for RetryConfig {
    fn default() -> Self {
        Self::fixed(DEFAULT_RETRY_INTERVAL)
    }
}

impl RetryConfig {
    /// Same delay for every retry
    pub fn fixed(delay: Duration) -> Self {
        Self {
            max_attempts: None,
            initial_delay: delay,
            max_delay: delay,
            backoff_multiplier: 1.0,
        }
    }

    /// 30s doubling up to 5 minutes
    pub fn exponential() -> Self {
        Self {
            max_attempts: None,
            initial_delay: DEFAULT_RETRY_INTERVAL,
            max_delay: Duration::from_secs(300),
            backoff_multiplier: 2.0,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Delay to suggest after `attempt` previous retries
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.max(1.0).powi(attempt.min(32) as i32);
        let secs = self.initial_delay.as_secs_f64() * factor;
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }

    /// Whether another retry may be requested after `attempt` previous ones
    pub fn allows(&self, attempt: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempt < max)
    }
}
