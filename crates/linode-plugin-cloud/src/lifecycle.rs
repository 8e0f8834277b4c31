//! Instance lifecycle reconciliation
//!
//! Each operation looks at the linode's current provider status, issues at
//! most one provider action to move it towards the operation's target, and
//! reports whether the target was reached:
//!
//! | status                                    | create / start      | stop                    |
//! |-------------------------------------------|---------------------|-------------------------|
//! | `running`                                 | done                | shutdown, then re-check |
//! | `offline`                                 | boot, then re-check | done                    |
//! | `provisioning`, `booting`, `shutting_down`| retry later         | retry later             |
//! | anything else                             | fatal               | fatal                   |
//!
//! Nothing here sleeps. A linode that is still converging yields
//! [`Outcome::Retry`] and the orchestrator decides when to call again.

use crate::error::{CloudError, Result};
use crate::instance::{
    CreateInstanceRequest, InstanceId, InstanceSpec, InstanceStatus, NodeContext, RemoteInstance,
    ResourceContext, ResourceProperties, StatusPhase, generate_label,
};
use crate::locator::{Located, Locator, LookupStrategy};
use crate::outcome::Outcome;
use crate::provider::{LinodeProvider, RetryConfig};
use crate::state::ContextRecorder;

/// Terminal status an operation drives towards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Running,
    Offline,
}

impl Target {
    fn phase(&self) -> StatusPhase {
        match self {
            Target::Running => StatusPhase::Running,
            Target::Offline => StatusPhase::Offline,
        }
    }
}

enum Convergence {
    Reached,
    Pending(InstanceStatus),
}

/// Drives linodes through create, start, stop and delete
pub struct Reconciler<P: LinodeProvider> {
    provider: P,
    retry: RetryConfig,
    lookup: LookupStrategy,
}

impl<P: LinodeProvider> Reconciler<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            retry: RetryConfig::default(),
            lookup: LookupStrategy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_lookup(mut self, lookup: LookupStrategy) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn locator(&self) -> Locator<'_, P> {
        Locator::new(&self.provider, self.lookup)
    }

    /// Create a linode from `spec`, or adopt an existing one
    pub async fn create(
        &self,
        node: &NodeContext,
        recorder: &mut dyn ContextRecorder,
        spec: &InstanceSpec,
    ) -> Outcome {
        report("create", self.try_create(node, recorder, spec, None).await)
    }

    /// Boot a linode; without any id this creates one and boots it
    pub async fn start(
        &self,
        node: &NodeContext,
        recorder: &mut dyn ContextRecorder,
        spec: &InstanceSpec,
        id: Option<InstanceId>,
    ) -> Outcome {
        report("start", self.try_start(node, recorder, spec, id).await)
    }

    /// Shut a linode down
    pub async fn stop(
        &self,
        node: &NodeContext,
        recorder: &mut dyn ContextRecorder,
        id: Option<InstanceId>,
    ) -> Outcome {
        report("stop", self.try_stop(node, recorder, id).await)
    }

    /// Destroy a linode. Deleting a linode that does not exist succeeds.
    pub async fn delete(
        &self,
        recorder: &mut dyn ContextRecorder,
        id: Option<InstanceId>,
    ) -> Outcome {
        report("delete", self.try_delete(recorder, id).await)
    }

    async fn try_create(
        &self,
        node: &NodeContext,
        recorder: &mut dyn ContextRecorder,
        spec: &InstanceSpec,
        booted: Option<bool>,
    ) -> Result<Outcome> {
        let id = self.create_or_adopt(recorder, spec, booted).await?;
        recorder.record_resource_id(id)?;

        match self.converge(id, Target::Running, "create").await? {
            Convergence::Reached => {
                let instance = self.refresh_properties(id, "create", recorder).await?;
                if recorder.resource_context().is_none() {
                    recorder.record_creation(ResourceContext::new(node))?;
                }
                tracing::info!("Linode {} ({}) is running", id, instance.label);
                Ok(Outcome::Success)
            }
            Convergence::Pending(status) => self.pending(id, "create", status, node.retry_number),
        }
    }

    /// Pick the linode `create` works on, creating one when nothing can be adopted
    async fn create_or_adopt(
        &self,
        recorder: &mut dyn ContextRecorder,
        spec: &InstanceSpec,
        booted: Option<bool>,
    ) -> Result<InstanceId> {
        // An earlier attempt of this operation may already have created one.
        if let Some(id) = recorder.resource_id()? {
            if self.locator().find(id).await?.is_found() {
                tracing::info!("Resuming with recorded linode {}", id);
                return Ok(id);
            }
            // Context and properties describe the vanished linode, not the next one.
            tracing::warn!("Recorded linode {} no longer exists, forgetting it", id);
            recorder.retract()?;
        }

        if let Some(id) = spec.existing_id {
            match self.locator().find(id).await? {
                Located::Found(instance) => {
                    tracing::info!("Adopting existing linode {} ({})", id, instance.label);
                    return Ok(id);
                }
                Located::NotFound if spec.create_if_missing => {
                    tracing::warn!("Linode {} not found, creating a new one", id);
                }
                Located::NotFound => return Err(CloudError::not_found("create", id)),
            }
        }

        let request = self.resolve_request(spec, booted).await?;
        tracing::info!("Creating linode {}...", request.label);
        tracing::debug!(
            "Linode arguments: region={} image={} type={} backups={}",
            request.region,
            request.image,
            request.instance_type,
            request.backups_enabled
        );

        let instance = self.provider.create_instance(&request).await?;
        tracing::info!("Created linode {} ({})", instance.id, instance.label);
        Ok(instance.id)
    }

    /// Fill in everything the spec left open from the provider catalog
    async fn resolve_request(
        &self,
        spec: &InstanceSpec,
        booted: Option<bool>,
    ) -> Result<CreateInstanceRequest> {
        let region = match &spec.region {
            Some(region) => region.clone(),
            None => first(self.provider.fetch_regions().await?, "region")?,
        };
        let image = match &spec.image {
            Some(image) => image.clone(),
            None => first(self.provider.fetch_images().await?, "image")?,
        };
        let instance_type = match &spec.instance_type {
            Some(t) => t.clone(),
            None => first(
                self.provider.fetch_instance_types(&region).await?,
                "instance type",
            )?,
        };

        Ok(CreateInstanceRequest {
            label: spec.label.clone().unwrap_or_else(generate_label),
            region,
            image,
            instance_type,
            backups_enabled: spec.backups,
            tags: spec.tags.clone(),
            root_pass: spec.root_pass.clone(),
            authorized_keys: spec.authorized_keys.clone(),
            booted,
        })
    }

    async fn try_start(
        &self,
        node: &NodeContext,
        recorder: &mut dyn ContextRecorder,
        spec: &InstanceSpec,
        id: Option<InstanceId>,
    ) -> Result<Outcome> {
        let id = match id {
            Some(id) => Some(id),
            None => recorder.resource_id()?,
        };
        let Some(id) = id else {
            tracing::info!("Creating, then starting a new linode");
            return self.try_create(node, recorder, spec, Some(false)).await;
        };

        if !self.locator().find(id).await?.is_found() {
            return Err(CloudError::not_found("start", id));
        }

        tracing::info!("Powering linode {} on...", id);
        match self.converge(id, Target::Running, "start").await? {
            Convergence::Reached => {
                self.refresh_properties(id, "start", recorder).await?;
                // A start that created the linode may have needed retries to get here.
                if recorder.resource_context().is_none() {
                    recorder.record_creation(ResourceContext::new(node))?;
                }
                tracing::info!("Linode {} started successfully", id);
                Ok(Outcome::Success)
            }
            Convergence::Pending(status) => self.pending(id, "start", status, node.retry_number),
        }
    }

    async fn try_stop(
        &self,
        node: &NodeContext,
        recorder: &mut dyn ContextRecorder,
        id: Option<InstanceId>,
    ) -> Result<Outcome> {
        let id = match id {
            Some(id) => id,
            None => recorder
                .resource_id()?
                .ok_or_else(|| CloudError::MissingResourceId {
                    operation: "stop".to_string(),
                })?,
        };

        if !self.locator().find(id).await?.is_found() {
            return Err(CloudError::not_found("stop", id));
        }

        tracing::info!("Shutting linode {} down...", id);
        match self.converge(id, Target::Offline, "stop").await? {
            Convergence::Reached => {
                self.refresh_properties(id, "stop", recorder).await?;
                tracing::info!("Linode {} shut down successfully", id);
                Ok(Outcome::Success)
            }
            Convergence::Pending(status) => self.pending(id, "stop", status, node.retry_number),
        }
    }

    async fn try_delete(
        &self,
        recorder: &mut dyn ContextRecorder,
        id: Option<InstanceId>,
    ) -> Result<Outcome> {
        let recorded = recorder.resource_id()?;
        let Some(id) = id.or(recorded) else {
            tracing::info!("No linode recorded for this node instance, nothing to delete");
            return Ok(Outcome::Success);
        };

        if self.locator().find(id).await?.is_found() {
            tracing::info!("Destroying linode {}...", id);
            self.provider.destroy(id).await?;

            if self.locator().find(id).await?.is_found() {
                return Err(CloudError::DeletionNotConfirmed(id));
            }
            tracing::info!("Linode {} destroyed successfully", id);
        } else {
            tracing::info!("Linode {} does not exist, treating as deleted", id);
        }

        if recorded.is_none_or(|r| r == id) {
            recorder.retract()?;
        }
        Ok(Outcome::Success)
    }

    /// Check the linode's status and issue the action that moves it to `target`
    async fn converge(
        &self,
        id: InstanceId,
        target: Target,
        operation: &str,
    ) -> Result<Convergence> {
        let status = self.provider.get_status(id).await?;
        tracing::debug!("Linode {} status: {}", id, status);

        match status.phase() {
            phase if phase == target.phase() => return Ok(Convergence::Reached),
            StatusPhase::Transitional => return Ok(Convergence::Pending(status)),
            StatusPhase::Unmodeled => return Err(unexpected(id, operation, status)),
            StatusPhase::Running | StatusPhase::Offline => {}
        }

        match target {
            Target::Running => {
                tracing::debug!("Booting linode {}", id);
                self.provider.boot(id).await?;
            }
            Target::Offline => {
                tracing::debug!("Shutting down linode {}", id);
                self.provider.shutdown(id).await?;
            }
        }

        let after = self.provider.get_status(id).await?;
        tracing::debug!("Linode {} status after action: {}", id, after);
        match after.phase() {
            phase if phase == target.phase() => Ok(Convergence::Reached),
            // The provider may not have picked the action up yet.
            StatusPhase::Transitional | StatusPhase::Running | StatusPhase::Offline => {
                Ok(Convergence::Pending(after))
            }
            StatusPhase::Unmodeled => Err(unexpected(id, operation, after)),
        }
    }

    fn pending(
        &self,
        id: InstanceId,
        operation: &str,
        status: InstanceStatus,
        retry_number: u32,
    ) -> Result<Outcome> {
        if !self.retry.allows(retry_number) {
            return Err(CloudError::CompletionNotConfirmed {
                id,
                operation: operation.to_string(),
                reason: format!("still {} after {} retries", status, retry_number),
            });
        }
        Ok(Outcome::retry(
            self.retry.delay_for(retry_number),
            format!(
                "Waiting for linode {} to complete {} (status: {}). Retrying...",
                id, operation, status
            ),
        ))
    }

    /// Snapshot the linode's attributes into the node instance
    async fn refresh_properties(
        &self,
        id: InstanceId,
        operation: &str,
        recorder: &mut dyn ContextRecorder,
    ) -> Result<RemoteInstance> {
        match self.locator().find(id).await? {
            Located::Found(instance) => {
                recorder.record_properties(ResourceProperties::from(&instance))?;
                Ok(instance)
            }
            Located::NotFound => Err(CloudError::CompletionNotConfirmed {
                id,
                operation: operation.to_string(),
                reason: "linode disappeared".to_string(),
            }),
        }
    }
}

fn first(items: Vec<String>, what: &str) -> Result<String> {
    items
        .into_iter()
        .next()
        .ok_or_else(|| CloudError::InvalidConfig(format!("provider offers no {}", what)))
}

fn unexpected(id: InstanceId, operation: &str, status: InstanceStatus) -> CloudError {
    CloudError::UnexpectedStatus {
        id,
        operation: operation.to_string(),
        status,
    }
}

fn report(operation: &str, result: Result<Outcome>) -> Outcome {
    let outcome = Outcome::from(result);
    match &outcome {
        Outcome::Success => tracing::info!("{} completed", operation),
        Outcome::Retry { after, message } => {
            tracing::info!("{} (retry after {}s)", message, after.as_secs())
        }
        Outcome::Fatal(e) => tracing::error!("{} failed: {}", operation, e),
    }
    outcome
}
