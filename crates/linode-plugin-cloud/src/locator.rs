//! Resource lookup by provider id

use crate::error::{CloudError, Result};
use crate::instance::{InstanceId, RemoteInstance};
use crate::provider::LinodeProvider;
use serde::{Deserialize, Serialize};

/// How a linode is looked up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStrategy {
    /// Enumerate every linode and match the id
    #[default]
    Scan,
    /// Fetch the linode by id; 403/404 mean absent
    Direct,
}

/// Result of a lookup. Absence is an expected outcome, not an error.
#[derive(Debug, Clone)]
pub enum Located {
    Found(RemoteInstance),
    NotFound,
}

impl Located {
    pub fn into_option(self) -> Option<RemoteInstance> {
        match self {
            Located::Found(instance) => Some(instance),
            Located::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Located::Found(_))
    }
}

/// Finds linodes through a provider
pub struct Locator<'a, P: LinodeProvider + ?Sized> {
    provider: &'a P,
    strategy: LookupStrategy,
}

impl<'a, P: LinodeProvider + ?Sized> Locator<'a, P> {
    pub fn new(provider: &'a P, strategy: LookupStrategy) -> Self {
        Self { provider, strategy }
    }

    pub async fn find(&self, id: InstanceId) -> Result<Located> {
        match self.strategy {
            LookupStrategy::Scan => {
                let instances = self.provider.list_instances().await?;
                tracing::debug!("Scanning {} linodes for {}", instances.len(), id);
                Ok(instances
                    .into_iter()
                    .find(|i| i.id == id)
                    .map(Located::Found)
                    .unwrap_or(Located::NotFound))
            }
            LookupStrategy::Direct => match self.provider.get_instance(id).await {
                Ok(instance) => Ok(Located::Found(instance)),
                Err(CloudError::Provider {
                    status: Some(403 | 404),
                    ..
                }) => Ok(Located::NotFound),
                Err(e) => Err(e),
            },
        }
    }
}
