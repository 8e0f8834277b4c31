//! API token resolution
//!
//! A token is taken from, in order:
//! 1. the explicit argument (the CLI fills it from `--token` / `LINODE_TOKEN`)
//! 2. the first credentials file that has one for the provider:
//!    - `$LINODE_PLUGIN_CREDENTIALS`
//!    - `~/.cloudify/credentials`
//!    - `/etc/cloudify/credentials`
//!
//! Credentials files are YAML keyed by provider name:
//!
//! ```yaml
//! linode:
//!   token: 0123abcd...
//! ```

use crate::error::{ConfigError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Environment variable naming an extra credentials file, searched first
pub const CREDENTIALS_PATH_ENV: &str = "LINODE_PLUGIN_CREDENTIALS";

/// Provider name the plugin looks its token up under
pub const DEFAULT_PROVIDER: &str = "linode";

const SYSTEM_CREDENTIALS_PATH: &str = "/etc/cloudify/credentials";

#[derive(Debug, Deserialize)]
struct ProviderCredentials {
    #[serde(default)]
    token: Option<String>,
}

/// Credentials files searched in priority order
pub fn credential_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(path) = std::env::var(CREDENTIALS_PATH_ENV) {
        if !path.is_empty() {
            paths.push(PathBuf::from(path));
        }
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".cloudify").join("credentials"));
    }

    paths.push(PathBuf::from(SYSTEM_CREDENTIALS_PATH));
    paths
}

/// Ordered set of credentials files
#[derive(Debug, Clone)]
pub struct CredentialStore {
    paths: Vec<PathBuf>,
}

impl CredentialStore {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// Store over [`credential_paths`]
    pub fn from_env() -> Self {
        Self::new(credential_paths())
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Token for `provider` from the first file that has one
    pub fn lookup(&self, provider: &str) -> Result<Option<String>> {
        for path in &self.paths {
            if !path.is_file() {
                continue;
            }
            if let Some(token) = read_token(path, provider)? {
                tracing::debug!("Using {} credentials from {}", provider, path.display());
                return Ok(Some(token));
            }
            tracing::debug!("No {} token in {}", provider, path.display());
        }
        Ok(None)
    }
}

fn read_token(path: &Path, provider: &str) -> Result<Option<String>> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(None);
    }

    let mut entries: HashMap<String, ProviderCredentials> = serde_yaml::from_str(&content)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(entries
        .remove(provider)
        .and_then(|c| c.token)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty()))
}

/// Resolve the API token for `provider` using the default credentials files
pub fn resolve_token(explicit: Option<&str>, provider: &str) -> Result<String> {
    resolve_token_with(explicit, provider, &CredentialStore::from_env())
}

pub fn resolve_token_with(
    explicit: Option<&str>,
    provider: &str,
    store: &CredentialStore,
) -> Result<String> {
    if let Some(token) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
        tracing::debug!("Using explicitly supplied {} token", provider);
        return Ok(token.to_string());
    }

    store
        .lookup(provider)?
        .ok_or_else(|| ConfigError::CredentialsMissing {
            provider: provider.to_string(),
            searched: store.paths().to_vec(),
        })
}
