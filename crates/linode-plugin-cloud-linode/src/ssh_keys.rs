//! SSH key registration
//!
//! Key material is supplied by a [`KeySource`]; the plugin does not inspect
//! the key beyond requiring that one was supplied.

use crate::client::{LinodeClient, SshKeyInfo};
use crate::error::{LinodeError, Result};
use std::path::PathBuf;

/// Where public key material comes from
pub trait KeySource {
    /// Human-readable description used in error messages
    fn describe(&self) -> String;

    fn public_key(&self) -> Result<String>;
}

/// Reads a public key from a file such as `~/.ssh/id_ed25519.pub`
#[derive(Debug, Clone)]
pub struct FileKeySource {
    path: PathBuf,
}

impl FileKeySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl KeySource for FileKeySource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn public_key(&self) -> Result<String> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            LinodeError::MissingKeySource(format!("{}: {}", self.path.display(), e))
        })?;
        let key = content.trim();
        if key.is_empty() {
            return Err(LinodeError::MissingKeySource(format!(
                "{} is empty",
                self.path.display()
            )));
        }
        Ok(key.to_string())
    }
}

/// Key material given inline, e.g. from a blueprint property
#[derive(Debug, Clone)]
pub struct InlineKeySource(pub Option<String>);

impl KeySource for InlineKeySource {
    fn describe(&self) -> String {
        "inline key".to_string()
    }

    fn public_key(&self) -> Result<String> {
        match self.0.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key.to_string()),
            _ => Err(LinodeError::MissingKeySource(
                "no public key was supplied".to_string(),
            )),
        }
    }
}

/// Registers public keys on the account profile
pub struct SshKeys<'a> {
    client: &'a LinodeClient,
}

impl<'a> SshKeys<'a> {
    pub fn new(client: &'a LinodeClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, label: &str, source: &dyn KeySource) -> Result<SshKeyInfo> {
        tracing::info!("Creating SSH key {}...", label);
        let key = source.public_key()?;
        tracing::debug!("SSH key material read from {}", source.describe());
        self.client.create_ssh_key(label, &key).await
    }
}
