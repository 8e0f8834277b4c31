//! Linode provider error types

use linode_plugin_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LinodeError {
    #[error("Linode API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("No SSH key material available: {0}")]
    MissingKeySource(String),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl LinodeError {
    pub fn status(&self) -> Option<u16> {
        match self {
            LinodeError::Api { status, .. } => Some(*status),
            LinodeError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<LinodeError> for CloudError {
    fn from(err: LinodeError) -> Self {
        match err {
            LinodeError::Api { status, message } => CloudError::provider(Some(status), message),
            LinodeError::MissingKeySource(source) => CloudError::MissingKeySource(source),
            other => CloudError::provider(other.status(), other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, LinodeError>;
