//! Lifecycle error types

use crate::instance::{InstanceId, InstanceStatus};
use thiserror::Error;

/// Errors that abort a lifecycle operation
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Provider error{}: {message}", http_suffix(.status))]
    Provider {
        status: Option<u16>,
        message: String,
    },

    #[error("Attempted to {operation} a linode with id '{id}', but no such linode exists")]
    ResourceNotFound { operation: String, id: InstanceId },

    #[error("Cannot {operation}: no linode id was supplied or recorded for this node instance")]
    MissingResourceId { operation: String },

    #[error("Linode {0} was destroyed but is still listed by the provider")]
    DeletionNotConfirmed(InstanceId),

    #[error("Linode {id} did not complete {operation}: {reason}")]
    CompletionNotConfirmed {
        id: InstanceId,
        operation: String,
        reason: String,
    },

    #[error("Linode {id} is in unexpected status '{status}' during {operation}")]
    UnexpectedStatus {
        id: InstanceId,
        operation: String,
        status: InstanceStatus,
    },

    #[error("No SSH key material available: {0}")]
    MissingKeySource(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("State file error: {0}")]
    StateError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    pub fn provider(status: Option<u16>, message: impl Into<String>) -> Self {
        CloudError::Provider {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(operation: impl Into<String>, id: InstanceId) -> Self {
        CloudError::ResourceNotFound {
            operation: operation.into(),
            id,
        }
    }

    /// HTTP status of a provider error, if one was received
    pub fn http_status(&self) -> Option<u16> {
        match self {
            CloudError::Provider { status, .. } => *status,
            _ => None,
        }
    }
}

fn http_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, CloudError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_display() {
        let err = CloudError::provider(Some(500), "Internal Server Error");
        assert_eq!(
            err.to_string(),
            "Provider error (HTTP 500): Internal Server Error"
        );

        let err = CloudError::provider(None, "connection reset");
        assert_eq!(err.to_string(), "Provider error: connection reset");
    }

    #[test]
    fn test_not_found_names_operation_and_id() {
        let err = CloudError::not_found("stop", InstanceId::new(123));
        let msg = err.to_string();
        assert!(msg.contains("stop"));
        assert!(msg.contains("123"));
    }
}
