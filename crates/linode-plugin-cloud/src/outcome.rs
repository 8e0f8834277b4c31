//! Result of a lifecycle operation

use crate::error::CloudError;
use std::time::Duration;

/// What the orchestrator should do after a lifecycle call
#[derive(Debug)]
pub enum Outcome {
    /// The operation reached its terminal state
    Success,

    /// The linode is still converging; re-invoke after `after`
    Retry { after: Duration, message: String },

    /// The operation was aborted
    Fatal(CloudError),
}

impl Outcome {
    pub fn retry(after: Duration, message: impl Into<String>) -> Self {
        Outcome::Retry {
            after,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    pub fn is_retry(&self) -> bool {
        matches!(self, Outcome::Retry { .. })
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Outcome::Fatal(_))
    }

    /// Suggested delay when a retry was requested
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Outcome::Retry { after, .. } => Some(*after),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&CloudError> {
        match self {
            Outcome::Fatal(e) => Some(e),
            _ => None,
        }
    }
}

impl From<crate::error::Result<Outcome>> for Outcome {
    fn from(result: crate::error::Result<Outcome>) -> Self {
        result.unwrap_or_else(Outcome::Fatal)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Success => write!(f, "success"),
            Outcome::Retry { after, message } => {
                write!(f, "{} (retry in {}s)", message, after.as_secs())
            }
            Outcome::Fatal(e) => write!(f, "failed: {}", e),
        }
    }
}
