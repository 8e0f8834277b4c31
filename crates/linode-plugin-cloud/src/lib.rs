//! Linode instance lifecycle
//!
//! This crate holds everything the orchestration plugin needs that does not
//! talk HTTP: the instance data model, the provider trait the REST adapter
//! implements, resource lookup, the lifecycle reconciler and the node
//! instance state the reconciler records into.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │              linode-plugin (CLI)                  │
//! │        create / start / stop / delete             │
//! └─────────────────┬────────────────────────────────┘
//!                   │
//! ┌─────────────────▼────────────────────────────────┐
//! │              linode-plugin-cloud                  │
//! │  ┌────────────┐  ┌──────────┐  ┌──────────────┐  │
//! │  │ Reconciler │─▶│ Locator  │  │ State/Record │  │
//! │  └─────┬──────┘  └────┬─────┘  └──────────────┘  │
//! │        │  trait LinodeProvider  │                 │
//! └────────┼──────────────┼──────────────────────────┘
//!          │              │
//! ┌────────▼──────────────▼──────┐
//! │  linode-plugin-cloud-linode  │
//! │      (Linode API v4)         │
//! └──────────────────────────────┘
//! ```

pub mod error;
pub mod instance;
pub mod lifecycle;
pub mod locator;
pub mod outcome;
pub mod provider;
pub mod state;

// Re-exports
pub use error::{CloudError, Result};
pub use instance::{
    CreateInstanceRequest, InstanceId, InstanceSpec, InstanceStatus, NodeContext, RemoteInstance,
    ResourceContext, ResourceProperties,
};
pub use lifecycle::Reconciler;
pub use locator::{Located, Locator, LookupStrategy};
pub use outcome::Outcome;
pub use provider::{DEFAULT_RETRY_INTERVAL, LinodeProvider, RetryConfig};
pub use state::{ContextRecorder, NodeInstanceState, StateManager};
