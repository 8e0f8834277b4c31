//! Linode provider for the orchestration plugin
//!
//! Implements `LinodeProvider` against the Linode REST API v4.
//!
//! # Features
//!
//! - Linode management (create, boot, shutdown, delete, list)
//! - Catalog lookups (images, regions, instance types)
//! - SSH key registration
//!
//! # Example
//!
//! ```ignore
//! use linode_plugin_cloud::{LinodeProvider, Reconciler};
//! use linode_plugin_cloud_linode::{LinodeClient, LinodeConfig};
//!
//! let client = LinodeClient::new(LinodeConfig::new(token))?;
//! let regions = client.fetch_regions().await?;
//!
//! let reconciler = Reconciler::new(client);
//! let outcome = reconciler.stop(&node, &mut state, None).await;
//! ```

pub mod client;
pub mod error;
pub mod provider;
pub mod ssh_keys;

pub use client::{
    ImageInfo, LINODE_API_BASE, LinodeClient, LinodeConfig, RegionInfo, SshKeyInfo, TypeInfo,
    USER_AGENT,
};
pub use error::{LinodeError, Result};
pub use ssh_keys::{FileKeySource, InlineKeySource, KeySource, SshKeys};
