//! Configuration for the Linode orchestration plugin
//!
//! Resolves the Linode API token (explicit argument first, then the
//! credentials files searched in priority order) and loads the optional
//! plugin settings file that selects the API URL, lookup strategy and retry
//! policy.

pub mod credentials;
pub mod error;
pub mod settings;

pub use credentials::{
    CREDENTIALS_PATH_ENV, CredentialStore, DEFAULT_PROVIDER, credential_paths, resolve_token,
    resolve_token_with,
};
pub use error::*;
pub use settings::{LookupMode, PluginSettings, RetryMode, config_dir, settings_path};
