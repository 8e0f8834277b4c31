//! Plugin settings file (`<config_dir>/linode-plugin/settings.yaml`)

use crate::error::{ConfigError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const SETTINGS_FILE: &str = "settings.yaml";

/// How linodes are looked up by id
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupMode {
    #[default]
    Scan,
    Direct,
}

/// Retry interval policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryMode {
    /// 30s between retries
    #[default]
    Fixed,
    /// 30s doubling up to 5 minutes
    Exponential,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PluginSettings {
    /// Override for the Linode API base URL
    pub api_url: Option<String>,
    pub lookup: LookupMode,
    pub retry: RetryMode,
    /// Fail instead of retrying after this many retries.
    ///
    /// Unset by default, so a linode that keeps reporting `provisioning`,
    /// `booting` or `shutting_down` is retried indefinitely. Setting a cap
    /// turns that case into a fatal `CompletionNotConfirmed` once it is reached.
    pub max_attempts: Option<u32>,
}

impl PluginSettings {
    /// Load from the user config directory, defaults when the file is absent
    pub fn load() -> Result<Self> {
        match settings_path() {
            Ok(path) => Self::load_from(&path),
            Err(ConfigError::ConfigDirNotFound) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}

/// The plugin's config directory (not created)
pub fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("linode-plugin"))
}

pub fn settings_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(SETTINGS_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_absent_file_gives_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let settings = PluginSettings::load_from(&temp_dir.path().join("settings.yaml")).unwrap();
        assert_eq!(settings, PluginSettings::default());
        assert_eq!(settings.retry, RetryMode::Fixed);
    }

    #[test]
    fn test_partial_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("settings.yaml");
        fs::write(&path, "retry: exponential\nmax_attempts: 20\n").unwrap();

        let settings = PluginSettings::load_from(&path).unwrap();
        assert_eq!(settings.retry, RetryMode::Exponential);
        assert_eq!(settings.max_attempts, Some(20));
        assert_eq!(settings.lookup, LookupMode::Scan);
        assert!(settings.api_url.is_none());
    }

    #[test]
    fn test_unknown_mode_is_parse_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("settings.yaml");
        fs::write(&path, "lookup: sideways\n").unwrap();

        assert!(matches!(
            PluginSettings::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_settings_path() {
        if let Ok(path) = settings_path() {
            assert!(path.ends_with("linode-plugin/settings.yaml"));
        }
    }
}
