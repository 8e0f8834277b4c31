pub mod catalog;
pub mod lifecycle;
pub mod show;
pub mod ssh_key;

use anyhow::Context;
use clap::Args;
use linode_plugin_cloud::{InstanceId, InstanceSpec};
use std::path::PathBuf;

/// Desired linode, from a properties file and/or flags (flags win)
#[derive(Args, Debug, Default)]
pub struct SpecArgs {
    /// YAML or JSON file with the node's properties
    #[arg(long = "spec-file")]
    pub spec_file: Option<PathBuf>,

    #[arg(long)]
    pub label: Option<String>,

    #[arg(long)]
    pub region: Option<String>,

    #[arg(long)]
    pub image: Option<String>,

    /// Instance type, e.g. g6-nanode-1
    #[arg(long = "type")]
    pub instance_type: Option<String>,

    /// Enable the backup service
    #[arg(long)]
    pub backups: bool,

    #[arg(long = "tag")]
    pub tags: Vec<String>,

    #[arg(long, env = "LINODE_ROOT_PASS", hide_env_values = true)]
    pub root_pass: Option<String>,

    #[arg(long = "authorized-key")]
    pub authorized_keys: Vec<String>,

    /// Adopt this linode instead of creating one
    #[arg(long)]
    pub existing_id: Option<String>,

    /// Create a linode when --existing-id is not found
    #[arg(long)]
    pub create_if_missing: bool,
}

impl SpecArgs {
    pub fn into_spec(self) -> anyhow::Result<InstanceSpec> {
        let mut spec = match &self.spec_file {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                serde_yaml::from_str::<InstanceSpec>(&content)
                    .with_context(|| format!("Invalid linode properties in {}", path.display()))?
            }
            None => InstanceSpec::default(),
        };

        if let Some(label) = self.label {
            spec.label = Some(label);
        }
        if let Some(region) = self.region {
            spec.region = Some(region);
        }
        if let Some(image) = self.image {
            spec.image = Some(image);
        }
        if let Some(instance_type) = self.instance_type {
            spec.instance_type = Some(instance_type);
        }
        if self.backups {
            spec.backups = true;
        }
        if !self.tags.is_empty() {
            spec.tags = self.tags;
        }
        if let Some(root_pass) = self.root_pass {
            spec.root_pass = Some(root_pass);
        }
        if !self.authorized_keys.is_empty() {
            spec.authorized_keys = self.authorized_keys;
        }
        if let Some(id) = self.existing_id {
            spec.existing_id = Some(id.parse::<InstanceId>()?);
        }
        if self.create_if_missing {
            spec.create_if_missing = true;
        }

        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults_without_file_or_flags() {
        let spec = SpecArgs::default().into_spec().unwrap();
        assert_eq!(spec.instance_type.as_deref(), Some("g6-nanode-1"));
        assert!(spec.label.is_none());
        assert!(!spec.backups);
    }

    #[test]
    fn test_flags_override_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("node.yaml");
        fs::write(
            &path,
            "label: from-file\nregion: us-east\ntags: [a]\nexisting_id: 7\n",
        )
        .unwrap();

        let args = SpecArgs {
            spec_file: Some(path),
            label: Some("from-flag".into()),
            tags: vec!["b".into(), "c".into()],
            ..Default::default()
        };
        let spec = args.into_spec().unwrap();

        assert_eq!(spec.label.as_deref(), Some("from-flag"));
        assert_eq!(spec.region.as_deref(), Some("us-east"));
        assert_eq!(spec.tags, vec!["b", "c"]);
        assert_eq!(spec.existing_id, Some(InstanceId::new(7)));
    }

    #[test]
    fn test_invalid_existing_id() {
        let args = SpecArgs {
            existing_id: Some("not-a-number".into()),
            ..Default::default()
        };
        assert!(args.into_spec().is_err());
    }
}
