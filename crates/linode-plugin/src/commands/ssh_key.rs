use crate::GlobalArgs;
use crate::utils;
use colored::Colorize;
use linode_plugin_cloud_linode::{FileKeySource, SshKeys};
use linode_plugin_config::PluginSettings;
use std::path::Path;

pub async fn handle(global: &GlobalArgs, label: &str, public_key_file: &Path) -> anyhow::Result<()> {
    let settings = PluginSettings::load()?;
    let client = utils::connect(global, &settings)?;

    let source = FileKeySource::new(public_key_file);
    let key = SshKeys::new(&client).create(label, &source).await?;

    println!(
        "{}",
        format!("✓ Registered SSH key '{}' (id {})", key.label, key.id)
            .green()
            .bold()
    );
    Ok(())
}
