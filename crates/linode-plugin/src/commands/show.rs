use crate::GlobalArgs;
use colored::Colorize;
use linode_plugin_cloud::{ContextRecorder, StateManager};

pub async fn handle(global: &GlobalArgs) -> anyhow::Result<()> {
    let manager = StateManager::new(&global.state_dir);
    let state = manager.load(&global.node_instance_id).await?;

    match state.resource_id()? {
        Some(id) => println!("{} {}", "resource_id:".bold(), id.to_string().cyan()),
        None => println!("{}", "No linode recorded".dimmed()),
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&state.runtime_properties)?
    );

    Ok(())
}
