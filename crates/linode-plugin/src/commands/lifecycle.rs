use crate::GlobalArgs;
use crate::utils;
use linode_plugin_cloud::{InstanceId, InstanceSpec, NodeInstanceState, Outcome, StateManager};
use linode_plugin_config::PluginSettings;

enum Operation {
    Create(InstanceSpec),
    Start(Option<InstanceId>, InstanceSpec),
    Stop(Option<InstanceId>),
    Delete(Option<InstanceId>),
}

impl Operation {
    fn name(&self) -> &'static str {
        match self {
            Operation::Create(_) => "create",
            Operation::Start(..) => "start",
            Operation::Stop(_) => "stop",
            Operation::Delete(_) => "delete",
        }
    }
}

pub async fn create(global: &GlobalArgs, spec: InstanceSpec) -> anyhow::Result<Outcome> {
    run(global, Operation::Create(spec)).await
}

pub async fn start(
    global: &GlobalArgs,
    id: Option<InstanceId>,
    spec: InstanceSpec,
) -> anyhow::Result<Outcome> {
    run(global, Operation::Start(id, spec)).await
}

pub async fn stop(global: &GlobalArgs, id: Option<InstanceId>) -> anyhow::Result<Outcome> {
    run(global, Operation::Stop(id)).await
}

pub async fn delete(global: &GlobalArgs, id: Option<InstanceId>) -> anyhow::Result<Outcome> {
    run(global, Operation::Delete(id)).await
}

/// Load state, run one reconcile step, persist state
async fn run(global: &GlobalArgs, operation: Operation) -> anyhow::Result<Outcome> {
    utils::print_operation(operation.name(), global);

    let settings = PluginSettings::load()?;
    let manager = StateManager::new(&global.state_dir);
    let mut state: NodeInstanceState = manager.load(&global.node_instance_id).await?;

    let client = utils::connect(global, &settings)?;
    let reconciler = utils::reconciler(client, &settings);
    let node = utils::node_context(global);

    let outcome = match operation {
        Operation::Create(spec) => reconciler.create(&node, &mut state, &spec).await,
        Operation::Start(id, spec) => reconciler.start(&node, &mut state, &spec, id).await,
        Operation::Stop(id) => reconciler.stop(&node, &mut state, id).await,
        Operation::Delete(id) => reconciler.delete(&mut state, id).await,
    };

    // Retries and failures may still have recorded a resource id
    manager.save(&state).await?;

    Ok(outcome)
}
