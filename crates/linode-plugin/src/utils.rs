use crate::GlobalArgs;
use colored::Colorize;
use linode_plugin_cloud::{InstanceId, LookupStrategy, NodeContext, Reconciler, RetryConfig};
use linode_plugin_cloud_linode::{LinodeClient, LinodeConfig};
use linode_plugin_config::{DEFAULT_PROVIDER, LookupMode, PluginSettings, RetryMode};

/// Parse an optional `--id` argument
pub fn parse_id(id: Option<&str>) -> anyhow::Result<Option<InstanceId>> {
    id.map(|s| s.parse::<InstanceId>())
        .transpose()
        .map_err(Into::into)
}

/// Node instance identity handed over by the orchestrator
pub fn node_context(global: &GlobalArgs) -> NodeContext {
    NodeContext {
        node_instance_id: global.node_instance_id.clone(),
        node_id: global.node_id.clone(),
        deployment_id: global.deployment_id.clone(),
        blueprint_id: global.blueprint_id.clone(),
        retry_number: global.retry_number,
    }
}

/// Authenticated API client
pub fn connect(global: &GlobalArgs, settings: &PluginSettings) -> anyhow::Result<LinodeClient> {
    let token = linode_plugin_config::resolve_token(global.token.as_deref(), DEFAULT_PROVIDER)?;

    let mut config = LinodeConfig::new(token);
    if let Some(url) = global.api_url.as_ref().or(settings.api_url.as_ref()) {
        config = config.with_base_url(url.trim_end_matches('/'));
    }

    tracing::debug!("Connecting to {}", config.base_url);
    Ok(LinodeClient::new(config)?)
}

pub fn retry_config(settings: &PluginSettings) -> RetryConfig {
    let retry = match settings.retry {
        RetryMode::Fixed => RetryConfig::default(),
        RetryMode::Exponential => RetryConfig::exponential(),
    };
    match settings.max_attempts {
        Some(max) => retry.with_max_attempts(max),
        None => retry,
    }
}

pub fn lookup_strategy(settings: &PluginSettings) -> LookupStrategy {
    match settings.lookup {
        LookupMode::Scan => LookupStrategy::Scan,
        LookupMode::Direct => LookupStrategy::Direct,
    }
}

pub fn reconciler(client: LinodeClient, settings: &PluginSettings) -> Reconciler<LinodeClient> {
    Reconciler::new(client)
        .with_retry(retry_config(settings))
        .with_lookup(lookup_strategy(settings))
}

/// Print a header line for an operation
pub fn print_operation(operation: &str, global: &GlobalArgs) {
    println!(
        "{} {}",
        format!("{}:", operation).bold(),
        global.node_instance_id.cyan()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id(None).unwrap(), None);
        assert_eq!(parse_id(Some("42")).unwrap(), Some(InstanceId::new(42)));
        assert!(parse_id(Some("abc")).is_err());
    }

    #[test]
    fn test_retry_config_from_settings() {
        let settings = PluginSettings::default();
        let retry = retry_config(&settings);
        assert_eq!(retry.delay_for(5), Duration::from_secs(30));
        assert!(retry.allows(1000));

        let settings = PluginSettings {
            retry: RetryMode::Exponential,
            max_attempts: Some(3),
            ..Default::default()
        };
        let retry = retry_config(&settings);
        assert_eq!(retry.delay_for(1), Duration::from_secs(60));
        assert!(retry.allows(2));
        assert!(!retry.allows(3));
    }

    #[test]
    fn test_lookup_strategy_from_settings() {
        let settings = PluginSettings {
            lookup: LookupMode::Direct,
            ..Default::default()
        };
        assert_eq!(lookup_strategy(&settings), LookupStrategy::Direct);
        assert_eq!(
            lookup_strategy(&PluginSettings::default()),
            LookupStrategy::Scan
        );
    }
}
