use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tracing::debug;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StrategyType {
    #[default]
    Failover,
    Injection,
    FallBack,
}

/// Load-balancing algorithm used to pick one healthy address.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShuntStrategy {
    #[default]
    Polling,
    Random,
    ConsistentHash,
}

/// Resilience policy of one service id. Only the data model lives here,
/// enforcement belongs to the invocation layer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CommandConfig {
    pub execution_timeout_ms: u64,
    pub failover_cluster: u32,
    pub strategy: StrategyType,
    pub shunt_strategy: ShuntStrategy,
    pub circuit_breaker_force_open: bool,
    pub breaker_force_closed: bool,
    pub breaker_error_threshold_percentage: u32,
    pub breaker_sleep_window_ms: u64,
    pub breaker_request_volume_threshold: u32,
    pub max_concurrent_requests: u32,
    pub request_cache_enabled: bool,
    pub fallback_name: Option<String>,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            execution_timeout_ms: 1000,
            failover_cluster: 3,
            strategy: StrategyType::Failover,
            shunt_strategy: ShuntStrategy::Polling,
            circuit_breaker_force_open: false,
            breaker_force_closed: false,
            breaker_error_threshold_percentage: 50,
            breaker_sleep_window_ms: 60000,
            breaker_request_volume_threshold: 20,
            max_concurrent_requests: 10,
            request_cache_enabled: false,
            fallback_name: None,
        }
    }
}

/// Resolves the [`CommandConfig`] of a service id once and caches it.
/// A service either has a complete override or gets the default record.
pub struct CommandProvider {
    default_command: Arc<CommandConfig>,
    overrides: HashMap<String, Arc<CommandConfig>>,
    cache: DashMap<String, Arc<CommandConfig>>,
}

impl Default for CommandProvider {
    fn default() -> Self {
        Self::new(CommandConfig::default(), HashMap::new())
    }
}

impl CommandProvider {
    pub fn new(default_command: CommandConfig, overrides: HashMap<String, CommandConfig>) -> Self {
        Self {
            default_command: Arc::new(default_command),
            overrides: overrides
                .into_iter()
                .map(|(id, command)| (id, Arc::new(command)))
                .collect(),
            cache: DashMap::new(),
        }
    }

    pub fn get_command(&self, service_id: &str) -> Arc<CommandConfig> {
        if let Some(command) = self.cache.get(service_id) {
            return command.value().clone();
        }
        self.cache
            .entry(service_id.to_owned())
            .or_insert_with(|| match self.overrides.get(service_id) {
                Some(command) => {
                    debug!("service {service_id} uses command override");
                    command.clone()
                }
                None => self.default_command.clone(),
            })
            .value()
            .clone()
    }

    pub fn default_command(&self) -> &CommandConfig {
        &self.default_command
    }
}
