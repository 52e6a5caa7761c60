use crate::command::CommandConfig;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, time::Duration};

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct SurgeConfig {
    pub health: HealthCheckConfig,
    pub command: CommandSettings,
    pub selector: SelectorConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct HealthCheckConfig {
    pub interval_ms: u64,
    pub timeout_ms: u64,
    /// Upper bound of probes in flight during one cycle, 1 probes sequentially.
    pub max_concurrent_probes: usize,
    pub evict_on_route_removal: bool,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            interval_ms: 10_000,
            timeout_ms: 3_000,
            max_concurrent_probes: 32,
            evict_on_route_removal: false,
        }
    }
}

impl HealthCheckConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct CommandSettings {
    pub default: CommandConfig,
    pub services: HashMap<String, CommandConfig>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SelectorConfig {
    pub virtual_nodes: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self { virtual_nodes: 100 }
    }
}
