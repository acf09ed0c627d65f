//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the task orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum concurrently running tasks (0 = unlimited).
    /// Starts beyond the limit are rejected, not queued.
    #[serde(default)]
    pub max_concurrent_tasks: usize,

    /// How long finished results are kept (seconds, 0 = forever).
    #[serde(default)]
    pub result_ttl_secs: u64,

    /// How often the reaper looks for expired results (seconds).
    #[serde(default = "default_reap_interval")]
    pub reap_interval_secs: u64,
}

fn default_reap_interval() -> u64 {
    60
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: 0,
            result_ttl_secs: 0,
            reap_interval_secs: default_reap_interval(),
        }
    }
}
