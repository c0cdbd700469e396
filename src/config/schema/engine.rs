use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_max_parallel_steps() -> usize {
    4
}

fn default_step_timeout_ms() -> u64 {
    10_000
}

fn default_query_timeout_ms() -> u64 {
    60_000
}

/// Execution limits for the plan engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Worker pool size inside one wave. 1 runs steps sequentially.
    #[serde(default = "default_max_parallel_steps")]
    pub max_parallel_steps: usize,
    /// Bound on a single tool invocation.
    #[serde(default = "default_step_timeout_ms")]
    pub step_timeout_ms: u64,
    /// Outer deadline for a whole plan.
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

impl EngineConfig {
    pub fn step_timeout(&self) -> Duration {
        Duration::from_millis(self.step_timeout_ms)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_parallel_steps: default_max_parallel_steps(),
            step_timeout_ms: default_step_timeout_ms(),
            query_timeout_ms: default_query_timeout_ms(),
        }
    }
}
