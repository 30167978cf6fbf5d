//! Executor configuration.

use std::time::Duration;

use scribe_core::WriteConcern;

use crate::telemetry::DEFAULT_SLOW_OP_THRESHOLD;

/// Process-level settings for the batch executor.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Enable shard-version validation. When off, declared versions are
    /// never checked.
    pub sharding_enabled: bool,
    /// Operations at or above this duration are logged as slow.
    pub slow_op_threshold: Duration,
    /// Durability requirement applied when a request carries none.
    pub default_write_concern: WriteConcern,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        ExecutorConfig {
            sharding_enabled: false,
            slow_op_threshold: DEFAULT_SLOW_OP_THRESHOLD,
            default_write_concern: WriteConcern::default(),
        }
    }
}
