//! Execution-time telemetry.
//!
//! The hook is fire-and-forget and must not affect correctness; the
//! default sink routes through `tracing`, promoting operations that exceed
//! the slow-op threshold to `warn!`.

use std::time::Duration;

use tracing::{debug, warn};

use scribe_core::{Namespace, OpKind, TelemetrySink};

/// Default slow-operation threshold.
pub const DEFAULT_SLOW_OP_THRESHOLD: Duration = Duration::from_millis(100);

/// Telemetry sink backed by `tracing`.
#[derive(Debug, Clone)]
pub struct TracingTelemetry {
    slow_op_threshold: Duration,
}

impl TracingTelemetry {
    /// Create a sink with an explicit slow-op threshold.
    pub fn new(slow_op_threshold: Duration) -> Self {
        TracingTelemetry { slow_op_threshold }
    }
}

impl Default for TracingTelemetry {
    fn default() -> Self {
        Self::new(DEFAULT_SLOW_OP_THRESHOLD)
    }
}

impl TelemetrySink for TracingTelemetry {
    fn record_op(&self, kind: OpKind, ns: &Namespace, duration: Duration) {
        let elapsed_ms = duration.as_millis() as u64;
        if duration >= self.slow_op_threshold {
            warn!(op = %kind, ns = %ns, elapsed_ms, "slow write operation");
        } else {
            debug!(op = %kind, ns = %ns, elapsed_ms, "write operation");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_op_never_panics() {
        let sink = TracingTelemetry::default();
        sink.record_op(
            OpKind::Insert,
            &Namespace::new("app", "users"),
            Duration::from_millis(1),
        );
        sink.record_op(
            OpKind::Delete,
            &Namespace::new("app", "users"),
            Duration::from_secs(5),
        );
    }
}
