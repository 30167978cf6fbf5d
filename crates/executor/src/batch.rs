//! Batch coordinator.
//!
//! [`BatchExecutor`] owns the collaborators and drives one batch at a
//! time: items run strictly in order, an ordered batch stops at the first
//! failure, and the write concern is enforced once, after the item loop,
//! whenever at least one item succeeded. A stale-version failure also
//! schedules a best-effort metadata refresh after the response is built,
//! so the next batch from the same client routes correctly.

use std::sync::Arc;

use tracing::{debug, warn};

use scribe_core::{
    BatchKind, BatchRequest, BatchResult, DurabilityWaiter, ErrorCode, ItemError, MetadataCache,
    Namespace, OpLog, OpTimestamp, PartitionVersion, Store, TelemetrySink, UpsertDetail,
    WriteOutcome,
};

use crate::config::ExecutorConfig;
use crate::item::apply_item;
use crate::locks::NamespaceLocks;
use crate::stats::BatchStats;
use crate::telemetry::TracingTelemetry;
use crate::write_concern::enforce_write_concern;

/// Executes write batches against a store.
///
/// One instance serves the whole process; `execute` takes `&self` and
/// batches targeting distinct namespaces run concurrently.
pub struct BatchExecutor {
    pub(crate) store: Arc<dyn Store>,
    pub(crate) cache: Arc<dyn MetadataCache>,
    pub(crate) waiter: Arc<dyn DurabilityWaiter>,
    pub(crate) oplog: Option<Arc<dyn OpLog>>,
    pub(crate) telemetry: Box<dyn TelemetrySink>,
    pub(crate) locks: NamespaceLocks,
    pub(crate) config: ExecutorConfig,
}

impl BatchExecutor {
    /// Create an executor over the given collaborators. No op log is
    /// attached and telemetry goes through `tracing`.
    pub fn new(
        store: Arc<dyn Store>,
        cache: Arc<dyn MetadataCache>,
        waiter: Arc<dyn DurabilityWaiter>,
        config: ExecutorConfig,
    ) -> Self {
        let telemetry = Box::new(TracingTelemetry::new(config.slow_op_threshold));
        BatchExecutor {
            store,
            cache,
            waiter,
            oplog: None,
            telemetry,
            locks: NamespaceLocks::new(),
            config,
        }
    }

    /// Attach an op log. Successful writes append one record each.
    pub fn with_oplog(mut self, oplog: Arc<dyn OpLog>) -> Self {
        self.oplog = Some(oplog);
        self
    }

    /// Replace the telemetry sink.
    pub fn with_telemetry(mut self, telemetry: Box<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Execute one batch to completion and build its result.
    ///
    /// Never returns an error: per-item failures land in `errors`,
    /// durability failures in `write_concern_error`, and `ok` is true on
    /// every completion.
    pub fn execute(&self, request: &BatchRequest) -> BatchResult {
        let mut result = BatchResult::default();
        let mut stats = BatchStats::default();
        let mut last_op: Option<OpTimestamp> = None;
        let mut successes: u64 = 0;
        let mut stale_ns: Option<Namespace> = None;

        for index in 0..request.items.len() {
            match apply_item(self, request, index, &mut stats, &mut last_op) {
                WriteOutcome::Success { upserted_id } => {
                    successes += 1;
                    if request.verbose {
                        if let Some(id) = upserted_id {
                            result.upserted.push(UpsertDetail { index, id });
                        }
                    }
                }
                WriteOutcome::Failure(error) => {
                    if error.code == ErrorCode::StaleShardVersion && stale_ns.is_none() {
                        stale_ns = Some(request.targeting_namespace(index));
                    }
                    if request.verbose {
                        result.errors.push(ItemError { index, error });
                    }
                    if request.ordered {
                        break;
                    }
                }
            }
        }

        result.n = stats.affected();
        if request.kind == BatchKind::Update {
            result.modified_count = Some(stats.modified);
        }

        // Nothing was written, nothing to wait for.
        if successes > 0 {
            result.write_concern_error = enforce_write_concern(
                self.waiter.as_ref(),
                request.write_concern.as_ref(),
                &self.config.default_write_concern,
                last_op,
            );
        }

        if request.verbose {
            result.last_op = last_op;
        }

        // After the response is fully built, so a refresh failure cannot
        // change what the client sees.
        if let Some(ns) = stale_ns {
            self.refresh_metadata(&ns, request.shard_version.as_ref());
        }

        result.ok = true;
        result
    }

    fn refresh_metadata(&self, ns: &Namespace, declared: Option<&PartitionVersion>) {
        let known = declared.copied().unwrap_or(PartitionVersion::UNSHARDED);
        match self.cache.refresh(ns, &known) {
            Ok(latest) => {
                debug!(ns = %ns, version = %latest, "refreshed partition metadata after stale write");
            }
            Err(reason) => {
                warn!(ns = %ns, reason, "could not refresh partition metadata after stale write");
            }
        }
    }
}
