//! Tracing-backed task event sink

use bgtask_core::TaskEventSink;
use bgtask_domain::TaskId;
use tracing::{info, warn};

/// Reports task lifecycle events as structured log lines.
///
/// Best-effort by construction: emitting a trace event never blocks and
/// never fails scheduling.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl TracingEventSink {
    /// Create the sink
    pub fn new() -> Self {
        Self
    }
}

impl TaskEventSink for TracingEventSink {
    fn task_started(&self, task_id: TaskId) {
        info!(task_id = %task_id, "Background task started");
    }

    fn task_stopped(&self, task_id: TaskId) {
        info!(task_id = %task_id, "Background task stopped by back-end");
    }

    fn task_expired(&self, task_id: TaskId) {
        info!(task_id = %task_id, "Background task expired before start");
    }

    fn extras_conversion_failed(&self, task_id: TaskId, failed_keys: &[String]) {
        warn!(
            task_id = %task_id,
            failed_keys = %failed_keys.join(", "),
            "Extras dropped during conversion"
        );
    }
}
