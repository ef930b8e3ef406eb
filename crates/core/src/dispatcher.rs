//! Task dispatcher and in-flight registry
//!
//! The dispatcher receives opaque start/stop signals from the active
//! back-end, correlates them with registered work units, enforces the
//! embedded deadline, and serializes completion acknowledgement.
//!
//! All registry mutation happens under one coordination context: a single
//! async mutex held across every decide-mutate-acknowledge sequence.
//! Signals may originate anywhere (back-end callbacks, work-unit completion
//! from arbitrary tasks); each one locks the context before touching shared
//! state. This closes the race between "work unit finishes and removes
//! itself" and "back-end immediately restarts the same task id": a finish
//! for run N can never be attributed to run N+1.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bgtask_domain::{decode_extras, JobExtras, TaskId, TaskInfo, TaskParameters};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::ports::{BackgroundTask, JobFinisher, SchedulerDelegate, TaskEventSink};
use crate::registry::TaskFactoryRegistry;

/// Registry entry for one in-flight execution
struct RunningTask {
    task: Arc<dyn BackgroundTask>,
}

struct DispatcherInner {
    /// In-flight executions, at most one per task id.
    ///
    /// The mutex is the coordination context; never exposed outside this
    /// module.
    running: Mutex<HashMap<TaskId, RunningTask>>,
    factories: Arc<TaskFactoryRegistry>,
    delegate: Arc<dyn SchedulerDelegate>,
    finisher: Arc<dyn JobFinisher>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn TaskEventSink>,
}

/// Process-side dispatcher for back-end start/stop signals.
///
/// Owns the only mutable shared state of the subsystem (the in-flight
/// registry) and the single coordination context serializing access to it.
#[derive(Clone)]
pub struct TaskDispatcher {
    inner: Arc<DispatcherInner>,
}

impl TaskDispatcher {
    /// Create a dispatcher wired to its collaborators.
    ///
    /// Explicit injection: the dispatcher never consults globals for the
    /// clock, registry, or adapter.
    pub fn new(
        factories: Arc<TaskFactoryRegistry>,
        delegate: Arc<dyn SchedulerDelegate>,
        finisher: Arc<dyn JobFinisher>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn TaskEventSink>,
    ) -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                running: Mutex::new(HashMap::new()),
                factories,
                delegate,
                finisher,
                clock,
                events,
            }),
        }
    }

    /// Forward a descriptor to the active back-end adapter.
    ///
    /// Serialized on the coordination context like every other adapter
    /// call. Returns whether the back-end accepted the request.
    pub async fn schedule(&self, task: &TaskInfo) -> bool {
        let _guard = self.inner.running.lock().await;
        self.inner.delegate.schedule(task).await
    }

    /// Drop the back-end's pending registration for a task id.
    ///
    /// Cooperative: an in-flight work unit keeps running until it finishes
    /// or the back-end stops it.
    pub async fn cancel(&self, task_id: TaskId) {
        let _guard = self.inner.running.lock().await;
        self.inner.delegate.cancel(task_id).await;
    }

    /// Handle a start signal delivered by the back-end.
    ///
    /// Returns whether the task was accepted for asynchronous background
    /// processing (the back-end keeps its reservation only on `true`).
    pub async fn on_start_signal(&self, task_id: TaskId, raw_extras: &Value) -> bool {
        let job = JobExtras::from_wire(raw_extras);
        let mut running = self.inner.running.lock().await;

        let Some(task) = self.inner.factories.instantiate(task_id) else {
            // The implementation was removed in a newer build. Cancel so
            // the back-end stops retrying a task nobody can run.
            warn!(task_id = %task_id, "No work unit registered; cancelling stale registration");
            self.inner.delegate.cancel(task_id).await;
            return false;
        };

        if let Some(deadline_ms) = job.deadline_ms {
            let now_ms = self.inner.clock.now_ms();
            if now_ms >= deadline_ms {
                info!(task_id = %task_id, deadline_ms, now_ms, "Task expired before start; skipping");
                self.inner.events.task_expired(task_id);
                return false;
            }
        }

        running.insert(task_id, RunningTask { task: Arc::clone(&task) });

        let params = TaskParameters { task_id, extras: decode_extras(&job.extras) };
        let finished = TaskFinishedHandle {
            task_id,
            task: Arc::clone(&task),
            inner: Arc::clone(&self.inner),
            completed: Arc::new(AtomicBool::new(false)),
        };

        self.inner.events.task_started(task_id);
        let needs_background_processing = task.on_start(params, finished);

        if !needs_background_processing {
            // Synchronous completion: no acknowledgement will follow, so
            // the entry must not outlive this signal.
            running.remove(&task_id);
        }
        needs_background_processing
    }

    /// Handle a stop signal delivered by the back-end.
    ///
    /// Returns whether the back-end should reschedule the task.
    pub async fn on_stop_signal(&self, task_id: TaskId, raw_extras: &Value) -> bool {
        let job = JobExtras::from_wire(raw_extras);
        let mut running = self.inner.running.lock().await;

        let Some(entry) = running.get(&task_id) else {
            warn!(task_id = %task_id, "Stop signal for a task that is not running; ignoring");
            return false;
        };

        self.inner.events.task_stopped(task_id);
        let params = TaskParameters { task_id, extras: decode_extras(&job.extras) };
        let needs_reschedule = entry.task.on_stop(params);
        running.remove(&task_id);
        needs_reschedule
    }

    /// Whether a work unit for the given id is currently in flight
    pub async fn is_running(&self, task_id: TaskId) -> bool {
        self.inner.running.lock().await.contains_key(&task_id)
    }
}

/// Completion callback bound to one start invocation.
///
/// Cloneable and invokable from any execution context; only the first
/// invocation for a given start has any effect. Stale handles (the entry
/// was removed or replaced by a newer run) are ignored with a log line.
#[derive(Clone)]
pub struct TaskFinishedHandle {
    task_id: TaskId,
    task: Arc<dyn BackgroundTask>,
    inner: Arc<DispatcherInner>,
    completed: Arc<AtomicBool>,
}

impl TaskFinishedHandle {
    /// Report that the work unit finished.
    ///
    /// Resolves on the coordination context: the registry entry is removed
    /// and the back-end acknowledged atomically with respect to a new
    /// start signal for the same task id.
    pub async fn finished(&self, needs_reschedule: bool) {
        if self.completed.swap(true, Ordering::SeqCst) {
            warn!(task_id = %self.task_id, "Duplicate completion signal; ignoring");
            return;
        }

        let mut running = self.inner.running.lock().await;
        let is_current = running
            .get(&self.task_id)
            .is_some_and(|entry| Arc::ptr_eq(&entry.task, &self.task));
        if !is_current {
            warn!(task_id = %self.task_id, "Completion signal for a non-current work unit; ignoring");
            return;
        }

        running.remove(&self.task_id);
        debug!(task_id = %self.task_id, needs_reschedule, "Task finished");
        // Acknowledge while still holding the coordination context so a
        // fresh start for this id cannot interleave with the removal.
        self.inner.finisher.job_finished(self.task_id, needs_reschedule).await;
    }
}
