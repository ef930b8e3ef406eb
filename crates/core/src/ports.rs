//! Port interfaces at the scheduling boundaries
//!
//! These traits define the seams between the dispatch logic and its
//! collaborators: caller-supplied work units, the active backend adapter,
//! the platform acknowledgement channel, and the observability sink.

use async_trait::async_trait;
use bgtask_domain::{TaskId, TaskInfo, TaskParameters};

use crate::dispatcher::TaskFinishedHandle;

/// Caller-supplied implementation of the actual deferred logic.
///
/// `on_start` runs on the coordination context and must return quickly; a
/// work unit that needs real processing returns `true`, does its work on
/// its own execution context, and invokes the finished handle exactly once
/// when done.
pub trait BackgroundTask: Send + Sync {
    /// Begin executing the task.
    ///
    /// Returns whether the task needs asynchronous background processing.
    /// Returning `false` means the work completed synchronously and no
    /// further acknowledgement will follow.
    fn on_start(&self, params: TaskParameters, finished: TaskFinishedHandle) -> bool;

    /// The back-end is forcibly stopping the task (constraints no longer
    /// hold). Returns whether the back-end should reschedule it.
    fn on_stop(&self, params: TaskParameters) -> bool;
}

/// Backend adapter surface: translates descriptors into back-end requests.
///
/// Both operations are best-effort and must never panic across this
/// boundary; a back-end failure surfaces as `false` from `schedule`.
#[async_trait]
pub trait SchedulerDelegate: Send + Sync {
    /// Hand the descriptor to the underlying scheduling facility.
    ///
    /// Returns whether the back-end accepted the request.
    async fn schedule(&self, task: &TaskInfo) -> bool;

    /// Drop the pending registration for the given id.
    ///
    /// Cooperative only: an already-running work unit keeps running until
    /// it finishes or the back-end stops it.
    async fn cancel(&self, task_id: TaskId);
}

/// Acknowledgement channel back to the platform that delivered a start
/// signal.
///
/// Invoked by the dispatcher exactly once per asynchronous execution, on
/// the coordination context, when the work unit reports completion.
#[async_trait]
pub trait JobFinisher: Send + Sync {
    /// Report that the work unit for `task_id` finished
    async fn job_finished(&self, task_id: TaskId, needs_reschedule: bool);
}

/// Observability sink for task lifecycle events.
///
/// Best-effort: implementations must not block and must not fail
/// scheduling.
pub trait TaskEventSink: Send + Sync {
    /// A work unit was started by a back-end signal
    fn task_started(&self, task_id: TaskId);

    /// A running work unit was stopped by the back-end
    fn task_stopped(&self, task_id: TaskId);

    /// A one-off task reached its deadline and was skipped
    fn task_expired(&self, task_id: TaskId);

    /// Keys dropped while narrowing the caller payload at schedule time
    fn extras_conversion_failed(&self, task_id: TaskId, failed_keys: &[String]);
}
