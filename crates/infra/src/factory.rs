//! Scheduler factory
//!
//! Selects exactly one backend adapter for the process lifetime based on
//! the platform capability probe, wires the dispatcher to it, and exposes
//! the single `schedule`/`cancel` entry point. Callers never branch on
//! back-end identity.
//!
//! Everything is injected explicitly: the factory owns one clock, one
//! event sink, and one dispatcher per process, handed to constructors
//! rather than looked up globally.

use std::sync::Arc;

use bgtask_core::{
    Clock, JobFinisher, SchedulerDelegate, TaskDispatcher, TaskEventSink, TaskFactoryRegistry,
};
use bgtask_domain::{TaskId, TaskInfo};
use tracing::info;

use crate::backends::{NetworkTaskService, SystemJobService};
use crate::capabilities::PlatformCapabilities;
use crate::delegates::{DelegateConfig, NetworkTaskDelegate, SystemJobDelegate};

/// Collaborators needed to assemble a scheduler
pub struct SchedulerEnv {
    /// Result of the platform capability probe
    pub capabilities: PlatformCapabilities,
    /// First-party system job service binding
    pub system_job_service: Arc<dyn SystemJobService>,
    /// Third-party network task service binding
    pub network_task_service: Arc<dyn NetworkTaskService>,
    /// Time source shared by adapters and dispatcher
    pub clock: Arc<dyn Clock>,
    /// Lifecycle event sink
    pub events: Arc<dyn TaskEventSink>,
    /// Adapter tunables
    pub config: DelegateConfig,
}

/// Assembles the scheduler for the current environment
pub struct SchedulerFactory;

impl SchedulerFactory {
    /// Pick the backend adapter for this environment.
    ///
    /// The system job service is preferred whenever the platform has it;
    /// the network task service is the fallback.
    pub fn delegate_for(env: &SchedulerEnv) -> Arc<dyn SchedulerDelegate> {
        if env.capabilities.has_system_job_service {
            info!("Using system job service back-end");
            Arc::new(SystemJobDelegate::new(
                Arc::clone(&env.system_job_service),
                Arc::clone(&env.clock),
                Arc::clone(&env.events),
                env.config.clone(),
                env.capabilities,
            ))
        } else {
            info!("Using network task service back-end");
            Arc::new(NetworkTaskDelegate::new(
                Arc::clone(&env.network_task_service),
                Arc::clone(&env.clock),
                Arc::clone(&env.events),
                env.config.clone(),
            ))
        }
    }

    /// Build the scheduler: one adapter, one dispatcher, one coordination
    /// context for the process lifetime.
    pub fn create(
        env: &SchedulerEnv,
        factories: Arc<TaskFactoryRegistry>,
        finisher: Arc<dyn JobFinisher>,
    ) -> BackgroundTaskScheduler {
        let delegate = Self::delegate_for(env);
        let dispatcher = TaskDispatcher::new(
            factories,
            delegate,
            finisher,
            Arc::clone(&env.clock),
            Arc::clone(&env.events),
        );
        BackgroundTaskScheduler { dispatcher }
    }
}

/// Caller-facing scheduling entry point.
///
/// Thin indirection over the selected adapter so calling code stays
/// agnostic of which back-end executes its tasks.
#[derive(Clone)]
pub struct BackgroundTaskScheduler {
    dispatcher: TaskDispatcher,
}

impl BackgroundTaskScheduler {
    /// Register a task with the active back-end.
    ///
    /// Best-effort: returns whether the back-end accepted the request.
    pub async fn schedule(&self, task: &TaskInfo) -> bool {
        self.dispatcher.schedule(task).await
    }

    /// Drop the pending registration for a task id.
    ///
    /// An already-running work unit keeps running until it finishes or the
    /// back-end stops it.
    pub async fn cancel(&self, task_id: TaskId) {
        self.dispatcher.cancel(task_id).await;
    }

    /// Dispatcher receiving the platform's inbound start/stop signals
    pub fn dispatcher(&self) -> &TaskDispatcher {
        &self.dispatcher
    }
}
