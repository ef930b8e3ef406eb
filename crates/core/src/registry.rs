//! Work-unit factory registry
//!
//! Maps task ids to factories producing the work unit for that id. Callers
//! register every task id they intend to schedule, typically at process
//! startup. A start signal for an unregistered id means the implementation
//! was removed in a newer build; the dispatcher treats that as a stale
//! registration and cancels it.

use std::collections::HashMap;
use std::sync::Arc;

use bgtask_domain::TaskId;

use crate::ports::BackgroundTask;

/// Factory producing a fresh work-unit instance for one start invocation
pub type TaskFactory = Arc<dyn Fn() -> Arc<dyn BackgroundTask> + Send + Sync>;

/// Registry of work-unit factories keyed by task id
#[derive(Default)]
pub struct TaskFactoryRegistry {
    factories: HashMap<TaskId, TaskFactory>,
}

impl TaskFactoryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the factory for a task id, replacing any previous one
    pub fn register<F>(&mut self, task_id: TaskId, factory: F)
    where
        F: Fn() -> Arc<dyn BackgroundTask> + Send + Sync + 'static,
    {
        self.factories.insert(task_id, Arc::new(factory));
    }

    /// Instantiate the work unit registered for a task id, if any
    pub fn instantiate(&self, task_id: TaskId) -> Option<Arc<dyn BackgroundTask>> {
        self.factories.get(&task_id).map(|factory| factory())
    }

    /// Whether a factory is registered for the given id
    pub fn contains(&self, task_id: TaskId) -> bool {
        self.factories.contains_key(&task_id)
    }
}
