//! # BgTask Infrastructure
//!
//! Infrastructure implementations of the core scheduling ports.
//!
//! This crate contains:
//! - The two backend adapters translating task descriptors into
//!   back-end-specific scheduling requests
//! - The capability profiles those adapters consume
//!   (`SystemJobService`, `NetworkTaskService`)
//! - Platform capability detection and the scheduler factory
//! - A tracing-backed task event sink
//!
//! ## Architecture
//! - Implements traits defined in `bgtask-core`
//! - The concrete OS scheduling facilities stay behind the backend
//!   capability-profile traits; nothing here touches OS APIs directly

pub mod backends;
pub mod capabilities;
pub mod delegates;
pub mod events;
pub mod factory;

// Re-export commonly used items
pub use backends::{
    BackendError, NetworkState, NetworkTaskService, NetworkTaskSpec, NetworkTaskTiming,
    SystemJobInfo, SystemJobService, SystemJobTiming,
};
pub use capabilities::PlatformCapabilities;
pub use delegates::{DelegateConfig, NetworkTaskDelegate, SystemJobDelegate, task_id_from_tag};
pub use events::TracingEventSink;
pub use factory::{BackgroundTaskScheduler, SchedulerEnv, SchedulerFactory};
