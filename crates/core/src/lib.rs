//! # BgTask Core
//!
//! Ports and the dispatch state machine of the background task scheduler.
//!
//! This crate contains:
//! - Port traits at the scheduling boundaries (`BackgroundTask`,
//!   `SchedulerDelegate`, `JobFinisher`, `TaskEventSink`, `Clock`)
//! - The work-unit factory registry consulted when a back-end starts a task
//! - The dispatcher correlating asynchronous back-end start/stop signals
//!   with in-flight work units
//!
//! ## Architecture
//! - Defines traits implemented by `bgtask-infra`
//! - Depends only on `bgtask-domain`
//! - All registry mutation is serialized on one coordination context

pub mod clock;
pub mod dispatcher;
pub mod ports;
pub mod registry;

// Re-export commonly used items
pub use clock::{Clock, FakeClock, SystemClock};
pub use dispatcher::{TaskDispatcher, TaskFinishedHandle};
pub use ports::{BackgroundTask, JobFinisher, SchedulerDelegate, TaskEventSink};
pub use registry::{TaskFactory, TaskFactoryRegistry};
