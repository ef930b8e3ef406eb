//! Backend adapters
//!
//! Two interchangeable adapters implement the `SchedulerDelegate` port,
//! one per scheduling facility:
//! - [`SystemJobDelegate`] targets the first-party system job service
//! - [`NetworkTaskDelegate`] targets the third-party network task service
//!
//! Both stamp the absolute deadline into the wire payload when a one-off
//! task expires after its window, then pad the back-end's own window by a
//! slack so the dispatcher, not the back-end, is the enforcement
//! mechanism. Both are best-effort: back-end failures are logged and
//! surfaced as `false` from `schedule`, never as a panic.

pub mod network_task;
pub mod system_job;

pub use network_task::{NetworkTaskDelegate, task_id_from_tag};
pub use system_job::SystemJobDelegate;

/// Tunables shared by both adapters
#[derive(Debug, Clone)]
pub struct DelegateConfig {
    /// Padding added to a one-off window end before hand-off to the
    /// back-end, absorbing back-end dispatch jitter relative to the
    /// dispatcher's own deadline check
    pub deadline_slack_ms: u64,
}

impl Default for DelegateConfig {
    fn default() -> Self {
        Self { deadline_slack_ms: 1_000 }
    }
}
