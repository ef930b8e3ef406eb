//! Back-end capability profiles
//!
//! Each adapter targets one external scheduling facility, specified here
//! only at its boundary. The first-party system job service takes
//! millisecond windows and understands the scheduler's own network enum;
//! the third-party network task service works in whole seconds, addresses
//! tasks by string tag, and has its own network-state enumeration.
//!
//! Real platform bindings implement these traits; tests substitute
//! recording fakes.

use async_trait::async_trait;
use bgtask_domain::{NetworkType, TaskId};
use serde_json::Value;
use thiserror::Error;

/// Failure surfaced by a scheduling back-end
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The scheduling facility is not present or not reachable
    #[error("Scheduling back-end unavailable")]
    Unavailable,

    /// The back-end rejected the request
    #[error("Scheduling back-end rejected request: {0}")]
    Rejected(String),
}

/// Timing section of a system job request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemJobTiming {
    /// Execute once between a minimum latency and an override deadline
    OneOff {
        /// Earliest eligibility, relative ms
        minimum_latency_ms: Option<u64>,
        /// Latest start, relative ms (already slack-extended by the
        /// adapter when a deadline is embedded)
        override_deadline_ms: u64,
    },
    /// Recurring execution
    Periodic {
        /// Period in ms
        interval_ms: u64,
        /// Flex window in ms; absent when the platform lacks native flex
        flex_ms: Option<u64>,
    },
}

/// Scheduling request understood by the system job service
#[derive(Debug, Clone, PartialEq)]
pub struct SystemJobInfo {
    /// Job identity, shared with the task id namespace
    pub job_id: TaskId,
    /// One-off window or period
    pub timing: SystemJobTiming,
    /// Required network condition (native enum matches [`NetworkType`])
    pub required_network: NetworkType,
    /// Only run while charging
    pub requires_charging: bool,
    /// Survive device restart
    pub persisted: bool,
    /// Opaque payload delivered back at start time
    pub extras: Value,
}

/// First-party OS job scheduling facility (capability profile).
///
/// Native millisecond one-off windows and periodic scheduling; flex
/// support depends on the platform version, which the adapter checks
/// before setting it.
#[async_trait]
pub trait SystemJobService: Send + Sync {
    /// Enqueue a job. `Ok(false)` means the service refused the request;
    /// `Err` means the service itself failed.
    async fn schedule(&self, job: SystemJobInfo) -> Result<bool, BackendError>;

    /// Drop the pending job with the given id
    async fn cancel(&self, job_id: TaskId) -> Result<(), BackendError>;

    /// Ids of jobs currently pending with the service
    async fn pending_job_ids(&self) -> Result<Vec<TaskId>, BackendError>;
}

/// Network-state requirement of the third-party network task service.
///
/// Note the skewed semantics: this service's "any state" means no network
/// is required at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkState {
    /// Any network state acceptable, including none
    AnyState,
    /// Some connected network required
    Connected,
    /// Unmetered network required
    Unmetered,
}

/// Timing section of a network task request, in whole seconds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkTaskTiming {
    /// Execute once inside a second-granularity window
    OneOff {
        /// Window start, relative seconds
        window_start_secs: u64,
        /// Window end, relative seconds
        window_end_secs: u64,
    },
    /// Recurring execution
    Periodic {
        /// Period in seconds
        period_secs: u64,
        /// Flex window in seconds
        flex_secs: Option<u64>,
    },
}

/// Scheduling request understood by the network task service
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkTaskSpec {
    /// Task identity as the service's string tag
    pub tag: String,
    /// One-off window or period
    pub timing: NetworkTaskTiming,
    /// Required network state, in the service's own enumeration
    pub network_state: NetworkState,
    /// Only run while charging
    pub requires_charging: bool,
    /// Survive device restart
    pub persisted: bool,
    /// Replace an existing pending task with the same tag
    pub update_current: bool,
    /// Opaque payload delivered back at start time
    pub extras: Value,
}

/// Third-party network scheduling facility (capability profile).
///
/// Second-granularity execution windows, native periodic+flex, may be
/// absent entirely on a given device.
#[async_trait]
pub trait NetworkTaskService: Send + Sync {
    /// Whether the service is present and usable on this device
    fn is_available(&self) -> bool;

    /// Enqueue a task
    async fn schedule(&self, spec: NetworkTaskSpec) -> Result<(), BackendError>;

    /// Drop the pending task with the given tag
    async fn cancel(&self, tag: &str) -> Result<(), BackendError>;
}
