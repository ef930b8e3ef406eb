//! Task descriptor types
//!
//! A [`TaskInfo`] is the immutable description of one schedulable unit of
//! work: its identity, timing window or period, and execution constraints.
//! Instances are built through [`TaskInfoBuilder`], which validates the
//! timing invariants before handing out a descriptor.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building a task descriptor
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaskInfoError {
    #[error("Task id must be a positive integer")]
    InvalidTaskId,

    #[error("One-off window end {end_ms}ms precedes window start {start_ms}ms")]
    WindowEndBeforeStart { start_ms: u64, end_ms: u64 },

    #[error("Periodic interval must be positive")]
    ZeroInterval,

    #[error("Flex {flex_ms}ms must be smaller than interval {interval_ms}ms")]
    FlexExceedsInterval { interval_ms: u64, flex_ms: u64 },
}

/// Identifier of a schedulable task.
///
/// Caller-assigned and stable across restarts, so a rescheduled task
/// correlates with state from a prior run. Unique within the scheduling
/// namespace.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TaskId(u32);

impl TaskId {
    /// Create a task id from a raw positive integer
    pub fn new(raw: u32) -> Result<Self, TaskInfoError> {
        if raw == 0 {
            return Err(TaskInfoError::InvalidTaskId);
        }
        Ok(Self(raw))
    }

    /// Raw integer value of this id
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Network condition a task requires before it may run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkType {
    /// No network required
    None,
    /// Any connected network
    Any,
    /// Unmetered network only
    Unmetered,
}

/// Timing constraints of a task.
///
/// Exactly one variant applies to a given task: either a one-off execution
/// window or a recurring period. Adapters match exhaustively on this enum
/// when translating a descriptor into a back-end request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingInfo {
    /// Single execution inside a time window
    OneOff {
        /// Optional delay before the task becomes eligible
        window_start_ms: Option<u64>,
        /// Upper bound of the execution window, relative to scheduling time
        window_end_ms: u64,
        /// Skip the task entirely if it has not started by the window end
        expires_after_window_end: bool,
    },
    /// Recurring execution with a fixed period
    Periodic {
        /// Period between executions
        interval_ms: u64,
        /// Optional window at the end of each period within which the
        /// back-end may run the task
        flex_ms: Option<u64>,
    },
}

/// Immutable descriptor of one schedulable unit of work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInfo {
    /// Stable caller-assigned identity
    pub task_id: TaskId,
    /// One-off window or recurring period
    pub timing: TimingInfo,
    /// Network condition required before the task may run
    pub required_network: NetworkType,
    /// Only run while the device is charging
    pub requires_charging: bool,
    /// Survive a process or device restart
    pub is_persisted: bool,
    /// Replace an existing pending task with the same id
    pub should_update_current: bool,
    /// Caller payload, round-tripped to the work unit at start time.
    ///
    /// Values outside the restricted persistable set are dropped at
    /// schedule time by the extras codec, never rejected.
    pub extras: serde_json::Map<String, serde_json::Value>,
}

impl TaskInfo {
    /// Start building a one-off task descriptor
    pub fn one_off(task_id: TaskId, window_end_ms: u64) -> TaskInfoBuilder {
        TaskInfoBuilder::new(
            task_id,
            TimingInfo::OneOff {
                window_start_ms: None,
                window_end_ms,
                expires_after_window_end: false,
            },
        )
    }

    /// Start building a periodic task descriptor
    pub fn periodic(task_id: TaskId, interval_ms: u64) -> TaskInfoBuilder {
        TaskInfoBuilder::new(task_id, TimingInfo::Periodic { interval_ms, flex_ms: None })
    }
}

/// Builder for [`TaskInfo`] with invariant validation at `build` time
#[derive(Debug, Clone)]
pub struct TaskInfoBuilder {
    task_id: TaskId,
    timing: TimingInfo,
    required_network: NetworkType,
    requires_charging: bool,
    is_persisted: bool,
    should_update_current: bool,
    extras: serde_json::Map<String, serde_json::Value>,
}

impl TaskInfoBuilder {
    fn new(task_id: TaskId, timing: TimingInfo) -> Self {
        Self {
            task_id,
            timing,
            required_network: NetworkType::None,
            requires_charging: false,
            is_persisted: false,
            should_update_current: false,
            extras: serde_json::Map::new(),
        }
    }

    /// Delay before a one-off task becomes eligible.
    ///
    /// Ignored for periodic tasks.
    #[must_use]
    pub fn window_start_ms(mut self, start_ms: u64) -> Self {
        if let TimingInfo::OneOff { ref mut window_start_ms, .. } = self.timing {
            *window_start_ms = Some(start_ms);
        }
        self
    }

    /// Skip a one-off task entirely once its window end has passed.
    ///
    /// Ignored for periodic tasks.
    #[must_use]
    pub fn expires_after_window_end(mut self, expires: bool) -> Self {
        if let TimingInfo::OneOff { ref mut expires_after_window_end, .. } = self.timing {
            *expires_after_window_end = expires;
        }
        self
    }

    /// Flex window for a periodic task.
    ///
    /// Ignored for one-off tasks.
    #[must_use]
    pub fn flex_ms(mut self, flex: u64) -> Self {
        if let TimingInfo::Periodic { ref mut flex_ms, .. } = self.timing {
            *flex_ms = Some(flex);
        }
        self
    }

    /// Network condition required before the task may run
    #[must_use]
    pub fn required_network(mut self, network: NetworkType) -> Self {
        self.required_network = network;
        self
    }

    /// Only run while the device is charging
    #[must_use]
    pub fn requires_charging(mut self, charging: bool) -> Self {
        self.requires_charging = charging;
        self
    }

    /// Survive a process or device restart
    #[must_use]
    pub fn is_persisted(mut self, persisted: bool) -> Self {
        self.is_persisted = persisted;
        self
    }

    /// Replace an existing pending task with the same id rather than
    /// coalescing with it
    #[must_use]
    pub fn should_update_current(mut self, update: bool) -> Self {
        self.should_update_current = update;
        self
    }

    /// Attach a caller payload value under the given key
    #[must_use]
    pub fn extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extras.insert(key.into(), value);
        self
    }

    /// Replace the whole caller payload
    #[must_use]
    pub fn extras(mut self, extras: serde_json::Map<String, serde_json::Value>) -> Self {
        self.extras = extras;
        self
    }

    /// Validate the timing invariants and produce the descriptor
    ///
    /// # Errors
    ///
    /// Returns [`TaskInfoError`] when the one-off window is inverted, the
    /// periodic interval is zero, or the flex window is not smaller than
    /// the interval.
    pub fn build(self) -> Result<TaskInfo, TaskInfoError> {
        match self.timing {
            TimingInfo::OneOff { window_start_ms, window_end_ms, .. } => {
                if let Some(start_ms) = window_start_ms {
                    if window_end_ms < start_ms {
                        return Err(TaskInfoError::WindowEndBeforeStart {
                            start_ms,
                            end_ms: window_end_ms,
                        });
                    }
                }
            }
            TimingInfo::Periodic { interval_ms, flex_ms } => {
                if interval_ms == 0 {
                    return Err(TaskInfoError::ZeroInterval);
                }
                if let Some(flex_ms) = flex_ms {
                    if flex_ms >= interval_ms {
                        return Err(TaskInfoError::FlexExceedsInterval { interval_ms, flex_ms });
                    }
                }
            }
        }

        Ok(TaskInfo {
            task_id: self.task_id,
            timing: self.timing,
            required_network: self.required_network,
            requires_charging: self.requires_charging,
            is_persisted: self.is_persisted,
            should_update_current: self.should_update_current,
            extras: self.extras,
        })
    }
}

/// Parameters handed to a work unit when the back-end starts it.
///
/// The extras are the caller payload restored by the codec; keys dropped at
/// schedule time are absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskParameters {
    /// Identity of the task being started or stopped
    pub task_id: TaskId,
    /// Restored caller payload
    pub extras: serde_json::Map<String, serde_json::Value>,
}
