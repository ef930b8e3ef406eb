//! Platform capability detection
//!
//! The factory picks a backend adapter once per process based on this
//! probe result. Detection itself is a simple external predicate; real
//! deployments fill this struct from platform bindings, tests construct
//! it directly.

use serde::{Deserialize, Serialize};

/// Capabilities of the current platform, as seen by the factory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCapabilities {
    /// The first-party system job service exists on this platform
    pub has_system_job_service: bool,
    /// The platform version supports periodic flex natively
    pub supports_native_flex: bool,
}

impl Default for PlatformCapabilities {
    fn default() -> Self {
        Self { has_system_job_service: true, supports_native_flex: true }
    }
}

impl PlatformCapabilities {
    /// Platform without the system job service; scheduling falls back to
    /// the network task service
    pub const fn legacy() -> Self {
        Self { has_system_job_service: false, supports_native_flex: false }
    }
}
