//! Adapter for the first-party system job service

use std::sync::Arc;

use async_trait::async_trait;
use bgtask_core::{Clock, SchedulerDelegate, TaskEventSink};
use bgtask_domain::{encode_extras, JobExtras, TaskId, TaskInfo, TimingInfo};
use tracing::{debug, error, warn};

use crate::backends::{SystemJobInfo, SystemJobService, SystemJobTiming};
use crate::capabilities::PlatformCapabilities;
use crate::delegates::DelegateConfig;

/// Translates task descriptors into system job requests.
///
/// The system job service shares the scheduler's network enumeration and
/// takes millisecond windows natively; the only capability gap is flex,
/// which older platform versions lack.
pub struct SystemJobDelegate {
    service: Arc<dyn SystemJobService>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn TaskEventSink>,
    config: DelegateConfig,
    capabilities: PlatformCapabilities,
}

impl SystemJobDelegate {
    /// Create an adapter over the given service
    pub fn new(
        service: Arc<dyn SystemJobService>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn TaskEventSink>,
        config: DelegateConfig,
        capabilities: PlatformCapabilities,
    ) -> Self {
        Self { service, clock, events, config, capabilities }
    }

    fn build_job(&self, task: &TaskInfo) -> SystemJobInfo {
        let converted = encode_extras(&task.extras);
        if converted.has_failures() {
            warn!(
                task_id = %task.task_id,
                failed_keys = %converted.failed_keys_display(),
                "Dropped extras not representable across the scheduling boundary"
            );
            self.events.extras_conversion_failed(task.task_id, &converted.failed_keys);
        }
        let mut job_extras = JobExtras { deadline_ms: None, extras: converted.extras };

        let timing = match task.timing {
            TimingInfo::OneOff { window_start_ms, window_end_ms, expires_after_window_end } => {
                let mut override_deadline_ms = window_end_ms;
                if expires_after_window_end {
                    let deadline_ms = self
                        .clock
                        .now_ms()
                        .saturating_add(i64::try_from(window_end_ms).unwrap_or(i64::MAX));
                    job_extras.deadline_ms = Some(deadline_ms);
                    // The dispatcher enforces the deadline; pad the
                    // back-end window so it does not race the check.
                    override_deadline_ms =
                        override_deadline_ms.saturating_add(self.config.deadline_slack_ms);
                }
                SystemJobTiming::OneOff {
                    minimum_latency_ms: window_start_ms,
                    override_deadline_ms,
                }
            }
            TimingInfo::Periodic { interval_ms, flex_ms } => SystemJobTiming::Periodic {
                interval_ms,
                flex_ms: flex_ms.filter(|_| self.capabilities.supports_native_flex),
            },
        };

        SystemJobInfo {
            job_id: task.task_id,
            timing,
            required_network: task.required_network,
            requires_charging: task.requires_charging,
            persisted: task.is_persisted,
            extras: job_extras.to_wire(),
        }
    }

    async fn has_pending_job(&self, job_id: TaskId) -> bool {
        match self.service.pending_job_ids().await {
            Ok(ids) => ids.contains(&job_id),
            Err(err) => {
                debug!(job_id = %job_id, error = %err, "Could not list pending jobs");
                false
            }
        }
    }
}

#[async_trait]
impl SchedulerDelegate for SystemJobDelegate {
    async fn schedule(&self, task: &TaskInfo) -> bool {
        let job = self.build_job(task);

        // Coalesce with an existing pending job unless the caller asked
        // for replacement.
        if !task.should_update_current && self.has_pending_job(task.task_id).await {
            debug!(task_id = %task.task_id, "Pending job exists; keeping current registration");
            return true;
        }

        match self.service.schedule(job).await {
            Ok(accepted) => {
                if !accepted {
                    warn!(task_id = %task.task_id, "System job service refused the request");
                }
                accepted
            }
            Err(err) => {
                error!(task_id = %task.task_id, error = %err, "Unable to schedule system job");
                false
            }
        }
    }

    async fn cancel(&self, task_id: TaskId) {
        if let Err(err) = self.service.cancel(task_id).await {
            error!(task_id = %task_id, error = %err, "Failed to cancel system job");
        }
    }
}
