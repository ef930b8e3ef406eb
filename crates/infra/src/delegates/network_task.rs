//! Adapter for the third-party network task service

use std::sync::Arc;

use async_trait::async_trait;
use bgtask_core::{Clock, SchedulerDelegate, TaskEventSink};
use bgtask_domain::{encode_extras, JobExtras, NetworkType, TaskId, TaskInfo, TimingInfo};
use tracing::{error, warn};

use crate::backends::{NetworkState, NetworkTaskService, NetworkTaskSpec, NetworkTaskTiming};
use crate::delegates::DelegateConfig;

const MS_PER_SEC: u64 = 1_000;

/// Translates task descriptors into network task requests.
///
/// The network task service only understands second-granularity windows
/// and has its own network-state enumeration; both are mapped here. The
/// service may be entirely absent on a device, in which case every
/// operation degrades to a logged failure.
pub struct NetworkTaskDelegate {
    service: Arc<dyn NetworkTaskService>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn TaskEventSink>,
    config: DelegateConfig,
}

impl NetworkTaskDelegate {
    /// Create an adapter over the given service
    pub fn new(
        service: Arc<dyn NetworkTaskService>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn TaskEventSink>,
        config: DelegateConfig,
    ) -> Self {
        Self { service, clock, events, config }
    }

    fn build_spec(&self, task: &TaskInfo) -> NetworkTaskSpec {
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
                let mut end_ms = window_end_ms;
                if expires_after_window_end {
                    let deadline_ms = self
                        .clock
                        .now_ms()
                        .saturating_add(i64::try_from(window_end_ms).unwrap_or(i64::MAX));
                    job_extras.deadline_ms = Some(deadline_ms);
                    end_ms = end_ms.saturating_add(self.config.deadline_slack_ms);
                }
                NetworkTaskTiming::OneOff {
                    window_start_secs: window_start_ms.unwrap_or(0) / MS_PER_SEC,
                    window_end_secs: end_ms / MS_PER_SEC,
                }
            }
            TimingInfo::Periodic { interval_ms, flex_ms } => NetworkTaskTiming::Periodic {
                period_secs: interval_ms / MS_PER_SEC,
                flex_secs: flex_ms.map(|flex| flex / MS_PER_SEC),
            },
        };

        NetworkTaskSpec {
            tag: task.task_id.to_string(),
            timing,
            network_state: network_state_for(task.required_network),
            requires_charging: task.requires_charging,
            persisted: task.is_persisted,
            update_current: task.should_update_current,
            extras: job_extras.to_wire(),
        }
    }
}

/// Recover the task id from a network task tag.
///
/// The network task service addresses tasks by string tag; outbound specs
/// use the decimal task id as the tag, and start/stop signals hand the tag
/// back. A tag that does not parse to a valid id (foreign tags can reach us
/// after an app update) is rejected here so the signal never reaches the
/// dispatcher.
pub fn task_id_from_tag(tag: &str) -> Option<TaskId> {
    let parsed = tag.parse::<u32>().ok().and_then(|raw| TaskId::new(raw).ok());
    if parsed.is_none() {
        error!(tag, "Network task tag does not name a task id; dropping signal");
    }
    parsed
}

// This is correct: the network task service's "any state" means no network
// is guaranteed.
fn network_state_for(network: NetworkType) -> NetworkState {
    match network {
        NetworkType::None => NetworkState::AnyState,
        NetworkType::Any => NetworkState::Connected,
        NetworkType::Unmetered => NetworkState::Unmetered,
    }
}

#[async_trait]
impl SchedulerDelegate for NetworkTaskDelegate {
    async fn schedule(&self, task: &TaskInfo) -> bool {
        if !self.service.is_available() {
            error!(task_id = %task.task_id, "Network task service is not available");
            return false;
        }

        let spec = self.build_spec(task);
        match self.service.schedule(spec).await {
            Ok(()) => true,
            Err(err) => {
                error!(task_id = %task.task_id, error = %err, "Network task service rejected task");
                false
            }
        }
    }

    async fn cancel(&self, task_id: TaskId) {
        if !self.service.is_available() {
            error!(task_id = %task_id, "Network task service is not available");
            return;
        }
        if let Err(err) = self.service.cancel(&task_id.to_string()).await {
            error!(task_id = %task_id, error = %err, "Failed to cancel network task");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use bgtask_core::FakeClock;

    use crate::backends::BackendError;

    use super::*;

    #[derive(Default)]
    struct RecordingNetworkService {
        specs: StdMutex<Vec<NetworkTaskSpec>>,
        cancelled: StdMutex<Vec<String>>,
        unavailable: bool,
        reject: bool,
    }

    #[async_trait]
    impl NetworkTaskService for RecordingNetworkService {
        fn is_available(&self) -> bool {
            !self.unavailable
        }

        async fn schedule(&self, spec: NetworkTaskSpec) -> Result<(), BackendError> {
            if self.reject {
                return Err(BackendError::Rejected("bad window".into()));
            }
            self.specs.lock().unwrap().push(spec);
            Ok(())
        }

        async fn cancel(&self, tag: &str) -> Result<(), BackendError> {
            self.cancelled.lock().unwrap().push(tag.to_string());
            Ok(())
        }
    }

    struct NoopEvents;

    impl TaskEventSink for NoopEvents {
        fn task_started(&self, _task_id: TaskId) {}
        fn task_stopped(&self, _task_id: TaskId) {}
        fn task_expired(&self, _task_id: TaskId) {}
        fn extras_conversion_failed(&self, _task_id: TaskId, _failed_keys: &[String]) {}
    }

    struct Fixture {
        delegate: NetworkTaskDelegate,
        service: Arc<RecordingNetworkService>,
        clock: Arc<FakeClock>,
    }

    fn fixture(service: RecordingNetworkService) -> Fixture {
        let service = Arc::new(service);
        let clock = Arc::new(FakeClock::at_ms(90_000));
        let delegate = NetworkTaskDelegate::new(
            Arc::clone(&service) as Arc<dyn NetworkTaskService>,
            Arc::clone(&clock) as Arc<dyn Clock>,
            Arc::new(NoopEvents) as Arc<dyn TaskEventSink>,
            DelegateConfig::default(),
        );
        Fixture { delegate, service, clock }
    }

    fn id(raw: u32) -> TaskId {
        TaskId::new(raw).unwrap()
    }

    #[tokio::test]
    async fn one_off_window_is_rounded_to_seconds() {
        let fx = fixture(RecordingNetworkService::default());
        let task = TaskInfo::one_off(id(7), 5_500).window_start_ms(1_900).build().unwrap();

        assert!(fx.delegate.schedule(&task).await);

        let specs = fx.service.specs.lock().unwrap();
        assert_eq!(specs[0].tag, "7");
        assert_eq!(
            specs[0].timing,
            NetworkTaskTiming::OneOff { window_start_secs: 1, window_end_secs: 5 }
        );
    }

    #[tokio::test]
    async fn expiring_one_off_stamps_deadline_and_pads_window() {
        let fx = fixture(RecordingNetworkService::default());
        let task =
            TaskInfo::one_off(id(7), 5_000).expires_after_window_end(true).build().unwrap();

        assert!(fx.delegate.schedule(&task).await);

        let specs = fx.service.specs.lock().unwrap();
        // 5000ms + 1000ms slack, in whole seconds.
        assert_eq!(
            specs[0].timing,
            NetworkTaskTiming::OneOff { window_start_secs: 0, window_end_secs: 6 }
        );
        let restored = JobExtras::from_wire(&specs[0].extras);
        assert_eq!(restored.deadline_ms, Some(fx.clock.now_ms() + 5_000));
    }

    #[tokio::test]
    async fn periodic_translates_period_and_flex_in_seconds() {
        let fx = fixture(RecordingNetworkService::default());
        let task = TaskInfo::periodic(id(3), 900_000).flex_ms(60_000).build().unwrap();

        assert!(fx.delegate.schedule(&task).await);

        let specs = fx.service.specs.lock().unwrap();
        assert_eq!(
            specs[0].timing,
            NetworkTaskTiming::Periodic { period_secs: 900, flex_secs: Some(60) }
        );
    }

    #[tokio::test]
    async fn network_type_maps_to_service_enumeration() {
        let fx = fixture(RecordingNetworkService::default());
        for (network, expected) in [
            (NetworkType::None, NetworkState::AnyState),
            (NetworkType::Any, NetworkState::Connected),
            (NetworkType::Unmetered, NetworkState::Unmetered),
        ] {
            let task =
                TaskInfo::one_off(id(1), 1_000).required_network(network).build().unwrap();
            assert!(fx.delegate.schedule(&task).await);
            assert_eq!(fx.service.specs.lock().unwrap().pop().unwrap().network_state, expected);
        }
    }

    #[tokio::test]
    async fn update_current_and_constraints_pass_through() {
        let fx = fixture(RecordingNetworkService::default());
        let task = TaskInfo::one_off(id(4), 2_000)
            .should_update_current(true)
            .requires_charging(true)
            .is_persisted(true)
            .build()
            .unwrap();

        assert!(fx.delegate.schedule(&task).await);

        let specs = fx.service.specs.lock().unwrap();
        assert!(specs[0].update_current);
        assert!(specs[0].requires_charging);
        assert!(specs[0].persisted);
    }

    #[tokio::test]
    async fn unavailable_service_fails_schedule_and_skips_cancel() {
        let fx = fixture(RecordingNetworkService {
            unavailable: true,
            ..RecordingNetworkService::default()
        });
        let task = TaskInfo::one_off(id(1), 1_000).build().unwrap();

        assert!(!fx.delegate.schedule(&task).await);
        fx.delegate.cancel(id(1)).await;
        assert!(fx.service.cancelled.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejection_surfaces_as_false() {
        let fx = fixture(RecordingNetworkService {
            reject: true,
            ..RecordingNetworkService::default()
        });
        let task = TaskInfo::one_off(id(1), 1_000).build().unwrap();
        assert!(!fx.delegate.schedule(&task).await);
    }

    #[test]
    fn tags_round_trip_through_task_ids() {
        let fx = fixture(RecordingNetworkService::default());
        let task = TaskInfo::one_off(id(42), 1_000).build().unwrap();
        let spec = fx.delegate.build_spec(&task);
        assert_eq!(task_id_from_tag(&spec.tag), Some(id(42)));
    }

    #[test]
    fn foreign_tags_are_rejected() {
        for tag in ["", "not-a-number", "0", "-3", "1.5", "4294967296"] {
            assert_eq!(task_id_from_tag(tag), None, "tag {tag:?} should not parse");
        }
    }

    #[tokio::test]
    async fn cancel_uses_the_string_tag() {
        let fx = fixture(RecordingNetworkService::default());
        fx.delegate.cancel(id(12)).await;
        assert_eq!(*fx.service.cancelled.lock().unwrap(), vec!["12".to_string()]);
    }
}
