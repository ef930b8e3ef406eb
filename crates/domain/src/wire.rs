//! Wire payload exchanged with scheduling back-ends
//!
//! When a task is scheduled, the adapter packs the converted caller
//! payload, plus an optional absolute deadline, into a [`JobExtras`]
//! record. The back-end stores it opaquely and hands it back verbatim when
//! it later invokes the dispatcher. Two reserved keys namespace this
//! record so caller keys can never collide with back-end bookkeeping.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::extras::TaskExtras;

/// Reserved key carrying the absolute deadline in ms since epoch
pub const DEADLINE_KEY: &str = "bgtask:deadline";

/// Reserved key namespacing the converted caller payload
pub const EXTRAS_KEY: &str = "bgtask:extras";

/// Serialized job record handed to (and later back from) a back-end.
///
/// Created at schedule time, read once at start time, then discarded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobExtras {
    /// Absolute timestamp after which the task must be skipped.
    ///
    /// Present only for one-off tasks scheduled with
    /// `expires_after_window_end`.
    #[serde(rename = "bgtask:deadline", default, skip_serializing_if = "Option::is_none")]
    pub deadline_ms: Option<i64>,

    /// Converted caller payload
    #[serde(rename = "bgtask:extras", default)]
    pub extras: TaskExtras,
}

impl JobExtras {
    /// Serialize for hand-off to a back-end
    pub fn to_wire(&self) -> Value {
        // A map of an optional integer and codec output always serializes.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Parse a payload delivered back by a back-end.
    ///
    /// Best-effort and total: a missing or garbled payload degrades to no
    /// deadline and empty extras rather than failing the start signal.
    pub fn from_wire(raw: &Value) -> Self {
        serde_json::from_value(raw.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::extras::ExtraValue;

    use super::*;

    #[test]
    fn wire_round_trip_preserves_deadline_and_extras() {
        let mut extras = TaskExtras::new();
        extras.insert("count".into(), ExtraValue::Long(3));

        let job = JobExtras { deadline_ms: Some(1_700_000_000_000), extras };
        let restored = JobExtras::from_wire(&job.to_wire());
        assert_eq!(restored, job);
    }

    #[test]
    fn deadline_key_is_absent_when_task_does_not_expire() {
        let job = JobExtras::default();
        let wire = job.to_wire();
        assert!(wire.get(DEADLINE_KEY).is_none());
        assert!(wire.get(EXTRAS_KEY).is_some());
    }

    #[test]
    fn garbled_payload_degrades_to_defaults() {
        assert_eq!(JobExtras::from_wire(&json!("not an object")), JobExtras::default());
        assert_eq!(JobExtras::from_wire(&json!(null)), JobExtras::default());
        assert_eq!(
            JobExtras::from_wire(&json!({ "bgtask:deadline": "garbage" })),
            JobExtras::default()
        );
    }

    #[test]
    fn unknown_backend_keys_are_ignored() {
        let raw = json!({
            "bgtask:deadline": 42,
            "backend:wakelock": true,
        });
        let restored = JobExtras::from_wire(&raw);
        assert_eq!(restored.deadline_ms, Some(42));
        assert!(restored.extras.is_empty());
    }
}
