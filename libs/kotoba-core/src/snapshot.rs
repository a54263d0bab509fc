//! Export/import of progress snapshots.

use crate::error::ImportError;
use crate::ledger::ProgressLedger;
use crate::types::Settings;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A portable dump of everything the trainer persists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub progress: ProgressLedger,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default = "epoch")]
    pub exported_at: DateTime<Utc>,
}

fn epoch() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

impl Snapshot {
    pub fn new(progress: ProgressLedger, settings: Settings, now: DateTime<Utc>) -> Self {
        Self {
            progress,
            settings,
            exported_at: now,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a snapshot, requiring a `progress.cards` map to be present.
    /// Everything else coerces to defaults; a snapshot without the cards map
    /// is rejected rather than silently wiping local progress.
    pub fn from_json(json: &str) -> Result<Self, ImportError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let has_cards = value
            .get("progress")
            .and_then(|progress| progress.get("cards"))
            .is_some_and(serde_json::Value::is_object);
        if !has_cards {
            return Err(ImportError::MissingCards);
        }
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Scheduler;
    use crate::types::Grade;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn round_trip_preserves_card_states() {
        let scheduler = Scheduler::default();
        let mut progress = ProgressLedger::new();
        let graded = scheduler.grade(&scheduler.initial_state(), Grade::Good, now());
        let relearned = scheduler.grade(&graded, Grade::Again, now());
        *progress.state_mut("card-a") = graded;
        *progress.state_mut("card-b") = relearned;
        progress.bump_reviewed(now());
        progress.update_streak(now());

        let snapshot = Snapshot::new(progress.clone(), Settings::default(), now());
        let json = snapshot.to_json().unwrap();
        let restored = Snapshot::from_json(&json).unwrap();

        assert_eq!(restored.progress, progress);
        assert_eq!(restored.exported_at, now());
    }

    #[test]
    fn missing_cards_map_is_rejected() {
        let err = Snapshot::from_json(r#"{"progress": {}, "exported_at": "2024-03-01T12:00:00Z"}"#)
            .unwrap_err();
        assert!(matches!(err, ImportError::MissingCards));

        let err = Snapshot::from_json(r#"{"exported_at": "2024-03-01T12:00:00Z"}"#).unwrap_err();
        assert!(matches!(err, ImportError::MissingCards));
    }

    #[test]
    fn invalid_json_is_rejected() {
        assert!(matches!(Snapshot::from_json("{{"), Err(ImportError::Invalid(_))));
    }
}
