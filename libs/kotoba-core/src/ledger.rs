//! Progress ledger: per-card review states, per-day counters, and streak
//! bookkeeping. One blob, read at startup, mutated in memory, persisted by
//! the caller after each mutation.

use crate::types::CardReviewState;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Calendar-day key in `YYYY-MM-DD` form.
pub fn day_key(now: DateTime<Utc>) -> String {
    now.date_naive().format("%Y-%m-%d").to_string()
}

/// Counters for one calendar day. Missing fields in older persisted shapes
/// backfill to zero via serde defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyEntry {
    pub reviewed: u32,
    pub correct: u32,
    pub wrong: u32,
    pub skipped: u32,
}

/// Consecutive-day activity streak.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreakState {
    pub last_day: Option<NaiveDate>,
    pub count: u32,
}

/// The persisted progress blob.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressLedger {
    pub version: u32,
    pub cards: HashMap<String, CardReviewState>,
    pub streak: StreakState,
    pub daily: BTreeMap<String, DailyEntry>,
}

impl ProgressLedger {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            ..Self::default()
        }
    }

    /// Decode a persisted blob, coercing malformed or foreign shapes to an
    /// empty ledger instead of failing.
    pub fn decode(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(ledger) => ledger,
            Err(err) => {
                tracing::warn!("discarding malformed progress blob: {err}");
                Self::new()
            }
        }
    }

    /// Review state for a card, if it has ever been touched.
    pub fn state(&self, card_id: &str) -> Option<&CardReviewState> {
        self.cards.get(card_id)
    }

    /// Review state for a card, creating the default record on first access.
    pub fn state_mut(&mut self, card_id: &str) -> &mut CardReviewState {
        self.cards.entry(card_id.to_string()).or_default()
    }

    /// Today's counters, created on first touch of the day.
    pub fn ensure_daily_entry(&mut self, now: DateTime<Utc>) -> &mut DailyEntry {
        self.daily.entry(day_key(now)).or_default()
    }

    pub fn bump_reviewed(&mut self, now: DateTime<Utc>) {
        self.ensure_daily_entry(now).reviewed += 1;
    }

    pub fn bump_correct(&mut self, now: DateTime<Utc>) {
        self.ensure_daily_entry(now).correct += 1;
    }

    pub fn bump_wrong(&mut self, now: DateTime<Utc>) {
        self.ensure_daily_entry(now).wrong += 1;
    }

    pub fn bump_skipped(&mut self, now: DateTime<Utc>) {
        self.ensure_daily_entry(now).skipped += 1;
    }

    /// Update the streak for activity at `now`.
    ///
    /// Same-day repeats are no-ops; an exact one-day gap increments; anything
    /// else (first activity, skipped days, clock going backwards) resets to 1.
    pub fn update_streak(&mut self, now: DateTime<Utc>) {
        let today = now.date_naive();
        match self.streak.last_day {
            Some(last) if last == today => {}
            Some(last) if today.signed_duration_since(last).num_days() == 1 => {
                self.streak.count += 1;
                self.streak.last_day = Some(today);
            }
            _ => {
                self.streak.count = 1;
                self.streak.last_day = Some(today);
            }
        }
    }
}
