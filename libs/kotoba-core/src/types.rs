//! Core types for the vocabulary trainer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Self-reported review grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Again,
    Hard,
    Good,
    Easy,
}

impl Grade {
    /// Whether this grade counts as a correct recall.
    pub fn is_correct(self) -> bool {
        !matches!(self, Self::Again)
    }

    /// Map a pass/fail outcome (typed answers, quiz questions) to a grade.
    pub fn from_outcome(correct: bool) -> Self {
        if correct { Self::Good } else { Self::Again }
    }

    /// Parse from a short key ("again", "hard", "good", "easy").
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "again" => Some(Self::Again),
            "hard" => Some(Self::Hard),
            "good" => Some(Self::Good),
            "easy" => Some(Self::Easy),
            _ => None,
        }
    }
}

/// Coarse three-bucket maturity used for UI triage and selection,
/// not for interval math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    New,
    Learning,
    Known,
    Unknown,
}

impl Default for ReviewStatus {
    fn default() -> Self {
        Self::New
    }
}

/// Review direction: which side of the card is prompted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Show the Japanese term, answer with the English translation.
    JpToEn,
    /// Show the English translation, answer with the Japanese term.
    EnToJp,
}

impl Default for Direction {
    fn default() -> Self {
        Self::JpToEn
    }
}

/// Example sentence attached to a card. Any field may be empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Example {
    pub jp: String,
    pub hiragana: String,
    pub en: String,
}

/// Immutable vocabulary card. Owned by the catalog; the engine only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub deck_id: String,
    pub japanese: String,
    pub hiragana: String,
    pub english: String,
    #[serde(default)]
    pub examples: Vec<Example>,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub notes: String,
}

/// Per-card scheduling record, created lazily on first access.
///
/// `due_at` is written only by the grade transitions in [`crate::scheduler`];
/// `None` means the card has never been scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardReviewState {
    pub status: ReviewStatus,
    pub ease: f64,
    pub interval_days: f64,
    pub due_at: Option<DateTime<Utc>>,
    pub seen: u32,
    pub correct: u32,
    pub wrong: u32,
    pub lapses: u32,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub last_grade: Option<Grade>,
}

impl Default for CardReviewState {
    fn default() -> Self {
        Self {
            status: ReviewStatus::New,
            ease: 2.5,
            interval_days: 0.0,
            due_at: None,
            seen: 0,
            correct: 0,
            wrong: 0,
            lapses: 0,
            last_reviewed_at: None,
            last_grade: None,
        }
    }
}

impl CardReviewState {
    /// Whether the card's scheduled review instant has passed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due_at.is_some_and(|due| due <= now)
    }
}

/// Deck filter value meaning "no filter".
pub const ALL_DECKS: &str = "all";

/// User settings consumed by the selector and quiz session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub deck_id: String,
    pub direction: Direction,
    pub only_due: bool,
    pub show_reading: bool,
    pub show_examples: bool,
    pub daily_goal: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            deck_id: ALL_DECKS.to_string(),
            direction: Direction::default(),
            only_due: false,
            show_reading: true,
            show_examples: true,
            daily_goal: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_correctness() {
        assert!(!Grade::Again.is_correct());
        assert!(Grade::Hard.is_correct());
        assert_eq!(Grade::from_outcome(true), Grade::Good);
        assert_eq!(Grade::from_outcome(false), Grade::Again);
    }

    #[test]
    fn default_state_is_new_and_not_due() {
        let state = CardReviewState::default();
        assert_eq!(state.status, ReviewStatus::New);
        assert_eq!(state.ease, 2.5);
        assert_eq!(state.interval_days, 0.0);
        assert!(!state.is_due(Utc::now()));
    }

    #[test]
    fn settings_decode_tolerates_missing_fields() {
        let settings: Settings = serde_json::from_str(r#"{"deck_id": "n5"}"#).unwrap();
        assert_eq!(settings.deck_id, "n5");
        assert_eq!(settings.daily_goal, 20);
        assert_eq!(settings.direction, Direction::JpToEn);
    }
}
