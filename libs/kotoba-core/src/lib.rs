//! Core vocabulary-trainer library.
//!
//! Provides:
//! - CSV catalog loading with deterministic card ids
//! - Simplified SM-2-style review scheduling
//! - Per-day progress counters and streak bookkeeping
//! - Adaptive card selection (biased lottery over weak/overdue cards)
//! - Bounded quiz sessions (multiple choice and typing)
//! - Fuzzy answer matching for typed free-text answers
//!
//! Presentation and persistence are external collaborators: the engine
//! exposes pure transitions plus a [`trainer::Trainer`] controller that owns
//! the mutable state, and treats storage as an opaque key-value blob store.

pub mod catalog;
pub mod error;
pub mod ledger;
pub mod matching;
pub mod quiz;
pub mod scheduler;
pub mod selector;
pub mod snapshot;
pub mod store;
pub mod trainer;
pub mod types;

pub use catalog::{card_id, Catalog};
pub use error::{CatalogError, ImportError, QuizError, StoreError, TrainerError};
pub use ledger::{day_key, DailyEntry, ProgressLedger, StreakState};
pub use matching::{check_answer, normalize, MatchOutcome};
pub use quiz::{
    Advance, Choice, McqQuestion, QuestionPhase, QuizMode, QuizParams, QuizSession, QuizSummary,
    SourceFilter, MAX_QUIZ_LEN,
};
pub use scheduler::Scheduler;
pub use selector::choose_next;
pub use snapshot::Snapshot;
pub use store::{BlobStore, FileStore, MemoryStore, PROGRESS_KEY, SETTINGS_KEY};
pub use trainer::Trainer;
pub use types::{
    Card, CardReviewState, Direction, Example, Grade, ReviewStatus, Settings, ALL_DECKS,
};
