//! Error types for kotoba-core.

use thiserror::Error;

/// Errors that can occur while loading the card catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing {field} in row {row}")]
    MissingField { row: usize, field: &'static str },

    #[error("duplicate card {id} in row {row}")]
    DuplicateCard { row: usize, id: String },
}

/// Errors from the blob store boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Non-fatal quiz conditions surfaced to the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuizError {
    /// No card matched the source filter; the session was not created.
    #[error("no cards available for this source")]
    NoCardsAvailable,

    /// Fewer than three unique distractors exist for the current card.
    /// Callers should fall back to typing mode.
    #[error("not enough options to build a multiple choice question")]
    NotEnoughChoices,

    /// The cursor has moved past the last question.
    #[error("quiz has no current question")]
    NoQuestion,

    /// The current question was already answered or skipped.
    #[error("answer already recorded for this question")]
    AlreadyAnswered,

    /// Advance requested before the current question was resolved.
    #[error("current question has not been answered")]
    NotAnswered,
}

/// Errors when importing a progress snapshot.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("snapshot is not valid JSON: {0}")]
    Invalid(#[from] serde_json::Error),

    #[error("snapshot has no progress.cards map")]
    MissingCards,
}

/// Errors from trainer commands.
#[derive(Debug, Error)]
pub enum TrainerError {
    /// Free-review commands are rejected while a quiz owns the control loop.
    #[error("a quiz session is active")]
    QuizActive,

    #[error("no quiz session is active")]
    NoQuiz,

    #[error("unknown card id {0}")]
    UnknownCard(String),

    #[error(transparent)]
    Quiz(#[from] QuizError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Import(#[from] ImportError),
}
