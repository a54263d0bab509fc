//! The trainer controller.
//!
//! Owns the catalog, the progress ledger, the settings, and the optional
//! quiz session, and exposes the commands the presentation layer calls.
//! Free review and quizzes are mutually exclusive control loops: while a
//! session is active the selector path is rejected, and quiz commands
//! require an active session.

use crate::catalog::Catalog;
use crate::error::{QuizError, StoreError, TrainerError};
use crate::ledger::{DailyEntry, ProgressLedger};
use crate::matching::{check_answer, MatchOutcome};
use crate::quiz::{Advance, McqQuestion, QuizParams, QuizSession, QuizSummary};
use crate::scheduler::Scheduler;
use crate::selector::choose_next;
use crate::snapshot::Snapshot;
use crate::store::{BlobStore, PROGRESS_KEY, SETTINGS_KEY};
use crate::types::{Card, CardReviewState, Grade, Settings};
use chrono::{DateTime, Utc};
use rand::RngCore;

pub struct Trainer {
    catalog: Catalog,
    ledger: ProgressLedger,
    settings: Settings,
    scheduler: Scheduler,
    quiz: Option<QuizSession>,
    rng: Box<dyn RngCore>,
    dirty: bool,
}

impl Trainer {
    pub fn new(catalog: Catalog) -> Self {
        Self::with_rng(catalog, Box::new(rand::thread_rng()))
    }

    /// Construct with an injected random source; tests pass a seeded RNG to
    /// make selection and shuffling deterministic.
    pub fn with_rng(catalog: Catalog, rng: Box<dyn RngCore>) -> Self {
        Self {
            catalog,
            ledger: ProgressLedger::new(),
            settings: Settings::default(),
            scheduler: Scheduler::default(),
            quiz: None,
            rng,
            dirty: false,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &ProgressLedger {
        &self.ledger
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn update_settings(&mut self, settings: Settings) {
        self.settings = settings;
        self.dirty = true;
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn set_scheduler(&mut self, scheduler: Scheduler) {
        self.scheduler = scheduler;
    }

    /// Whether in-memory state has mutations not yet written to a store.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // ---- persistence -----------------------------------------------------

    /// Read progress and settings from the store, coercing malformed blobs
    /// to defaults.
    pub fn load(&mut self, store: &dyn BlobStore) -> Result<(), StoreError> {
        if let Some(blob) = store.get(PROGRESS_KEY)? {
            self.ledger = ProgressLedger::decode(&blob);
        }
        if let Some(blob) = store.get(SETTINGS_KEY)? {
            self.settings = serde_json::from_str(&blob).unwrap_or_else(|err| {
                tracing::warn!("discarding malformed settings blob: {err}");
                Settings::default()
            });
        }
        self.dirty = false;
        Ok(())
    }

    /// Write progress and settings if anything changed since the last save.
    pub fn save(&mut self, store: &mut dyn BlobStore) -> Result<(), StoreError> {
        if !self.dirty {
            return Ok(());
        }
        store.set(PROGRESS_KEY, &serde_json::to_string(&self.ledger)?)?;
        store.set(SETTINGS_KEY, &serde_json::to_string(&self.settings)?)?;
        self.dirty = false;
        Ok(())
    }

    // ---- free review -----------------------------------------------------

    /// Pick the next card via the adaptive selector.
    pub fn next_card(&mut self, now: DateTime<Utc>) -> Result<Option<&Card>, TrainerError> {
        if self.quiz.is_some() {
            return Err(TrainerError::QuizActive);
        }
        Ok(choose_next(
            &self.catalog,
            &self.ledger,
            now,
            &self.settings,
            self.rng.as_mut(),
        ))
    }

    /// Apply a self-reported grade to a card.
    pub fn grade(
        &mut self,
        card_id: &str,
        grade: Grade,
        now: DateTime<Utc>,
    ) -> Result<CardReviewState, TrainerError> {
        if self.quiz.is_some() {
            return Err(TrainerError::QuizActive);
        }
        if self.catalog.get(card_id).is_none() {
            return Err(TrainerError::UnknownCard(card_id.to_string()));
        }
        Ok(self.apply_grade(card_id, grade, now))
    }

    /// Check a typed answer in free review, then grade Good or Again from
    /// the outcome.
    pub fn answer_typed(
        &mut self,
        card_id: &str,
        typed: &str,
        now: DateTime<Utc>,
    ) -> Result<MatchOutcome, TrainerError> {
        if self.quiz.is_some() {
            return Err(TrainerError::QuizActive);
        }
        let card = self
            .catalog
            .get(card_id)
            .ok_or_else(|| TrainerError::UnknownCard(card_id.to_string()))?;
        let outcome = check_answer(card, self.settings.direction, typed);
        self.apply_grade(card_id, Grade::from_outcome(outcome.ok), now);
        Ok(outcome)
    }

    /// Skip the presented card without grading it.
    pub fn skip(&mut self, now: DateTime<Utc>) -> Result<(), TrainerError> {
        if self.quiz.is_some() {
            return Err(TrainerError::QuizActive);
        }
        self.ledger.bump_reviewed(now);
        self.ledger.bump_skipped(now);
        self.ledger.update_streak(now);
        self.dirty = true;
        Ok(())
    }

    /// Today's counters alongside the streak, for goal display.
    pub fn today(&mut self, now: DateTime<Utc>) -> (DailyEntry, u32) {
        let entry = self.ledger.ensure_daily_entry(now).clone();
        (entry, self.ledger.streak.count)
    }

    fn apply_grade(&mut self, card_id: &str, grade: Grade, now: DateTime<Utc>) -> CardReviewState {
        let previous = self
            .ledger
            .state(card_id)
            .cloned()
            .unwrap_or_else(|| self.scheduler.initial_state());
        let next = self.scheduler.grade(&previous, grade, now);
        tracing::debug!(
            card_id,
            ?grade,
            interval = next.interval_days,
            ease = next.ease,
            "graded card"
        );
        *self.ledger.state_mut(card_id) = next.clone();
        self.ledger.bump_reviewed(now);
        if grade.is_correct() {
            self.ledger.bump_correct(now);
        } else {
            self.ledger.bump_wrong(now);
        }
        self.ledger.update_streak(now);
        self.dirty = true;
        next
    }

    // ---- quiz ------------------------------------------------------------

    pub fn quiz(&self) -> Option<&QuizSession> {
        self.quiz.as_ref()
    }

    /// Start a quiz over the active deck. Fails without creating a session
    /// when no cards match the source filter or a quiz is already running.
    pub fn start_quiz(&mut self, params: QuizParams, now: DateTime<Utc>) -> Result<(), TrainerError> {
        if self.quiz.is_some() {
            return Err(TrainerError::QuizActive);
        }
        let session = QuizSession::start(
            &self.catalog,
            &self.ledger,
            now,
            &self.settings.deck_id,
            params,
            self.rng.as_mut(),
        )?;
        self.quiz = Some(session);
        Ok(())
    }

    /// Card under the quiz cursor.
    pub fn quiz_card(&self) -> Result<&Card, TrainerError> {
        let session = self.quiz.as_ref().ok_or(TrainerError::NoQuiz)?;
        let id = session.current_id().ok_or(QuizError::NoQuestion)?;
        self.catalog
            .get(id)
            .ok_or_else(|| TrainerError::UnknownCard(id.to_string()))
    }

    /// Generate (or return the cached) multiple-choice question for the
    /// current quiz card.
    pub fn quiz_mcq(&mut self) -> Result<McqQuestion, TrainerError> {
        let direction = self.settings.direction;
        let session = self.quiz.as_mut().ok_or(TrainerError::NoQuiz)?;
        if let Some(question) = session.mcq() {
            return Ok(question.clone());
        }
        let question = session.build_mcq(&self.catalog, direction, self.rng.as_mut())?;
        Ok(question.clone())
    }

    /// Answer the current multiple-choice question.
    pub fn answer_quiz_choice(
        &mut self,
        choice_index: usize,
        now: DateTime<Utc>,
    ) -> Result<bool, TrainerError> {
        let session = self.quiz.as_mut().ok_or(TrainerError::NoQuiz)?;
        let question = session.mcq().ok_or(QuizError::NoQuestion)?;
        let ok = choice_index == question.correct_index;
        let card_id = session
            .current_id()
            .ok_or(QuizError::NoQuestion)?
            .to_string();
        let affects_srs = session.params().affects_srs;
        session.record(ok, false)?;
        self.record_quiz_outcome(&card_id, ok, false, affects_srs, now);
        Ok(ok)
    }

    /// Answer the current quiz question by typing.
    pub fn answer_quiz_typed(
        &mut self,
        typed: &str,
        now: DateTime<Utc>,
    ) -> Result<MatchOutcome, TrainerError> {
        let direction = self.settings.direction;
        let session = self.quiz.as_mut().ok_or(TrainerError::NoQuiz)?;
        let card_id = session
            .current_id()
            .ok_or(QuizError::NoQuestion)?
            .to_string();
        let card = self
            .catalog
            .get(&card_id)
            .ok_or_else(|| TrainerError::UnknownCard(card_id.clone()))?;
        let outcome = check_answer(card, direction, typed);
        let affects_srs = session.params().affects_srs;
        session.record(outcome.ok, false)?;
        self.record_quiz_outcome(&card_id, outcome.ok, false, affects_srs, now);
        Ok(outcome)
    }

    /// Skip the current quiz question: counts as reviewed and skipped, never
    /// as correct/wrong, and never touches the schedule.
    pub fn skip_quiz_question(&mut self, now: DateTime<Utc>) -> Result<(), TrainerError> {
        let session = self.quiz.as_mut().ok_or(TrainerError::NoQuiz)?;
        let card_id = session
            .current_id()
            .ok_or(QuizError::NoQuestion)?
            .to_string();
        let affects_srs = session.params().affects_srs;
        session.record(false, true)?;
        self.record_quiz_outcome(&card_id, false, true, affects_srs, now);
        Ok(())
    }

    /// Move to the next question; returns the summary when the quiz ends,
    /// at which point the session is discarded.
    pub fn advance_quiz(&mut self) -> Result<Option<QuizSummary>, TrainerError> {
        let session = self.quiz.as_mut().ok_or(TrainerError::NoQuiz)?;
        match session.advance()? {
            Advance::Next => Ok(None),
            Advance::Finished(summary) => {
                tracing::info!(
                    correct = summary.correct,
                    wrong = summary.wrong,
                    skipped = summary.skipped,
                    accuracy = summary.accuracy_pct,
                    "quiz finished"
                );
                self.quiz = None;
                Ok(Some(summary))
            }
        }
    }

    /// Abort the quiz immediately, discarding remaining questions. No
    /// summary is produced.
    pub fn stop_quiz(&mut self) {
        self.quiz = None;
    }

    fn record_quiz_outcome(
        &mut self,
        card_id: &str,
        ok: bool,
        skipped: bool,
        affects_srs: bool,
        now: DateTime<Utc>,
    ) {
        self.ledger.bump_reviewed(now);
        if skipped {
            self.ledger.bump_skipped(now);
        } else {
            if ok {
                self.ledger.bump_correct(now);
            } else {
                self.ledger.bump_wrong(now);
            }
            if affects_srs {
                let previous = self
                    .ledger
                    .state(card_id)
                    .cloned()
                    .unwrap_or_else(|| self.scheduler.initial_state());
                let next = self.scheduler.grade(&previous, Grade::from_outcome(ok), now);
                *self.ledger.state_mut(card_id) = next;
            }
        }
        self.ledger.update_streak(now);
        self.dirty = true;
    }

    // ---- snapshots -------------------------------------------------------

    pub fn export_snapshot(&self, now: DateTime<Utc>) -> Snapshot {
        Snapshot::new(self.ledger.clone(), self.settings.clone(), now)
    }

    /// Replace local progress and settings with an imported snapshot.
    pub fn import_snapshot(&mut self, json: &str) -> Result<(), TrainerError> {
        let snapshot = Snapshot::from_json(json)?;
        self.ledger = snapshot.progress;
        self.settings = snapshot.settings;
        self.dirty = true;
        Ok(())
    }
}
