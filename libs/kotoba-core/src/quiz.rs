//! Bounded quiz sessions.
//!
//! A session owns a fixed, pre-shuffled id sequence and a cursor; while it is
//! active the live selector loop is dormant. The per-question lifecycle is an
//! explicit `Unanswered -> Answered` machine so an answer can only be
//! recorded once.

use crate::catalog::Catalog;
use crate::error::QuizError;
use crate::ledger::ProgressLedger;
use crate::types::{Card, Direction, ReviewStatus};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Maximum quiz length; requested counts clamp to `1..=MAX_QUIZ_LEN`.
pub const MAX_QUIZ_LEN: usize = 200;

const MCQ_CHOICES: usize = 4;
const MCQ_DISTRACTORS: usize = MCQ_CHOICES - 1;

/// Which cards feed the quiz sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFilter {
    Due,
    Unknown,
    All,
}

/// Question format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizMode {
    Mcq,
    Typing,
}

/// Parameters for starting a quiz.
#[derive(Debug, Clone, Copy)]
pub struct QuizParams {
    pub source: SourceFilter,
    pub count: usize,
    pub mode: QuizMode,
    /// Whether grading inside the quiz also mutates the review schedule.
    pub affects_srs: bool,
    /// Presentation hint only; the engine just carries it.
    pub auto_advance: bool,
}

/// Per-question lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionPhase {
    Unanswered,
    Answered,
}

/// One answer choice in a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub card_id: String,
    pub label: String,
}

/// A generated multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McqQuestion {
    pub choices: Vec<Choice>,
    pub correct_index: usize,
}

/// Final score of a finished quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizSummary {
    pub correct: u32,
    pub wrong: u32,
    pub skipped: u32,
    pub total: u32,
    pub accuracy_pct: u32,
}

/// Result of advancing past an answered question.
#[derive(Debug, Clone)]
pub enum Advance {
    Next,
    Finished(QuizSummary),
}

/// An active quiz. Dropped (never persisted) when finished or stopped.
#[derive(Debug, Clone)]
pub struct QuizSession {
    ids: Vec<String>,
    /// Full eligible set, retained as the distractor source so choice
    /// quality does not degrade for short quizzes.
    pool_ids: Vec<String>,
    index: usize,
    correct: u32,
    wrong: u32,
    skipped: u32,
    params: QuizParams,
    phase: QuestionPhase,
    mcq: Option<McqQuestion>,
}

impl QuizSession {
    /// Draw a quiz sequence from the active deck.
    ///
    /// Returns [`QuizError::NoCardsAvailable`] when nothing matches the
    /// source filter; no partial session is created.
    pub fn start<R: Rng + ?Sized>(
        catalog: &Catalog,
        ledger: &ProgressLedger,
        now: DateTime<Utc>,
        deck_id: &str,
        params: QuizParams,
        rng: &mut R,
    ) -> Result<Self, QuizError> {
        let pool_ids: Vec<String> = catalog
            .in_deck(deck_id)
            .filter(|card| match params.source {
                SourceFilter::All => true,
                SourceFilter::Due => ledger.state(&card.id).is_some_and(|s| s.is_due(now)),
                SourceFilter::Unknown => ledger
                    .state(&card.id)
                    .is_some_and(|s| s.status == ReviewStatus::Unknown),
            })
            .map(|card| card.id.clone())
            .collect();

        if pool_ids.is_empty() {
            return Err(QuizError::NoCardsAvailable);
        }

        let count = params.count.clamp(1, MAX_QUIZ_LEN);
        let mut ids = pool_ids.clone();
        ids.shuffle(rng);
        ids.truncate(count);

        tracing::debug!(questions = ids.len(), pool = pool_ids.len(), "quiz started");
        Ok(Self {
            ids,
            pool_ids,
            index: 0,
            correct: 0,
            wrong: 0,
            skipped: 0,
            params,
            phase: QuestionPhase::Unanswered,
            mcq: None,
        })
    }

    pub fn params(&self) -> &QuizParams {
        &self.params
    }

    pub fn phase(&self) -> QuestionPhase {
        self.phase
    }

    /// Id of the card under the cursor.
    pub fn current_id(&self) -> Option<&str> {
        self.ids.get(self.index).map(String::as_str)
    }

    /// Zero-based cursor and total question count.
    pub fn position(&self) -> (usize, usize) {
        (self.index, self.ids.len())
    }

    pub fn mcq(&self) -> Option<&McqQuestion> {
        self.mcq.as_ref()
    }

    /// Generate the four answer choices for the current question.
    ///
    /// Distractor labels come from the pool, deduplicated by normalized label
    /// so identical translations never appear twice. Fewer than three unique
    /// distractors is [`QuizError::NotEnoughChoices`]; the question is never
    /// shown with fewer than four options.
    pub fn build_mcq<R: Rng + ?Sized>(
        &mut self,
        catalog: &Catalog,
        direction: Direction,
        rng: &mut R,
    ) -> Result<&McqQuestion, QuizError> {
        let current_id = self.current_id().ok_or(QuizError::NoQuestion)?.to_string();
        let current = catalog.get(&current_id).ok_or(QuizError::NoQuestion)?;
        let correct_label = choice_label(current, direction).to_string();

        let mut seen = vec![normalize_label(&correct_label)];
        let mut candidates: Vec<&str> = self
            .pool_ids
            .iter()
            .map(String::as_str)
            .filter(|id| *id != current_id)
            .collect();
        candidates.shuffle(rng);

        let mut distractors: Vec<Choice> = Vec::with_capacity(MCQ_DISTRACTORS);
        for id in candidates {
            let Some(card) = catalog.get(id) else { continue };
            let label = choice_label(card, direction);
            let key = normalize_label(label);
            if key.is_empty() || seen.contains(&key) {
                continue;
            }
            seen.push(key);
            distractors.push(Choice {
                card_id: id.to_string(),
                label: label.to_string(),
            });
            if distractors.len() == MCQ_DISTRACTORS {
                break;
            }
        }

        if distractors.len() < MCQ_DISTRACTORS {
            return Err(QuizError::NotEnoughChoices);
        }

        let correct_index = rng.gen_range(0..MCQ_CHOICES);
        let mut choices = distractors;
        choices.insert(
            correct_index,
            Choice {
                card_id: current_id,
                label: correct_label,
            },
        );

        Ok(&*self.mcq.insert(McqQuestion {
            choices,
            correct_index,
        }))
    }

    /// Record the outcome of the current question. Exactly one record per
    /// question; a second call is [`QuizError::AlreadyAnswered`].
    pub fn record(&mut self, ok: bool, skipped: bool) -> Result<(), QuizError> {
        if self.current_id().is_none() {
            return Err(QuizError::NoQuestion);
        }
        if self.phase == QuestionPhase::Answered {
            return Err(QuizError::AlreadyAnswered);
        }
        self.phase = QuestionPhase::Answered;
        if skipped {
            self.skipped += 1;
        } else if ok {
            self.correct += 1;
        } else {
            self.wrong += 1;
        }
        Ok(())
    }

    /// Move to the next question, or finish with a summary after the last.
    pub fn advance(&mut self) -> Result<Advance, QuizError> {
        if self.phase != QuestionPhase::Answered {
            return Err(QuizError::NotAnswered);
        }
        self.index += 1;
        self.phase = QuestionPhase::Unanswered;
        self.mcq = None;
        if self.index >= self.ids.len() {
            Ok(Advance::Finished(self.summary()))
        } else {
            Ok(Advance::Next)
        }
    }

    fn summary(&self) -> QuizSummary {
        let total = self.correct + self.wrong + self.skipped;
        let accuracy_pct = if total == 0 {
            0
        } else {
            (f64::from(self.correct) / f64::from(total) * 100.0).round() as u32
        };
        QuizSummary {
            correct: self.correct,
            wrong: self.wrong,
            skipped: self.skipped,
            total,
            accuracy_pct,
        }
    }
}

fn choice_label(card: &Card, direction: Direction) -> &str {
    match direction {
        Direction::JpToEn => &card.english,
        Direction::EnToJp => {
            if card.japanese.trim().is_empty() {
                &card.hiragana
            } else {
                &card.japanese
            }
        }
    }
}

/// Case- and whitespace-insensitive label key for deduplication.
fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::card_id;
    use crate::types::CardReviewState;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(99)
    }

    fn card(deck: &str, japanese: &str, english: &str) -> Card {
        Card {
            id: card_id(deck, japanese, english),
            deck_id: deck.to_string(),
            japanese: japanese.to_string(),
            hiragana: String::new(),
            english: english.to_string(),
            examples: vec![],
            tags: String::new(),
            notes: String::new(),
        }
    }

    fn five_cards() -> Catalog {
        Catalog::from_cards(vec![
            card("n5", "猫", "cat"),
            card("n5", "犬", "dog"),
            card("n5", "鳥", "bird"),
            card("n5", "魚", "fish"),
            card("n5", "馬", "horse"),
        ])
        .unwrap()
    }

    fn params(mode: QuizMode) -> QuizParams {
        QuizParams {
            source: SourceFilter::All,
            count: 3,
            mode,
            affects_srs: false,
            auto_advance: false,
        }
    }

    #[test]
    fn start_truncates_but_keeps_full_pool() {
        let catalog = five_cards();
        let ledger = ProgressLedger::new();
        let session = QuizSession::start(
            &catalog,
            &ledger,
            now(),
            "all",
            params(QuizMode::Mcq),
            &mut rng(),
        )
        .unwrap();
        assert_eq!(session.position(), (0, 3));
        assert_eq!(session.pool_ids.len(), 5);
    }

    #[test]
    fn empty_source_does_not_activate() {
        let catalog = five_cards();
        let ledger = ProgressLedger::new();
        let mut p = params(QuizMode::Typing);
        p.source = SourceFilter::Unknown;
        let err = QuizSession::start(&catalog, &ledger, now(), "all", p, &mut rng()).unwrap_err();
        assert_eq!(err, QuizError::NoCardsAvailable);
    }

    #[test]
    fn due_filter_only_draws_due_cards() {
        let catalog = five_cards();
        let mut ledger = ProgressLedger::new();
        let due_id = catalog.cards()[2].id.clone();
        *ledger.state_mut(&due_id) = CardReviewState {
            due_at: Some(now() - Duration::hours(1)),
            ..CardReviewState::default()
        };
        let mut p = params(QuizMode::Typing);
        p.source = SourceFilter::Due;
        let session = QuizSession::start(&catalog, &ledger, now(), "all", p, &mut rng()).unwrap();
        assert_eq!(session.position(), (0, 1));
        assert_eq!(session.current_id(), Some(due_id.as_str()));
    }

    #[test]
    fn count_is_clamped() {
        let catalog = five_cards();
        let ledger = ProgressLedger::new();
        let mut p = params(QuizMode::Typing);
        p.count = 0;
        let session = QuizSession::start(&catalog, &ledger, now(), "all", p, &mut rng()).unwrap();
        assert_eq!(session.position().1, 1);
    }

    #[test]
    fn mcq_choices_are_unique_and_correct_index_points_home() {
        let catalog = five_cards();
        let ledger = ProgressLedger::new();
        let mut rng = rng();
        let mut session = QuizSession::start(
            &catalog,
            &ledger,
            now(),
            "all",
            params(QuizMode::Mcq),
            &mut rng,
        )
        .unwrap();
        let current_id = session.current_id().unwrap().to_string();
        let q = session.build_mcq(&catalog, Direction::JpToEn, &mut rng).unwrap();
        assert_eq!(q.choices.len(), 4);
        assert_eq!(q.choices[q.correct_index].card_id, current_id);
        let mut labels: Vec<String> =
            q.choices.iter().map(|c| normalize_label(&c.label)).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), 4);
    }

    #[test]
    fn duplicate_translations_cause_shortfall() {
        // four cards but only two distinct labels
        let catalog = Catalog::from_cards(vec![
            card("n5", "猫", "cat"),
            card("n5", "子猫", "Cat"),
            card("n5", "犬", "dog"),
            card("n5", "子犬", " dog "),
        ])
        .unwrap();
        let ledger = ProgressLedger::new();
        let mut rng = rng();
        let mut session = QuizSession::start(
            &catalog,
            &ledger,
            now(),
            "all",
            params(QuizMode::Mcq),
            &mut rng,
        )
        .unwrap();
        let err = session
            .build_mcq(&catalog, Direction::JpToEn, &mut rng)
            .unwrap_err();
        assert_eq!(err, QuizError::NotEnoughChoices);
    }

    #[test]
    fn record_guards_double_submission() {
        let catalog = five_cards();
        let ledger = ProgressLedger::new();
        let mut session = QuizSession::start(
            &catalog,
            &ledger,
            now(),
            "all",
            params(QuizMode::Typing),
            &mut rng(),
        )
        .unwrap();
        session.record(true, false).unwrap();
        assert_eq!(session.record(false, false).unwrap_err(), QuizError::AlreadyAnswered);
        assert_eq!(session.correct, 1);
        assert_eq!(session.wrong, 0);
    }

    #[test]
    fn advance_requires_an_answer_first() {
        let catalog = five_cards();
        let ledger = ProgressLedger::new();
        let mut session = QuizSession::start(
            &catalog,
            &ledger,
            now(),
            "all",
            params(QuizMode::Typing),
            &mut rng(),
        )
        .unwrap();
        assert_eq!(session.advance().unwrap_err(), QuizError::NotAnswered);
    }

    #[test]
    fn full_run_produces_summary() {
        let catalog = five_cards();
        let ledger = ProgressLedger::new();
        let mut session = QuizSession::start(
            &catalog,
            &ledger,
            now(),
            "all",
            params(QuizMode::Typing),
            &mut rng(),
        )
        .unwrap();

        session.record(true, false).unwrap();
        assert!(matches!(session.advance().unwrap(), Advance::Next));
        session.record(false, false).unwrap();
        assert!(matches!(session.advance().unwrap(), Advance::Next));
        session.record(false, true).unwrap();
        let Advance::Finished(summary) = session.advance().unwrap() else {
            panic!("expected summary");
        };
        assert_eq!(
            summary,
            QuizSummary {
                correct: 1,
                wrong: 1,
                skipped: 1,
                total: 3,
                accuracy_pct: 33,
            }
        );
    }
}
