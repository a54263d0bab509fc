//! Review scheduling: simplified SM-2-style multiplicative growth.
//!
//! `grade` is a pure transition function over [`CardReviewState`]; it never
//! touches anything but the state it is given and is the only code that
//! writes `due_at`.

use crate::types::{CardReviewState, Grade, ReviewStatus};
use chrono::{DateTime, Duration, Utc};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Scheduling parameters.
///
/// The known-promotion threshold and the again delay are tuning knobs rather
/// than derived constants, so they live here instead of being hardcoded.
#[derive(Debug, Clone)]
pub struct Scheduler {
    pub initial_ease: f64,
    pub minimum_ease: f64,
    pub maximum_ease: f64,
    pub again_ease_penalty: f64,
    pub hard_ease_penalty: f64,
    pub easy_ease_bonus: f64,
    pub hard_multiplier: f64,
    pub easy_bonus: f64,
    /// First interval when grading Hard on an unscheduled card.
    pub hard_bootstrap_days: f64,
    /// First interval when grading Good on an unscheduled card.
    pub good_bootstrap_days: f64,
    /// First interval when grading Easy on an unscheduled card.
    pub easy_bootstrap_days: f64,
    pub minimum_interval_days: f64,
    pub maximum_interval_days: f64,
    /// How soon an Again-graded card comes back.
    pub again_delay_minutes: i64,
    /// Prior interval at which a successful review promotes to Known.
    pub known_threshold_days: f64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            initial_ease: 2.5,
            minimum_ease: 1.3,
            maximum_ease: 3.0,
            again_ease_penalty: 0.2,
            hard_ease_penalty: 0.05,
            easy_ease_bonus: 0.05,
            hard_multiplier: 1.2,
            easy_bonus: 1.3,
            hard_bootstrap_days: 0.5,
            good_bootstrap_days: 1.0,
            easy_bootstrap_days: 3.0,
            minimum_interval_days: 0.2,
            maximum_interval_days: 3650.0,
            again_delay_minutes: 10,
            known_threshold_days: 7.0,
        }
    }
}

impl Scheduler {
    /// Initial state for a card that has never been reviewed.
    pub fn initial_state(&self) -> CardReviewState {
        CardReviewState {
            ease: self.initial_ease,
            ..CardReviewState::default()
        }
    }

    /// Apply a grade at `now`, producing the next review state.
    pub fn grade(&self, state: &CardReviewState, grade: Grade, now: DateTime<Utc>) -> CardReviewState {
        let mut next = state.clone();
        next.seen += 1;
        next.last_reviewed_at = Some(now);
        next.last_grade = Some(grade);

        match grade {
            Grade::Again => {
                next.wrong += 1;
                next.lapses += 1;
                next.status = ReviewStatus::Unknown;
                next.ease = self.clamp_ease(state.ease - self.again_ease_penalty);
                next.interval_days = 0.0;
                next.due_at = Some(now + Duration::minutes(self.again_delay_minutes));
            }
            Grade::Hard => {
                next.correct += 1;
                next.status = self.promoted_status(state.interval_days);
                next.ease = self.clamp_ease(state.ease - self.hard_ease_penalty);
                next.interval_days = self.clamp_interval(if state.interval_days > 0.0 {
                    state.interval_days * self.hard_multiplier
                } else {
                    self.hard_bootstrap_days
                });
                next.due_at = Some(now + interval_duration(next.interval_days));
            }
            Grade::Good => {
                next.correct += 1;
                next.status = self.promoted_status(state.interval_days);
                next.ease = self.clamp_ease(state.ease);
                next.interval_days = self.clamp_interval(if state.interval_days > 0.0 {
                    state.interval_days * state.ease
                } else {
                    self.good_bootstrap_days
                });
                next.due_at = Some(now + interval_duration(next.interval_days));
            }
            Grade::Easy => {
                next.correct += 1;
                next.status = ReviewStatus::Known;
                next.ease = self.clamp_ease(state.ease + self.easy_ease_bonus);
                next.interval_days = self.clamp_interval(if state.interval_days > 0.0 {
                    state.interval_days * state.ease * self.easy_bonus
                } else {
                    self.easy_bootstrap_days
                });
                next.due_at = Some(now + interval_duration(next.interval_days));
            }
        }

        next
    }

    fn promoted_status(&self, prior_interval_days: f64) -> ReviewStatus {
        if prior_interval_days >= self.known_threshold_days {
            ReviewStatus::Known
        } else {
            ReviewStatus::Learning
        }
    }

    fn clamp_ease(&self, ease: f64) -> f64 {
        ease.clamp(self.minimum_ease, self.maximum_ease)
    }

    fn clamp_interval(&self, days: f64) -> f64 {
        days.clamp(self.minimum_interval_days, self.maximum_interval_days)
    }
}

fn interval_duration(days: f64) -> Duration {
    Duration::seconds((days * SECONDS_PER_DAY).round() as i64)
}
