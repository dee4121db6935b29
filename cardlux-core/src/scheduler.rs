use crate::checker::MatchQuality;
use crate::models::{ProgressRecord, EF_DEFAULT, EF_MIN};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// SM-2 recall quality, 0–5. Scores of 3 and above count as remembered.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Blackout,
    Incorrect,
    Familiar,
    Difficult,
    Hesitant,
    Perfect,
}

impl Quality {
    pub fn as_score(&self) -> u8 {
        match self {
            Quality::Blackout => 0,
            Quality::Incorrect => 1,
            Quality::Familiar => 2,
            Quality::Difficult => 3,
            Quality::Hesitant => 4,
            Quality::Perfect => 5,
        }
    }

    pub fn is_passing(&self) -> bool {
        self.as_score() >= 3
    }

    /// Map an answer-check result to a quality score. `Close` sits on either
    /// side of the passing line depending on the almost-counts policy.
    pub fn from_match(match_quality: MatchQuality, almost_counts: bool) -> Self {
        match match_quality {
            MatchQuality::Exact => Quality::Hesitant,
            MatchQuality::Close if almost_counts => Quality::Difficult,
            MatchQuality::Close => Quality::Familiar,
            MatchQuality::Incorrect => Quality::Incorrect,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SchedulingState {
    pub ease_factor: f32,
    pub interval_days: u32,
    pub repetitions: u32,
}

impl SchedulingState {
    pub fn fresh() -> Self {
        Self {
            ease_factor: EF_DEFAULT,
            interval_days: 0,
            repetitions: 0,
        }
    }

    pub fn of(record: &ProgressRecord) -> Self {
        Self {
            ease_factor: record.ease_factor,
            interval_days: record.interval_days,
            repetitions: record.repetitions,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Schedule {
    pub ease_factor: f32,
    pub interval_days: u32,
    pub repetitions: u32,
    pub next_review_at: DateTime<Utc>,
}

/// One SM-2 step. Pure and deterministic; the only clock input is `now`.
pub fn next_schedule(state: SchedulingState, quality: Quality, now: DateTime<Utc>) -> Schedule {
    let q = quality.as_score() as i32;
    let miss = (5 - q) as f32;
    let ease_factor = (state.ease_factor + 0.1 - miss * (0.08 + miss * 0.02)).max(EF_MIN);

    let (repetitions, interval_days) = if q < 3 {
        // Relearning: repetition count resets, card comes back tomorrow.
        (0, 1)
    } else {
        let reps = state.repetitions + 1;
        let days = match reps {
            1 => 1,
            2 => 6,
            _ => (state.interval_days.max(1) as f32 * ease_factor).round() as u32,
        };
        (reps, days)
    };

    Schedule {
        ease_factor,
        interval_days,
        repetitions,
        next_review_at: now + Duration::days(interval_days as i64),
    }
}
