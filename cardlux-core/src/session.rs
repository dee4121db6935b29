use crate::checker::{AnswerChecker, MatchQuality};
use crate::models::{
    Card, CardId, Difficulty, Direction, ProgressRecord, ReviewEvent, TopicId, TopicProgress,
    UserId, UserStats,
};
use crate::options::{build_choices, DEFAULT_DISTRACTORS};
use crate::progress::advance_progress;
use crate::scheduler::{next_schedule, Quality, SchedulingState};
use crate::selector::plan_session;
use crate::stats::{advance_topic_progress, apply_outcome};
use crate::store::{CardFilter, OutcomeWrite, Store};
use crate::CoreError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_SESSION_SIZE: usize = 10;

/// Study policy knobs. `almost_counts_as_correct` decides whether a `Close`
/// fuzzy match counts as a scheduling success (quality 3) or a near-miss
/// failure (quality 2).
#[derive(Clone, Debug)]
pub struct StudyConfig {
    pub review_share: f32,
    pub distractor_count: usize,
    pub typo_tolerance: usize,
    pub case_sensitive: bool,
    pub almost_counts_as_correct: bool,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            review_share: 0.3,
            distractor_count: DEFAULT_DISTRACTORS,
            typo_tolerance: 1,
            case_sensitive: false,
            almost_counts_as_correct: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    MultipleChoice,
    TextInput,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CardPrompt {
    pub card_id: CardId,
    pub question: String,
    pub input_mode: InputMode,
    pub options: Option<Vec<String>>,
    pub correct_index: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct CheckOutcome {
    pub is_correct: bool,
    pub match_quality: MatchQuality,
    pub expected_answer: String,
}

/// Ephemeral state of one study run; never persisted.
#[derive(Clone, Debug, Default)]
pub struct SessionState {
    pub cards: Vec<Card>,
    pub position: usize,
    pub correct: usize,
    pub incorrect: usize,
}

impl SessionState {
    pub fn new(cards: Vec<Card>) -> Self {
        Self {
            cards,
            position: 0,
            correct: 0,
            incorrect: 0,
        }
    }

    pub fn current(&self) -> Option<&Card> {
        self.cards.get(self.position)
    }

    pub fn advance(&mut self, was_correct: bool) {
        if was_correct {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }
        self.position += 1;
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.cards.len()
    }
}

/// Orchestrates selection, presentation, checking, and the atomic progress
/// commit against a storage collaborator.
pub struct StudyEngine {
    store: Arc<dyn Store>,
    config: StudyConfig,
    checker: AnswerChecker,
}

impl StudyEngine {
    pub fn new(store: Arc<dyn Store>, config: StudyConfig) -> Self {
        let checker = AnswerChecker::new(config.case_sensitive, config.typo_tolerance);
        Self {
            store,
            config,
            checker,
        }
    }

    pub fn config(&self) -> &StudyConfig {
        &self.config
    }

    /// Plans a session: due cards first (most overdue leading), new cards in
    /// catalog order filling the remainder per the review share.
    pub async fn select_session(
        &self,
        user_id: UserId,
        topic: Option<TopicId>,
        size: usize,
    ) -> Result<SessionState, CoreError> {
        let filter = match topic {
            Some(t) => CardFilter::in_topic(t),
            None => CardFilter::active(),
        };
        let cards = self.store.list_cards(&filter).await?;
        let progress = self.store.list_progress(user_id).await?;
        let by_card: HashMap<CardId, ProgressRecord> =
            progress.into_iter().map(|p| (p.card_id, p)).collect();

        let now = Utc::now();
        let planned = plan_session(&cards, &by_card, now, size, self.config.review_share);
        debug!(user = %user_id, requested = size, planned = planned.len(), "session planned");
        Ok(SessionState::new(planned))
    }

    /// Beginner vocabulary cards get multiple choice; anything else, or a
    /// catalog too small to supply distractors, falls back to free text.
    pub async fn present_card(
        &self,
        card: &Card,
        direction: Direction,
    ) -> Result<CardPrompt, CoreError> {
        let question = card.question(direction).to_string();

        if card.difficulty == Difficulty::Beginner && !card.kind.is_phrase() {
            let pool = self.store.list_cards(&CardFilter::active()).await?;
            match build_choices(card, &pool, direction, self.config.distractor_count) {
                Ok(choices) => {
                    return Ok(CardPrompt {
                        card_id: card.id,
                        question,
                        input_mode: InputMode::MultipleChoice,
                        options: Some(choices.options),
                        correct_index: Some(choices.correct_index),
                    });
                }
                Err(CoreError::InsufficientOptions { needed, found }) => {
                    debug!(card = %card.id, needed, found, "falling back to text input");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(CardPrompt {
            card_id: card.id,
            question,
            input_mode: InputMode::TextInput,
            options: None,
            correct_index: None,
        })
    }

    /// Classifies a submitted answer. Multiple choice is checked exactly;
    /// free text tolerates typos per the checker configuration.
    pub fn submit_answer(
        &self,
        card: &Card,
        direction: Direction,
        input_mode: InputMode,
        text: &str,
    ) -> CheckOutcome {
        let expected = card.answer(direction);
        let result = match input_mode {
            InputMode::MultipleChoice => self.checker.check_exact(text, expected),
            InputMode::TextInput => self.checker.check_fuzzy(text, expected),
        };
        CheckOutcome {
            is_correct: self.counts_as_correct(result.match_quality),
            match_quality: result.match_quality,
            expected_answer: expected.to_string(),
        }
    }

    /// Applies one review outcome: SM-2 step, progress record, review event,
    /// user stats, and topic progress, committed to the store as one unit.
    pub async fn record_outcome(
        &self,
        user_id: UserId,
        card: &Card,
        direction: Direction,
        submitted: &str,
        match_quality: MatchQuality,
    ) -> Result<ProgressRecord, CoreError> {
        let now = Utc::now();

        let existing = self.store.get_progress(user_id, card.id).await?;
        let is_new_card = existing.is_none();
        let record = existing.unwrap_or_else(|| ProgressRecord::new(user_id, card.id, now));

        let was_correct = self.counts_as_correct(match_quality);
        let quality = Quality::from_match(match_quality, self.config.almost_counts_as_correct);
        let schedule = next_schedule(SchedulingState::of(&record), quality, now);
        let progress = advance_progress(record, schedule, was_correct, now);

        let review = ReviewEvent::new(user_id, card.id, direction, submitted, was_correct, now);

        let stats = self
            .store
            .get_stats(user_id)
            .await?
            .unwrap_or_else(|| UserStats::new(user_id));
        let stats = apply_outcome(stats, was_correct, is_new_card, now.date_naive());

        let topic_progress = self
            .store
            .get_topic_progress(user_id, card.topic_id)
            .await?
            .unwrap_or_else(|| TopicProgress::new(user_id, card.topic_id, now));
        let active = self.store.topic_card_count(card.topic_id).await?;
        let topic_progress = advance_topic_progress(topic_progress, is_new_card, active, now);

        self.store
            .commit_outcome(OutcomeWrite {
                progress: progress.clone(),
                review,
                stats,
                topic_progress,
            })
            .await?;

        debug!(
            user = %user_id,
            card = %card.id,
            correct = was_correct,
            interval_days = progress.interval_days,
            "outcome recorded"
        );
        Ok(progress)
    }

    fn counts_as_correct(&self, match_quality: MatchQuality) -> bool {
        match match_quality {
            MatchQuality::Exact => true,
            MatchQuality::Close => self.config.almost_counts_as_correct,
            MatchQuality::Incorrect => false,
        }
    }
}
