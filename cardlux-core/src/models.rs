use crate::CoreError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TopicId = Uuid;
pub type CardId = Uuid;
pub type UserId = Uuid;
pub type ReviewId = Uuid;

pub const EF_MIN: f32 = 1.3;
pub const EF_DEFAULT: f32 = 2.5;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    /// Numeric level as used by the CSV catalog format (1..=3).
    pub fn as_level(&self) -> u8 {
        match self {
            Difficulty::Beginner => 1,
            Difficulty::Intermediate => 2,
            Difficulty::Advanced => 3,
        }
    }

    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Difficulty::Beginner),
            2 => Some(Difficulty::Intermediate),
            3 => Some(Difficulty::Advanced),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Register {
    #[default]
    Neutral,
    Formal,
    Informal,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CardKind {
    Vocabulary,
    Phrase { register: Register },
}

impl CardKind {
    pub fn is_phrase(&self) -> bool {
        matches!(self, CardKind::Phrase { .. })
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    FrontToBack,
    BackToFront,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Topic {
    pub id: TopicId,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Topic {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub topic_id: TopicId,
    pub front: String,
    pub back: String,
    pub difficulty: Difficulty,
    #[serde(flatten)]
    pub kind: CardKind,
    pub suspended: bool,
    pub created_at: DateTime<Utc>,
}

impl Card {
    pub fn new(
        topic_id: TopicId,
        front: impl Into<String>,
        back: impl Into<String>,
        difficulty: Difficulty,
        kind: CardKind,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic_id,
            front: front.into(),
            back: back.into(),
            difficulty,
            kind,
            suspended: false,
            created_at: Utc::now(),
        }
    }

    /// Kind/difficulty invariant, checked at catalog write time.
    pub fn validate(&self) -> Result<(), CoreError> {
        match (&self.kind, self.difficulty) {
            (CardKind::Vocabulary, Difficulty::Advanced) => {
                Err(CoreError::Invalid("vocabulary cards cannot be advanced"))
            }
            (CardKind::Phrase { .. }, d) if d != Difficulty::Advanced => {
                Err(CoreError::Invalid("phrase cards must be advanced"))
            }
            _ => Ok(()),
        }
    }

    pub fn question(&self, direction: Direction) -> &str {
        match direction {
            Direction::FrontToBack => &self.front,
            Direction::BackToFront => &self.back,
        }
    }

    pub fn answer(&self, direction: Direction) -> &str {
        match direction {
            Direction::FrontToBack => &self.back,
            Direction::BackToFront => &self.front,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProgressRecord {
    pub user_id: UserId,
    pub card_id: CardId,
    pub times_shown: u32,
    pub times_correct: u32,
    pub times_incorrect: u32,
    pub ease_factor: f32,
    pub interval_days: u32,
    pub repetitions: u32,
    pub next_review_at: DateTime<Utc>,
    pub last_shown_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ProgressRecord {
    /// Lazy default created on the first review of a card.
    pub fn new(user_id: UserId, card_id: CardId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            card_id,
            times_shown: 0,
            times_correct: 0,
            times_incorrect: 0,
            ease_factor: EF_DEFAULT,
            interval_days: 0,
            repetitions: 0,
            next_review_at: now,
            last_shown_at: None,
            created_at: now,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_at <= now
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReviewEvent {
    pub id: ReviewId,
    pub user_id: UserId,
    pub card_id: CardId,
    pub direction: Direction,
    pub answer: String,
    pub was_correct: bool,
    pub reviewed_at: DateTime<Utc>,
}

impl ReviewEvent {
    pub fn new(
        user_id: UserId,
        card_id: CardId,
        direction: Direction,
        answer: impl Into<String>,
        was_correct: bool,
        reviewed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            card_id,
            direction,
            answer: answer.into(),
            was_correct,
            reviewed_at,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserStats {
    pub user_id: UserId,
    pub cards_studied: u32,
    pub total_correct: u32,
    pub total_incorrect: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_study_date: Option<NaiveDate>,
}

impl UserStats {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            cards_studied: 0,
            total_correct: 0,
            total_incorrect: 0,
            current_streak: 0,
            longest_streak: 0,
            last_study_date: None,
        }
    }

    pub fn accuracy(&self) -> f32 {
        let total = self.total_correct + self.total_incorrect;
        if total == 0 {
            0.0
        } else {
            self.total_correct as f32 / total as f32
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TopicProgress {
    pub user_id: UserId,
    pub topic_id: TopicId,
    pub cards_seen: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TopicProgress {
    pub fn new(user_id: UserId, topic_id: TopicId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            topic_id,
            cards_seen: 0,
            started_at: now,
            completed_at: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    New,
    Due,
    Scheduled,
}

impl ReviewStatus {
    pub fn of(progress: Option<&ProgressRecord>, now: DateTime<Utc>) -> Self {
        match progress {
            None => ReviewStatus::New,
            Some(p) if p.is_due(now) => ReviewStatus::Due,
            Some(_) => ReviewStatus::Scheduled,
        }
    }
}
