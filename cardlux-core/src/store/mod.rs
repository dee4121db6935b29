use crate::models::{
    Card, CardId, CardKind, Difficulty, ProgressRecord, ReviewEvent, Topic, TopicId,
    TopicProgress, UserId, UserStats,
};
use crate::CoreError;
use async_trait::async_trait;

pub mod memory;

pub use memory::MemoryStore;

#[derive(Clone, Debug, Default)]
pub struct CardFilter {
    pub topic: Option<TopicId>,
    pub difficulty: Option<Difficulty>,
    pub phrases_only: Option<bool>,
    pub include_suspended: bool,
}

impl CardFilter {
    pub fn active() -> Self {
        Self::default()
    }

    pub fn in_topic(topic: TopicId) -> Self {
        Self {
            topic: Some(topic),
            ..Self::default()
        }
    }

    pub fn matches(&self, card: &Card) -> bool {
        if !self.include_suspended && card.suspended {
            return false;
        }
        if let Some(t) = self.topic {
            if card.topic_id != t {
                return false;
            }
        }
        if let Some(d) = self.difficulty {
            if card.difficulty != d {
                return false;
            }
        }
        if let Some(phrases) = self.phrases_only {
            if card.kind.is_phrase() != phrases {
                return false;
            }
        }
        true
    }
}

/// All rows touched by one review outcome. Stores apply the whole set in a
/// single atomic unit: either everything lands or nothing does.
#[derive(Clone, Debug)]
pub struct OutcomeWrite {
    pub progress: ProgressRecord,
    pub review: ReviewEvent,
    pub stats: UserStats,
    pub topic_progress: TopicProgress,
}

#[async_trait]
pub trait Catalog: Send + Sync {
    async fn create_topic(&self, name: &str, description: &str) -> Result<Topic, CoreError>;
    async fn get_topic(&self, id: TopicId) -> Result<Topic, CoreError>;
    async fn find_topic(&self, name: &str) -> Result<Option<Topic>, CoreError>;
    async fn list_topics(&self) -> Result<Vec<Topic>, CoreError>;
    async fn delete_topic(&self, id: TopicId) -> Result<(), CoreError>;

    async fn add_card(
        &self,
        topic_id: TopicId,
        front: &str,
        back: &str,
        difficulty: Difficulty,
        kind: CardKind,
    ) -> Result<Card, CoreError>;

    async fn get_card(&self, id: CardId) -> Result<Card, CoreError>;
    async fn list_cards(&self, filter: &CardFilter) -> Result<Vec<Card>, CoreError>;
    async fn update_card(&self, card: &Card) -> Result<Card, CoreError>;
    async fn delete_card(&self, id: CardId) -> Result<(), CoreError>;
    async fn set_suspended(&self, id: CardId, suspended: bool) -> Result<(), CoreError>;

    /// Number of non-suspended cards in a topic, used for topic completion.
    async fn topic_card_count(&self, topic_id: TopicId) -> Result<usize, CoreError>;
}

#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn get_progress(
        &self,
        user_id: UserId,
        card_id: CardId,
    ) -> Result<Option<ProgressRecord>, CoreError>;
    async fn list_progress(&self, user_id: UserId) -> Result<Vec<ProgressRecord>, CoreError>;
    async fn get_stats(&self, user_id: UserId) -> Result<Option<UserStats>, CoreError>;
    async fn get_topic_progress(
        &self,
        user_id: UserId,
        topic_id: TopicId,
    ) -> Result<Option<TopicProgress>, CoreError>;
    async fn list_reviews(
        &self,
        user_id: UserId,
        card_id: Option<CardId>,
    ) -> Result<Vec<ReviewEvent>, CoreError>;
    async fn commit_outcome(&self, write: OutcomeWrite) -> Result<(), CoreError>;
}

pub trait Store: Catalog + ProgressStore {}

impl<T: Catalog + ProgressStore> Store for T {}
