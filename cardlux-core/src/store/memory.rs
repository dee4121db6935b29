use crate::models::{
    Card, CardId, CardKind, Difficulty, ProgressRecord, ReviewEvent, Topic, TopicId,
    TopicProgress, UserId, UserStats,
};
use crate::store::{CardFilter, Catalog, OutcomeWrite, ProgressStore};
use crate::CoreError;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
struct MemState {
    topics: HashMap<TopicId, Topic>,
    cards: HashMap<CardId, Card>,
    progress: HashMap<(UserId, CardId), ProgressRecord>,
    reviews: Vec<ReviewEvent>,
    stats: HashMap<UserId, UserStats>,
    topic_progress: HashMap<(UserId, TopicId), TopicProgress>,
}

/// In-memory store. One lock over the whole state, so an outcome commit is
/// a single critical section and never observed half-applied.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Catalog for MemoryStore {
    async fn create_topic(&self, name: &str, description: &str) -> Result<Topic, CoreError> {
        let topic = Topic::new(name, description);
        let mut s = self.state.write();
        if s.topics.values().any(|t| t.name.eq_ignore_ascii_case(name)) {
            return Err(CoreError::Conflict("topic name already exists"));
        }
        s.topics.insert(topic.id, topic.clone());
        Ok(topic)
    }

    async fn get_topic(&self, id: TopicId) -> Result<Topic, CoreError> {
        self.state
            .read()
            .topics
            .get(&id)
            .cloned()
            .ok_or(CoreError::NotFound("topic"))
    }

    async fn find_topic(&self, name: &str) -> Result<Option<Topic>, CoreError> {
        Ok(self
            .state
            .read()
            .topics
            .values()
            .find(|t| t.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn list_topics(&self) -> Result<Vec<Topic>, CoreError> {
        let mut v: Vec<Topic> = self.state.read().topics.values().cloned().collect();
        v.sort_by(|a, b| (a.created_at, &a.name).cmp(&(b.created_at, &b.name)));
        Ok(v)
    }

    async fn delete_topic(&self, id: TopicId) -> Result<(), CoreError> {
        let mut s = self.state.write();
        if s.topics.remove(&id).is_none() {
            return Err(CoreError::NotFound("topic"));
        }
        let ids: Vec<CardId> = s
            .cards
            .values()
            .filter(|c| c.topic_id == id)
            .map(|c| c.id)
            .collect();
        for cid in ids {
            s.cards.remove(&cid);
        }
        Ok(())
    }

    async fn add_card(
        &self,
        topic_id: TopicId,
        front: &str,
        back: &str,
        difficulty: Difficulty,
        kind: CardKind,
    ) -> Result<Card, CoreError> {
        let card = Card::new(topic_id, front, back, difficulty, kind);
        card.validate()?;
        let mut s = self.state.write();
        if !s.topics.contains_key(&topic_id) {
            return Err(CoreError::NotFound("topic"));
        }
        s.cards.insert(card.id, card.clone());
        Ok(card)
    }

    async fn get_card(&self, id: CardId) -> Result<Card, CoreError> {
        self.state
            .read()
            .cards
            .get(&id)
            .cloned()
            .ok_or(CoreError::NotFound("card"))
    }

    async fn list_cards(&self, filter: &CardFilter) -> Result<Vec<Card>, CoreError> {
        let s = self.state.read();
        let mut v: Vec<Card> = s.cards.values().filter(|c| filter.matches(c)).cloned().collect();
        v.sort_by_key(|c| (c.difficulty, c.created_at));
        Ok(v)
    }

    async fn update_card(&self, card: &Card) -> Result<Card, CoreError> {
        card.validate()?;
        let mut s = self.state.write();
        if !s.cards.contains_key(&card.id) {
            return Err(CoreError::NotFound("card"));
        }
        s.cards.insert(card.id, card.clone());
        Ok(card.clone())
    }

    async fn delete_card(&self, id: CardId) -> Result<(), CoreError> {
        let mut s = self.state.write();
        s.cards.remove(&id).ok_or(CoreError::NotFound("card"))?;
        s.progress.retain(|(_, cid), _| *cid != id);
        Ok(())
    }

    async fn set_suspended(&self, id: CardId, suspended: bool) -> Result<(), CoreError> {
        let mut s = self.state.write();
        let Some(card) = s.cards.get_mut(&id) else {
            return Err(CoreError::NotFound("card"));
        };
        card.suspended = suspended;
        Ok(())
    }

    async fn topic_card_count(&self, topic_id: TopicId) -> Result<usize, CoreError> {
        Ok(self
            .state
            .read()
            .cards
            .values()
            .filter(|c| c.topic_id == topic_id && !c.suspended)
            .count())
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn get_progress(
        &self,
        user_id: UserId,
        card_id: CardId,
    ) -> Result<Option<ProgressRecord>, CoreError> {
        Ok(self.state.read().progress.get(&(user_id, card_id)).cloned())
    }

    async fn list_progress(&self, user_id: UserId) -> Result<Vec<ProgressRecord>, CoreError> {
        Ok(self
            .state
            .read()
            .progress
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_stats(&self, user_id: UserId) -> Result<Option<UserStats>, CoreError> {
        Ok(self.state.read().stats.get(&user_id).cloned())
    }

    async fn get_topic_progress(
        &self,
        user_id: UserId,
        topic_id: TopicId,
    ) -> Result<Option<TopicProgress>, CoreError> {
        Ok(self
            .state
            .read()
            .topic_progress
            .get(&(user_id, topic_id))
            .cloned())
    }

    async fn list_reviews(
        &self,
        user_id: UserId,
        card_id: Option<CardId>,
    ) -> Result<Vec<ReviewEvent>, CoreError> {
        Ok(self
            .state
            .read()
            .reviews
            .iter()
            .filter(|r| r.user_id == user_id && card_id.map_or(true, |c| r.card_id == c))
            .cloned()
            .collect())
    }

    async fn commit_outcome(&self, write: OutcomeWrite) -> Result<(), CoreError> {
        let mut s = self.state.write();
        s.progress.insert(
            (write.progress.user_id, write.progress.card_id),
            write.progress,
        );
        s.reviews.push(write.review);
        s.stats.insert(write.stats.user_id, write.stats);
        s.topic_progress.insert(
            (write.topic_progress.user_id, write.topic_progress.topic_id),
            write.topic_progress,
        );
        Ok(())
    }
}
