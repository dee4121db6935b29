use crate::models::{Card, CardId, ProgressRecord, ReviewStatus};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

pub fn filter_by_text(cards: &[Card], query: &str) -> Vec<Card> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return cards.to_vec();
    }
    cards
        .iter()
        .filter(|c| c.front.to_lowercase().contains(&q) || c.back.to_lowercase().contains(&q))
        .cloned()
        .collect()
}

pub fn filter_by_review_status(
    cards: &[Card],
    progress: &HashMap<CardId, ProgressRecord>,
    now: DateTime<Utc>,
    want: ReviewStatus,
) -> Vec<Card> {
    cards
        .iter()
        .filter(|c| ReviewStatus::of(progress.get(&c.id), now) == want)
        .cloned()
        .collect()
}

pub fn filter_not_suspended(cards: &[Card]) -> Vec<Card> {
    cards.iter().filter(|c| !c.suspended).cloned().collect()
}
