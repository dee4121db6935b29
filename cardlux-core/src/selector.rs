use crate::models::{Card, CardId, ProgressRecord};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Plans a study session over an already-scoped card slice.
///
/// Due cards (progress record with a passed review time) come first, most
/// overdue leading; the rest of the session is filled with never-reviewed
/// cards in catalog order (beginner first, then age). The review share caps
/// how much of the session the due cards may claim up front, but they flow
/// back in once the new cards run out. An exhausted catalog just yields a
/// shorter session.
pub fn plan_session(
    cards: &[Card],
    progress: &HashMap<CardId, ProgressRecord>,
    now: DateTime<Utc>,
    size: usize,
    review_share: f32,
) -> Vec<Card> {
    let mut due: Vec<(&Card, &ProgressRecord)> = cards
        .iter()
        .filter(|c| !c.suspended)
        .filter_map(|c| progress.get(&c.id).map(|p| (c, p)))
        .filter(|(_, p)| p.is_due(now))
        .collect();
    due.sort_by_key(|(c, p)| (p.next_review_at, c.created_at));

    let mut fresh: Vec<&Card> = cards
        .iter()
        .filter(|c| !c.suspended && !progress.contains_key(&c.id))
        .collect();
    fresh.sort_by_key(|c| (c.difficulty, c.created_at));

    let quota = ((size as f32) * review_share).round() as usize;
    let quota = quota.min(size);

    let mut session: Vec<Card> = due
        .iter()
        .take(quota)
        .map(|(c, _)| (*c).clone())
        .collect();

    for card in &fresh {
        if session.len() >= size {
            break;
        }
        session.push((*card).clone());
    }

    // New cards exhausted: let the remaining due cards fill the gap.
    for (card, _) in due.iter().skip(quota) {
        if session.len() >= size {
            break;
        }
        session.push((*card).clone());
    }

    session
}
