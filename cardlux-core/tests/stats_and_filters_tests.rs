use cardlux_core::{
    advance_topic_progress, apply_outcome, filter_by_review_status, filter_by_text,
    filter_not_suspended, Card, CardKind, Difficulty, ProgressRecord, ReviewStatus,
    TopicProgress, UserStats,
};
use chrono::{Duration, NaiveDate, Utc};
use std::collections::HashMap;
use uuid::Uuid;

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[test]
fn streak_extends_on_consecutive_days_only() {
    let user = Uuid::new_v4();
    let stats = UserStats::new(user);

    let stats = apply_outcome(stats, true, true, day("2026-08-01"));
    assert_eq!(stats.current_streak, 1);
    assert_eq!(stats.cards_studied, 1);

    // Same day: counters move, streak does not.
    let stats = apply_outcome(stats, false, false, day("2026-08-01"));
    assert_eq!(stats.current_streak, 1);
    assert_eq!(stats.total_incorrect, 1);
    assert_eq!(stats.cards_studied, 1);

    let stats = apply_outcome(stats, true, true, day("2026-08-02"));
    assert_eq!(stats.current_streak, 2);
    assert_eq!(stats.longest_streak, 2);

    // A gap resets the streak but keeps the high-water mark.
    let stats = apply_outcome(stats, true, false, day("2026-08-05"));
    assert_eq!(stats.current_streak, 1);
    assert_eq!(stats.longest_streak, 2);
    assert_eq!(stats.last_study_date, Some(day("2026-08-05")));
}

#[test]
fn accuracy_is_correct_share_of_answers() {
    let user = Uuid::new_v4();
    let mut stats = UserStats::new(user);
    assert_eq!(stats.accuracy(), 0.0);
    stats.total_correct = 3;
    stats.total_incorrect = 1;
    assert!((stats.accuracy() - 0.75).abs() < 1e-6);
}

#[test]
fn topic_completes_when_all_active_cards_seen() {
    let user = Uuid::new_v4();
    let topic = Uuid::new_v4();
    let now = Utc::now();

    let tp = TopicProgress::new(user, topic, now);
    let tp = advance_topic_progress(tp, true, 2, now);
    assert_eq!(tp.cards_seen, 1);
    assert!(tp.completed_at.is_none());

    // Repeat review of a known card does not advance the count.
    let tp = advance_topic_progress(tp, false, 2, now);
    assert_eq!(tp.cards_seen, 1);

    let tp = advance_topic_progress(tp, true, 2, now);
    assert_eq!(tp.cards_seen, 2);
    assert!(tp.completed_at.is_some());
}

#[test]
fn text_and_suspension_filters() {
    let topic = Uuid::new_v4();
    let c1 = Card::new(topic, "Haus", "house", Difficulty::Beginner, CardKind::Vocabulary);
    let mut c2 = Card::new(topic, "Kaz", "cat", Difficulty::Beginner, CardKind::Vocabulary);
    c2.suspended = true;
    let cards = vec![c1.clone(), c2.clone()];

    let by_text = filter_by_text(&cards, "hau");
    assert_eq!(by_text.len(), 1);
    assert_eq!(by_text[0].front, "Haus");

    let active = filter_not_suspended(&cards);
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].front, "Haus");
}

#[test]
fn review_status_filter_partitions_cards() {
    let user = Uuid::new_v4();
    let topic = Uuid::new_v4();
    let now = Utc::now();

    let fresh = Card::new(topic, "new", "new", Difficulty::Beginner, CardKind::Vocabulary);
    let due = Card::new(topic, "due", "due", Difficulty::Beginner, CardKind::Vocabulary);
    let ahead = Card::new(topic, "ahead", "ahead", Difficulty::Beginner, CardKind::Vocabulary);

    let mut progress = HashMap::new();
    let mut p = ProgressRecord::new(user, due.id, now - Duration::days(2));
    p.next_review_at = now - Duration::days(1);
    progress.insert(due.id, p);
    let mut p = ProgressRecord::new(user, ahead.id, now);
    p.next_review_at = now + Duration::days(4);
    progress.insert(ahead.id, p);

    let cards = vec![fresh, due, ahead];
    assert_eq!(
        filter_by_review_status(&cards, &progress, now, ReviewStatus::New)[0].front,
        "new"
    );
    assert_eq!(
        filter_by_review_status(&cards, &progress, now, ReviewStatus::Due)[0].front,
        "due"
    );
    assert_eq!(
        filter_by_review_status(&cards, &progress, now, ReviewStatus::Scheduled)[0].front,
        "ahead"
    );
}
