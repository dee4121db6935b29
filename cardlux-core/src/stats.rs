use crate::models::{TopicProgress, UserStats};
use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Advances the user's aggregate counters for one review outcome. The streak
/// moves at most once per calendar day: same day leaves it alone, the day
/// after the last study extends it, any gap restarts at 1.
pub fn apply_outcome(
    mut stats: UserStats,
    was_correct: bool,
    is_new_card: bool,
    today: NaiveDate,
) -> UserStats {
    if is_new_card {
        stats.cards_studied += 1;
    }
    if was_correct {
        stats.total_correct += 1;
    } else {
        stats.total_incorrect += 1;
    }

    stats.current_streak = match stats.last_study_date {
        Some(last) if last == today => stats.current_streak,
        Some(last) if today - last == Duration::days(1) => stats.current_streak + 1,
        _ => 1,
    };
    stats.longest_streak = stats.longest_streak.max(stats.current_streak);
    stats.last_study_date = Some(today);
    stats
}

/// Counts a first-time card toward the topic, marking the topic completed
/// once every active card in it has been seen.
pub fn advance_topic_progress(
    mut progress: TopicProgress,
    is_new_card: bool,
    active_cards_in_topic: usize,
    now: DateTime<Utc>,
) -> TopicProgress {
    if is_new_card {
        progress.cards_seen += 1;
        if progress.completed_at.is_none()
            && active_cards_in_topic > 0
            && progress.cards_seen as usize >= active_cards_in_topic
        {
            progress.completed_at = Some(now);
        }
    }
    progress
}
