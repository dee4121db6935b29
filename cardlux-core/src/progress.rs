use crate::models::ProgressRecord;
use crate::scheduler::Schedule;
use chrono::{DateTime, Utc};

/// Folds one review outcome into a progress record: exposure counters plus
/// the scheduling fields computed by the SM-2 step.
pub fn advance_progress(
    mut record: ProgressRecord,
    schedule: Schedule,
    was_correct: bool,
    now: DateTime<Utc>,
) -> ProgressRecord {
    record.times_shown += 1;
    if was_correct {
        record.times_correct += 1;
    } else {
        record.times_incorrect += 1;
    }
    record.ease_factor = schedule.ease_factor;
    record.interval_days = schedule.interval_days;
    record.repetitions = schedule.repetitions;
    record.next_review_at = schedule.next_review_at;
    record.last_shown_at = Some(now);
    record
}
