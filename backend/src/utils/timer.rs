// src/utils/timer.rs

use chrono::{DateTime, TimeDelta, Utc};

/// Time left before the deadline `started_at + duration`.
///
/// Goes negative once the deadline has passed; zero exactly at the deadline.
pub fn remaining(started_at: DateTime<Utc>, duration: TimeDelta, now: DateTime<Utc>) -> TimeDelta {
    duration - (now - started_at)
}

pub fn is_expired(remaining: TimeDelta) -> bool {
    remaining <= TimeDelta::zero()
}

/// Whole seconds left, floored at zero.
pub fn remaining_seconds(remaining: TimeDelta) -> i64 {
    remaining.num_seconds().max(0)
}

/// Countdown shown to the candidate, `hh:mm:ss`.
pub fn format_countdown(remaining: TimeDelta) -> String {
    let secs = remaining_seconds(remaining);
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
