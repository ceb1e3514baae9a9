// Schedule matching and run-recency guard
//
// Due-ness is exact-minute: a schedule matches only during the minute it
// names, so the driving tick must divide evenly into one minute or due
// events are missed.

use crate::models::{Frequency, Schedule};
use chrono::{DateTime, Datelike, Duration, Timelike, Utc};

/// Suppression window for the recency guard, one cadence period.
pub const RECENCY_WINDOW_MS: i64 = 60_000;

/// Decide whether a schedule is due at `now` (this tick).
///
/// A schedule missing the fields its frequency requires is never due; the
/// source simply never triggers.
pub fn is_due(schedule: &Schedule, now: DateTime<Utc>) -> bool {
    match schedule.frequency {
        Frequency::Hourly => now.minute() == 0,
        Frequency::Daily => minute_matches(schedule, now),
        Frequency::Weekly => {
            minute_matches(schedule, now)
                && schedule
                    .day_of_week
                    .map(|d| d.matches(now.weekday()))
                    .unwrap_or(false)
        }
        Frequency::Monthly => {
            minute_matches(schedule, now)
                && schedule
                    .day_of_month
                    .map(|d| now.day() == d)
                    .unwrap_or(false)
        }
    }
}

fn minute_matches(schedule: &Schedule, now: DateTime<Utc>) -> bool {
    match schedule.time_of_day {
        Some(tod) => now.hour() == tod.hour && now.minute() == tod.minute,
        None => false,
    }
}

/// Run-recency guard: suppress a trigger when the source already started a
/// run within the last 60 seconds. Keeps the tick-based matcher idempotent
/// per logical minute; this is a time-window heuristic, not a run lock.
pub fn ran_recently(last_run: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last_run {
        Some(last) => last > now - Duration::milliseconds(RECENCY_WINDOW_MS),
        None => false,
    }
}
