//! Elapsed time in the proposal stage

use chrono::{DateTime, Local, Utc};

use crate::normalize::{hours_between, round2, Timestamp};

/// Stage label (lowercase) whose deals are still accruing time
pub const OPEN_STAGE_MARKER: &str = "proposal sent";

/// Hours spent in a stage, rounded to 2 decimals
///
/// - no entry: `None`
/// - entry and exit: `exit - entry`
/// - entry only, current stage label contains "proposal sent": `now - entry`,
///   compared in the entry's own timezone context (local wall clock for a
///   naive entry)
/// - entry only, any other stage: `None`
pub fn elapsed_hours(
    entry: Option<&Timestamp>,
    exit: Option<&Timestamp>,
    stage_label: &str,
    now: DateTime<Utc>,
) -> Option<f64> {
    let entry = entry?;

    if let Some(exit) = exit {
        return Some(round2(entry.hours_until(exit)));
    }

    if !stage_label.to_lowercase().contains(OPEN_STAGE_MARKER) {
        return None;
    }

    let hours = match entry {
        Timestamp::Aware(dt) => hours_between(dt.naive_utc(), now.naive_utc()),
        Timestamp::Naive(dt) => hours_between(*dt, now.with_timezone(&Local).naive_local()),
    };
    Some(round2(hours))
}
