//! Interval conflict detection between calendar events.
//!
//! Pure functions, no side effects. Intervals are half-open
//! `[start, end)`, so back-to-back events do not conflict.

use chrono::{DateTime, Utc};

use crate::event::Event;

/// Half-open interval overlap: `[a_start, a_end)` and `[b_start, b_end)`
/// overlap iff `a_start < b_end && a_end > b_start`.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// Find the first existing event whose interval overlaps the candidate.
///
/// The candidate is never compared against itself (matched by id).
/// Existing events without an end time never conflict; an open end is
/// a deliberate exclusion, not an infinite interval. Which overlapping
/// event is reported depends on the caller-supplied iteration order --
/// pass a start-time-sorted slice to get the earliest-starting conflict.
pub fn find_conflict<'a>(candidate: &Event, existing: &'a [Event]) -> Option<&'a Event> {
    let candidate_end = candidate.end_time?;

    existing.iter().find(|other| {
        if other.id == candidate.id {
            return false;
        }
        match other.end_time {
            Some(other_end) => overlaps(
                candidate.start_time,
                candidate_end,
                other.start_time,
                other_end,
            ),
            None => false,
        }
    })
}
