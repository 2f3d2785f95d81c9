//! Greedy search for free calendar slots.
//!
//! Proposes alternative start times when a new event collides with the
//! existing schedule. The scan walks forward in fixed increments,
//! jumping to the end of any conflicting event instead of probing
//! minute by minute, and is bounded by a search horizon so pathological
//! schedules fail with a typed error instead of spinning.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::conflict::overlaps;
use crate::error::SlotError;
use crate::event::Event;

/// Hard cap on scan iterations, independent of the horizon. Guards
/// against degenerate configs such as an empty business-hours window.
const MAX_ITERATIONS: u64 = 100_000;

/// Slot finder configuration.
///
/// Hours are read off the stored clock directly; times are naive wall
/// clock, not timezone-adjusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotConfig {
    /// First schedulable hour of the day (inclusive).
    pub open_hour: u32,
    /// Last schedulable hour of the day (exclusive).
    pub close_hour: u32,
    /// Slot start granularity in minutes.
    pub granularity_min: i64,
    /// Minimum lead time from "now" before the first slot.
    pub lead_min: i64,
    /// Maximum days to scan past the seed time before giving up.
    pub horizon_days: i64,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            open_hour: 8,
            close_hour: 22,
            granularity_min: 15,
            lead_min: 30,
            horizon_days: 60,
        }
    }
}

/// Greedy forward-scanning slot finder.
pub struct SlotFinder {
    config: SlotConfig,
}

impl SlotFinder {
    /// Create a finder with default settings (8-22 business hours,
    /// 15-minute granularity, 60-day horizon).
    pub fn new() -> Self {
        Self {
            config: SlotConfig::default(),
        }
    }

    /// Create with custom config.
    pub fn with_config(config: SlotConfig) -> Self {
        Self { config }
    }

    /// Find the next `count` free start times of `duration` length.
    ///
    /// The scan starts at `desired_start`, but never earlier than
    /// `now + lead`. Returned slots are chronological, pairwise
    /// non-overlapping, start within business hours, and avoid every
    /// existing event that has an end time.
    ///
    /// # Errors
    /// [`SlotError::HorizonExhausted`] if the horizon passes before
    /// `count` slots are found; [`SlotError::IterationLimit`] if the
    /// scan fails to advance meaningfully.
    pub fn find_slots(
        &self,
        desired_start: DateTime<Utc>,
        duration: Duration,
        existing: &[Event],
        count: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, SlotError> {
        // Closed intervals only; open-ended events never block a slot.
        let mut busy: Vec<(DateTime<Utc>, DateTime<Utc>)> = existing
            .iter()
            .filter_map(|e| e.end_time.map(|end| (e.start_time, end)))
            .collect();
        busy.sort_by_key(|&(start, _)| start);

        let mut cursor = desired_start.max(now + Duration::minutes(self.config.lead_min));
        let horizon = cursor + Duration::days(self.config.horizon_days);

        let mut slots = Vec::with_capacity(count);
        let mut iterations: u64 = 0;

        while slots.len() < count {
            iterations += 1;
            if iterations > MAX_ITERATIONS {
                return Err(SlotError::IterationLimit { iterations });
            }
            if cursor > horizon {
                return Err(SlotError::HorizonExhausted {
                    duration_min: duration.num_minutes(),
                    horizon_days: self.config.horizon_days,
                });
            }

            cursor = round_up(cursor, self.config.granularity_min);

            // Business-hours gate on the slot start.
            let hour = cursor.hour();
            if hour < self.config.open_hour || hour >= self.config.close_hour {
                cursor = next_day_open(cursor, self.config.open_hour);
                continue;
            }

            let candidate_end = cursor + duration;

            // Jump to the end of the first conflicting event.
            if let Some(&(_, busy_end)) = busy
                .iter()
                .find(|&&(start, end)| overlaps(cursor, candidate_end, start, end))
            {
                cursor = busy_end;
                continue;
            }

            slots.push(cursor);
            cursor = candidate_end;
        }

        Ok(slots)
    }
}

impl Default for SlotFinder {
    fn default() -> Self {
        Self::new()
    }
}

/// Round up to the next `granularity_min` boundary. Times already on a
/// boundary are left alone.
fn round_up(t: DateTime<Utc>, granularity_min: i64) -> DateTime<Utc> {
    let gran_secs = granularity_min.max(1) * 60;
    let mut secs = t.timestamp();
    if t.timestamp_subsec_nanos() > 0 {
        secs += 1;
    }
    // `i64::div_ceil` is still unstable (`int_roundings`); this is the
    // equivalent ceiling division for a positive divisor.
    let quotient = secs.div_euclid(gran_secs) + (secs.rem_euclid(gran_secs) > 0) as i64;
    let rounded = quotient * gran_secs;
    DateTime::<Utc>::from_timestamp(rounded, 0).unwrap_or(t)
}

/// Jump to `open_hour:00` on the next calendar day.
fn next_day_open(t: DateTime<Utc>, open_hour: u32) -> DateTime<Utc> {
    let next_day = t.date_naive() + Duration::days(1);
    next_day
        .and_hms_opt(open_hour, 0, 0)
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
        .unwrap_or(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventCategory, EventState};
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn make_event(id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Event {
        Event {
            id: id.to_string(),
            owner_id: "owner".to_string(),
            title: format!("Event {id}"),
            start_time: start,
            end_time: Some(end),
            location: None,
            notes: None,
            category: EventCategory::default(),
            state: EventState::Draft,
            reminders: Vec::new(),
            timeline: Vec::new(),
            is_confirmed: false,
            was_shared: false,
            is_reminded: false,
        }
    }

    fn base() -> DateTime<Utc> {
        // A Monday at 08:00.
        Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
    }

    #[test]
    fn rounds_up_to_quarter_hour() {
        let t = Utc.with_ymd_and_hms(2026, 3, 2, 9, 7, 30).unwrap();
        let rounded = round_up(t, 15);
        assert_eq!(rounded, Utc.with_ymd_and_hms(2026, 3, 2, 9, 15, 0).unwrap());

        // Already aligned: unchanged.
        assert_eq!(round_up(rounded, 15), rounded);
    }

    #[test]
    fn finds_slots_on_an_empty_calendar() {
        let finder = SlotFinder::new();
        let now = base();
        let slots = finder
            .find_slots(now, Duration::minutes(60), &[], 3, now)
            .unwrap();

        assert_eq!(slots.len(), 3);
        // First slot honors the 30-minute lead, rounded up.
        assert_eq!(slots[0], Utc.with_ymd_and_hms(2026, 3, 2, 8, 30, 0).unwrap());
        assert_eq!(slots[1], Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap());
        assert_eq!(slots[2], Utc.with_ymd_and_hms(2026, 3, 2, 10, 30, 0).unwrap());
    }

    #[test]
    fn jumps_past_a_conflicting_event() {
        let now = base();
        let busy = make_event(
            "busy",
            Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 2, 11, 0, 0).unwrap(),
        );

        let finder = SlotFinder::new();
        let slots = finder
            .find_slots(now, Duration::minutes(30), &[busy], 1, now)
            .unwrap();

        assert_eq!(slots[0], Utc.with_ymd_and_hms(2026, 3, 2, 11, 0, 0).unwrap());
    }

    #[test]
    fn late_evening_request_rolls_over_to_next_morning() {
        // Request at 21:50 with a 60-minute duration: 21:50 rounds up
        // to 22:00, which is outside [8, 22), so the first slot is
        // 08:00 the next day.
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 21, 20, 0).unwrap();
        let desired = Utc.with_ymd_and_hms(2026, 3, 2, 21, 50, 0).unwrap();

        let finder = SlotFinder::new();
        let slots = finder
            .find_slots(desired, Duration::minutes(60), &[], 1, now)
            .unwrap();

        assert_eq!(slots[0], Utc.with_ymd_and_hms(2026, 3, 3, 8, 0, 0).unwrap());
    }

    #[test]
    fn fully_booked_horizon_is_a_typed_error() {
        let now = base();
        // Block every business hour for three days.
        let busy: Vec<Event> = (0..3)
            .map(|day| {
                let start = now + Duration::days(day);
                make_event(&format!("day{day}"), start, start + Duration::hours(14))
            })
            .collect();

        let finder = SlotFinder::with_config(SlotConfig {
            horizon_days: 1,
            ..SlotConfig::default()
        });

        let err = finder
            .find_slots(now, Duration::minutes(60), &busy, 1, now)
            .unwrap_err();
        assert!(matches!(err, SlotError::HorizonExhausted { .. }));
    }

    #[test]
    fn consecutive_slots_do_not_overlap_each_other() {
        let now = base();
        let finder = SlotFinder::new();
        let duration = Duration::minutes(45);
        let slots = finder.find_slots(now, duration, &[], 5, now).unwrap();

        for pair in slots.windows(2) {
            assert!(pair[1] >= pair[0] + duration);
        }
    }

    proptest! {
        #[test]
        fn found_slots_satisfy_all_invariants(
            event_quarters in prop::collection::vec((0i64..14 * 24 * 4, 1i64..16), 0..8),
            desired_quarters in 0i64..7 * 24 * 4,
            duration_quarters in 1i64..9,
            count in 1usize..5,
        ) {
            let now = base();
            let existing: Vec<Event> = event_quarters
                .iter()
                .enumerate()
                .map(|(i, &(offset, len))| {
                    let start = now + Duration::minutes(offset * 15);
                    make_event(&format!("e{i}"), start, start + Duration::minutes(len * 15))
                })
                .collect();

            let desired = now + Duration::minutes(desired_quarters * 15);
            let duration = Duration::minutes(duration_quarters * 15);

            let finder = SlotFinder::new();
            let result = finder.find_slots(desired, duration, &existing, count, now);
            // A crowded random calendar may legally exhaust the horizon.
            if matches!(result, Err(SlotError::HorizonExhausted { .. })) {
                return Ok(());
            }
            prop_assert!(result.is_ok(), "unexpected slot error: {:?}", result);
            let slots = result.unwrap();

            prop_assert_eq!(slots.len(), count);

            for pair in slots.windows(2) {
                prop_assert!(pair[1] >= pair[0] + duration);
            }

            for &slot in &slots {
                let hour = slot.hour();
                prop_assert!((8..22).contains(&hour));

                let slot_end = slot + duration;
                for event in &existing {
                    let end = event.end_time.unwrap();
                    prop_assert!(
                        !overlaps(slot, slot_end, event.start_time, end),
                        "slot {} overlaps event {}..{}",
                        slot,
                        event.start_time,
                        end
                    );
                }
            }
        }
    }
}
