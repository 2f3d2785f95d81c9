//! Calendar event domain model and lifecycle types.
//!
//! An [`Event`] moves through a small state machine: created as
//! `Draft`, promoted by Confirm/Share, sent back to `Draft` by
//! Reschedule. `ReminderSent`, `Completed`, and `Cancelled` are set
//! through the manual status update; `Cancelled` is not enforced as
//! terminal.
//!
//! Every mutation appends exactly one [`TimelineEntry`]; the timeline
//! is append-only and its timestamps are non-decreasing.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Lifecycle state of an event.
///
/// Stored as stable SCREAMING_SNAKE codes at the storage boundary;
/// the domain layer only ever sees this closed enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventState {
    Draft,
    Confirmed,
    Shared,
    ReminderSent,
    Completed,
    Cancelled,
}

impl EventState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Confirmed => "CONFIRMED",
            Self::Shared => "SHARED",
            Self::ReminderSent => "REMINDER_SENT",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parse a stored state code. Unknown codes fall back to `Draft`.
    pub fn parse(code: &str) -> Self {
        match code {
            "CONFIRMED" => Self::Confirmed,
            "SHARED" => Self::Shared,
            "REMINDER_SENT" => Self::ReminderSent,
            "COMPLETED" => Self::Completed,
            "CANCELLED" => Self::Cancelled,
            _ => Self::Draft,
        }
    }
}

/// Category assigned by the keyword classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventCategory {
    Uncategorized,
    Sports,
    Appointment,
    School,
    Work,
    Social,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uncategorized => "UNCATEGORIZED",
            Self::Sports => "SPORTS",
            Self::Appointment => "APPOINTMENT",
            Self::School => "SCHOOL",
            Self::Work => "WORK",
            Self::Social => "SOCIAL",
        }
    }

    /// Parse a stored category code. Unknown codes fall back to
    /// `Uncategorized`.
    pub fn parse(code: &str) -> Self {
        match code {
            "SPORTS" => Self::Sports,
            "APPOINTMENT" => Self::Appointment,
            "SCHOOL" => Self::School,
            "WORK" => Self::Work,
            "SOCIAL" => Self::Social,
            _ => Self::Uncategorized,
        }
    }
}

impl Default for EventCategory {
    fn default() -> Self {
        Self::Uncategorized
    }
}

/// A reminder attached to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    /// Minutes before the event start to fire.
    pub minutes_before: u32,
    pub message: Option<String>,
}

/// One entry in an event's append-only audit timeline.
///
/// Fixed shape: timestamp, short action label, optional free-form
/// details. No open-ended key/value payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub details: Option<String>,
}

impl TimelineEntry {
    /// Create an entry stamped with the current time.
    pub fn now(action: &str, details: Option<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            action: action.to_string(),
            details,
        }
    }
}

/// A calendar event owned by a single user.
///
/// The three booleans are projections of `state` that every mutator
/// keeps consistent; they exist so status queries don't have to match
/// on the enum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    /// Opaque, already-authenticated owner identity. Every query and
    /// mutation is scoped to it.
    pub owner_id: String,
    pub title: String,
    pub start_time: DateTime<Utc>,
    /// Optional in the model, but normalized to be present after
    /// creation (defaulted to start + 1h).
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub category: EventCategory,
    pub state: EventState,
    pub reminders: Vec<Reminder>,
    pub timeline: Vec<TimelineEntry>,
    pub is_confirmed: bool,
    pub was_shared: bool,
    pub is_reminded: bool,
}

impl Event {
    /// Event duration, when an end time is present.
    pub fn duration(&self) -> Option<Duration> {
        self.end_time.map(|end| end - self.start_time)
    }

    /// Check the `end_time > start_time` invariant.
    pub fn validate_times(&self) -> Result<(), ValidationError> {
        match self.end_time {
            Some(end) if end <= self.start_time => Err(ValidationError::InvalidTimeRange {
                start: self.start_time,
                end,
            }),
            _ => Ok(()),
        }
    }
}

/// Partial status update applied by the manual status operation.
///
/// At least one field must be set; an empty update is a validation
/// error, not a no-op.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub state: Option<EventState>,
    pub is_confirmed: Option<bool>,
    pub is_reminded: Option<bool>,
    pub was_shared: Option<bool>,
}

impl StatusUpdate {
    pub fn is_empty(&self) -> bool {
        self.state.is_none()
            && self.is_confirmed.is_none()
            && self.is_reminded.is_none()
            && self.was_shared.is_none()
    }

    /// Human-readable summary of the applied fields, for the
    /// "Status Updated" timeline entry.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(state) = self.state {
            parts.push(format!("state={}", state.as_str()));
        }
        if let Some(v) = self.is_confirmed {
            parts.push(format!("is_confirmed={v}"));
        }
        if let Some(v) = self.is_reminded {
            parts.push(format!("is_reminded={v}"));
        }
        if let Some(v) = self.was_shared {
            parts.push(format!("was_shared={v}"));
        }
        parts.join(", ")
    }
}

/// Summary returned when an event is shared with other people.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharePayload {
    pub summary: String,
    pub start: DateTime<Utc>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_codes_round_trip() {
        for state in [
            EventState::Draft,
            EventState::Confirmed,
            EventState::Shared,
            EventState::ReminderSent,
            EventState::Completed,
            EventState::Cancelled,
        ] {
            assert_eq!(EventState::parse(state.as_str()), state);
        }
    }

    #[test]
    fn unknown_state_code_falls_back_to_draft() {
        assert_eq!(EventState::parse("BOGUS"), EventState::Draft);
    }

    #[test]
    fn category_codes_round_trip() {
        for cat in [
            EventCategory::Uncategorized,
            EventCategory::Sports,
            EventCategory::Appointment,
            EventCategory::School,
            EventCategory::Work,
            EventCategory::Social,
        ] {
            assert_eq!(EventCategory::parse(cat.as_str()), cat);
        }
    }

    #[test]
    fn empty_status_update_is_detected() {
        assert!(StatusUpdate::default().is_empty());

        let update = StatusUpdate {
            is_confirmed: Some(true),
            ..Default::default()
        };
        assert!(!update.is_empty());
        assert_eq!(update.describe(), "is_confirmed=true");
    }

    #[test]
    fn validate_times_rejects_inverted_range() {
        let start = Utc::now();
        let event = Event {
            id: "e1".to_string(),
            owner_id: "u1".to_string(),
            title: "Test".to_string(),
            start_time: start,
            end_time: Some(start - Duration::minutes(5)),
            location: None,
            notes: None,
            category: EventCategory::default(),
            state: EventState::Draft,
            reminders: Vec::new(),
            timeline: Vec::new(),
            is_confirmed: false,
            was_shared: false,
            is_reminded: false,
        };
        assert!(event.validate_times().is_err());
    }
}
