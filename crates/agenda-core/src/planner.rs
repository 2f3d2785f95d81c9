//! Event orchestration: creation from free text, conflict handling,
//! and lifecycle operations.
//!
//! The planner wires the extraction collaborator, the keyword
//! classifier, the conflict detector, the slot finder, and storage
//! into the operation catalogue. It owns no global state; both the
//! database and the extractor are injected.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classify::categorize;
use crate::conflict::find_conflict;
use crate::error::{Result, SlotError, ValidationError};
use crate::event::{
    Event, EventState, Reminder, SharePayload, StatusUpdate, TimelineEntry,
};
use crate::extract::{Extractor, ParsedEvent};
use crate::slots::{SlotConfig, SlotFinder};
use crate::storage::{EventDb, EventPatch};

/// How many alternative slots to propose on conflict.
const DEFAULT_SUGGESTIONS: usize = 3;

/// Result of creating an event from free text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOutcome {
    pub is_conflict: bool,
    /// Human-readable description of the conflict, when there is one.
    pub conflict_details: Option<String>,
    pub event: Event,
    /// Suggested alternative start times; empty when no conflict, or
    /// when the slot search exhausted its horizon.
    pub suggested_times: Vec<DateTime<Utc>>,
    /// True when extraction failed and the event is the recovery
    /// placeholder rather than a genuine parse.
    pub extraction_failed: bool,
}

/// Orchestrates event creation and lifecycle operations.
pub struct Planner {
    db: EventDb,
    extractor: Box<dyn Extractor>,
    slot_finder: SlotFinder,
    suggestion_count: usize,
}

impl Planner {
    pub fn new(db: EventDb, extractor: Box<dyn Extractor>) -> Self {
        Self {
            db,
            extractor,
            slot_finder: SlotFinder::new(),
            suggestion_count: DEFAULT_SUGGESTIONS,
        }
    }

    /// Override the slot-finder configuration.
    pub fn with_slot_config(mut self, config: SlotConfig) -> Self {
        self.slot_finder = SlotFinder::with_config(config);
        self
    }

    /// Override how many alternative slots to propose.
    pub fn with_suggestion_count(mut self, count: usize) -> Self {
        self.suggestion_count = count;
        self
    }

    /// Create an event from free text.
    ///
    /// Extraction failure does not fail the operation: a placeholder
    /// event carrying the original text is created instead, and the
    /// outcome flags it. Conflicts against the owner's other events
    /// yield suggested alternative start times.
    pub fn create_from_text(&mut self, owner: &str, text: &str) -> Result<CreateOutcome> {
        let now = Utc::now();
        let (parsed, extraction_failed) = match self.extractor.extract(text, now) {
            Ok(parsed) => (parsed, false),
            Err(_) => (ParsedEvent::fallback(text, now), true),
        };

        let event = self.build_event(owner, parsed, now)?;
        self.db.insert(&event)?;

        // The freshly inserted event is part of the owner's set; the
        // conflict check skips it by id, and the slot search treats its
        // time as booked so suggestions don't land on top of it.
        let mut others = self.db.find_all_by_owner(owner)?;
        others.sort_by_key(|e| e.start_time);

        let conflict = find_conflict(&event, &others).cloned();
        let (conflict_details, suggested_times) = match conflict {
            Some(ref conflicting) => {
                let details = format!("Conflicts with '{}'", conflicting.title);
                let suggestions = self.suggest_alternatives(&event, conflicting, &others, now);
                (Some(details), suggestions)
            }
            None => (None, Vec::new()),
        };

        Ok(CreateOutcome {
            is_conflict: conflict.is_some(),
            conflict_details,
            event,
            suggested_times,
            extraction_failed,
        })
    }

    fn build_event(&self, owner: &str, parsed: ParsedEvent, now: DateTime<Utc>) -> Result<Event> {
        let category = categorize(&parsed.title);

        // Normalize: every created event has an end time.
        let end_time = parsed
            .end_time
            .unwrap_or(parsed.start_time + Duration::hours(1));
        if end_time <= parsed.start_time {
            return Err(ValidationError::InvalidTimeRange {
                start: parsed.start_time,
                end: end_time,
            }
            .into());
        }

        let category_note = format!("Assistant classified this as: {}.", category.as_str());
        let notes = match parsed.notes {
            Some(notes) => format!("{notes}\n{category_note}"),
            None => category_note,
        };

        Ok(Event {
            id: Uuid::new_v4().to_string(),
            owner_id: owner.to_string(),
            title: parsed.title,
            start_time: parsed.start_time,
            end_time: Some(end_time),
            location: parsed.location,
            notes: Some(notes),
            category,
            state: EventState::Draft,
            reminders: Vec::new(),
            timeline: vec![TimelineEntry {
                timestamp: now,
                action: "Event Created".to_string(),
                details: Some(format!("Category: {}", category.as_str())),
            }],
            is_confirmed: false,
            was_shared: false,
            is_reminded: false,
        })
    }

    /// Slot search seeded at the conflicting event's end. Horizon
    /// exhaustion degrades to "no suggestions" rather than failing the
    /// creation that already committed.
    fn suggest_alternatives(
        &self,
        event: &Event,
        conflicting: &Event,
        all_events: &[Event],
        now: DateTime<Utc>,
    ) -> Vec<DateTime<Utc>> {
        let Some(duration) = event.duration() else {
            return Vec::new();
        };
        let seed = conflicting.end_time.unwrap_or(event.start_time);

        match self.slot_finder.find_slots(
            seed,
            duration,
            all_events,
            self.suggestion_count,
            now,
        ) {
            Ok(slots) => slots,
            Err(SlotError::HorizonExhausted { .. } | SlotError::IterationLimit { .. }) => {
                Vec::new()
            }
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// All events belonging to the owner.
    pub fn list(&self, owner: &str) -> Result<Vec<Event>> {
        self.db.find_all_by_owner(owner)
    }

    /// One event by id, or None when absent / owned by someone else.
    pub fn get(&self, id: &str, owner: &str) -> Result<Option<Event>> {
        self.db.find_by_id(id, owner)
    }

    /// The event's audit timeline.
    pub fn timeline(&self, id: &str, owner: &str) -> Result<Option<Vec<TimelineEntry>>> {
        Ok(self.db.find_by_id(id, owner)?.map(|e| e.timeline))
    }

    // ── Lifecycle operations ─────────────────────────────────────────

    /// Confirm an event. Idempotent: confirming a confirmed event is
    /// safe and still appends a timeline entry.
    pub fn confirm(&mut self, id: &str, owner: &str) -> Result<Option<Event>> {
        let patch = EventPatch {
            state: Some(EventState::Confirmed),
            is_confirmed: Some(true),
            ..Default::default()
        };
        let entry = TimelineEntry::now("Event Confirmed", None);
        if self.db.apply(id, owner, &patch, &entry)? == 0 {
            return Ok(None);
        }
        self.db.find_by_id(id, owner)
    }

    /// Re-extract the event from new text and move it back to Draft.
    ///
    /// Location and notes fall back to the stored values when the new
    /// text doesn't mention them.
    pub fn reschedule(&mut self, id: &str, owner: &str, text: &str) -> Result<Option<Event>> {
        let Some(original) = self.db.find_by_id(id, owner)? else {
            return Ok(None);
        };

        let now = Utc::now();
        let parsed = self.extractor.extract(text, now)?;
        let end_time = parsed
            .end_time
            .unwrap_or(parsed.start_time + Duration::hours(1));
        if end_time <= parsed.start_time {
            return Err(ValidationError::InvalidTimeRange {
                start: parsed.start_time,
                end: end_time,
            }
            .into());
        }

        let patch = EventPatch {
            start_time: Some(parsed.start_time),
            end_time: Some(end_time),
            location: parsed.location.or(original.location),
            notes: parsed.notes.or(original.notes),
            state: Some(EventState::Draft),
            is_confirmed: Some(false),
            ..Default::default()
        };
        let entry = TimelineEntry::now(
            "Event Rescheduled",
            Some(format!("New time: {}", parsed.start_time.to_rfc3339())),
        );
        if self.db.apply(id, owner, &patch, &entry)? == 0 {
            return Ok(None);
        }
        self.db.find_by_id(id, owner)
    }

    /// Attach a reminder. The event's state is unchanged.
    pub fn add_reminder(
        &mut self,
        id: &str,
        owner: &str,
        reminder: Reminder,
    ) -> Result<Option<Event>> {
        let patch = EventPatch {
            push_reminder: Some(reminder),
            ..Default::default()
        };
        let entry = TimelineEntry::now("Reminder Added", None);
        if self.db.apply(id, owner, &patch, &entry)? == 0 {
            return Ok(None);
        }
        self.db.find_by_id(id, owner)
    }

    /// Share an event with a list of recipients, returning a share
    /// summary.
    pub fn share(
        &mut self,
        id: &str,
        owner: &str,
        recipients: &[String],
    ) -> Result<Option<SharePayload>> {
        let Some(event) = self.db.find_by_id(id, owner)? else {
            return Ok(None);
        };

        let patch = EventPatch {
            state: Some(EventState::Shared),
            was_shared: Some(true),
            ..Default::default()
        };
        let entry = TimelineEntry::now(
            "Event Shared",
            Some(format!("Shared with: {}", recipients.join(", "))),
        );
        self.db.apply(id, owner, &patch, &entry)?;

        Ok(Some(SharePayload {
            summary: format!("Event: {}", event.title),
            start: event.start_time,
            location: event.location,
            notes: event.notes,
        }))
    }

    /// Apply a manual status update. At least one field must be set.
    pub fn update_status(
        &mut self,
        id: &str,
        owner: &str,
        status: &StatusUpdate,
    ) -> Result<Option<Event>> {
        if status.is_empty() {
            return Err(ValidationError::EmptyUpdate {
                operation: "status update".to_string(),
            }
            .into());
        }

        let patch = EventPatch {
            state: status.state,
            is_confirmed: status.is_confirmed,
            is_reminded: status.is_reminded,
            was_shared: status.was_shared,
            ..Default::default()
        };
        let entry = TimelineEntry::now(
            "Status Updated",
            Some(format!("New status: {}", status.describe())),
        );
        if self.db.apply(id, owner, &patch, &entry)? == 0 {
            return Ok(None);
        }
        self.db.find_by_id(id, owner)
    }

    /// Hard-delete an event. Returns whether anything was removed.
    pub fn delete(&mut self, id: &str, owner: &str) -> Result<bool> {
        Ok(self.db.delete(id, owner)? > 0)
    }
}
