//! SQLite-based storage for calendar events and their audit timelines.
//!
//! Every state mutation and its timeline entry commit in a single
//! transaction; a state change without its audit entry (or the
//! reverse) cannot be observed. The timeline table is append-only by
//! construction -- the only statement ever issued against it besides
//! SELECT is INSERT (and the cascade DELETE when an event is removed).

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::data_dir;
use crate::error::{CoreError, DatabaseError, Result};
use crate::event::{Event, EventCategory, EventState, Reminder, TimelineEntry};

// === Helper Functions ===

/// Parse datetime from RFC3339 string with fallback to current time
fn parse_datetime_fallback(dt_str: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

const EVENT_COLUMNS: &str = "id, owner_id, title, start_time, end_time, location, notes, \
                             category, state, is_confirmed, was_shared, is_reminded, reminders";

/// Build an Event from a database row (timeline loaded separately).
fn row_to_event(row: &rusqlite::Row) -> std::result::Result<Event, rusqlite::Error> {
    let start_time_str: String = row.get(3)?;
    let end_time_str: Option<String> = row.get(4)?;
    let category_str: String = row.get(7)?;
    let state_str: String = row.get(8)?;
    let reminders_json: String = row.get(12)?;

    Ok(Event {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        start_time: parse_datetime_fallback(&start_time_str),
        end_time: end_time_str.as_deref().map(parse_datetime_fallback),
        location: row.get(5)?,
        notes: row.get(6)?,
        category: EventCategory::parse(&category_str),
        state: EventState::parse(&state_str),
        reminders: serde_json::from_str(&reminders_json).unwrap_or_default(),
        timeline: Vec::new(),
        is_confirmed: row.get(9)?,
        was_shared: row.get(10)?,
        is_reminded: row.get(11)?,
    })
}

/// Partial update applied to a stored event.
///
/// `None` fields are left untouched; `push_reminder` appends instead
/// of replacing. The accompanying timeline entry is supplied to
/// [`EventDb::apply`] so both land in one transaction.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub category: Option<EventCategory>,
    pub state: Option<EventState>,
    pub is_confirmed: Option<bool>,
    pub was_shared: Option<bool>,
    pub is_reminded: Option<bool>,
    pub push_reminder: Option<Reminder>,
}

impl EventPatch {
    fn apply_to(&self, event: &mut Event) {
        if let Some(ref title) = self.title {
            event.title = title.clone();
        }
        if let Some(start) = self.start_time {
            event.start_time = start;
        }
        if let Some(end) = self.end_time {
            event.end_time = Some(end);
        }
        if let Some(ref location) = self.location {
            event.location = Some(location.clone());
        }
        if let Some(ref notes) = self.notes {
            event.notes = Some(notes.clone());
        }
        if let Some(category) = self.category {
            event.category = category;
        }
        if let Some(state) = self.state {
            event.state = state;
        }
        if let Some(v) = self.is_confirmed {
            event.is_confirmed = v;
        }
        if let Some(v) = self.was_shared {
            event.was_shared = v;
        }
        if let Some(v) = self.is_reminded {
            event.is_reminded = v;
        }
        if let Some(ref reminder) = self.push_reminder {
            event.reminders.push(reminder.clone());
        }
    }
}

/// SQLite database for event storage.
///
/// Every query and mutation is scoped by owner; a non-owner is
/// indistinguishable from "not found".
pub struct EventDb {
    conn: Connection,
}

impl EventDb {
    /// Open the event database at `~/.config/agenda/agenda.db`.
    ///
    /// Creates tables if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()
            .map_err(|e| CoreError::Custom(e.to_string()))?
            .join("agenda.db");
        Self::open_at(&path)
    }

    /// Open (or create) the event database at an explicit path.
    pub fn open_at(path: &std::path::Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS events (
                    id           TEXT PRIMARY KEY,
                    owner_id     TEXT NOT NULL,
                    title        TEXT NOT NULL,
                    start_time   TEXT NOT NULL,
                    end_time     TEXT,
                    location     TEXT,
                    notes        TEXT,
                    category     TEXT NOT NULL DEFAULT 'UNCATEGORIZED',
                    state        TEXT NOT NULL DEFAULT 'DRAFT',
                    is_confirmed INTEGER NOT NULL DEFAULT 0,
                    was_shared   INTEGER NOT NULL DEFAULT 0,
                    is_reminded  INTEGER NOT NULL DEFAULT 0,
                    reminders    TEXT NOT NULL DEFAULT '[]'
                );

                CREATE INDEX IF NOT EXISTS idx_events_owner ON events(owner_id);

                CREATE TABLE IF NOT EXISTS timeline (
                    event_id  TEXT NOT NULL,
                    seq       INTEGER NOT NULL,
                    timestamp TEXT NOT NULL,
                    action    TEXT NOT NULL,
                    details   TEXT,
                    PRIMARY KEY (event_id, seq)
                );",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    /// Insert a new event with its initial timeline.
    pub fn insert(&mut self, event: &Event) -> Result<()> {
        let tx = self.conn.transaction().map_err(DatabaseError::from)?;
        tx.execute(
            "INSERT INTO events (id, owner_id, title, start_time, end_time, location, notes,
                                 category, state, is_confirmed, was_shared, is_reminded, reminders)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                event.id,
                event.owner_id,
                event.title,
                event.start_time.to_rfc3339(),
                event.end_time.map(|t| t.to_rfc3339()),
                event.location,
                event.notes,
                event.category.as_str(),
                event.state.as_str(),
                event.is_confirmed,
                event.was_shared,
                event.is_reminded,
                serde_json::to_string(&event.reminders)?,
            ],
        )
        .map_err(DatabaseError::from)?;

        for (seq, entry) in event.timeline.iter().enumerate() {
            tx.execute(
                "INSERT INTO timeline (event_id, seq, timestamp, action, details)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    event.id,
                    seq as i64,
                    entry.timestamp.to_rfc3339(),
                    entry.action,
                    entry.details
                ],
            )
            .map_err(DatabaseError::from)?;
        }

        tx.commit().map_err(DatabaseError::from)?;
        Ok(())
    }

    /// Fetch one event by id, scoped to its owner.
    pub fn find_by_id(&self, id: &str, owner: &str) -> Result<Option<Event>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1 AND owner_id = ?2");
        let event = self
            .conn
            .query_row(&sql, params![id, owner], row_to_event)
            .optional()
            .map_err(DatabaseError::from)?;

        match event {
            Some(mut event) => {
                event.timeline = self.load_timeline(&event.id)?;
                Ok(Some(event))
            }
            None => Ok(None),
        }
    }

    /// Fetch all events belonging to an owner.
    pub fn find_all_by_owner(&self, owner: &str) -> Result<Vec<Event>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE owner_id = ?1");
        let mut stmt = self.conn.prepare(&sql).map_err(DatabaseError::from)?;
        let rows = stmt
            .query_map(params![owner], row_to_event)
            .map_err(DatabaseError::from)?;

        let mut events = Vec::new();
        for row in rows {
            let mut event = row.map_err(DatabaseError::from)?;
            event.timeline = self.load_timeline(&event.id)?;
            events.push(event);
        }
        Ok(events)
    }

    /// Apply a partial update and append one timeline entry, atomically.
    ///
    /// Returns the number of modified events: 0 when the id doesn't
    /// exist for this owner, 1 otherwise.
    pub fn apply(
        &mut self,
        id: &str,
        owner: &str,
        patch: &EventPatch,
        entry: &TimelineEntry,
    ) -> Result<usize> {
        let tx = self.conn.transaction().map_err(DatabaseError::from)?;

        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1 AND owner_id = ?2");
        let existing = tx
            .query_row(&sql, params![id, owner], row_to_event)
            .optional()
            .map_err(DatabaseError::from)?;

        let Some(mut event) = existing else {
            return Ok(0);
        };
        patch.apply_to(&mut event);

        tx.execute(
            "UPDATE events
             SET title = ?3, start_time = ?4, end_time = ?5, location = ?6, notes = ?7,
                 category = ?8, state = ?9, is_confirmed = ?10, was_shared = ?11,
                 is_reminded = ?12, reminders = ?13
             WHERE id = ?1 AND owner_id = ?2",
            params![
                id,
                owner,
                event.title,
                event.start_time.to_rfc3339(),
                event.end_time.map(|t| t.to_rfc3339()),
                event.location,
                event.notes,
                event.category.as_str(),
                event.state.as_str(),
                event.is_confirmed,
                event.was_shared,
                event.is_reminded,
                serde_json::to_string(&event.reminders)?,
            ],
        )
        .map_err(DatabaseError::from)?;

        let next_seq: i64 = tx
            .query_row(
                "SELECT COALESCE(MAX(seq) + 1, 0) FROM timeline WHERE event_id = ?1",
                params![id],
                |row| row.get(0),
            )
            .map_err(DatabaseError::from)?;
        tx.execute(
            "INSERT INTO timeline (event_id, seq, timestamp, action, details)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id,
                next_seq,
                entry.timestamp.to_rfc3339(),
                entry.action,
                entry.details
            ],
        )
        .map_err(DatabaseError::from)?;

        tx.commit().map_err(DatabaseError::from)?;
        Ok(1)
    }

    /// Delete an event and its timeline. Returns the number of deleted
    /// events (0 when absent or owned by someone else).
    pub fn delete(&mut self, id: &str, owner: &str) -> Result<usize> {
        let tx = self.conn.transaction().map_err(DatabaseError::from)?;
        let deleted = tx
            .execute(
                "DELETE FROM events WHERE id = ?1 AND owner_id = ?2",
                params![id, owner],
            )
            .map_err(DatabaseError::from)?;
        if deleted > 0 {
            tx.execute("DELETE FROM timeline WHERE event_id = ?1", params![id])
                .map_err(DatabaseError::from)?;
        }
        tx.commit().map_err(DatabaseError::from)?;
        Ok(deleted)
    }

    fn load_timeline(&self, event_id: &str) -> Result<Vec<TimelineEntry>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT timestamp, action, details FROM timeline
                 WHERE event_id = ?1 ORDER BY seq ASC",
            )
            .map_err(DatabaseError::from)?;
        let rows = stmt
            .query_map(params![event_id], |row| {
                let timestamp_str: String = row.get(0)?;
                Ok(TimelineEntry {
                    timestamp: parse_datetime_fallback(&timestamp_str),
                    action: row.get(1)?,
                    details: row.get(2)?,
                })
            })
            .map_err(DatabaseError::from)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(DatabaseError::from)?);
        }
        Ok(entries)
    }
}
