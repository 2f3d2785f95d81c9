//! # Agenda Core Library
//!
//! Core business logic for Agenda, a calendar assistant that turns
//! free-text input into scheduled events. The CLI binary is a thin
//! layer over this library; any other transport would sit on the same
//! surface.
//!
//! ## Architecture
//!
//! - **Conflict detection**: pure interval-overlap checks against the
//!   owner's existing schedule
//! - **Slot finder**: bounded greedy scan proposing alternative start
//!   times inside business hours
//! - **Event lifecycle**: draft/confirmed/shared/completed state
//!   machine with an append-only audit timeline per event
//! - **Planner**: orchestrates extraction, categorization, persistence,
//!   conflict handling, and lifecycle transitions
//! - **Storage**: SQLite-based event store, TOML-based configuration
//!
//! ## Key Components
//!
//! - [`Planner`]: the operation catalogue (create, confirm, reschedule,
//!   share, remind, status, delete)
//! - [`SlotFinder`]: free-slot search
//! - [`EventDb`]: event and timeline persistence
//! - [`Extractor`]: trait for the free-text extraction collaborator

pub mod classify;
pub mod conflict;
pub mod error;
pub mod event;
pub mod extract;
pub mod planner;
pub mod slots;
pub mod storage;

pub use conflict::{find_conflict, overlaps};
pub use error::{
    ConfigError, CoreError, DatabaseError, ExtractionError, SlotError, ValidationError,
};
pub use event::{
    Event, EventCategory, EventState, Reminder, SharePayload, StatusUpdate, TimelineEntry,
};
pub use extract::{Extractor, LlmExtractor, ParsedEvent};
pub use planner::{CreateOutcome, Planner};
pub use slots::{SlotConfig, SlotFinder};
pub use storage::{Config, EventDb, EventPatch};
