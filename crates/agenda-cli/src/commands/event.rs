//! Event management commands for CLI.

use clap::Subcommand;

use agenda_core::storage::{Config, EventDb};
use agenda_core::{
    Event, EventState, LlmExtractor, Planner, Reminder, StatusUpdate, TimelineEntry,
};

#[derive(Subcommand)]
pub enum EventAction {
    /// Create an event from free text
    Create {
        /// Free-text description, e.g. "dentist tuesday at 2pm"
        text: String,
        /// Owner identity (default: config `owner`)
        #[arg(long)]
        owner: Option<String>,
    },
    /// List events
    List {
        #[arg(long)]
        owner: Option<String>,
    },
    /// Get event details
    Get {
        /// Event ID
        id: String,
        #[arg(long)]
        owner: Option<String>,
    },
    /// Confirm an event
    Confirm {
        id: String,
        #[arg(long)]
        owner: Option<String>,
    },
    /// Reschedule an event from new free text
    Reschedule {
        id: String,
        /// New free-text description
        text: String,
        #[arg(long)]
        owner: Option<String>,
    },
    /// Add a reminder to an event
    Remind {
        id: String,
        /// Minutes before the event start
        #[arg(long, default_value = "30")]
        minutes_before: u32,
        /// Optional reminder message
        #[arg(long)]
        message: Option<String>,
        #[arg(long)]
        owner: Option<String>,
    },
    /// Share an event with recipients
    Share {
        id: String,
        /// Recipients (repeatable)
        #[arg(required = true)]
        recipients: Vec<String>,
        #[arg(long)]
        owner: Option<String>,
    },
    /// Show an event's audit timeline
    Timeline {
        id: String,
        #[arg(long)]
        owner: Option<String>,
    },
    /// Manually update event status
    Status {
        id: String,
        /// New state (DRAFT, CONFIRMED, SHARED, REMINDER_SENT, COMPLETED, CANCELLED)
        #[arg(long)]
        state: Option<String>,
        #[arg(long)]
        confirmed: Option<bool>,
        #[arg(long)]
        reminded: Option<bool>,
        #[arg(long)]
        shared: Option<bool>,
        #[arg(long)]
        owner: Option<String>,
    },
    /// Delete an event
    Delete {
        id: String,
        #[arg(long)]
        owner: Option<String>,
    },
}

pub fn run(action: EventAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let extractor = LlmExtractor::new(
        &config.extraction.endpoint,
        &config.api_key().unwrap_or_default(),
        &config.extraction.model,
    )?;
    let mut planner = Planner::new(EventDb::open()?, Box::new(extractor))
        .with_slot_config(config.slots.clone())
        .with_suggestion_count(config.suggestion_count);
    let default_owner = config.owner.clone();
    let owner_of = |owner: &Option<String>| owner.clone().unwrap_or_else(|| default_owner.clone());

    match action {
        EventAction::Create { text, owner } => {
            let outcome = planner.create_from_text(&owner_of(&owner), &text)?;
            if outcome.extraction_failed {
                println!("warning: could not parse the text; created a placeholder event");
            }
            print_event(&outcome.event);
            if let Some(details) = outcome.conflict_details {
                println!("conflict: {details}");
                if outcome.suggested_times.is_empty() {
                    println!("no free slots found within the search horizon");
                } else {
                    println!("suggested alternatives:");
                    for slot in outcome.suggested_times {
                        println!("  {}", slot.format("%Y-%m-%d %H:%M"));
                    }
                }
            }
        }
        EventAction::List { owner } => {
            let events = planner.list(&owner_of(&owner))?;
            if events.is_empty() {
                println!("no events");
            }
            for event in events {
                println!(
                    "{}  {}  {}  [{}]",
                    event.id,
                    event.start_time.format("%Y-%m-%d %H:%M"),
                    event.title,
                    event.state.as_str()
                );
            }
        }
        EventAction::Get { id, owner } => match planner.get(&id, &owner_of(&owner))? {
            Some(event) => print_event(&event),
            None => println!("not found"),
        },
        EventAction::Confirm { id, owner } => match planner.confirm(&id, &owner_of(&owner))? {
            Some(event) => print_event(&event),
            None => println!("not found"),
        },
        EventAction::Reschedule { id, text, owner } => {
            match planner.reschedule(&id, &owner_of(&owner), &text)? {
                Some(event) => print_event(&event),
                None => println!("not found"),
            }
        }
        EventAction::Remind {
            id,
            minutes_before,
            message,
            owner,
        } => {
            let reminder = Reminder {
                minutes_before,
                message,
            };
            match planner.add_reminder(&id, &owner_of(&owner), reminder)? {
                Some(event) => print_event(&event),
                None => println!("not found"),
            }
        }
        EventAction::Share {
            id,
            recipients,
            owner,
        } => match planner.share(&id, &owner_of(&owner), &recipients)? {
            Some(payload) => {
                println!("{}", payload.summary);
                println!("  starts: {}", payload.start.format("%Y-%m-%d %H:%M"));
                if let Some(location) = payload.location {
                    println!("  location: {location}");
                }
            }
            None => println!("not found"),
        },
        EventAction::Timeline { id, owner } => {
            match planner.timeline(&id, &owner_of(&owner))? {
                Some(timeline) => print_timeline(&timeline),
                None => println!("not found"),
            }
        }
        EventAction::Status {
            id,
            state,
            confirmed,
            reminded,
            shared,
            owner,
        } => {
            let update = StatusUpdate {
                state: state.as_deref().map(EventState::parse),
                is_confirmed: confirmed,
                is_reminded: reminded,
                was_shared: shared,
            };
            match planner.update_status(&id, &owner_of(&owner), &update)? {
                Some(event) => print_event(&event),
                None => println!("not found"),
            }
        }
        EventAction::Delete { id, owner } => {
            if planner.delete(&id, &owner_of(&owner))? {
                println!("deleted {id}");
            } else {
                println!("not found");
            }
        }
    }

    Ok(())
}

fn print_event(event: &Event) {
    println!("{}  {}", event.id, event.title);
    println!("  starts:   {}", event.start_time.format("%Y-%m-%d %H:%M"));
    if let Some(end) = event.end_time {
        println!("  ends:     {}", end.format("%Y-%m-%d %H:%M"));
    }
    if let Some(ref location) = event.location {
        println!("  location: {location}");
    }
    println!("  category: {}", event.category.as_str());
    println!("  state:    {}", event.state.as_str());
    for reminder in &event.reminders {
        match reminder.message {
            Some(ref message) => {
                println!("  reminder: {} min before -- {message}", reminder.minutes_before)
            }
            None => println!("  reminder: {} min before", reminder.minutes_before),
        }
    }
}

fn print_timeline(timeline: &[TimelineEntry]) {
    for entry in timeline {
        match entry.details {
            Some(ref details) => println!(
                "{}  {}  ({details})",
                entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                entry.action
            ),
            None => println!(
                "{}  {}",
                entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                entry.action
            ),
        }
    }
}
