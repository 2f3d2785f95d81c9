mod config;
pub mod event_db;

pub use config::{Config, ExtractionConfig};
pub use event_db::{EventDb, EventPatch};

use std::path::PathBuf;

/// Returns `~/.config/agenda[-dev]/` based on AGENDA_ENV.
///
/// Set AGENDA_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("AGENDA_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("agenda-dev")
    } else {
        base_dir.join("agenda")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
