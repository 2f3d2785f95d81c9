//! TOML-based application configuration.
//!
//! Stores the owner identity, extraction-service settings, and the
//! slot-finder knobs. Stored at `~/.config/agenda/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::slots::SlotConfig;

/// Extraction-service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// API root of the chat-completions endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key. The key itself never
    /// lands in the config file.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/agenda/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Opaque owner identity all events are scoped to. In the CLI this
    /// stands in for an already-authenticated user.
    #[serde(default = "default_owner")]
    pub owner: String,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub slots: SlotConfig,
    /// How many alternative start times to suggest on conflict.
    #[serde(default = "default_suggestion_count")]
    pub suggestion_count: usize,
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_model() -> String {
    "gpt-4-turbo".to_string()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_owner() -> String {
    "local".to_string()
}
fn default_suggestion_count() -> usize {
    3
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            extraction: ExtractionConfig::default(),
            slots: SlotConfig::default(),
            suggestion_count: default_suggestion_count(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing defaults on first run.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(Self::path()?, content)?;
        Ok(())
    }

    /// Load from disk, silently falling back to defaults.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Resolve the extraction API key from the configured environment
    /// variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.extraction.api_key_env).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = Config::default();
        assert_eq!(cfg.owner, "local");
        assert_eq!(cfg.suggestion_count, 3);
        assert_eq!(cfg.slots.open_hour, 8);
        assert_eq!(cfg.slots.close_hour, 22);
    }

    #[test]
    fn round_trips_through_toml() {
        let cfg = Config {
            owner: "ada".to_string(),
            suggestion_count: 5,
            ..Default::default()
        };
        let text = toml::to_string_pretty(&cfg).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.owner, "ada");
        assert_eq!(back.suggestion_count, 5);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let back: Config = toml::from_str("owner = \"ada\"").unwrap();
        assert_eq!(back.owner, "ada");
        assert_eq!(back.extraction.model, "gpt-4-turbo");
        assert_eq!(back.slots.granularity_min, 15);
    }
}
