//! Free-text event extraction.
//!
//! The extraction collaborator turns raw text like "soccer practice
//! Thursday at 3:30pm at Sunset Field" into structured event fields.
//! The core only depends on the [`Extractor`] trait; [`LlmExtractor`]
//! is the production implementation backed by an OpenAI-style
//! chat-completions endpoint with a forced tool call.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ExtractionError;

/// Structured fields extracted from free text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedEvent {
    pub title: String,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// True when the text reads like an update to an existing event
    /// ("reschedule", "move", "postpone").
    #[serde(default)]
    pub is_reschedule: bool,
}

impl ParsedEvent {
    /// Placeholder produced when extraction fails. The event is still
    /// created so the user's input is never dropped; the original text
    /// is preserved in the notes.
    pub fn fallback(text: &str, now: DateTime<Utc>) -> Self {
        Self {
            title: "Could not parse event".to_string(),
            start_time: now + Duration::hours(1),
            end_time: Some(now + Duration::hours(2)),
            location: None,
            notes: Some(format!("Original text: '{text}'. Error during parsing.")),
            is_reschedule: false,
        }
    }
}

/// Extraction collaborator interface.
///
/// Implementations are stateless between calls. `now` anchors relative
/// phrases ("tomorrow at 3") and is injected for testability.
pub trait Extractor: Send + Sync {
    fn extract(&self, text: &str, now: DateTime<Utc>) -> Result<ParsedEvent, ExtractionError>;
}

/// Extractor backed by an OpenAI-style chat-completions API.
///
/// Owns a current-thread tokio runtime so callers get a blocking
/// interface; the core never suspends mid-operation.
pub struct LlmExtractor {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl LlmExtractor {
    /// Create a client. `base_url` is the API root without a trailing
    /// slash (e.g. `https://api.openai.com/v1`).
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Result<Self, std::io::Error> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
            runtime,
        })
    }

    fn request_body(&self, text: &str, now: DateTime<Utc>) -> serde_json::Value {
        let prompt = format!(
            "The current date is {}. Analyze the following text: \"{}\". \
             Extract the event details. Pay close attention to keywords like \
             'reschedule', 'move', 'postpone', 'change' to determine if this is \
             an update to an existing event. If an end time is not specified, \
             predict a reasonable duration from the event's title and context \
             and calculate the end_time. All times are RFC 3339 UTC.",
            now.format("%A, %Y-%m-%d"),
            text
        );

        json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "tools": [{
                "type": "function",
                "function": {
                    "name": "create_event",
                    "description": "Extracts event details from a user's text, including intent to reschedule.",
                    "parameters": {
                        "type": "object",
                        "properties": {
                            "title": {"type": "string"},
                            "start_time": {"type": "string", "format": "date-time"},
                            "end_time": {"type": "string", "format": "date-time"},
                            "location": {"type": "string"},
                            "notes": {"type": "string"},
                            "is_reschedule": {"type": "boolean"}
                        },
                        "required": ["title", "start_time"]
                    }
                }
            }],
            "tool_choice": {"type": "function", "function": {"name": "create_event"}}
        })
    }
}

impl Extractor for LlmExtractor {
    fn extract(&self, text: &str, now: DateTime<Utc>) -> Result<ParsedEvent, ExtractionError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.request_body(text, now);

        let response: serde_json::Value = self
            .runtime
            .block_on(async {
                self.client
                    .post(&url)
                    .bearer_auth(&self.api_key)
                    .json(&body)
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await
            })
            .map_err(|e: reqwest::Error| ExtractionError::RequestFailed {
                text: text.to_string(),
                message: e.to_string(),
            })?;

        let arguments = response["choices"][0]["message"]["tool_calls"][0]["function"]
            ["arguments"]
            .as_str()
            .ok_or_else(|| ExtractionError::MalformedResponse {
                text: text.to_string(),
                message: "response carried no tool call".to_string(),
            })?;

        serde_json::from_str(arguments).map_err(|e| ExtractionError::MalformedResponse {
            text: text.to_string(),
            message: e.to_string(),
        })
    }
}
