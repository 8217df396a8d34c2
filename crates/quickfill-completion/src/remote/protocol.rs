//! Wire messages exchanged with the suggestion backend

use crate::language::Language;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Keys checked, in order, for a suggestion array inside an object payload
const BATCH_KEYS: [&str; 3] = ["suggestions", "data", "results"];

/// Messages sent to the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Outbound {
    Search {
        word: String,
        language: Language,
        /// Milliseconds since the Unix epoch
        timestamp: i64,
    },
    Ping,
}

impl Outbound {
    pub fn search(word: &str, language: Language) -> Self {
        Outbound::Search {
            word: word.to_string(),
            language,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// One element of a suggestion batch, as received
///
/// Only a JSON object whose `text` and `t` fields are strings (or missing)
/// becomes [`RemoteEntry::Object`]; arrays never do.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum RemoteEntry {
    Text(String),
    Object {
        text: Option<String>,
        t: Option<String>,
    },
    Other(Value),
}

impl From<Value> for RemoteEntry {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => RemoteEntry::Text(text),
            Value::Object(ref fields) => match (string_field(fields, "text"), string_field(fields, "t")) {
                (Some(text), Some(t)) => RemoteEntry::Object { text, t },
                _ => RemoteEntry::Other(value),
            },
            other => RemoteEntry::Other(other),
        }
    }
}

/// `Some(None)` when the field is missing or null, `None` when it is not a string
fn string_field(fields: &serde_json::Map<String, Value>, key: &str) -> Option<Option<String>> {
    match fields.get(key) {
        None | Some(Value::Null) => Some(None),
        Some(Value::String(s)) => Some(Some(s.clone())),
        Some(_) => None,
    }
}

impl RemoteEntry {
    /// Text shown for this entry; `text` wins over `t`, empty counts as absent
    pub fn display_text(&self) -> Option<&str> {
        let text = match self {
            RemoteEntry::Text(text) => Some(text.as_str()),
            RemoteEntry::Object { text, t } => text
                .as_deref()
                .filter(|s| !s.is_empty())
                .or(t.as_deref()),
            RemoteEntry::Other(_) => None,
        };
        text.filter(|s| !s.is_empty())
    }
}

/// A decoded inbound payload
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Pong,
    Error(Option<String>),
    Batch(Vec<RemoteEntry>),
    /// Valid JSON without a recognizable suggestion array
    Unrecognized,
    /// Not JSON at all
    Malformed(String),
}

/// Decode one text frame
pub fn parse_inbound(payload: &str) -> Inbound {
    let value: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(e) => return Inbound::Malformed(e.to_string()),
    };

    match value {
        Value::Array(items) => Inbound::Batch(entries(items)),
        Value::Object(map) => {
            let tag = map
                .get("kind")
                .or_else(|| map.get("type"))
                .and_then(Value::as_str);

            match tag {
                Some("pong") => return Inbound::Pong,
                Some("error") => {
                    let message = map
                        .get("message")
                        .or_else(|| map.get("error"))
                        .and_then(|m| match m {
                            Value::String(s) => Some(s.clone()),
                            Value::Null => None,
                            other => Some(other.to_string()),
                        });
                    return Inbound::Error(message);
                }
                _ => {}
            }

            let found = BATCH_KEYS
                .iter()
                .filter_map(|key| map.get(*key))
                .find(|v| is_present(v));

            match found {
                Some(Value::Array(items)) => Inbound::Batch(entries(items.clone())),
                _ => Inbound::Unrecognized,
            }
        }
        _ => Inbound::Unrecognized,
    }
}

/// Whether a field counts as set; null, false, zero and "" do not
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn entries(items: Vec<Value>) -> Vec<RemoteEntry> {
    items
        .into_iter()
        .map(RemoteEntry::from)
        .collect()
}
