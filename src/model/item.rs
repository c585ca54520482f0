use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An article as returned by the upstream source
///
/// Only `publishedAt` is interpreted; every other field is carried through
/// verbatim so sinks receive exactly what the upstream sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "publishedAt", with = "super::timestamp")]
    pub published_at: DateTime<Utc>,

    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Item {
    /// Creates an item from a publish time and payload fields
    pub fn new(published_at: DateTime<Utc>, payload: Map<String, Value>) -> Self {
        Self {
            published_at,
            payload,
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.payload.get("title").and_then(Value::as_str)
    }

    pub fn url(&self) -> Option<&str> {
        self.payload.get("url").and_then(Value::as_str)
    }

    /// Name of the publishing source (`source.name`)
    pub fn source_name(&self) -> Option<&str> {
        self.payload
            .get("source")
            .and_then(|source| source.get("name"))
            .and_then(Value::as_str)
    }
}
