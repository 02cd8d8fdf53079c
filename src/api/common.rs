//! Shared API Types
//!
//! Types returned by more than one endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token usage reported for a request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,

    /// Tokens in the completion
    #[serde(default)]
    pub completion_tokens: u32,

    /// Sum of prompt and completion tokens
    pub total_tokens: u32,
}

/// Object kinds returned in the `object` field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Object {
    #[serde(rename = "model")]
    Model,
    #[serde(rename = "engine")]
    Engine,
    #[serde(rename = "list")]
    List,
    #[serde(rename = "text_completion")]
    TextCompletion,
    #[serde(rename = "chat.completion")]
    ChatCompletion,
    #[serde(rename = "chat.completion.chunk")]
    ChatCompletionChunk,
    #[serde(rename = "edit")]
    Edit,
    #[serde(rename = "embedding")]
    Embedding,
    #[serde(rename = "file")]
    File,
    #[serde(rename = "fine-tune")]
    FineTune,
    #[serde(rename = "fine-tune-event")]
    FineTuneEvent,

    /// Anything this crate does not know about yet
    #[default]
    #[serde(other)]
    Unknown,
}

/// Generic list wrapper returned by listing endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct List<T> {
    /// Always `list`
    #[serde(default)]
    pub object: Object,

    /// Listed objects
    pub data: Vec<T>,
}

impl<T> List<T> {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T> IntoIterator for List<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

/// Response of the delete endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletionStatus {
    /// ID of the deleted object
    pub id: String,

    /// Kind of the deleted object
    #[serde(default)]
    pub object: Object,

    /// Whether the object is gone
    pub deleted: bool,
}

/// Convert a unix timestamp in seconds, as the API sends them.
pub(crate) fn timestamp(secs: u64) -> Option<DateTime<Utc>> {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}
