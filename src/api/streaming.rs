//! Streaming Chunks
//!
//! Chunk types sent on streamed chat completions, and an accumulator that folds
//! them back into a whole message.

use crate::api::common::{timestamp, Object};
use crate::api::completion::{ChatMessage, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One streamed chat completion event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    /// Chunk ID, shared by every chunk of one completion
    pub id: String,

    /// `chat.completion.chunk`
    #[serde(default)]
    pub object: Object,

    /// Creation time, unix seconds
    pub created: u64,

    /// Model name
    pub model: String,

    /// Partial choices in this chunk
    pub choices: Vec<ChunkChoice>,
}

impl ChatCompletionChunk {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        timestamp(self.created)
    }
}

/// A choice in a streamed chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkChoice {
    /// Choice index
    pub index: u32,

    /// Partial message
    pub delta: ChatDelta,

    /// Set on the last chunk of this choice
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Partial message content; the role only arrives on the first chunk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatDelta {
    /// Message author
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    /// Content fragment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Folds chat chunks of a single choice into a message
#[derive(Debug, Default)]
pub struct ChatAccumulator {
    /// ID of the first chunk
    pub id: Option<String>,

    /// Model of the first chunk
    pub model: Option<String>,

    /// Creation time of the first chunk
    pub created: Option<u64>,

    /// Role from the first delta that carried one
    pub role: Option<Role>,

    /// Content so far
    pub content: String,

    /// Finish reason, once reported
    pub finish_reason: Option<String>,

    /// Chunks seen so far
    pub chunks: usize,
}

impl ChatAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one chunk. Only choice 0 is accumulated.
    pub fn push(&mut self, chunk: &ChatCompletionChunk) {
        self.chunks += 1;
        if self.id.is_none() {
            self.id = Some(chunk.id.clone());
            self.model = Some(chunk.model.clone());
            self.created = Some(chunk.created);
        }

        for choice in chunk.choices.iter().filter(|c| c.index == 0) {
            if self.role.is_none() {
                self.role = choice.delta.role;
            }
            if let Some(content) = &choice.delta.content {
                self.content.push_str(content);
            }
            if choice.finish_reason.is_some() {
                self.finish_reason.clone_from(&choice.finish_reason);
            }
        }
    }

    /// Whether the model reported a finish reason
    pub fn is_finished(&self) -> bool {
        self.finish_reason.is_some()
    }

    /// The assembled message; the role defaults to assistant.
    pub fn into_message(self) -> ChatMessage {
        ChatMessage {
            role: self.role.unwrap_or(Role::Assistant),
            content: self.content,
            name: None,
        }
    }
}
