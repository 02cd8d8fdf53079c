//! Models API
//!
//! Model metadata and the identifiers of well-known models.

use crate::api::common::{timestamp, Object};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Model metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    /// Model ID
    pub id: String,

    /// `model`
    #[serde(default)]
    pub object: Object,

    /// Creation time, unix seconds
    #[serde(default)]
    pub created: Option<u64>,

    /// Owning organization
    pub owned_by: String,

    /// Permission entries, kept as raw JSON
    #[serde(default)]
    pub permission: Vec<serde_json::Value>,

    /// Root model this one derives from
    #[serde(default)]
    pub root: Option<String>,

    #[serde(default)]
    pub parent: Option<String>,
}

impl Model {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created.and_then(timestamp)
    }
}

/// Identifiers accepted in the `model` field of requests
pub mod ids {
    // Chat completions
    pub const GPT_3_5_TURBO: &str = "gpt-3.5-turbo";
    pub const GPT_3_5_TURBO_0301: &str = "gpt-3.5-turbo-0301";
    pub const GPT_3_5_TURBO_0613: &str = "gpt-3.5-turbo-0613";
    pub const GPT_3_5_TURBO_16K: &str = "gpt-3.5-turbo-16k";
    pub const GPT_4: &str = "gpt-4";
    pub const GPT_4_0314: &str = "gpt-4-0314";
    pub const GPT_4_0613: &str = "gpt-4-0613";
    pub const GPT_4_32K: &str = "gpt-4-32k";
    pub const GPT_4_32K_0314: &str = "gpt-4-32k-0314";

    // Completions
    pub const TEXT_DAVINCI_003: &str = "text-davinci-003";
    pub const TEXT_DAVINCI_002: &str = "text-davinci-002";
    pub const TEXT_CURIE_001: &str = "text-curie-001";
    pub const TEXT_BABBAGE_001: &str = "text-babbage-001";
    pub const TEXT_ADA_001: &str = "text-ada-001";
    pub const CODE_DAVINCI_002: &str = "code-davinci-002";
    pub const CODE_CUSHMAN_001: &str = "code-cushman-001";

    // Edits
    pub const TEXT_DAVINCI_EDIT_001: &str = "text-davinci-edit-001";
    pub const CODE_DAVINCI_EDIT_001: &str = "code-davinci-edit-001";

    // Embeddings
    pub const TEXT_EMBEDDING_ADA_002: &str = "text-embedding-ada-002";

    // Fine-tune bases
    pub const DAVINCI: &str = "davinci";
    pub const CURIE: &str = "curie";
    pub const BABBAGE: &str = "babbage";
    pub const ADA: &str = "ada";

    // Moderations
    pub const TEXT_MODERATION_STABLE: &str = "text-moderation-stable";
    pub const TEXT_MODERATION_LATEST: &str = "text-moderation-latest";

    // Audio
    pub const WHISPER_1: &str = "whisper-1";
}
