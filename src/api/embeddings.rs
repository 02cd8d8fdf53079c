//! Embeddings API

use crate::api::common::{Object, Usage};
use serde::{Deserialize, Serialize};

/// Request embeddings for one or more inputs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// e.g. `text-embedding-ada-002`
    pub model: String,

    /// Texts to embed
    pub input: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl EmbeddingRequest {
    pub fn new<I, S>(model: impl Into<String>, input: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            model: model.into(),
            input: input.into_iter().map(Into::into).collect(),
            user: None,
        }
    }
}

/// Embedding of one input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    /// `embedding`
    #[serde(default)]
    pub object: Object,

    /// Embedding vector
    pub embedding: Vec<f64>,

    /// Position of the matching input
    pub index: u32,
}

/// Embeddings response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// `list`
    #[serde(default)]
    pub object: Object,

    /// One embedding per input, in input order
    pub data: Vec<Embedding>,

    /// Model name
    pub model: String,

    /// Token usage
    pub usage: Usage,
}
