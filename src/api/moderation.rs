//! Moderation API

use serde::{Deserialize, Serialize};

/// Classify text against the usage policies
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModerationRequest {
    /// Text to classify
    pub input: String,

    /// `text-moderation-stable` or `text-moderation-latest`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ModerationRequest {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            model: None,
        }
    }
}

/// Category flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Categories {
    pub hate: bool,
    #[serde(rename = "hate/threatening")]
    pub hate_threatening: bool,
    #[serde(rename = "self-harm")]
    pub self_harm: bool,
    pub sexual: bool,
    #[serde(rename = "sexual/minors")]
    pub sexual_minors: bool,
    pub violence: bool,
    #[serde(rename = "violence/graphic")]
    pub violence_graphic: bool,
}

/// Category scores in `[0, 1]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub hate: f32,
    #[serde(rename = "hate/threatening")]
    pub hate_threatening: f32,
    #[serde(rename = "self-harm")]
    pub self_harm: f32,
    pub sexual: f32,
    #[serde(rename = "sexual/minors")]
    pub sexual_minors: f32,
    pub violence: f32,
    #[serde(rename = "violence/graphic")]
    pub violence_graphic: f32,
}

/// Classification of one input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationResult {
    /// Which categories were violated
    pub categories: Categories,

    /// Model confidence per category
    pub category_scores: CategoryScores,

    /// Whether any category was violated
    pub flagged: bool,
}

/// Moderation response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationResponse {
    /// Moderation ID
    pub id: String,

    /// Model name
    pub model: String,

    /// One result per input
    pub results: Vec<ModerationResult>,
}

impl ModerationResponse {
    /// Whether any result was flagged
    pub fn flagged(&self) -> bool {
        self.results.iter().any(|r| r.flagged)
    }
}
