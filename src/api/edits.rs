//! Edits API

use crate::api::common::{timestamp, Object, Usage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request to edit `input` following `instruction`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditRequest {
    /// e.g. `text-davinci-edit-001`
    pub model: String,

    /// Text to edit; the API starts from an empty string when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,

    /// How to edit the input
    pub instruction: String,

    /// Number of edits to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,

    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

impl EditRequest {
    pub fn new(
        model: impl Into<String>,
        input: impl Into<String>,
        instruction: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            input: Some(input.into()),
            instruction: instruction.into(),
            ..Default::default()
        }
    }
}

/// One edited version of the input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditChoice {
    /// Edited text
    pub text: String,

    /// Choice index
    pub index: u32,
}

/// Edit response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditResponse {
    /// `edit`
    #[serde(default)]
    pub object: Object,

    /// Creation time, unix seconds
    pub created: u64,

    /// Edited versions
    pub choices: Vec<EditChoice>,

    /// Token usage
    pub usage: Usage,
}

impl EditResponse {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        timestamp(self.created)
    }

    /// Text of the first choice
    pub fn text(&self) -> Option<&str> {
        self.choices.first().map(|c| c.text.as_str())
    }
}
