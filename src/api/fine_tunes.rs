//! Fine-tunes API

use crate::api::common::{timestamp, Object};
use crate::api::files::File;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Start a fine-tuning job on an uploaded training file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FineTuneRequest {
    /// ID of an uploaded file with purpose `fine-tune`
    pub training_file: String,

    /// ID of an uploaded file used for validation metrics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_file: Option<String>,

    /// Base model: ada, babbage, curie or davinci
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Passes over the training data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_epochs: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning_rate_multiplier: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_loss_weight: Option<f64>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub compute_classification_metrics: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification_n_classes: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification_positive_class: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub classification_betas: Vec<f32>,

    /// Up to 40 characters added to the fine-tuned model name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

impl FineTuneRequest {
    pub fn new(training_file: impl Into<String>) -> Self {
        Self {
            training_file: training_file.into(),
            ..Default::default()
        }
    }
}

/// A fine-tune status event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FineTuneEvent {
    /// `fine-tune-event`
    #[serde(default)]
    pub object: Object,

    /// Event time, unix seconds
    pub created_at: u64,

    /// Log level, e.g. `info`
    pub level: String,

    /// Event description
    pub message: String,
}

impl FineTuneEvent {
    pub fn created(&self) -> Option<DateTime<Utc>> {
        timestamp(self.created_at)
    }
}

/// Hyperparameters a job ran with
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hyperparams {
    #[serde(default)]
    pub batch_size: Option<u32>,

    #[serde(default)]
    pub learning_rate_multiplier: Option<f64>,

    #[serde(default)]
    pub n_epochs: Option<u32>,

    #[serde(default)]
    pub prompt_loss_weight: Option<f64>,
}

/// A fine-tuning job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FineTune {
    /// Job ID
    pub id: String,

    /// `fine-tune`
    #[serde(default)]
    pub object: Object,

    /// Base model
    pub model: String,

    /// Creation time, unix seconds
    pub created_at: u64,

    /// Only present on create and retrieve
    #[serde(default)]
    pub events: Vec<FineTuneEvent>,

    /// Set once the job has succeeded
    pub fine_tuned_model: Option<String>,

    #[serde(default)]
    pub hyperparams: Hyperparams,

    #[serde(default)]
    pub organization_id: Option<String>,

    /// Result files, once the job has finished
    #[serde(default)]
    pub result_files: Vec<File>,

    /// pending, running, succeeded, failed or cancelled
    pub status: String,

    #[serde(default)]
    pub validation_files: Vec<File>,

    #[serde(default)]
    pub training_files: Vec<File>,

    /// Last status change, unix seconds
    pub updated_at: u64,
}

impl FineTune {
    pub fn created(&self) -> Option<DateTime<Utc>> {
        timestamp(self.created_at)
    }

    pub fn updated(&self) -> Option<DateTime<Utc>> {
        timestamp(self.updated_at)
    }

    /// Whether the job stopped, successfully or not
    pub fn is_finished(&self) -> bool {
        matches!(self.status.as_str(), "succeeded" | "failed" | "cancelled")
    }
}
