//! Audio API

use crate::api::files::FileUpload;
use crate::client::Multipart;
use serde::{Deserialize, Serialize};

/// Transcript output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFormat {
    #[default]
    Json,
    Text,
    Srt,
    VerboseJson,
    Vtt,
}

impl AudioFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
            Self::Srt => "srt",
            Self::VerboseJson => "verbose_json",
            Self::Vtt => "vtt",
        }
    }
}

/// Transcribe an audio file. The response body is returned as is, since its
/// shape depends on `response_format`.
#[derive(Debug, Clone)]
pub struct AudioTranscriptionRequest {
    /// mp3, mp4, mpeg, mpga, m4a, wav or webm
    pub file: FileUpload,

    /// e.g. `whisper-1`
    pub model: String,

    /// Text to guide the style or continue a previous segment
    pub prompt: Option<String>,

    /// Transcript format; JSON when unset
    pub response_format: Option<AudioFormat>,

    /// Sampling temperature
    pub temperature: Option<f32>,

    /// ISO-639-1 language of the input audio
    pub language: Option<String>,
}

impl AudioTranscriptionRequest {
    pub fn new(file: FileUpload, model: impl Into<String>) -> Self {
        Self {
            file,
            model: model.into(),
            prompt: None,
            response_format: None,
            temperature: None,
            language: None,
        }
    }

    pub fn with_format(mut self, format: AudioFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub(crate) fn to_multipart(&self) -> Multipart {
        let mut form = Multipart::new()
            .file("file", self.file.clone())
            .text("model", self.model.clone());

        if let Some(prompt) = &self.prompt {
            form = form.text("prompt", prompt.clone());
        }
        if let Some(format) = self.response_format {
            form = form.text("response_format", format.as_str());
        }
        if let Some(temperature) = self.temperature {
            form = form.text("temperature", temperature.to_string());
        }
        if let Some(language) = &self.language {
            form = form.text("language", language.clone());
        }
        form
    }
}
