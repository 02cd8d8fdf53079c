//! API Module
//!
//! Request and response types for each endpoint.

pub mod audio;
pub mod common;
pub mod completion;
pub mod edits;
pub mod embeddings;
pub mod engines;
pub mod files;
pub mod fine_tunes;
pub mod images;
pub mod models;
pub mod moderation;
pub mod streaming;

pub use audio::{AudioFormat, AudioTranscriptionRequest};
pub use common::{DeletionStatus, List, Object, Usage};
pub use completion::{
    ChatChoice, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, CompletionChoice,
    CompletionRequest, CompletionResponse, LogprobResult, Role,
};
pub use edits::{EditChoice, EditRequest, EditResponse};
pub use embeddings::{Embedding, EmbeddingRequest, EmbeddingResponse};
pub use engines::Engine;
pub use files::{File, FileRequest, FileUpload};
pub use fine_tunes::{FineTune, FineTuneEvent, FineTuneRequest, Hyperparams};
pub use images::{
    CreateImageRequest, EditImageRequest, ImageData, ImageFormat, ImageOptions, ImageResponse,
    ImageSize, VariationImageRequest,
};
pub use models::{ids as model, Model};
pub use moderation::{
    Categories, CategoryScores, ModerationRequest, ModerationResponse, ModerationResult,
};
pub use streaming::{ChatAccumulator, ChatCompletionChunk, ChatDelta, ChunkChoice};
