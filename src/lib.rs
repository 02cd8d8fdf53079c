//! OAI - Typed async client for the OpenAI HTTP API
//!
//! Completions, chat, edits, embeddings, images, files, fine-tunes, models,
//! moderations and audio transcription. Streamed completions are read by a
//! background pump that cuts the response body into server-sent event frames and
//! hands them over one at a time.
//!
//! ```no_run
//! use futures::StreamExt;
//! use oai::api::{model, CompletionRequest};
//! use oai::{CancellationToken, Client};
//!
//! # async fn run() -> oai::Result<()> {
//! let client = Client::from_env()?;
//! let request = CompletionRequest::new(model::TEXT_DAVINCI_003, "Say this is a test");
//!
//! let mut events = client
//!     .create_completion_stream(&request, CancellationToken::new())
//!     .await?;
//! while let Some(event) = events.next().await {
//!     print!("{}", event?.text().unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod stream;

use api::{
    AudioTranscriptionRequest, ChatCompletionChunk, ChatCompletionRequest,
    ChatCompletionResponse, CompletionRequest, CompletionResponse, CreateImageRequest,
    DeletionStatus, EditImageRequest, EditRequest, EditResponse, EmbeddingRequest,
    EmbeddingResponse, Engine, File, FileRequest, FineTune, FineTuneEvent, FineTuneRequest,
    ImageResponse, List, Model, ModerationRequest, ModerationResponse, VariationImageRequest,
};
use bytes::Bytes;
use client::{HttpClient, Multipart, Payload};
use futures::TryStreamExt;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tokio_util::io::StreamReader;

pub use config::{ClientConfig, ConfigLoader, RetryConfig};
pub use error::{ApiError, OaiError, Result};
pub use stream::{EventStream, JsonEvents};
pub use tokio_util::sync::CancellationToken;

mod routes {
    pub const COMPLETIONS: &str = "completions";
    pub const CHAT_COMPLETIONS: &str = "chat/completions";
    pub const EDITS: &str = "edits";
    pub const EMBEDDINGS: &str = "embeddings";
    pub const ENGINES: &str = "engines";
    pub const IMAGE_GENERATIONS: &str = "images/generations";
    pub const IMAGE_EDITS: &str = "images/edits";
    pub const IMAGE_VARIATIONS: &str = "images/variations";
    pub const FILES: &str = "files";
    pub const FINE_TUNES: &str = "fine-tunes";
    pub const MODELS: &str = "models";
    pub const MODERATIONS: &str = "moderations";
    pub const AUDIO_TRANSCRIPTIONS: &str = "audio/transcriptions";
}

/// The API client
pub struct Client {
    http: HttpClient,
    stream_buffer_size: usize,
}

impl Client {
    /// Create a client from validated settings.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            http: HttpClient::new(&config)?,
            stream_buffer_size: config.stream_buffer_size,
        })
    }

    /// Create a client on top of a caller-built `reqwest::Client`.
    pub fn with_http_client(client: reqwest::Client, config: ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            http: HttpClient::with_client(client, &config)?,
            stream_buffer_size: config.stream_buffer_size,
        })
    }

    /// Load `.env`, config files and environment overrides.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::new(ConfigLoader::new()?.into_config()?)
    }

    /// Like [`Client::from_env`], with settings from one specific file.
    pub fn from_config_path(path: impl AsRef<Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::new(ConfigLoader::from_path(path)?.into_config()?)
    }

    /// The underlying HTTP client
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    async fn get<R: DeserializeOwned>(&self, route: &str) -> Result<R> {
        self.http.execute(Method::GET, route, Payload::Empty).await
    }

    async fn post<B, R>(&self, route: &str, body: &B) -> Result<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        self.http
            .execute(Method::POST, route, Payload::json(body)?)
            .await
    }

    async fn post_form<R: DeserializeOwned>(&self, route: &str, form: Multipart) -> Result<R> {
        self.http
            .execute(Method::POST, route, Payload::Multipart(form))
            .await
    }

    async fn delete<R: DeserializeOwned>(&self, route: &str) -> Result<R> {
        self.http.execute(Method::DELETE, route, Payload::Empty).await
    }

    /// Open an event stream and start pumping it.
    async fn post_stream<B, T>(
        &self,
        route: &str,
        body: &B,
        cancel: CancellationToken,
    ) -> Result<JsonEvents<T>>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let mut payload = serde_json::to_value(body)?;
        if let Some(fields) = payload.as_object_mut() {
            fields.insert("stream".to_string(), serde_json::Value::Bool(true));
        }

        let response = self.http.open_stream(route, Payload::Json(payload)).await?;
        let chunks = Box::pin(response.bytes_stream().map_err(std::io::Error::other));
        let reader = StreamReader::new(chunks);

        Ok(stream::pump::spawn(reader, cancel, self.stream_buffer_size).json())
    }

    /// Create a text completion
    pub async fn create_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse> {
        self.post(routes::COMPLETIONS, request).await
    }

    /// Stream a text completion. Each event has the shape of a full response
    /// without usage.
    pub async fn create_completion_stream(
        &self,
        request: &CompletionRequest,
        cancel: CancellationToken,
    ) -> Result<JsonEvents<CompletionResponse>> {
        self.post_stream(routes::COMPLETIONS, request, cancel).await
    }

    /// Create a chat completion
    pub async fn create_chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        self.post(routes::CHAT_COMPLETIONS, request).await
    }

    /// Stream a chat completion as deltas
    pub async fn create_chat_completion_stream(
        &self,
        request: &ChatCompletionRequest,
        cancel: CancellationToken,
    ) -> Result<JsonEvents<ChatCompletionChunk>> {
        self.post_stream(routes::CHAT_COMPLETIONS, request, cancel)
            .await
    }

    pub async fn create_edit(&self, request: &EditRequest) -> Result<EditResponse> {
        self.post(routes::EDITS, request).await
    }

    pub async fn create_embeddings(&self, request: &EmbeddingRequest) -> Result<EmbeddingResponse> {
        self.post(routes::EMBEDDINGS, request).await
    }

    /// Generate images from a prompt
    pub async fn create_image(&self, request: &CreateImageRequest) -> Result<ImageResponse> {
        self.post(routes::IMAGE_GENERATIONS, request).await
    }

    /// Edit an image, optionally through a mask
    pub async fn edit_image(&self, request: &EditImageRequest) -> Result<ImageResponse> {
        self.post_form(routes::IMAGE_EDITS, request.to_multipart())
            .await
    }

    pub async fn image_variation(&self, request: &VariationImageRequest) -> Result<ImageResponse> {
        self.post_form(routes::IMAGE_VARIATIONS, request.to_multipart())
            .await
    }

    pub async fn list_files(&self) -> Result<List<File>> {
        self.get(routes::FILES).await
    }

    pub async fn retrieve_file(&self, id: &str) -> Result<File> {
        self.get(&format!("{}/{}", routes::FILES, id)).await
    }

    /// Upload a file, e.g. fine-tuning data
    pub async fn upload_file(&self, request: &FileRequest) -> Result<File> {
        let form = Multipart::new()
            .text("purpose", request.purpose.clone())
            .file("file", request.file.clone());
        self.post_form(routes::FILES, form).await
    }

    pub async fn delete_file(&self, id: &str) -> Result<DeletionStatus> {
        self.delete(&format!("{}/{}", routes::FILES, id)).await
    }

    pub async fn create_fine_tune(&self, request: &FineTuneRequest) -> Result<FineTune> {
        self.post(routes::FINE_TUNES, request).await
    }

    pub async fn list_fine_tunes(&self) -> Result<List<FineTune>> {
        self.get(routes::FINE_TUNES).await
    }

    pub async fn retrieve_fine_tune(&self, id: &str) -> Result<FineTune> {
        self.get(&format!("{}/{}", routes::FINE_TUNES, id)).await
    }

    /// Cancel a running job; returns the job as it stands after cancelling.
    pub async fn cancel_fine_tune(&self, id: &str) -> Result<FineTune> {
        self.http
            .execute(
                Method::POST,
                &format!("{}/{}/cancel", routes::FINE_TUNES, id),
                Payload::Empty,
            )
            .await
    }

    pub async fn list_fine_tune_events(&self, id: &str) -> Result<List<FineTuneEvent>> {
        self.get(&format!("{}/{}/events", routes::FINE_TUNES, id))
            .await
    }

    /// Delete a fine-tuned model. Requires the owner role in the organization.
    pub async fn delete_fine_tune(&self, id: &str) -> Result<DeletionStatus> {
        self.delete(&format!("{}/{}", routes::FINE_TUNES, id)).await
    }

    /// Delete a fine-tuned model you own
    pub async fn delete_model(&self, id: &str) -> Result<DeletionStatus> {
        self.delete(&format!("{}/{}", routes::MODELS, id)).await
    }

    pub async fn list_models(&self) -> Result<List<Model>> {
        self.get(routes::MODELS).await
    }

    pub async fn retrieve_model(&self, id: &str) -> Result<Model> {
        self.get(&format!("{}/{}", routes::MODELS, id)).await
    }

    /// List engines with their owner and availability. Prefer [`Client::list_models`].
    pub async fn list_engines(&self) -> Result<List<Engine>> {
        self.get(routes::ENGINES).await
    }

    pub async fn retrieve_engine(&self, id: &str) -> Result<Engine> {
        self.get(&format!("{}/{}", routes::ENGINES, id)).await
    }

    /// Classify text against the usage policies
    pub async fn create_moderation(
        &self,
        request: &ModerationRequest,
    ) -> Result<ModerationResponse> {
        self.post(routes::MODERATIONS, request).await
    }

    /// Transcribe audio. The body is returned raw, in the requested format.
    pub async fn transcribe_audio(&self, request: &AudioTranscriptionRequest) -> Result<Bytes> {
        self.http
            .execute_raw(
                Method::POST,
                routes::AUDIO_TRANSCRIPTIONS,
                Payload::Multipart(request.to_multipart()),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::{model, ChatAccumulator, ChatMessage, FileUpload, ImageSize};
    use futures::StreamExt;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn test_client(url: &str) -> Client {
        let config = ClientConfig::new("sk-test")
            .with_base_url(url)
            .with_retry(RetryConfig::disabled());
        Client::new(config).unwrap()
    }

    const COMPLETION_STREAM: &str = concat!(
        "data: {\"id\":\"cmpl-1\",\"object\":\"text_completion\",\"created\":1,\"model\":\"text-davinci-003\",\"choices\":[{\"text\":\"Hello\",\"index\":0,\"finish_reason\":null}]}\n\n",
        "data: {\"id\":\"cmpl-1\",\"object\":\"text_completion\",\"created\":1,\"model\":\"text-davinci-003\",\"choices\":[{\"text\":\" world\",\"index\":0,\"finish_reason\":\"stop\"}]}\n\n",
        "data: [DONE]\n\n",
    );

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = ClientConfig {
            api_key_env: "OAI_LIB_TEST_UNSET_KEY".to_string(),
            ..Default::default()
        };
        assert!(matches!(Client::new(config), Err(OaiError::Config(_))));
    }

    #[tokio::test]
    async fn test_create_completion() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/completions")
            .match_body(Matcher::PartialJson(json!({"model": "text-davinci-003", "max_tokens": 5})))
            .with_status(200)
            .with_body(
                r#"{"id":"cmpl-1","object":"text_completion","created":1,"model":"text-davinci-003",
                    "choices":[{"text":"This is a test","index":0,"finish_reason":"length"}],
                    "usage":{"prompt_tokens":5,"completion_tokens":5,"total_tokens":10}}"#,
            )
            .create_async()
            .await;

        let request =
            CompletionRequest::new(model::TEXT_DAVINCI_003, "Say this is a test").with_max_tokens(5);
        let response = test_client(&server.url())
            .create_completion(&request)
            .await
            .unwrap();

        assert_eq!(response.text(), Some("This is a test"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_completion_stream() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/completions")
            .match_header("accept", "text/event-stream; charset=utf-8")
            .match_body(Matcher::PartialJson(json!({"stream": true})))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(COMPLETION_STREAM)
            .create_async()
            .await;

        let request = CompletionRequest::new(model::TEXT_DAVINCI_003, "Say hello");
        let events = test_client(&server.url())
            .create_completion_stream(&request, CancellationToken::new())
            .await
            .unwrap();

        let texts: Vec<String> = events
            .map(|event| event.unwrap().text().unwrap_or_default().to_string())
            .collect()
            .await;

        assert_eq!(texts, vec!["Hello", " world"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_chat_stream_accumulates() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(concat!(
                "data: {\"id\":\"c\",\"object\":\"chat.completion.chunk\",\"created\":1,\"model\":\"gpt-3.5-turbo\",\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\"}}]}\n\n",
                "data: {\"id\":\"c\",\"object\":\"chat.completion.chunk\",\"created\":1,\"model\":\"gpt-3.5-turbo\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hi\"}}]}\n\n",
                "data: {\"id\":\"c\",\"object\":\"chat.completion.chunk\",\"created\":1,\"model\":\"gpt-3.5-turbo\",\"choices\":[{\"index\":0,\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
                "data: [DONE]\n\n",
            ))
            .create_async()
            .await;

        let request =
            ChatCompletionRequest::new(model::GPT_3_5_TURBO, vec![ChatMessage::user("Hello")]);
        let mut events = test_client(&server.url())
            .create_chat_completion_stream(&request, CancellationToken::new())
            .await
            .unwrap();

        let mut acc = ChatAccumulator::new();
        while let Some(chunk) = events.recv().await {
            acc.push(&chunk.unwrap());
        }

        assert!(acc.is_finished());
        assert_eq!(acc.into_message(), ChatMessage::assistant("Hi"));
    }

    #[tokio::test]
    async fn test_stream_reports_bad_prefix_after_frames() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/completions")
            .with_status(200)
            .with_body(concat!(
                "data: {\"id\":\"cmpl-1\",\"created\":1,\"model\":\"m\",\"choices\":[]}\n\n",
                "event: error\n\n",
            ))
            .create_async()
            .await;

        let mut events = test_client(&server.url())
            .create_completion_stream(&CompletionRequest::new("m", "p"), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(events.recv().await.unwrap().unwrap().id, "cmpl-1");
        assert!(matches!(events.recv().await, Some(Err(OaiError::BadPrefix))));
        assert!(events.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_stream_api_error_fails_before_streaming() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/completions")
            .with_status(401)
            .with_body(r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#)
            .create_async()
            .await;

        let result = test_client(&server.url())
            .create_completion_stream(&CompletionRequest::new("m", "p"), CancellationToken::new())
            .await;

        match result {
            Err(OaiError::Api(err)) => {
                assert_eq!(err.status.as_u16(), 401);
                assert_eq!(err.message, "Incorrect API key provided");
            }
            Err(other) => panic!("expected API error, got {other:?}"),
            Ok(_) => panic!("expected API error, got a stream"),
        }
    }

    #[tokio::test]
    async fn test_stream_cancelled() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/completions")
            .with_status(200)
            .with_body(COMPLETION_STREAM)
            .create_async()
            .await;

        let cancel = CancellationToken::new();
        cancel.cancel();

        let events = test_client(&server.url())
            .create_completion_stream(&CompletionRequest::new("m", "p"), cancel)
            .await
            .unwrap();
        let items: Vec<_> = events.collect().await;

        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(OaiError::Cancelled)));
    }

    #[tokio::test]
    async fn test_models() {
        let mut server = Server::new_async().await;
        let list = server
            .mock("GET", "/models")
            .with_status(200)
            .with_body(r#"{"object":"list","data":[{"id":"davinci","object":"model","created":1649359874,"owned_by":"openai"}]}"#)
            .create_async()
            .await;
        let retrieve = server
            .mock("GET", "/models/davinci")
            .with_status(200)
            .with_body(r#"{"id":"davinci","object":"model","owned_by":"openai"}"#)
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/models/curie:ft-acme-2022-12-01")
            .with_status(200)
            .with_body(r#"{"id":"curie:ft-acme-2022-12-01","object":"model","deleted":true}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        assert_eq!(client.list_models().await.unwrap().len(), 1);
        assert_eq!(client.retrieve_model("davinci").await.unwrap().owned_by, "openai");
        assert!(client.delete_model("curie:ft-acme-2022-12-01").await.unwrap().deleted);

        list.assert_async().await;
        retrieve.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_files() {
        let mut server = Server::new_async().await;
        let file_json = r#"{"id":"file-abc","object":"file","bytes":12,"created_at":1613779121,"filename":"data.jsonl","purpose":"fine-tune"}"#;
        let upload = server
            .mock("POST", "/files")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="purpose""#.to_string()),
                Matcher::Regex("fine-tune".to_string()),
                Matcher::Regex(r#"filename="data.jsonl""#.to_string()),
            ]))
            .with_status(200)
            .with_body(file_json)
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/files/file-abc")
            .with_status(200)
            .with_body(r#"{"id":"file-abc","object":"file","deleted":true}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let request = FileRequest::new(FileUpload::new("data.jsonl", &b"{\"prompt\":\"\"}"[..]), "fine-tune");
        let file = client.upload_file(&request).await.unwrap();
        assert_eq!(file.id, "file-abc");

        let status = client.delete_file(&file.id).await.unwrap();
        assert!(status.deleted);

        upload.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_fine_tune_routes() {
        let mut server = Server::new_async().await;
        let job = r#"{"id":"ft-1","object":"fine-tune","model":"curie","created_at":1,"fine_tuned_model":null,"status":"cancelled","updated_at":2}"#;
        let cancel = server
            .mock("POST", "/fine-tunes/ft-1/cancel")
            .with_status(200)
            .with_body(job)
            .create_async()
            .await;
        let events = server
            .mock("GET", "/fine-tunes/ft-1/events")
            .with_status(200)
            .with_body(r#"{"object":"list","data":[{"object":"fine-tune-event","created_at":1,"level":"info","message":"Job enqueued"}]}"#)
            .create_async()
            .await;

        let delete = server
            .mock("DELETE", "/fine-tunes/curie:ft-acme-2022-12-01")
            .with_status(200)
            .with_body(r#"{"id":"curie:ft-acme-2022-12-01","object":"model","deleted":true}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        assert!(client.cancel_fine_tune("ft-1").await.unwrap().is_finished());
        let listed = client.list_fine_tune_events("ft-1").await.unwrap();
        assert_eq!(listed.data[0].message, "Job enqueued");

        let deleted = client.delete_fine_tune("curie:ft-acme-2022-12-01").await.unwrap();
        assert_eq!(deleted.id, "curie:ft-acme-2022-12-01");
        assert!(deleted.deleted);

        cancel.assert_async().await;
        events.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_engines() {
        let mut server = Server::new_async().await;
        let list = server
            .mock("GET", "/engines")
            .with_status(200)
            .with_body(r#"{"object":"list","data":[{"id":"davinci","object":"engine","owner":"openai","ready":true}]}"#)
            .create_async()
            .await;
        let retrieve = server
            .mock("GET", "/engines/davinci")
            .with_status(200)
            .with_body(r#"{"id":"davinci","object":"engine","owner":"openai","ready":false}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let engines = client.list_engines().await.unwrap();
        assert_eq!(engines.data[0].id, "davinci");
        assert!(engines.data[0].ready);

        let engine = client.retrieve_engine("davinci").await.unwrap();
        assert_eq!(engine.owner, "openai");
        assert!(!engine.ready);

        list.assert_async().await;
        retrieve.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_image_and_transcribe() {
        let mut server = Server::new_async().await;
        let image = server
            .mock("POST", "/images/generations")
            .match_body(Matcher::Json(json!({"prompt": "otter", "size": "256x256"})))
            .with_status(200)
            .with_body(r#"{"created":1,"data":[{"url":"https://example.com/otter.png"}]}"#)
            .create_async()
            .await;
        let audio = server
            .mock("POST", "/audio/transcriptions")
            .with_status(200)
            .with_body("WEBVTT\n")
            .create_async()
            .await;

        let client = test_client(&server.url());
        let images = client
            .create_image(&CreateImageRequest::new("otter").with_size(ImageSize::S256))
            .await
            .unwrap();
        assert_eq!(images.data[0].url.as_deref(), Some("https://example.com/otter.png"));

        let file = FileUpload::new("a.mp3", &b"ID3"[..]);
        let request = AudioTranscriptionRequest::new(file, model::WHISPER_1)
            .with_format(api::AudioFormat::Vtt);
        let transcript = client.transcribe_audio(&request).await.unwrap();
        assert_eq!(transcript, Bytes::from_static(b"WEBVTT\n"));

        image.assert_async().await;
        audio.assert_async().await;
    }
}
