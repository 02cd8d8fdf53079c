//! HTTP Client
//!
//! Request plumbing shared by every endpoint: URL building, auth headers, retry
//! with backoff, rate limit tracking and error interpretation.

use crate::api::files::FileUpload;
use crate::client::rate_limiter::RateLimitTracker;
use crate::config::{ClientConfig, RetryConfig};
use crate::error::{ApiError, OaiError, Result};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const ACCEPT_JSON: &str = "application/json; charset=utf-8";
const ACCEPT_EVENT_STREAM: &str = "text/event-stream; charset=utf-8";
const ORGANIZATION_HEADER: &str = "openai-organization";

/// Request body
#[derive(Debug, Clone)]
pub enum Payload {
    Empty,
    Json(Value),
    Multipart(Multipart),
}

impl Payload {
    pub fn json<T: Serialize>(body: &T) -> Result<Self> {
        Ok(Self::Json(serde_json::to_value(body)?))
    }
}

/// Multipart form kept as plain data, so it can be rebuilt for every attempt
#[derive(Debug, Clone, Default)]
pub struct Multipart {
    parts: Vec<(String, FormPart)>,
}

#[derive(Debug, Clone)]
enum FormPart {
    Text(String),
    File(FileUpload),
}

impl Multipart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push((name.into(), FormPart::Text(value.into())));
        self
    }

    pub fn file(mut self, name: impl Into<String>, file: FileUpload) -> Self {
        self.parts.push((name.into(), FormPart::File(file)));
        self
    }

    /// Field names in insertion order
    pub fn names(&self) -> Vec<&str> {
        self.parts.iter().map(|(name, _)| name.as_str()).collect()
    }

    fn to_form(&self) -> Result<Form> {
        let mut form = Form::new();
        for (name, part) in &self.parts {
            form = match part {
                FormPart::Text(value) => form.text(name.clone(), value.clone()),
                FormPart::File(file) => {
                    let len = file.content.len() as u64;
                    let mut part = Part::stream_with_length(file.content.clone(), len)
                        .file_name(file.name.clone());
                    if let Some(mime) = &file.mime {
                        part = part.mime_str(mime)?;
                    }
                    form.part(name.clone(), part)
                }
            };
        }
        Ok(form)
    }
}

/// HTTP client bound to one API base URL and key
pub struct HttpClient {
    client: Client,
    base_url: Url,
    headers: HeaderMap,
    retry: RetryConfig,
    rate_limiter: Arc<RateLimitTracker>,
}

impl HttpClient {
    /// Build a transport from the config's timeouts and pool settings.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build()
            .map_err(|e| OaiError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Self::with_client(client, config)
    }

    /// Use a caller-built transport. Timeouts and pool settings in `config` are
    /// ignored; the transport's own apply.
    pub fn with_client(client: Client, config: &ClientConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim())
            .map_err(|e| OaiError::Config(format!("Invalid base_url {}: {}", config.base_url, e)))?;

        Ok(Self {
            client,
            base_url,
            headers: default_headers(config)?,
            retry: config.retry.clone(),
            rate_limiter: Arc::new(RateLimitTracker::with_max_wait(Duration::from_millis(
                config.retry.max_elapsed_ms,
            ))),
        })
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimitTracker> {
        &self.rate_limiter
    }

    /// Resolve `route` against the base URL, keeping the base URL's query.
    pub fn url(&self, route: &str) -> Url {
        let mut url = self.base_url.clone();
        let path = format!(
            "{}/{}",
            url.path().trim_end_matches('/'),
            route.trim_start_matches('/')
        );
        url.set_path(&path);
        url
    }

    /// Send a request and decode the JSON response, retrying transient failures.
    pub async fn execute<R>(&self, method: Method, route: &str, payload: Payload) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let body = self.execute_raw(method, route, payload).await?;
        serde_json::from_slice(&body).map_err(|e| {
            OaiError::Response(format!(
                "Failed to parse response: {}. Body: {}",
                e,
                String::from_utf8_lossy(&body[..body.len().min(500)])
            ))
        })
    }

    /// Same as [`HttpClient::execute`], returning the body untouched.
    pub async fn execute_raw(
        &self,
        method: Method,
        route: &str,
        payload: Payload,
    ) -> Result<Bytes> {
        let url = self.url(route);
        let attempts = AtomicU32::new(0);
        let max_retries = self.retry.max_retries;

        let (method, url, payload, attempts) = (&method, &url, &payload, &attempts);
        let response = backoff::future::retry(self.retry.backoff(), move || async move {
            let attempt = attempts.fetch_add(1, Ordering::Relaxed);

            match self.send(method, url, payload, ACCEPT_JSON).await {
                Ok(response) => Ok(response),
                Err(err) if attempt < max_retries && err.is_retryable() => {
                    warn!(attempt = attempt + 1, error = %err, "retrying request");
                    Err(backoff::Error::transient(err))
                }
                Err(err) => Err(backoff::Error::permanent(err)),
            }
        })
        .await?;

        Ok(response.bytes().await?)
    }

    /// Open a server-sent event stream. Not retried: the body is handed to the
    /// caller as soon as the status is known to be successful.
    pub async fn open_stream(&self, route: &str, payload: Payload) -> Result<Response> {
        let url = self.url(route);
        self.send(&Method::POST, &url, &payload, ACCEPT_EVENT_STREAM)
            .await
    }

    /// One attempt: wait out any known rate limit, send, record limits, check status.
    async fn send(
        &self,
        method: &Method,
        url: &Url,
        payload: &Payload,
        accept: &'static str,
    ) -> Result<Response> {
        if let Some(wait) = self.rate_limiter.should_wait() {
            debug!(?wait, "waiting for rate limit");
            tokio::time::sleep(wait).await;
        }

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .headers(self.headers.clone())
            .header(ACCEPT, accept);

        request = match payload {
            Payload::Empty => request,
            Payload::Json(body) => request.json(body),
            Payload::Multipart(form) => request.multipart(form.to_form()?),
        };

        debug!(%method, path = url.path(), "sending request");
        let response = request.send().await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            self.rate_limiter.record_rate_limited(response.headers());
        } else {
            self.rate_limiter.record(response.headers());
        }

        interpret_response(response).await
    }
}

/// Pass 2xx responses through; turn anything else into an [`ApiError`].
pub async fn interpret_response(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => format!("<unreadable body: {}>", e),
    };
    let err = ApiError::from_body(status, &body);
    debug!(status = status.as_u16(), retryable = err.is_retryable(), "API error");

    Err(OaiError::Api(err))
}

fn default_headers(config: &ClientConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    let key = config.resolve_api_key()?;
    let mut auth = HeaderValue::from_str(&format!("Bearer {}", key))
        .map_err(|e| OaiError::Config(format!("Invalid API key format: {}", e)))?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);

    if let Some(org) = &config.organization {
        let value = HeaderValue::from_str(org)
            .map_err(|e| OaiError::Config(format!("Invalid organization: {}", e)))?;
        headers.insert(HeaderName::from_static(ORGANIZATION_HEADER), value);
    }

    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| OaiError::Config(format!("Invalid header name {}: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| OaiError::Config(format!("Invalid value for header {}: {}", name, e)))?;
        headers.insert(name, value);
    }

    Ok(headers)
}
