//! Stream a chat completion to stdout.
//!
//! Usage:
//!   OPENAI_API_KEY=sk-... cargo run --example stream_completion -- "Write a haiku about Rust"
//!
//! Ctrl-C stops the stream after the current read.

use anyhow::Context;
use oai::api::{model, ChatAccumulator, ChatCompletionRequest, ChatMessage};
use oai::{CancellationToken, Client};
use std::io::Write;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("oai=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let prompt = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Say this is a test".to_string());

    let client = Client::from_env().context("failed to configure the client")?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let request = ChatCompletionRequest::new(
        model::GPT_3_5_TURBO,
        vec![
            ChatMessage::system("You are a helpful assistant."),
            ChatMessage::user(prompt),
        ],
    );

    let mut events = client
        .create_chat_completion_stream(&request, cancel)
        .await
        .context("failed to start the stream")?;

    let mut acc = ChatAccumulator::new();
    let mut stdout = std::io::stdout();
    while let Some(chunk) = events.recv().await {
        let chunk = chunk.context("stream failed")?;
        if let Some(text) = chunk.choices.first().and_then(|c| c.delta.content.as_deref()) {
            write!(stdout, "{}", text)?;
            stdout.flush()?;
        }
        acc.push(&chunk);
    }
    writeln!(stdout)?;

    tracing::info!(
        chunks = acc.chunks,
        finish_reason = acc.finish_reason.as_deref().unwrap_or("none"),
        "stream finished"
    );

    Ok(())
}
