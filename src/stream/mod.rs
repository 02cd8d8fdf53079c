//! Event Streams
//!
//! Server-sent event handling for streamed completions: the framer that cuts a
//! response body into `data: ` frames, the pump that runs it on its own task, and
//! the consumer side that reads frames and errors back out.

pub mod framer;
pub mod pump;

pub use framer::{frame_payload, parse_events, ParsedEvents, Terminal};

use crate::error::{OaiError, Result};
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use pin_project_lite::pin_project;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tokio::sync::mpsc;

/// Receiving end of a pumped event stream
///
/// Frames arrive in body order. At most one error arrives, after the last frame.
/// Both channels close when the pump stops; a clean end of stream sends no error.
#[derive(Debug)]
pub struct EventStream {
    events: mpsc::Receiver<Bytes>,
    errors: mpsc::Receiver<OaiError>,
    events_open: bool,
    errors_open: bool,
}

impl EventStream {
    pub(crate) fn new(events: mpsc::Receiver<Bytes>, errors: mpsc::Receiver<OaiError>) -> Self {
        Self {
            events,
            errors,
            events_open: true,
            errors_open: true,
        }
    }

    /// Next frame or error; `None` once both channels are closed.
    pub async fn recv(&mut self) -> Option<Result<Bytes>> {
        loop {
            if !self.events_open && !self.errors_open {
                return None;
            }

            tokio::select! {
                // Frames first, so nothing sent before an error is skipped.
                biased;

                frame = self.events.recv(), if self.events_open => match frame {
                    Some(frame) => return Some(Ok(frame)),
                    None => self.events_open = false,
                },
                err = self.errors.recv(), if self.errors_open => match err {
                    Some(err) => return Some(Err(err)),
                    None => self.errors_open = false,
                },
            }
        }
    }

    /// The raw frame and error channels.
    pub fn into_channels(self) -> (mpsc::Receiver<Bytes>, mpsc::Receiver<OaiError>) {
        (self.events, self.errors)
    }

    /// Frames and errors as a single stream.
    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes>> + Send + 'static {
        async_stream::stream! {
            let mut events = self;
            while let Some(item) = events.recv().await {
                yield item;
            }
        }
    }

    /// Decode every frame payload as JSON.
    pub fn json<T: DeserializeOwned>(self) -> JsonEvents<T> {
        JsonEvents {
            inner: self.into_stream().boxed(),
            _marker: PhantomData,
        }
    }
}

pin_project! {
    /// Stream of typed events decoded from `data: ` frames
    pub struct JsonEvents<T> {
        #[pin]
        inner: BoxStream<'static, Result<Bytes>>,
        _marker: PhantomData<fn() -> T>,
    }
}

impl<T: DeserializeOwned> JsonEvents<T> {
    /// Next decoded event; `None` at the end of the stream.
    pub async fn recv(&mut self) -> Option<Result<T>> {
        self.next().await
    }
}

impl<T: DeserializeOwned> Stream for JsonEvents<T> {
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        let item = ready!(this.inner.poll_next(cx));
        Poll::Ready(item.map(|frame| frame.and_then(|frame| decode_frame(&frame))))
    }
}

/// Deserialize the payload of one frame.
pub fn decode_frame<T: DeserializeOwned>(frame: &Bytes) -> Result<T> {
    let payload = frame_payload(frame);
    serde_json::from_slice(&payload).map_err(|e| {
        OaiError::Response(format!(
            "Failed to parse event: {}. Data: {}",
            e,
            String::from_utf8_lossy(&payload)
        ))
    })
}
