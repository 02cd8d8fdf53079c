//! Stream Pump
//!
//! Runs the read/frame loop for one streamed response on its own task and hands
//! frames and errors to the consumer over two channels.

use crate::error::{OaiError, Result};
use crate::stream::framer::{last_boundary, parse_events, Terminal, FRAME_SEPARATOR};
use crate::stream::EventStream;
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Bytes requested from the body per read
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Channel capacity; 1 is as close to an unbuffered handoff as tokio gets
const CHANNEL_CAPACITY: usize = 1;

/// Reads one unfinished frame may span before the stream is abandoned
pub const MAX_PENDING_READS: usize = 64;

/// Floor for the unfinished frame limit, for small read sizes
const MIN_PENDING_LIMIT: usize = 64 * 1024;

/// How a stream ended without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Finish {
    /// The body reached end of file
    Eof,

    /// The `[DONE]` sentinel was seen
    Done,

    /// The consumer dropped its receiver
    ConsumerGone,
}

/// Start pumping `reader` on a new task.
///
/// The reader is owned by the task and dropped exactly once when the loop ends,
/// before either channel is closed. `cancel` is checked once per read, so a read
/// that never returns is not interrupted by it.
pub fn spawn<R>(reader: R, cancel: CancellationToken, buffer_size: usize) -> EventStream
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (events_tx, events_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (errors_tx, errors_rx) = mpsc::channel(CHANNEL_CAPACITY);

    let buffer_size = buffer_size.max(1);
    let mut pump = Pump {
        buffer_size,
        max_pending: buffer_size
            .saturating_mul(MAX_PENDING_READS)
            .max(MIN_PENDING_LIMIT),
        cancel,
        events: events_tx,
        pending: BytesMut::new(),
    };

    tokio::spawn(async move {
        let mut reader = reader;
        let outcome = pump.run(&mut reader).await;
        drop(reader);

        match outcome {
            Ok(finish) => debug!(?finish, "event stream closed"),
            Err(err) => {
                debug!(error = %err, "event stream failed");
                // Nobody left to tell if the consumer is gone.
                let _ = errors_tx.send(err).await;
            }
        }
    });

    EventStream::new(events_rx, errors_rx)
}

struct Pump {
    buffer_size: usize,

    /// Largest unfinished frame carried between reads
    max_pending: usize,
    cancel: CancellationToken,
    events: mpsc::Sender<Bytes>,

    /// Bytes after the last frame separator, waiting for the rest of their frame
    pending: BytesMut,
}

impl Pump {
    async fn run<R>(&mut self, reader: &mut R) -> Result<Finish>
    where
        R: AsyncRead + Unpin,
    {
        loop {
            let mut chunk = vec![0u8; self.buffer_size];
            let n = reader.read(&mut chunk).await?;
            if n == 0 {
                return self.flush().await;
            }

            if self.cancel.is_cancelled() {
                return Err(OaiError::Cancelled);
            }

            trace!(bytes = n, "read chunk");

            // The carried tail holds no separator, so only its last byte can
            // start one.
            let scan_from = self.pending.len().saturating_sub(FRAME_SEPARATOR.len() - 1);
            self.pending.extend_from_slice(&chunk[..n]);

            match last_boundary(&self.pending[scan_from..]) {
                Some(boundary) => {
                    let complete = self.pending.split_to(scan_from + boundary).freeze();
                    if let Some(finish) = self.emit(&complete).await? {
                        return Ok(finish);
                    }
                }
                None if self.pending.len() > self.max_pending => {
                    return Err(OaiError::Response(format!(
                        "Event frame exceeds {} bytes without a separator",
                        self.max_pending
                    )));
                }
                None => {}
            }
        }
    }

    /// Frame what is left once the body is exhausted.
    async fn flush(&mut self) -> Result<Finish> {
        let rest = self.pending.split().freeze();
        Ok(self.emit(&rest).await?.unwrap_or(Finish::Eof))
    }

    async fn emit(&self, buf: &Bytes) -> Result<Option<Finish>> {
        let parsed = parse_events(buf);

        for frame in parsed.frames {
            if self.events.send(frame).await.is_err() {
                return Ok(Some(Finish::ConsumerGone));
            }
        }

        match parsed.terminal {
            Some(Terminal::Done) => Ok(Some(Finish::Done)),
            Some(Terminal::BadPrefix) => Err(OaiError::BadPrefix),
            None => Ok(None),
        }
    }
}
