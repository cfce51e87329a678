//! Event outputs.
//!
//! The dispatcher hands every mapped event to an [`EventSink`]. Sinks are
//! shared behind an `Arc` and called for one event at a time.

use crate::error::{EnqueueErrorKind, Error, Result};
use crate::event::Event;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{Mutex, mpsc};

/// Type alias for boxed async return type (dyn-compatible).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Destination for mapped events.
///
/// A failed `send` is logged with the trap that produced the event and
/// never stops the listener.
pub trait EventSink: Send + Sync + 'static {
    /// Deliver one event.
    fn send<'a>(&'a self, event: Event) -> BoxFuture<'a, Result<()>>;
}

/// Bounded in-process queue.
///
/// Waits at most `timeout` for capacity, so a stalled consumer delays the
/// dispatcher by a bounded amount per event.
#[derive(Debug, Clone)]
pub struct QueueSink {
    tx: mpsc::Sender<Event>,
    timeout: Duration,
}

impl QueueSink {
    /// Wrap an existing sender.
    pub fn new(tx: mpsc::Sender<Event>, timeout: Duration) -> Self {
        Self { tx, timeout }
    }

    /// Create a queue of `capacity` events and return its receiving end.
    pub fn channel(capacity: usize, timeout: Duration) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx, timeout), rx)
    }
}

impl EventSink for QueueSink {
    fn send<'a>(&'a self, event: Event) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.tx
                .send_timeout(event, self.timeout)
                .await
                .map_err(|e| {
                    let kind = match e {
                        mpsc::error::SendTimeoutError::Closed(_) => EnqueueErrorKind::Closed,
                        mpsc::error::SendTimeoutError::Timeout(_) => {
                            EnqueueErrorKind::TimedOut(self.timeout)
                        }
                    };
                    Error::Enqueue { kind }
                })
        })
    }
}

/// Writes each event as one line of JSON.
pub struct JsonLinesSink<W> {
    writer: Mutex<W>,
}

impl<W> JsonLinesSink<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    /// Create a sink over `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl JsonLinesSink<tokio::io::Stdout> {
    /// Sink writing to standard output.
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W> EventSink for JsonLinesSink<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    fn send<'a>(&'a self, event: Event) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut line = serde_json::to_vec(&event)
                .map_err(|e| Error::Output { source: e.into() })?;
            line.push(b'\n');

            let mut writer = self.writer.lock().await;
            writer
                .write_all(&line)
                .await
                .map_err(|source| Error::Output { source })?;
            writer
                .flush()
                .await
                .map_err(|source| Error::Output { source })
        })
    }
}
