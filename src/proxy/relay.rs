//! Streaming body relay.
//!
//! Bytes move from a source stream into a bounded channel whose receiving end
//! becomes the body on the other connection. A full channel stops the pump
//! from reading the source, so a slow reader throttles the writer.

use std::fmt::Display;
use std::future::Future;
use std::io;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Chunks buffered between the two sides of a relay.
pub const RELAY_CAPACITY: usize = 8;

/// Receiving half of a relay, usable as an HTTP body stream.
pub type RelayStream = ReceiverStream<Result<Bytes, io::Error>>;

/// How a relay ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEnd {
    /// Source exhausted, every chunk handed over.
    Complete,
    /// The source failed; the error was forwarded to the receiver.
    SourceFailed(String),
    /// The receiving side went away first.
    ReceiverGone,
}

/// Summary passed to the completion callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayReport {
    pub bytes: u64,
    pub end: RelayEnd,
}

/// Create a relay from `source`.
///
/// Returns the body stream and the pump future; the caller spawns the pump.
/// `on_done` runs once when the pump stops.
pub fn relay<S, E, F>(source: S, on_done: F) -> (RelayStream, impl Future<Output = ()> + Send)
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
    F: FnOnce(RelayReport) + Send + 'static,
{
    let (tx, rx) = mpsc::channel(RELAY_CAPACITY);
    let pump = async move {
        let report = pump(source, tx).await;
        on_done(report);
    };
    (ReceiverStream::new(rx), pump)
}

async fn pump<S, E>(source: S, tx: mpsc::Sender<Result<Bytes, io::Error>>) -> RelayReport
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    let mut source = std::pin::pin!(source);
    let mut bytes = 0u64;

    let end = loop {
        let next = tokio::select! {
            _ = tx.closed() => break RelayEnd::ReceiverGone,
            next = source.next() => next,
        };

        match next {
            None => break RelayEnd::Complete,
            Some(Ok(chunk)) => {
                let len = chunk.len() as u64;
                if tx.send(Ok(chunk)).await.is_err() {
                    break RelayEnd::ReceiverGone;
                }
                bytes += len;
            }
            Some(Err(e)) => {
                let message = e.to_string();
                // Receiver may already be gone; the failure is reported either way.
                let _ = tx.send(Err(io::Error::other(message.clone()))).await;
                break RelayEnd::SourceFailed(message);
            }
        }
    };

    RelayReport { bytes, end }
}
