//! Cancellable event streams for server-driven RPC calls.
//!
//! A streaming call delivers zero or more events over time until the server
//! completes it, the consumer cancels it, or an in-band error frame arrives.
//! [`EventStream`] is the consumer half: a pull-based, channel-backed
//! sequence. [`EventSink`] is the producer half, held by the transport
//! adapter feeding frames off the wire.
//!
//! Exhaustion and cancellation are distinct terminal conditions, reported
//! through [`StreamEnd`]; errors travel in-band as frames and are
//! interpreted by the typed session layer on top of this primitive.

use crate::error::{Error, Result};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// How a stream reached its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The producer completed the stream.
    Completed,
    /// The consumer cancelled the stream.
    Cancelled,
}

/// Cancellation capability detached from the stream it controls.
///
/// Cancelling is best-effort and asynchronous: the producer observes it on
/// its next send, and the consumer yields no further elements once it has
/// been observed. Elements already delivered are not retracted.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    /// Requests that no further elements be delivered. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Consumer half of one streaming call.
///
/// Elements arrive in producer send order. The sequence is lazy and
/// possibly infinite; consuming it is the only way to receive data, and it
/// cannot be restarted once ended.
#[derive(Debug)]
pub struct EventStream<T> {
    rx: mpsc::Receiver<T>,
    token: CancellationToken,
    end: Option<StreamEnd>,
}

/// Producer half of one streaming call.
#[derive(Debug, Clone)]
pub struct EventSink<T> {
    tx: mpsc::Sender<T>,
    token: CancellationToken,
}

impl<T> EventStream<T> {
    /// Creates a connected sink/stream pair with a bounded buffer.
    ///
    /// The bound is what gives the transport back-pressure: a producer
    /// suspends in [`EventSink::send`] while the consumer lags `capacity`
    /// elements behind.
    pub fn channel(capacity: usize) -> (EventSink<T>, EventStream<T>) {
        let (tx, rx) = mpsc::channel(capacity);
        let token = CancellationToken::new();
        (
            EventSink {
                tx,
                token: token.clone(),
            },
            EventStream {
                rx,
                token,
                end: None,
            },
        )
    }

    /// Creates a stream that yields the given elements and then completes.
    ///
    /// Useful for transport adapters replaying buffered frames and for
    /// scripted fakes in tests.
    pub fn preloaded(items: Vec<T>) -> EventStream<T> {
        let (sink, stream) = EventStream::channel(items.len().max(1));
        for item in items {
            // Cannot fail: capacity covers every item and the receiver is live.
            let _ = sink.tx.try_send(item);
        }
        stream
    }

    /// Returns the next element, suspending until one arrives.
    ///
    /// Returns `None` once the producer has completed the stream or a
    /// cancellation has been observed; after that the stream is fused and
    /// keeps returning `None`. Use [`end`](EventStream::end) to tell the
    /// two apart.
    pub async fn next(&mut self) -> Option<T> {
        if self.end.is_some() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                self.end = Some(StreamEnd::Cancelled);
                self.rx.close();
                None
            }
            item = self.rx.recv() => match item {
                Some(item) => Some(item),
                None => {
                    self.end = Some(StreamEnd::Completed);
                    None
                }
            },
        }
    }

    /// Requests that the producer stop delivering elements. Best-effort
    /// and asynchronous; elements already delivered are not retracted.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Detached handle for cancelling this stream from elsewhere.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            token: self.token.clone(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Terminal condition of the stream, or `None` while it is still live.
    pub fn end(&self) -> Option<StreamEnd> {
        self.end
    }
}

impl<T> Drop for EventStream<T> {
    fn drop(&mut self) {
        // A consumer that walks away is indistinguishable from one that
        // cancelled; let the producer observe it either way.
        self.token.cancel();
    }
}

impl<T> EventSink<T> {
    /// Delivers an element to the consumer, suspending while the buffer
    /// is full.
    ///
    /// Fails with [`Error::ChannelClosed`] once the consumer has cancelled
    /// or dropped the stream; the producer should stop at that point.
    pub async fn send(&self, item: T) -> Result<()> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(Error::ChannelClosed),
            sent = self.tx.send(item) => sent.map_err(|_| Error::ChannelClosed),
        }
    }

    /// Whether the consumer has cancelled the stream.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
