//! Typed session wrapper for one server-streaming call.

use machina_core::{CancelHandle, EventStream, Result, StreamEnd};

/// Classification of one wire frame pulled off a stream.
#[derive(Debug)]
pub enum FrameOutcome<T> {
    /// An application event to hand to the caller.
    Event(T),
    /// A frame with no caller-visible payload, such as an empty chunk.
    Skip,
    /// An explicit end marker; the stream is complete.
    End,
}

/// A wire frame that can classify itself.
///
/// In-band error markers surface as `Err`, carrying the server-supplied
/// message; everything else maps to a [`FrameOutcome`].
pub trait StreamFrame: Send + 'static {
    type Event;

    fn classify(self) -> Result<FrameOutcome<Self::Event>>;
}

/// One open server-streaming call, typed.
///
/// Events are produced in server emission order until the stream
/// completes, the consumer cancels it, or an error frame arrives. An
/// error frame fails the pending [`next`](StreamSession::next) call with
/// the server message and fuses the session: no further elements are
/// produced even if the transport stays open. Sessions are not
/// restartable; re-running an operation means issuing a fresh request
/// with fresh semantics.
///
/// No ordering holds between two sessions, or between a session and a
/// unary control call, even on the same channel.
#[derive(Debug)]
pub struct StreamSession<F: StreamFrame> {
    stream: EventStream<F>,
    done: bool,
}

impl<F: StreamFrame> StreamSession<F> {
    pub(crate) fn new(stream: EventStream<F>) -> Self {
        Self {
            stream,
            done: false,
        }
    }

    /// Returns the next event, suspending until one arrives.
    ///
    /// `Ok(None)` means the session is over: the stream completed, was
    /// cancelled, or previously failed. Check [`end`](StreamSession::end)
    /// to distinguish completion from cancellation.
    pub async fn next(&mut self) -> Result<Option<F::Event>> {
        while !self.done {
            let Some(frame) = self.stream.next().await else {
                self.done = true;
                break;
            };
            match frame.classify() {
                Ok(FrameOutcome::Event(event)) => return Ok(Some(event)),
                Ok(FrameOutcome::Skip) => continue,
                Ok(FrameOutcome::End) => {
                    self.done = true;
                    self.stream.cancel();
                    break;
                }
                Err(err) => {
                    self.done = true;
                    self.stream.cancel();
                    return Err(err);
                }
            }
        }
        Ok(None)
    }

    /// Requests the transport stop delivering elements. Best-effort and
    /// asynchronous; events already delivered are unaffected.
    pub fn cancel(&self) {
        self.stream.cancel();
    }

    /// Detached handle for cancelling this session from elsewhere.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.stream.cancel_handle()
    }

    /// Terminal condition of the underlying stream, once it has ended.
    pub fn end(&self) -> Option<StreamEnd> {
        self.stream.end()
    }
}
