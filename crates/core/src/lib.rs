//! Core types shared across the machina SDK crates.
//!
//! This crate holds the pieces every other crate depends on: the error
//! taxonomy, the channel scope that addresses one computer instance, and
//! the cancellable event-stream primitive behind every streaming RPC.

mod error;
mod scope;
mod stream;

pub use error::{Error, Result};
pub use scope::ChannelScope;
pub use stream::{CancelHandle, EventSink, EventStream, StreamEnd};
