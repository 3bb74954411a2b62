//! Async client SDK for driving remote sandboxed computers.
//!
//! A [`Computer`] bundles four service channels scoped to one remote
//! instance: a terminal/process manager, a filesystem, a browser
//! automation service, and a guest agent. Long-lived server-driven
//! streams (process output, filesystem notifications) surface as
//! pull-based, cancellable sessions; short control calls (input, resize,
//! signal, stop-watching) go through lightweight handles correlated to
//! the in-flight stream by id.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! # async fn example(computer: machina::Computer) -> machina::Result<()> {
//! let mut events = computer
//!     .terminal()
//!     .spawn("echo hi", machina::SpawnOptions::default())
//!     .await?;
//!
//! while let Some(event) = events.next().await? {
//!     if let machina::ProcessEvent::Stdout { data, .. } = event {
//!         print!("{}", String::from_utf8_lossy(&data));
//!     }
//! }
//!
//! computer.fs().write_file("/tmp/hello", "hello").await?;
//! computer.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! The transport itself is pluggable: each tool speaks to an
//! implementation of the service traits in [`machina_protocol`], normally
//! provided by a generated stub layer.

mod agent;
mod browser;
mod computer;
mod fs;
mod session;
mod terminal;

// ============================================================================
// Core API - The types most users need
// ============================================================================

pub use browser::{Browser, BrowserSession, CreateSessionOptions};
pub use computer::{Computer, ComputerDescriptor, ComputerState, ServiceSet};
pub use fs::{
    EventMask, FileStats, FileStream, FileWriter, Filesystem, WatchEvent, WatchHandle,
    WatchOptions, WatchStream,
};
pub use terminal::{Process, ProcessEvent, ProcessHandle, ProcessStream, SpawnOptions, Terminal};

// Agent diagnostics
pub use agent::{Agent, Metrics};

// Session layer, for consumers generic over streaming calls
pub use session::{FrameOutcome, StreamFrame, StreamSession};

// Watch event categories come straight off the wire
pub use machina_protocol::filesystem::WatchEventKind;

// Errors and stream primitives
pub use machina_core::{CancelHandle, ChannelScope, Error, EventSink, EventStream, Result, StreamEnd};
