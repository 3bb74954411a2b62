//! Process-control service: wire shapes and service definition.

use crate::Ack;
use async_trait::async_trait;
use machina_core::{EventStream, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A process known to the terminal service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub pid: u32,
    pub command: String,
    pub cwd: String,
    pub cols: u32,
    pub rows: u32,
    pub start_time: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListProcessesResponse {
    pub success: bool,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub processes: Vec<ProcessRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpawnProcessRequest {
    pub cmd: String,
    #[serde(default)]
    pub cwd: String,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub args: Vec<String>,
    pub cols: u32,
    pub rows: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectToProcessRequest {
    pub pid: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendInputRequest {
    pub pid: u32,
    pub input: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProcessRequest {
    pub pid: u32,
    pub cols: u32,
    pub rows: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendSignalRequest {
    pub pid: u32,
    pub signal: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessEventKind {
    Spawn,
    Stdout,
    Stderr,
    Exit,
    Error,
}

/// One element of a process event stream.
///
/// The first frame of a spawn stream is always `spawn` (assigning the pid)
/// or an error frame; `exit` and error frames are terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessEventFrame {
    pub pid: u32,
    pub kind: ProcessEventKind,
    #[serde(default)]
    pub data: Vec<u8>,
    #[serde(default)]
    pub exit_code: i32,
    #[serde(default)]
    pub error: String,
}

impl ProcessEventFrame {
    pub fn spawn(pid: u32) -> Self {
        Self::bare(pid, ProcessEventKind::Spawn)
    }

    pub fn stdout(pid: u32, data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            ..Self::bare(pid, ProcessEventKind::Stdout)
        }
    }

    pub fn stderr(pid: u32, data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            ..Self::bare(pid, ProcessEventKind::Stderr)
        }
    }

    pub fn exit(pid: u32, exit_code: i32) -> Self {
        Self {
            exit_code,
            ..Self::bare(pid, ProcessEventKind::Exit)
        }
    }

    pub fn error(pid: u32, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            ..Self::bare(pid, ProcessEventKind::Error)
        }
    }

    fn bare(pid: u32, kind: ProcessEventKind) -> Self {
        Self {
            pid,
            kind,
            data: Vec::new(),
            exit_code: 0,
            error: String::new(),
        }
    }
}

/// Process-control service for one computer instance.
///
/// Implemented by the transport stub layer. Streaming methods hand back
/// lazy event streams; unary methods resolve to a single response.
/// Closing the channel invalidates every stream and handle derived from
/// it: subsequent calls fail with a channel-closed error.
#[async_trait]
pub trait TerminalService: Send + Sync {
    async fn list_processes(&self) -> Result<ListProcessesResponse>;

    async fn spawn_process(
        &self,
        request: SpawnProcessRequest,
    ) -> Result<EventStream<ProcessEventFrame>>;

    async fn connect_to_process(
        &self,
        request: ConnectToProcessRequest,
    ) -> Result<EventStream<ProcessEventFrame>>;

    async fn send_input(&self, request: SendInputRequest) -> Result<Ack>;

    async fn update_process(&self, request: UpdateProcessRequest) -> Result<Ack>;

    async fn send_signal(&self, request: SendSignalRequest) -> Result<Ack>;

    /// Closes the underlying channel.
    async fn close(&self) -> Result<()>;
}
