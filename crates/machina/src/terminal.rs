//! Terminal tool: process lifecycle over the process-control service.
//!
//! [`Terminal`] spawns processes and attaches to running ones, handing
//! back event streams; [`ProcessHandle`] is the control capability for a
//! process whose pid the server has assigned. The two are deliberately
//! decoupled: a handle never owns the stream that produced its pid, and
//! control calls are independent unary RPCs correlated only by pid.

use crate::session::{FrameOutcome, StreamFrame, StreamSession};
use machina_core::{Error, Result, StreamEnd};
use machina_protocol::terminal::{
    ConnectToProcessRequest, ProcessEventFrame, ProcessEventKind, ProcessRecord, SendInputRequest,
    SendSignalRequest, SpawnProcessRequest, TerminalService, UpdateProcessRequest,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use uuid::Uuid;

/// A process running in the computer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Process {
    pub pid: u32,
    pub command: String,
    pub cwd: String,
    pub cols: u32,
    pub rows: u32,
    pub start_time: u64,
}

impl From<ProcessRecord> for Process {
    fn from(record: ProcessRecord) -> Self {
        Self {
            pid: record.pid,
            command: record.command,
            cwd: record.cwd,
            cols: record.cols,
            rows: record.rows,
            start_time: record.start_time,
        }
    }
}

/// An event observed on a process stream.
///
/// The first event of a spawn stream is always `Spawn`, which assigns the
/// pid; until then the process cannot be addressed by control calls.
/// Error frames never surface as events, they fail the stream instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    /// The server assigned a pid; the process is now addressable.
    Spawn { pid: u32 },
    Stdout { pid: u32, data: Vec<u8> },
    Stderr { pid: u32, data: Vec<u8> },
    /// Terminal event: the process exited.
    Exit { pid: u32, code: i32 },
}

impl StreamFrame for ProcessEventFrame {
    type Event = ProcessEvent;

    fn classify(self) -> Result<FrameOutcome<ProcessEvent>> {
        if !self.error.is_empty() {
            return Err(Error::Service(self.error));
        }
        let event = match self.kind {
            ProcessEventKind::Spawn => ProcessEvent::Spawn { pid: self.pid },
            ProcessEventKind::Stdout => ProcessEvent::Stdout {
                pid: self.pid,
                data: self.data,
            },
            ProcessEventKind::Stderr => ProcessEvent::Stderr {
                pid: self.pid,
                data: self.data,
            },
            ProcessEventKind::Exit => ProcessEvent::Exit {
                pid: self.pid,
                code: self.exit_code,
            },
            ProcessEventKind::Error => {
                return Err(Error::Service(
                    "process stream reported an unspecified error".to_string(),
                ));
            }
        };
        Ok(FrameOutcome::Event(event))
    }
}

/// Locally-observed process lifecycle, shared by every stream and handle
/// of one [`Terminal`].
///
/// The server stays authoritative; this map only lets control calls to a
/// pid whose exit has already been observed fail fast, before any RPC is
/// issued. Pids never seen locally pass straight through.
#[derive(Debug, Clone, Default)]
struct ProcessRegistry {
    // pid -> exit code once observed, None while running
    inner: Arc<Mutex<HashMap<u32, Option<i32>>>>,
}

impl ProcessRegistry {
    fn observe(&self, event: &ProcessEvent) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        match event {
            ProcessEvent::Spawn { pid } => {
                inner.insert(*pid, None);
            }
            ProcessEvent::Exit { pid, code } => {
                inner.insert(*pid, Some(*code));
            }
            _ => {}
        }
    }

    fn ensure_addressable(&self, pid: u32) -> Result<()> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        match inner.get(&pid) {
            Some(Some(_)) => Err(Error::ProcessExited(pid)),
            _ => Ok(()),
        }
    }
}

/// Stream of events for one spawned or attached process.
///
/// Observed lifecycle: pending (no pid) until the first `Spawn` event,
/// then running until a terminal `Exit` event or an error frame.
#[derive(Debug)]
pub struct ProcessStream {
    session: StreamSession<ProcessEventFrame>,
    registry: ProcessRegistry,
}

impl ProcessStream {
    /// Returns the next process event, suspending until one arrives.
    pub async fn next(&mut self) -> Result<Option<ProcessEvent>> {
        let event = self.session.next().await?;
        if let Some(event) = &event {
            self.registry.observe(event);
        }
        Ok(event)
    }

    /// Stops the stream. Best-effort; the process itself keeps running.
    pub fn cancel(&self) {
        self.session.cancel();
    }

    /// Terminal condition of the stream, once it has ended.
    pub fn end(&self) -> Option<StreamEnd> {
        self.session.end()
    }
}

/// Spawn parameters for a process.
#[derive(Debug, Clone)]
pub struct SpawnOptions {
    pub cwd: String,
    pub env: HashMap<String, String>,
    pub args: Vec<String>,
    pub cols: u32,
    pub rows: u32,
}

impl Default for SpawnOptions {
    fn default() -> Self {
        Self {
            cwd: String::new(),
            env: HashMap::new(),
            args: Vec::new(),
            cols: 80,
            rows: 24,
        }
    }
}

impl SpawnOptions {
    pub fn cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = cwd.into();
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn size(mut self, cols: u32, rows: u32) -> Self {
        self.cols = cols;
        self.rows = rows;
        self
    }
}

/// Process manager for one computer instance.
pub struct Terminal {
    service: Arc<dyn TerminalService>,
    registry: ProcessRegistry,
}

impl Terminal {
    pub fn new(service: Arc<dyn TerminalService>) -> Self {
        Self {
            service,
            registry: ProcessRegistry::default(),
        }
    }

    /// Closes the terminal channel. Every stream and handle derived from
    /// this tool fails afterwards.
    pub async fn close(&self) -> Result<()> {
        self.service.close().await
    }

    /// Lists processes running in the computer.
    pub async fn list_processes(&self) -> Result<Vec<Process>> {
        let response = self.service.list_processes().await?;
        if !response.success {
            return Err(Error::Service(response.error));
        }
        Ok(response.processes.into_iter().map(Process::from).collect())
    }

    /// Spawns a process and returns its event stream.
    pub async fn spawn(&self, cmd: &str, options: SpawnOptions) -> Result<ProcessStream> {
        let request = SpawnProcessRequest {
            cmd: cmd.to_string(),
            cwd: options.cwd,
            env: options.env,
            args: options.args,
            cols: options.cols,
            rows: options.rows,
        };
        let stream = self.service.spawn_process(request).await?;
        tracing::debug!(session_id = %Uuid::new_v4(), cmd, "opened spawn stream");
        Ok(ProcessStream {
            session: StreamSession::new(stream),
            registry: self.registry.clone(),
        })
    }

    /// Attaches to an existing process; the server replays or tails its
    /// output into the returned stream.
    pub async fn connect(&self, pid: u32) -> Result<ProcessStream> {
        let stream = self
            .service
            .connect_to_process(ConnectToProcessRequest { pid })
            .await?;
        tracing::debug!(session_id = %Uuid::new_v4(), pid, "attached to process");
        Ok(ProcessStream {
            session: StreamSession::new(stream),
            registry: self.registry.clone(),
        })
    }

    /// Spawns a process and returns a control handle as soon as the
    /// server assigns a pid.
    ///
    /// The remainder of the event stream is drained by a background task
    /// so the transport never stalls on an unconsumed stream; the output
    /// itself is discarded. Use [`spawn`](Terminal::spawn) directly when
    /// stdout/stderr matter. The drain records the exit status, which
    /// [`ProcessHandle::wait`] observes.
    pub async fn run(&self, cmd: &str, options: SpawnOptions) -> Result<ProcessHandle> {
        let mut stream = self.spawn(cmd, options).await?;
        let pid = loop {
            match stream.next().await? {
                Some(ProcessEvent::Spawn { pid }) => break pid,
                Some(_) => continue,
                None => {
                    return Err(Error::SpawnFailed(
                        "stream ended before a spawn event".to_string(),
                    ));
                }
            }
        };

        let (exit_tx, exit_rx) = watch::channel(None::<i32>);
        tokio::spawn(async move {
            loop {
                match stream.next().await {
                    Ok(Some(ProcessEvent::Exit { code, .. })) => {
                        let _ = exit_tx.send(Some(code));
                    }
                    Ok(Some(_)) => {}
                    Ok(None) => break,
                    Err(err) => {
                        tracing::warn!(pid, error = %err, "process stream failed during drain");
                        break;
                    }
                }
            }
        });

        Ok(ProcessHandle {
            pid,
            service: Arc::clone(&self.service),
            registry: self.registry.clone(),
            exit: exit_rx,
        })
    }
}

/// Control capability for one process, keyed by pid.
///
/// A handle exists only after the server has assigned a pid, and never
/// owns the event stream that produced it: control calls are independent
/// unary RPCs, valid whether or not anyone is still draining the stream.
/// It stays usable until the owning channel closes.
pub struct ProcessHandle {
    pid: u32,
    service: Arc<dyn TerminalService>,
    registry: ProcessRegistry,
    exit: watch::Receiver<Option<i32>>,
}

impl std::fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.pid)
            .finish_non_exhaustive()
    }
}

impl ProcessHandle {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Sends input bytes to the process.
    pub async fn send_input(&self, input: &[u8]) -> Result<()> {
        self.registry.ensure_addressable(self.pid)?;
        self.service
            .send_input(SendInputRequest {
                pid: self.pid,
                input: input.to_vec(),
            })
            .await?
            .into_result()
    }

    /// Updates the terminal size of the process.
    pub async fn update_size(&self, cols: u32, rows: u32) -> Result<()> {
        self.registry.ensure_addressable(self.pid)?;
        self.service
            .update_process(UpdateProcessRequest {
                pid: self.pid,
                cols,
                rows,
            })
            .await?
            .into_result()
    }

    /// Sends a signal to the process by name, e.g. `SIGTERM`.
    pub async fn send_signal(&self, signal: &str) -> Result<()> {
        self.registry.ensure_addressable(self.pid)?;
        self.service
            .send_signal(SendSignalRequest {
                pid: self.pid,
                signal: signal.to_string(),
            })
            .await?
            .into_result()
    }

    /// Waits for the process to exit and returns its exit code, as
    /// observed by the background drain behind [`Terminal::run`].
    pub async fn wait(&self) -> Result<i32> {
        let mut exit = self.exit.clone();
        let code = exit
            .wait_for(|code| code.is_some())
            .await
            .map_err(|_| Error::Transport("process stream closed before reporting an exit".to_string()))?;
        match *code {
            Some(code) => Ok(code),
            None => Err(Error::Transport(
                "process stream closed before reporting an exit".to_string(),
            )),
        }
    }

    /// Waits for the process to exit with a timeout.
    ///
    /// Returns `None` if the timeout expires before the process exits.
    pub async fn wait_timeout(&self, duration: Duration) -> Result<Option<i32>> {
        match tokio::time::timeout(duration, self.wait()).await {
            Ok(result) => result.map(Some),
            Err(_) => Ok(None),
        }
    }
}
