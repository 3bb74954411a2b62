//! Scripted in-memory service fakes shared by the integration tests.
//!
//! Each fake implements one of the protocol service traits with
//! configurable responses and records the requests it receives, so tests
//! can assert both on SDK behavior and on what went over the wire.

#![allow(dead_code)]

use async_trait::async_trait;
use machina::{Error, EventStream, Result};
use machina_protocol::Ack;
use machina_protocol::agent::{
    AgentService, GetHostRequest, GetHostResponse, HealthCheckResponse, MetricsResponse,
};
use machina_protocol::browser::{BrowserService, CreateSessionRequest, CreateSessionResponse};
use machina_protocol::filesystem::{
    CreateDirectoryRequest, ExistsRequest, ExistsResponse, FileChunk, FilesystemService,
    GetStatsRequest, GetStatsResponse, ReadDirectoryRequest, ReadDirectoryResponse,
    ReadFileRequest, ReadFileResponse, ReadFileStreamRequest, RenameRequest, UnlinkRequest,
    WatchEventFrame, WatchRequest, WriteFileRequest, FileFormat,
};
use machina_protocol::terminal::{
    ConnectToProcessRequest, ListProcessesResponse, ProcessEventFrame, ProcessRecord,
    SendInputRequest, SendSignalRequest, SpawnProcessRequest, TerminalService,
    UpdateProcessRequest,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

fn ensure_open(closed: &AtomicBool) -> Result<()> {
    if closed.load(Ordering::SeqCst) {
        Err(Error::ChannelClosed)
    } else {
        Ok(())
    }
}

// ============================================================================
// Terminal
// ============================================================================

#[derive(Default)]
pub struct FakeTerminal {
    closed: AtomicBool,
    /// Frames replayed for each spawn stream.
    pub spawn_frames: Mutex<Vec<ProcessEventFrame>>,
    /// Frames replayed for each connect stream.
    pub connect_frames: Mutex<Vec<ProcessEventFrame>>,
    pub processes: Mutex<Vec<ProcessRecord>>,
    pub list_error: Mutex<Option<String>>,
    pub spawn_requests: Mutex<Vec<SpawnProcessRequest>>,
    pub inputs: Mutex<Vec<SendInputRequest>>,
    pub resizes: Mutex<Vec<UpdateProcessRequest>>,
    pub signals: Mutex<Vec<SendSignalRequest>>,
    pub input_ack: Mutex<Option<Ack>>,
    pub signal_ack: Mutex<Option<Ack>>,
}

impl FakeTerminal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_spawn_frames(frames: Vec<ProcessEventFrame>) -> Self {
        let fake = Self::new();
        *fake.spawn_frames.lock().unwrap() = frames;
        fake
    }

    pub fn set_signal_ack(&self, ack: Ack) {
        *self.signal_ack.lock().unwrap() = Some(ack);
    }
}

#[async_trait]
impl TerminalService for FakeTerminal {
    async fn list_processes(&self) -> Result<ListProcessesResponse> {
        ensure_open(&self.closed)?;
        if let Some(error) = self.list_error.lock().unwrap().clone() {
            return Ok(ListProcessesResponse {
                success: false,
                error,
                processes: Vec::new(),
            });
        }
        Ok(ListProcessesResponse {
            success: true,
            error: String::new(),
            processes: self.processes.lock().unwrap().clone(),
        })
    }

    async fn spawn_process(
        &self,
        request: SpawnProcessRequest,
    ) -> Result<EventStream<ProcessEventFrame>> {
        ensure_open(&self.closed)?;
        self.spawn_requests.lock().unwrap().push(request);
        Ok(EventStream::preloaded(
            self.spawn_frames.lock().unwrap().clone(),
        ))
    }

    async fn connect_to_process(
        &self,
        _request: ConnectToProcessRequest,
    ) -> Result<EventStream<ProcessEventFrame>> {
        ensure_open(&self.closed)?;
        Ok(EventStream::preloaded(
            self.connect_frames.lock().unwrap().clone(),
        ))
    }

    async fn send_input(&self, request: SendInputRequest) -> Result<Ack> {
        ensure_open(&self.closed)?;
        self.inputs.lock().unwrap().push(request);
        Ok(self.input_ack.lock().unwrap().clone().unwrap_or_else(Ack::ok))
    }

    async fn update_process(&self, request: UpdateProcessRequest) -> Result<Ack> {
        ensure_open(&self.closed)?;
        self.resizes.lock().unwrap().push(request);
        Ok(Ack::ok())
    }

    async fn send_signal(&self, request: SendSignalRequest) -> Result<Ack> {
        ensure_open(&self.closed)?;
        self.signals.lock().unwrap().push(request);
        Ok(self.signal_ack.lock().unwrap().clone().unwrap_or_else(Ack::ok))
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Filesystem
// ============================================================================

#[derive(Default)]
pub struct FakeFilesystem {
    closed: AtomicBool,
    files: Mutex<HashMap<String, Vec<u8>>>,
    dirs: Mutex<HashSet<String>>,
    /// Frames replayed for each watch stream; ignored when
    /// `endless_watch` is set.
    pub watch_frames: Mutex<Vec<WatchEventFrame>>,
    /// Keep emitting the first watch frame until the consumer cancels.
    pub endless_watch: AtomicBool,
    pub watch_requests: Mutex<Vec<WatchRequest>>,
    /// Chunk size used by read_file_stream.
    pub chunk_size: usize,
}

impl FakeFilesystem {
    pub fn new() -> Self {
        Self {
            chunk_size: 4,
            ..Self::default()
        }
    }

    pub fn with_file(self, path: &str, contents: &[u8]) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), contents.to_vec());
        self
    }

    pub fn file_contents(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }
}

#[async_trait]
impl FilesystemService for FakeFilesystem {
    async fn read_file(&self, request: ReadFileRequest) -> Result<ReadFileResponse> {
        ensure_open(&self.closed)?;
        let files = self.files.lock().unwrap();
        let Some(contents) = files.get(&request.path) else {
            return Ok(ReadFileResponse {
                success: false,
                error: format!("no such file: {}", request.path),
                ..Default::default()
            });
        };
        let mut response = ReadFileResponse {
            success: true,
            ..Default::default()
        };
        match request.format {
            FileFormat::Text => {
                response.content = String::from_utf8_lossy(contents).into_owned();
            }
            FileFormat::Bytes => response.binary = contents.clone(),
        }
        Ok(response)
    }

    async fn read_file_stream(
        &self,
        request: ReadFileStreamRequest,
    ) -> Result<EventStream<FileChunk>> {
        ensure_open(&self.closed)?;
        let files = self.files.lock().unwrap();
        let Some(contents) = files.get(&request.path) else {
            return Ok(EventStream::preloaded(vec![FileChunk::error(
                request.path.clone(),
                format!("no such file: {}", request.path),
            )]));
        };
        let mut frames: Vec<FileChunk> = contents
            .chunks(self.chunk_size.max(1))
            .map(|chunk| FileChunk::data(request.path.clone(), chunk.to_vec()))
            .collect();
        frames.push(FileChunk::end(request.path.clone()));
        Ok(EventStream::preloaded(frames))
    }

    async fn write_file(&self, request: WriteFileRequest) -> Result<Ack> {
        ensure_open(&self.closed)?;
        let contents = match request.format {
            FileFormat::Text => request.content.into_bytes(),
            FileFormat::Bytes => request.binary,
        };
        self.files.lock().unwrap().insert(request.path, contents);
        Ok(Ack::ok())
    }

    async fn write_file_stream(&self, mut chunks: EventStream<FileChunk>) -> Result<Ack> {
        ensure_open(&self.closed)?;
        let mut path = String::new();
        let mut assembled = Vec::new();
        while let Some(chunk) = chunks.next().await {
            path = chunk.path.clone();
            assembled.extend_from_slice(&chunk.content);
            if chunk.end {
                self.files.lock().unwrap().insert(path, assembled);
                return Ok(Ack::ok());
            }
        }
        Ok(Ack::err(format!("transfer aborted: {path}")))
    }

    async fn read_directory(&self, request: ReadDirectoryRequest) -> Result<ReadDirectoryResponse> {
        ensure_open(&self.closed)?;
        let prefix = format!("{}/", request.path.trim_end_matches('/'));
        let files = self.files.lock().unwrap();
        let names: Vec<String> = files
            .keys()
            .filter_map(|path| path.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(str::to_string)
            .collect();
        Ok(ReadDirectoryResponse {
            success: true,
            error: String::new(),
            files: names,
        })
    }

    async fn create_directory(&self, request: CreateDirectoryRequest) -> Result<Ack> {
        ensure_open(&self.closed)?;
        self.dirs.lock().unwrap().insert(request.path);
        Ok(Ack::ok())
    }

    async fn rename(&self, request: RenameRequest) -> Result<Ack> {
        ensure_open(&self.closed)?;
        let mut files = self.files.lock().unwrap();
        match files.remove(&request.old_path) {
            Some(contents) => {
                files.insert(request.new_path, contents);
                Ok(Ack::ok())
            }
            None => Ok(Ack::err(format!("no such file: {}", request.old_path))),
        }
    }

    async fn unlink(&self, request: UnlinkRequest) -> Result<Ack> {
        ensure_open(&self.closed)?;
        match self.files.lock().unwrap().remove(&request.path) {
            Some(_) => Ok(Ack::ok()),
            None => Ok(Ack::err(format!("no such file: {}", request.path))),
        }
    }

    async fn exists(&self, request: ExistsRequest) -> Result<ExistsResponse> {
        ensure_open(&self.closed)?;
        let exists = self.files.lock().unwrap().contains_key(&request.path)
            || self.dirs.lock().unwrap().contains(&request.path);
        Ok(ExistsResponse {
            success: true,
            error: String::new(),
            exists,
        })
    }

    async fn get_stats(&self, request: GetStatsRequest) -> Result<GetStatsResponse> {
        ensure_open(&self.closed)?;
        if let Some(contents) = self.files.lock().unwrap().get(&request.path) {
            return Ok(GetStatsResponse {
                success: true,
                is_file: true,
                size: contents.len() as u64,
                modified_time: "2024-01-01T00:00:00Z".to_string(),
                ..Default::default()
            });
        }
        if self.dirs.lock().unwrap().contains(&request.path) {
            return Ok(GetStatsResponse {
                success: true,
                is_directory: true,
                modified_time: "2024-01-01T00:00:00Z".to_string(),
                ..Default::default()
            });
        }
        Ok(GetStatsResponse {
            success: false,
            error: format!("no such path: {}", request.path),
            ..Default::default()
        })
    }

    async fn watch(&self, request: WatchRequest) -> Result<EventStream<WatchEventFrame>> {
        ensure_open(&self.closed)?;
        self.watch_requests.lock().unwrap().push(request);
        if self.endless_watch.load(Ordering::SeqCst) {
            let frame = self
                .watch_frames
                .lock()
                .unwrap()
                .first()
                .cloned()
                .expect("endless_watch requires at least one frame");
            let (sink, stream) = EventStream::channel(4);
            tokio::spawn(async move {
                while sink.send(frame.clone()).await.is_ok() {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
            });
            return Ok(stream);
        }
        Ok(EventStream::preloaded(
            self.watch_frames.lock().unwrap().clone(),
        ))
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Browser
// ============================================================================

#[derive(Default)]
pub struct FakeBrowser {
    closed: AtomicBool,
    pub response: Mutex<Option<CreateSessionResponse>>,
    pub requests: Mutex<Vec<CreateSessionRequest>>,
    pub terminations: AtomicU32,
    pub terminate_ack: Mutex<Option<Ack>>,
}

impl FakeBrowser {
    pub fn new(cdp_port: u32) -> Self {
        let fake = Self::default();
        *fake.response.lock().unwrap() = Some(CreateSessionResponse {
            success: true,
            error: String::new(),
            cdp_port,
        });
        fake
    }

    pub fn failing(error: &str) -> Self {
        let fake = Self::default();
        *fake.response.lock().unwrap() = Some(CreateSessionResponse {
            success: false,
            error: error.to_string(),
            cdp_port: 0,
        });
        fake
    }
}

#[async_trait]
impl BrowserService for FakeBrowser {
    async fn create_session(&self, request: CreateSessionRequest) -> Result<CreateSessionResponse> {
        ensure_open(&self.closed)?;
        self.requests.lock().unwrap().push(request);
        Ok(self
            .response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_default())
    }

    async fn terminate_session(&self) -> Result<Ack> {
        ensure_open(&self.closed)?;
        self.terminations.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .terminate_ack
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(Ack::ok))
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Agent
// ============================================================================

pub struct FakeAgent {
    closed: AtomicBool,
    pub healthy: AtomicBool,
    pub metrics: Mutex<MetricsResponse>,
    pub host: Mutex<GetHostResponse>,
}

impl Default for FakeAgent {
    fn default() -> Self {
        Self {
            closed: AtomicBool::new(false),
            healthy: AtomicBool::new(true),
            metrics: Mutex::new(MetricsResponse {
                success: true,
                cpu_count: 2,
                mem_total_mib: 2048,
                ..Default::default()
            }),
            host: Mutex::new(GetHostResponse {
                success: true,
                error: String::new(),
                host: "inst.example.dev".to_string(),
            }),
        }
    }
}

impl FakeAgent {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AgentService for FakeAgent {
    async fn health_check(&self) -> Result<HealthCheckResponse> {
        ensure_open(&self.closed)?;
        Ok(HealthCheckResponse {
            success: self.healthy.load(Ordering::SeqCst),
            error: String::new(),
        })
    }

    async fn get_metrics(&self) -> Result<MetricsResponse> {
        ensure_open(&self.closed)?;
        Ok(self.metrics.lock().unwrap().clone())
    }

    async fn get_host(&self, _request: GetHostRequest) -> Result<GetHostResponse> {
        ensure_open(&self.closed)?;
        Ok(self.host.lock().unwrap().clone())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Frames for the canonical `echo hi` scenario: spawn, one stdout line,
/// clean exit.
pub fn echo_hi_frames(pid: u32) -> Vec<ProcessEventFrame> {
    vec![
        ProcessEventFrame::spawn(pid),
        ProcessEventFrame::stdout(pid, b"hi\n".to_vec()),
        ProcessEventFrame::exit(pid, 0),
    ]
}
