//! Filesystem service: wire shapes and service definition.

use crate::Ack;
use async_trait::async_trait;
use machina_core::{EventStream, Result};
use serde::{Deserialize, Serialize};

/// How file content travels on the wire for whole-file reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Text,
    Bytes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadFileRequest {
    pub path: String,
    pub format: FileFormat,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadFileResponse {
    pub success: bool,
    #[serde(default)]
    pub error: String,
    /// Populated for `format = text`.
    #[serde(default)]
    pub content: String,
    /// Populated for `format = bytes`.
    #[serde(default)]
    pub binary: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteFileRequest {
    pub path: String,
    pub format: FileFormat,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub binary: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadFileStreamRequest {
    pub path: String,
}

/// One element of a chunked file transfer, in either direction.
///
/// A chunk with `end = true` is the explicit end marker; a chunk with a
/// non-empty `error` terminates the transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChunk {
    pub path: String,
    #[serde(default)]
    pub content: Vec<u8>,
    #[serde(default)]
    pub end: bool,
    #[serde(default)]
    pub error: String,
}

impl FileChunk {
    pub fn data(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            end: false,
            error: String::new(),
        }
    }

    pub fn end(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: Vec::new(),
            end: true,
            error: String::new(),
        }
    }

    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: Vec::new(),
            end: false,
            error: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadDirectoryRequest {
    pub path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadDirectoryResponse {
    pub success: bool,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDirectoryRequest {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameRequest {
    pub old_path: String,
    pub new_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlinkRequest {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExistsRequest {
    pub path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExistsResponse {
    pub success: bool,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub exists: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetStatsRequest {
    pub path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetStatsResponse {
    pub success: bool,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub is_directory: bool,
    #[serde(default)]
    pub is_file: bool,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub modified_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchRequest {
    pub path: String,
    pub recursive: bool,
    /// Bit set of event categories to deliver; all bits set means every
    /// category.
    pub events: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchEventKind {
    #[default]
    Create,
    Modify,
    Delete,
    Rename,
}

/// One element of a watch stream.
///
/// A frame with a non-empty `error` terminates the subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchEventFrame {
    pub path: String,
    #[serde(default)]
    pub kind: WatchEventKind,
    /// Previous path, set only for renames.
    #[serde(default)]
    pub old_path: String,
    #[serde(default)]
    pub is_directory: bool,
    #[serde(default)]
    pub error: String,
}

impl WatchEventFrame {
    pub fn event(path: impl Into<String>, kind: WatchEventKind, is_directory: bool) -> Self {
        Self {
            path: path.into(),
            kind,
            old_path: String::new(),
            is_directory,
            error: String::new(),
        }
    }

    pub fn rename(
        path: impl Into<String>,
        old_path: impl Into<String>,
        is_directory: bool,
    ) -> Self {
        Self {
            old_path: old_path.into(),
            ..Self::event(path, WatchEventKind::Rename, is_directory)
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            path: String::new(),
            kind: WatchEventKind::default(),
            old_path: String::new(),
            is_directory: false,
            error: message.into(),
        }
    }
}

/// Filesystem service for one computer instance.
///
/// Same channel rules as the terminal service: one scope per channel,
/// closing the channel invalidates all derived streams and handles.
#[async_trait]
pub trait FilesystemService: Send + Sync {
    async fn read_file(&self, request: ReadFileRequest) -> Result<ReadFileResponse>;

    async fn read_file_stream(
        &self,
        request: ReadFileStreamRequest,
    ) -> Result<EventStream<FileChunk>>;

    async fn write_file(&self, request: WriteFileRequest) -> Result<Ack>;

    /// Client-streaming write: consumes chunks until the end marker and
    /// resolves to a single acknowledgement.
    async fn write_file_stream(&self, chunks: EventStream<FileChunk>) -> Result<Ack>;

    async fn read_directory(&self, request: ReadDirectoryRequest) -> Result<ReadDirectoryResponse>;

    async fn create_directory(&self, request: CreateDirectoryRequest) -> Result<Ack>;

    async fn rename(&self, request: RenameRequest) -> Result<Ack>;

    async fn unlink(&self, request: UnlinkRequest) -> Result<Ack>;

    async fn exists(&self, request: ExistsRequest) -> Result<ExistsResponse>;

    async fn get_stats(&self, request: GetStatsRequest) -> Result<GetStatsResponse>;

    async fn watch(&self, request: WatchRequest) -> Result<EventStream<WatchEventFrame>>;

    /// Closes the underlying channel.
    async fn close(&self) -> Result<()>;
}
