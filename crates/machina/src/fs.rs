//! Filesystem tool: unary file operations and change-notification streams.

use crate::session::{FrameOutcome, StreamFrame, StreamSession};
use machina_core::{CancelHandle, Error, EventSink, EventStream, Result};
use machina_protocol::filesystem::{
    CreateDirectoryRequest, ExistsRequest, FileChunk, FileFormat, FilesystemService,
    GetStatsRequest, ReadDirectoryRequest, ReadFileRequest, ReadFileStreamRequest, RenameRequest,
    UnlinkRequest, WatchEventFrame, WatchEventKind, WatchRequest, WriteFileRequest,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Buffer size for chunked file transfers, in elements.
const FILE_STREAM_CAPACITY: usize = 64;

/// Bit set selecting which watch event categories are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventMask(u32);

impl EventMask {
    pub const CREATE: EventMask = EventMask(1 << 0);
    pub const MODIFY: EventMask = EventMask(1 << 1);
    pub const DELETE: EventMask = EventMask(1 << 2);
    pub const RENAME: EventMask = EventMask(1 << 3);
    /// Every event category; equivalent to leaving the mask unset.
    pub const ALL: EventMask = EventMask(u32::MAX);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: EventMask) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Default for EventMask {
    fn default() -> Self {
        EventMask::ALL
    }
}

impl std::ops::BitOr for EventMask {
    type Output = EventMask;

    fn bitor(self, rhs: EventMask) -> EventMask {
        EventMask(self.0 | rhs.0)
    }
}

/// Parameters for a watch subscription.
#[derive(Debug, Clone, Default)]
pub struct WatchOptions {
    pub recursive: bool,
    pub mask: EventMask,
}

/// A filesystem change observed by a watch subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub path: String,
    pub kind: WatchEventKind,
    /// Previous path, set only for renames.
    pub old_path: Option<String>,
    pub is_directory: bool,
}

impl StreamFrame for WatchEventFrame {
    type Event = WatchEvent;

    fn classify(self) -> Result<FrameOutcome<WatchEvent>> {
        if !self.error.is_empty() {
            return Err(Error::Service(self.error));
        }
        Ok(FrameOutcome::Event(WatchEvent {
            path: self.path,
            kind: self.kind,
            old_path: (!self.old_path.is_empty()).then_some(self.old_path),
            is_directory: self.is_directory,
        }))
    }
}

impl StreamFrame for FileChunk {
    type Event = Vec<u8>;

    fn classify(self) -> Result<FrameOutcome<Vec<u8>>> {
        if !self.error.is_empty() {
            return Err(Error::Service(self.error));
        }
        if self.end {
            return Ok(FrameOutcome::End);
        }
        if self.content.is_empty() {
            return Ok(FrameOutcome::Skip);
        }
        Ok(FrameOutcome::Event(self.content))
    }
}

/// Live feed of change events for one watch subscription.
pub type WatchStream = StreamSession<WatchEventFrame>;

/// Chunked content of one remote file, ended by an explicit end marker.
pub type FileStream = StreamSession<FileChunk>;

/// Cancellation capability for one watch subscription, bound 1:1 to its
/// stream.
#[derive(Debug, Clone)]
pub struct WatchHandle {
    cancel: CancelHandle,
}

impl WatchHandle {
    /// Stops the subscription. Idempotent and best-effort: events already
    /// delivered stay delivered, and none arrive once the transport
    /// observes the cancellation.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Point-in-time stats for a file or directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStats {
    pub is_directory: bool,
    pub is_file: bool,
    pub size: u64,
    pub modified_time: String,
}

/// Filesystem access for one computer instance.
pub struct Filesystem {
    service: Arc<dyn FilesystemService>,
}

impl Filesystem {
    pub fn new(service: Arc<dyn FilesystemService>) -> Self {
        Self { service }
    }

    /// Closes the filesystem channel. Every stream and handle derived
    /// from this tool fails afterwards.
    pub async fn close(&self) -> Result<()> {
        self.service.close().await
    }

    /// Reads a file as text.
    pub async fn read_file(&self, path: &str) -> Result<String> {
        let response = self
            .service
            .read_file(ReadFileRequest {
                path: path.to_string(),
                format: FileFormat::Text,
            })
            .await?;
        if !response.success {
            return Err(Error::Service(response.error));
        }
        Ok(response.content)
    }

    /// Reads a file as raw bytes.
    pub async fn read_file_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let response = self
            .service
            .read_file(ReadFileRequest {
                path: path.to_string(),
                format: FileFormat::Bytes,
            })
            .await?;
        if !response.success {
            return Err(Error::Service(response.error));
        }
        Ok(response.binary)
    }

    /// Writes text content to a file, replacing it.
    pub async fn write_file(&self, path: &str, contents: &str) -> Result<()> {
        self.service
            .write_file(WriteFileRequest {
                path: path.to_string(),
                format: FileFormat::Text,
                content: contents.to_string(),
                binary: Vec::new(),
            })
            .await?
            .into_result()
    }

    /// Writes raw bytes to a file, replacing it.
    pub async fn write_file_bytes(&self, path: &str, contents: &[u8]) -> Result<()> {
        self.service
            .write_file(WriteFileRequest {
                path: path.to_string(),
                format: FileFormat::Bytes,
                content: String::new(),
                binary: contents.to_vec(),
            })
            .await?
            .into_result()
    }

    /// Lists the names of entries in a directory.
    pub async fn read_directory(&self, path: &str) -> Result<Vec<String>> {
        let response = self
            .service
            .read_directory(ReadDirectoryRequest {
                path: path.to_string(),
            })
            .await?;
        if !response.success {
            return Err(Error::Service(response.error));
        }
        Ok(response.files)
    }

    pub async fn create_directory(&self, path: &str) -> Result<()> {
        self.service
            .create_directory(CreateDirectoryRequest {
                path: path.to_string(),
            })
            .await?
            .into_result()
    }

    pub async fn rename(&self, old_path: &str, new_path: &str) -> Result<()> {
        self.service
            .rename(RenameRequest {
                old_path: old_path.to_string(),
                new_path: new_path.to_string(),
            })
            .await?
            .into_result()
    }

    /// Deletes a file or directory.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.service
            .unlink(UnlinkRequest {
                path: path.to_string(),
            })
            .await?
            .into_result()
    }

    pub async fn exists(&self, path: &str) -> Result<bool> {
        let response = self
            .service
            .exists(ExistsRequest {
                path: path.to_string(),
            })
            .await?;
        if !response.success {
            return Err(Error::Service(response.error));
        }
        Ok(response.exists)
    }

    pub async fn stats(&self, path: &str) -> Result<FileStats> {
        let response = self
            .service
            .get_stats(GetStatsRequest {
                path: path.to_string(),
            })
            .await?;
        if !response.success {
            return Err(Error::Service(response.error));
        }
        Ok(FileStats {
            is_directory: response.is_directory,
            is_file: response.is_file,
            size: response.size,
            modified_time: response.modified_time,
        })
    }

    /// Subscribes to change events under a path.
    ///
    /// The returned stream is a live, possibly-infinite feed; it is never
    /// materialized eagerly. Stop it by dropping the stream or calling
    /// [`WatchHandle::stop`] on the paired handle.
    pub async fn watch(
        &self,
        path: &str,
        options: WatchOptions,
    ) -> Result<(WatchStream, WatchHandle)> {
        let stream = self
            .service
            .watch(WatchRequest {
                path: path.to_string(),
                recursive: options.recursive,
                events: options.mask.bits(),
            })
            .await?;
        tracing::debug!(session_id = %Uuid::new_v4(), path, "opened watch stream");
        let handle = WatchHandle {
            cancel: stream.cancel_handle(),
        };
        Ok((StreamSession::new(stream), handle))
    }

    /// Reads a file as a stream of chunks.
    pub async fn read_file_stream(&self, path: &str) -> Result<FileStream> {
        let stream = self
            .service
            .read_file_stream(ReadFileStreamRequest {
                path: path.to_string(),
            })
            .await?;
        Ok(StreamSession::new(stream))
    }

    /// Opens a chunked writer for a remote file.
    ///
    /// Chunks are pushed with [`FileWriter::write`]; [`FileWriter::finish`]
    /// sends the end marker and resolves to the single server
    /// acknowledgement. Dropping the writer without finishing cancels the
    /// transfer.
    pub async fn write_file_stream(&self, path: &str) -> Result<FileWriter> {
        let (sink, stream) = EventStream::channel(FILE_STREAM_CAPACITY);
        let service = Arc::clone(&self.service);
        let call = tokio::spawn(async move { service.write_file_stream(stream).await });
        Ok(FileWriter {
            path: path.to_string(),
            sink: Some(sink),
            call,
        })
    }
}

/// Client-streaming writer for one remote file.
pub struct FileWriter {
    path: String,
    sink: Option<EventSink<FileChunk>>,
    call: JoinHandle<Result<machina_protocol::Ack>>,
}

impl FileWriter {
    /// Sends one chunk, suspending while the transfer buffer is full.
    pub async fn write(&mut self, data: &[u8]) -> Result<()> {
        let Some(sink) = &self.sink else {
            return Err(Error::ChannelClosed);
        };
        sink.send(FileChunk::data(self.path.clone(), data.to_vec()))
            .await
    }

    /// Sends the end marker and awaits the server acknowledgement.
    pub async fn finish(mut self) -> Result<()> {
        if let Some(sink) = self.sink.take() {
            sink.send(FileChunk::end(self.path.clone())).await?;
        }
        match (&mut self.call).await {
            Ok(ack) => ack?.into_result(),
            Err(_) => Err(Error::Transport(
                "write stream terminated unexpectedly".to_string(),
            )),
        }
    }
}

impl Drop for FileWriter {
    fn drop(&mut self) {
        if self.sink.is_some() {
            self.call.abort();
        }
    }
}
