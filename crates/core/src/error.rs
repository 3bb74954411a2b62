/// Errors that can occur when using the machina SDK.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A call did not complete before its deadline. Retryable at the
    /// caller's discretion; the SDK never retries on its own.
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// The service asked the caller to back off.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The connection to the service failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// A call was issued through a channel that has been closed.
    #[error("channel is closed")]
    ChannelClosed,

    /// The call completed but the service reported a failure. Carries the
    /// server-provided message verbatim; never retried automatically.
    #[error("service error: {0}")]
    Service(String),

    /// A control call targeted a process whose exit has already been
    /// observed on this client.
    #[error("process {0} has already exited")]
    ProcessExited(u32),

    /// A spawn stream ended or failed before the server assigned a pid.
    #[error("process failed to spawn: {0}")]
    SpawnFailed(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error is worth retrying from the caller's side.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Timeout(_) | Error::RateLimited(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
