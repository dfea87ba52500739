//! Client error types.

use std::time::Duration;

use vidrelay_protocol::ProtocolError;
use vidrelay_transfer::{RetryPolicy, TransferError};

/// Errors produced by uploads and operation polling.
///
/// A FAILED operation is not an error: it comes back as an
/// [`Operation`](vidrelay_protocol::Operation) carrying its
/// [`OperationError`](vidrelay_protocol::OperationError).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to start upload: HTTP {status}: {body}")]
    UploadInit { status: u16, body: String },

    #[error("HTTP {status}: {body}")]
    Transport { status: u16, body: String },

    #[error("connection error: {0}")]
    Connection(String),

    #[error("upload failed at byte {committed} after {attempts} attempt(s): {last}")]
    UploadFailed {
        /// Last offset the server confirmed; resume from here.
        committed: u64,
        attempts: u32,
        #[source]
        last: Box<ClientError>,
    },

    #[error("server made no progress past byte {offset}")]
    Stalled { offset: u64 },

    #[error("cancelled")]
    Cancelled,

    #[error("timed out after {elapsed:?}")]
    TimedOut { elapsed: Duration },

    #[error("missing response header: {0}")]
    MissingHeader(&'static str),

    #[error("credential error: {0}")]
    Credential(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl ClientError {
    /// Whether repeating the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Transport { status, .. } => RetryPolicy::should_retry(*status),
            ClientError::Connection(_) | ClientError::Stalled { .. } => true,
            _ => false,
        }
    }

    /// HTTP status behind this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::UploadInit { status, .. } | ClientError::Transport { status, .. } => {
                Some(*status)
            }
            ClientError::UploadFailed { last, .. } => last.status(),
            _ => None,
        }
    }
}
