use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Handle for an in-progress resumable upload.
///
/// The session URI is assigned by the server, the upload id by the client.
/// Both are fixed for the lifetime of the session, so a caller can persist
/// the pair together with the last committed offset and resume later.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "SessionParts")]
pub struct UploadSession {
    session_uri: String,
    upload_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionParts {
    session_uri: String,
    upload_id: String,
}

impl TryFrom<SessionParts> for UploadSession {
    type Error = ProtocolError;

    fn try_from(parts: SessionParts) -> Result<Self, Self::Error> {
        UploadSession::new(parts.session_uri, parts.upload_id)
    }
}

impl UploadSession {
    /// Creates a session handle. Neither part may be empty.
    pub fn new(
        session_uri: impl Into<String>,
        upload_id: impl Into<String>,
    ) -> Result<Self, ProtocolError> {
        let session_uri = session_uri.into();
        let upload_id = upload_id.into();
        if session_uri.is_empty() {
            return Err(ProtocolError::EmptyField("session_uri"));
        }
        if upload_id.is_empty() {
            return Err(ProtocolError::EmptyField("upload_id"));
        }
        Ok(Self {
            session_uri,
            upload_id,
        })
    }

    pub fn session_uri(&self) -> &str {
        &self.session_uri
    }

    pub fn upload_id(&self) -> &str {
        &self.upload_id
    }
}

/// Outcome of a single chunk transfer.
///
/// `total_bytes` is only set once the server has accepted the whole
/// payload, and then equals `bytes_committed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ProgressParts")]
pub struct UploadProgress {
    bytes_committed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    total_bytes: Option<u64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgressParts {
    bytes_committed: u64,
    #[serde(default)]
    total_bytes: Option<u64>,
}

impl TryFrom<ProgressParts> for UploadProgress {
    type Error = ProtocolError;

    fn try_from(parts: ProgressParts) -> Result<Self, Self::Error> {
        UploadProgress::from_parts(parts.bytes_committed, parts.total_bytes)
    }
}

impl UploadProgress {
    /// Server holds `bytes_committed` bytes and expects more.
    pub fn partial(bytes_committed: u64) -> Self {
        Self {
            bytes_committed,
            total_bytes: None,
        }
    }

    /// Server accepted the full payload of `total_bytes`.
    pub fn complete(total_bytes: u64) -> Self {
        Self {
            bytes_committed: total_bytes,
            total_bytes: Some(total_bytes),
        }
    }

    /// Rebuilds a progress value from persisted parts, checking the invariant.
    pub fn from_parts(bytes_committed: u64, total_bytes: Option<u64>) -> Result<Self, ProtocolError> {
        match total_bytes {
            Some(total) if total != bytes_committed => Err(ProtocolError::InvalidProgress {
                committed: bytes_committed,
                total,
            }),
            _ => Ok(Self {
                bytes_committed,
                total_bytes,
            }),
        }
    }

    pub fn bytes_committed(&self) -> u64 {
        self.bytes_committed
    }

    pub fn total_bytes(&self) -> Option<u64> {
        self.total_bytes
    }

    pub fn is_complete(&self) -> bool {
        self.total_bytes.is_some()
    }

    /// Returns the committed share of `source_len` as a percentage (0-100).
    pub fn percentage(&self, source_len: u64) -> f64 {
        if source_len == 0 {
            return if self.is_complete() { 100.0 } else { 0.0 };
        }
        (self.bytes_committed.min(source_len) as f64 / source_len as f64) * 100.0
    }
}

/// Durable reference to uploaded media, usable in generation requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaReference {
    pub media_id: String,
    pub uri: String,
}

/// Lifecycle state of a long-running operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Pending,
    Done,
    Failed,
}

impl OperationStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, OperationStatus::Pending)
    }
}

/// Structured failure reported by the server for a FAILED operation.
///
/// This is business data, not a client error: callers inspect it and
/// surface it to the end user as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Read-only snapshot of a server-side long-running task.
///
/// Constructors keep the invariants: a result only on DONE, an error only
/// on FAILED.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    name: String,
    status: OperationStatus,
    result: Option<serde_json::Value>,
    error: Option<OperationError>,
    metadata: Option<serde_json::Value>,
}

impl Operation {
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: OperationStatus::Pending,
            result: None,
            error: None,
            metadata: None,
        }
    }

    pub fn done(name: impl Into<String>, result: Option<serde_json::Value>) -> Self {
        Self {
            name: name.into(),
            status: OperationStatus::Done,
            result,
            error: None,
            metadata: None,
        }
    }

    pub fn failed(name: impl Into<String>, error: OperationError) -> Self {
        Self {
            name: name.into(),
            status: OperationStatus::Failed,
            result: None,
            error: Some(error),
            metadata: None,
        }
    }

    /// Attaches server-supplied progress metadata.
    pub fn with_metadata(mut self, metadata: Option<serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> OperationStatus {
        self.status
    }

    pub fn result(&self) -> Option<&serde_json::Value> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&OperationError> {
        self.error.as_ref()
    }

    pub fn metadata(&self) -> Option<&serde_json::Value> {
        self.metadata.as_ref()
    }

    pub fn is_done(&self) -> bool {
        self.status == OperationStatus::Done
    }

    pub fn is_failed(&self) -> bool {
        self.status == OperationStatus::Failed
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
