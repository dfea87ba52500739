//! Wire types for resumable media uploads and long-running operations.
//!
//! Everything in this crate is plain data: request bodies, the JSON
//! operation resource, and the client-side entities derived from server
//! responses. Nothing here performs I/O.

pub mod constants;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use messages::{OperationResource, StartUploadRequest, UploadMetadata};
pub use types::{
    MediaReference, Operation, OperationError, OperationStatus, UploadProgress, UploadSession,
};

/// Errors produced when constructing protocol values.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("invalid progress: {committed} bytes committed of {total}")]
    InvalidProgress { committed: u64, total: u64 },
}
