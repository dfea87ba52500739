//! Transfer primitives for resumable uploads.
//!
//! Reads bounded windows from a seekable byte source, interprets the
//! server's committed-range header, and computes retry backoff. Nothing in
//! this crate talks to the network, so each piece is testable on its own.

mod chunked;
mod range;
mod retry;

pub use chunked::{ByteSource, read_window, source_len};
pub use range::{content_range, parse_committed_range};
pub use retry::{
    JITTER_WINDOW_MS, MAX_BACKOFF_EXPONENT, RetryDecision, RetryPolicy, compute_backoff,
};

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
