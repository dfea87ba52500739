//! Client for resumable media uploads and long-running operations.
//!
//! - [`Uploader`] opens an upload session and sends the source in windows,
//!   retrying transient failures and following the server's committed
//!   offset.
//! - [`OperationPoller`] submits work and watches the resulting operation
//!   until it reaches a terminal state.
//! - [`MediaClient`] wires both to a [`ClientConfig`], a [`Transport`] and a
//!   [`CredentialProvider`].
//!
//! All long-running calls take a [`CancellationToken`]; cancellation is
//! observed before every request and during every backoff or poll wait.

mod auth;
mod chunk;
mod client;
mod config;
mod error;
mod observe;
mod poller;
mod requester;
mod transport;
mod uploader;

#[cfg(feature = "reqwest")]
mod reqwest_transport;

#[cfg(test)]
mod mock;

pub use auth::{Credential, CredentialFuture, CredentialProvider};
pub use chunk::ChunkUploader;
pub use client::MediaClient;
pub use config::{CREDENTIAL_ENV_VARS, ClientConfig};
pub use error::ClientError;
pub use observe::{
    EVENT_ERROR, EVENT_REQUEST, EVENT_RESPONSE, NoopObserver, Observer, TracingObserver, redact,
};
pub use poller::{OperationPoller, PollState};
pub use requester::Requester;
pub use transport::{HttpRequest, HttpResponse, Method, Transport, TransportFuture};
pub use uploader::{UploadEvent, Uploader};

#[cfg(feature = "reqwest")]
pub use reqwest_transport::ReqwestTransport;

pub use tokio_util::sync::CancellationToken;
pub use vidrelay_protocol as protocol;
pub use vidrelay_transfer::RetryPolicy;
