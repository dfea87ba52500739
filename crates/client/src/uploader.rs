//! Resumable upload orchestration.
//!
//! Opens a session, walks the source window by window through the
//! [`ChunkUploader`], retries transient failures of a window with backoff,
//! and always continues from the offset the server reports as committed.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;
use vidrelay_protocol::constants::{DEFAULT_CHUNK_SIZE, HEADER_LOCATION};
use vidrelay_protocol::{
    MediaReference, StartUploadRequest, UploadMetadata, UploadProgress, UploadSession,
};
use vidrelay_transfer::{ByteSource, RetryPolicy, source_len};

use crate::ClientError;
use crate::chunk::ChunkUploader;
use crate::requester::{Requester, sleep_or_cancel};
use crate::transport::{HttpRequest, Method};

/// Progress notifications emitted while an upload runs.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    /// A session was opened for `total_bytes`.
    Started { upload_id: String, total_bytes: u64 },
    /// The server confirmed `committed` of `total` bytes.
    Progress { committed: u64, total: u64 },
    /// The window at `offset` is re-sent after `delay`.
    Retrying {
        offset: u64,
        attempt: u32,
        delay: Duration,
    },
    /// The upload finished and was finalized.
    Completed { media: MediaReference },
}

/// Drives resumable uploads against one upload endpoint.
///
/// An uploader may run several uploads concurrently; each call owns its
/// own session, source and offset.
pub struct Uploader {
    requester: Requester,
    chunks: ChunkUploader,
    upload_url: String,
    policy: RetryPolicy,
    rng: Mutex<StdRng>,
    events: Option<mpsc::Sender<UploadEvent>>,
}

impl Uploader {
    pub fn new(requester: Requester, upload_url: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            chunks: ChunkUploader::new(requester.clone()),
            requester,
            upload_url: upload_url.into(),
            policy,
            rng: Mutex::new(StdRng::from_entropy()),
            events: None,
        }
    }

    /// Replaces the jitter source, e.g. with a seeded one in tests.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    /// Sends [`UploadEvent`]s to `tx`. Events are dropped when the channel
    /// is full or closed; the upload never waits on the receiver.
    pub fn with_events(mut self, tx: mpsc::Sender<UploadEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Announces an upload and opens a session for it.
    ///
    /// The session URI comes from the `Location` header; the upload id is
    /// generated locally. Any non-2xx answer is [`ClientError::UploadInit`]
    /// and is not retried.
    pub async fn start_session(
        &self,
        request: &StartUploadRequest,
        cancel: &CancellationToken,
    ) -> Result<UploadSession, ClientError> {
        let payload = serde_json::to_value(request)?;
        let http = HttpRequest::new(Method::Post, &self.upload_url).json(request)?;
        let resp = self.requester.send(http, &payload, cancel).await?;

        if !resp.is_success() {
            let err = ClientError::UploadInit {
                status: resp.status,
                body: resp.body_text(),
            };
            self.requester.observer().on_error(&self.upload_url, &err);
            return Err(err);
        }

        let location = resp
            .header(HEADER_LOCATION)
            .filter(|v| !v.is_empty())
            .ok_or(ClientError::MissingHeader(HEADER_LOCATION))?;
        let upload_id = Uuid::new_v4().simple().to_string();
        let session = UploadSession::new(location, upload_id)?;

        self.requester.observer().on_response(
            &self.upload_url,
            resp.status,
            &serde_json::to_value(&session)?,
        );
        info!(
            upload_id = %session.upload_id(),
            file = %request.file_name,
            total_bytes = request.total_bytes,
            "upload session started"
        );
        Ok(session)
    }

    /// Uploads the whole source and returns its durable reference.
    pub async fn upload_all<S: ByteSource + ?Sized>(
        &self,
        metadata: &UploadMetadata,
        source: &mut S,
        chunk_size: usize,
        cancel: &CancellationToken,
    ) -> Result<MediaReference, ClientError> {
        check_chunk_size(chunk_size)?;

        let total = source_len(source).await?;
        let session = self.start_session(&metadata.with_size(total), cancel).await?;
        self.emit(UploadEvent::Started {
            upload_id: session.upload_id().to_string(),
            total_bytes: total,
        });

        self.resume(&session, source, 0, chunk_size, cancel).await?;

        let media = self.finalize(&session);
        self.emit(UploadEvent::Completed {
            media: media.clone(),
        });
        info!(media_id = %media.media_id, total_bytes = total, "upload complete");
        Ok(media)
    }

    /// [`upload_all`](Self::upload_all) with the default 256 KiB window.
    pub async fn upload_small<S: ByteSource + ?Sized>(
        &self,
        metadata: &UploadMetadata,
        source: &mut S,
        cancel: &CancellationToken,
    ) -> Result<MediaReference, ClientError> {
        self.upload_all(metadata, source, DEFAULT_CHUNK_SIZE, cancel)
            .await
    }

    /// Continues an existing session from `offset` until the server holds
    /// the whole source.
    ///
    /// `offset` is usually the `committed` value of an earlier
    /// [`ClientError::UploadFailed`] or a persisted checkpoint.
    pub async fn resume<S: ByteSource + ?Sized>(
        &self,
        session: &UploadSession,
        source: &mut S,
        offset: u64,
        chunk_size: usize,
        cancel: &CancellationToken,
    ) -> Result<UploadProgress, ClientError> {
        check_chunk_size(chunk_size)?;

        let total = source_len(source).await?;
        if offset > total {
            return Err(ClientError::InvalidArgument(format!(
                "offset {offset} is past the end of the source ({total} bytes)"
            )));
        }

        let mut offset = offset;
        let mut progress = UploadProgress::partial(offset);
        let mut stalls = 0u32;

        while offset < total {
            let window = usize::try_from(total - offset)
                .map_or(chunk_size, |left| left.min(chunk_size));
            progress = self
                .send_window(session, source, offset, window, cancel)
                .await?;
            let committed = progress.bytes_committed();

            if !progress.is_complete() && committed <= offset {
                stalls += 1;
                if !self.policy.allows(stalls) {
                    return Err(ClientError::UploadFailed {
                        committed,
                        attempts: stalls,
                        last: Box::new(ClientError::Stalled { offset }),
                    });
                }
                warn!(
                    upload_id = %session.upload_id(),
                    offset,
                    committed,
                    stalls,
                    "server did not advance the committed offset"
                );
                self.backoff(stalls, committed, cancel).await?;
            } else {
                stalls = 0;
            }

            // The server's view wins, in either direction.
            offset = committed;
            self.emit(UploadEvent::Progress {
                committed: offset,
                total,
            });

            if progress.is_complete() {
                break;
            }
        }

        if !progress.is_complete() {
            if offset != total {
                warn!(offset, total, "server committed past the end of the source");
            }
            progress = UploadProgress::complete(total);
        }
        Ok(progress)
    }

    /// Returns the durable reference for a completed session.
    ///
    /// The final chunk response already commits the upload on the server,
    /// so this issues no request and always returns the same reference for
    /// the same session.
    pub fn finalize(&self, session: &UploadSession) -> MediaReference {
        MediaReference {
            media_id: session.upload_id().to_string(),
            uri: session.session_uri().to_string(),
        }
    }

    /// Sends one window, re-sending it from the same offset while failures
    /// are transient and the retry budget lasts.
    async fn send_window<S: ByteSource + ?Sized>(
        &self,
        session: &UploadSession,
        source: &mut S,
        offset: u64,
        window: usize,
        cancel: &CancellationToken,
    ) -> Result<UploadProgress, ClientError> {
        let mut failures = 0u32;
        loop {
            let err = match self
                .chunks
                .upload_chunk(session, source, offset, window, cancel)
                .await
            {
                Ok(progress) => return Ok(progress),
                Err(e) => e,
            };

            match err {
                ClientError::Cancelled
                | ClientError::Io(_)
                | ClientError::Transfer(_)
                | ClientError::InvalidArgument(_) => return Err(err),
                err if err.is_transient() => {
                    failures += 1;
                    if !self.policy.allows(failures) {
                        return Err(ClientError::UploadFailed {
                            committed: offset,
                            attempts: failures,
                            last: Box::new(err),
                        });
                    }
                    debug!(offset, attempt = failures, error = %err, "chunk failed, retrying");
                    self.backoff(failures, offset, cancel).await?;
                }
                err => {
                    return Err(ClientError::UploadFailed {
                        committed: offset,
                        attempts: failures + 1,
                        last: Box::new(err),
                    });
                }
            }
        }
    }

    async fn backoff(
        &self,
        attempt: u32,
        offset: u64,
        cancel: &CancellationToken,
    ) -> Result<(), ClientError> {
        let delay = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            self.policy.backoff(attempt, &mut *rng)
        };
        self.emit(UploadEvent::Retrying {
            offset,
            attempt,
            delay,
        });
        sleep_or_cancel(delay, cancel).await
    }

    fn emit(&self, event: UploadEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.try_send(event);
        }
    }
}

fn check_chunk_size(chunk_size: usize) -> Result<(), ClientError> {
    if chunk_size == 0 {
        return Err(ClientError::InvalidArgument(
            "chunk_size must be greater than zero".into(),
        ));
    }
    Ok(())
}
