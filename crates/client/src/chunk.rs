//! Single-attempt chunk transfer.

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use vidrelay_protocol::constants::{
    HEADER_CONTENT_RANGE, HEADER_CONTENT_TYPE, HEADER_RANGE, HEADER_UPLOAD_ID, MIME_OCTET_STREAM,
    STATUS_RESUME_INCOMPLETE,
};
use vidrelay_protocol::{UploadProgress, UploadSession};
use vidrelay_transfer::{ByteSource, content_range, parse_committed_range, read_window, source_len};

use crate::ClientError;
use crate::requester::Requester;
use crate::transport::{HttpRequest, HttpResponse, Method};

/// Sends one window of the source to an upload session.
///
/// Exactly one request per call and no retries; the [`Uploader`]
/// decides what to do with failures.
///
/// [`Uploader`]: crate::Uploader
#[derive(Clone)]
pub struct ChunkUploader {
    requester: Requester,
}

impl ChunkUploader {
    pub fn new(requester: Requester) -> Self {
        Self { requester }
    }

    /// Reads up to `max_bytes` at `offset` and PUTs them to the session.
    ///
    /// - 308: partial accept. The committed count comes from the `Range`
    ///   header when present, otherwise `offset + bytes_read`.
    /// - 2xx: the whole upload is complete.
    /// - anything else: [`ClientError::Transport`].
    pub async fn upload_chunk<S: ByteSource + ?Sized>(
        &self,
        session: &UploadSession,
        source: &mut S,
        offset: u64,
        max_bytes: usize,
        cancel: &CancellationToken,
    ) -> Result<UploadProgress, ClientError> {
        if max_bytes == 0 {
            return Err(ClientError::InvalidArgument(
                "max_bytes must be greater than zero".into(),
            ));
        }
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        let total = source_len(source).await?;
        let data = read_window(source, offset, max_bytes).await?;
        let read = data.len();

        let request = HttpRequest::new(Method::Put, session.session_uri())
            .header(HEADER_CONTENT_TYPE, MIME_OCTET_STREAM)
            .header(HEADER_CONTENT_RANGE, content_range(offset, read, total))
            .header(HEADER_UPLOAD_ID, session.upload_id())
            .body(data);

        let payload = serde_json::json!({ "offset": offset, "read": read });
        let resp = self.requester.send(request, &payload, cancel).await?;

        let progress = match interpret(&resp, offset, read, total) {
            Ok(p) => p,
            Err(e) => {
                self.requester.observer().on_error(session.session_uri(), &e);
                return Err(e);
            }
        };

        debug!(
            upload_id = %session.upload_id(),
            offset,
            read,
            status = resp.status,
            committed = progress.bytes_committed(),
            "chunk sent"
        );
        self.requester.observer().on_response(
            session.session_uri(),
            resp.status,
            &serde_json::to_value(progress)?,
        );
        Ok(progress)
    }
}

/// Maps a chunk response to progress. The server's range wins over local
/// arithmetic whenever it is present.
fn interpret(
    resp: &HttpResponse,
    offset: u64,
    read: usize,
    total: u64,
) -> Result<UploadProgress, ClientError> {
    let sent_end = offset + read as u64;

    if resp.status == STATUS_RESUME_INCOMPLETE {
        let committed = resp
            .header(HEADER_RANGE)
            .and_then(parse_committed_range)
            .unwrap_or(sent_end);
        return Ok(UploadProgress::partial(committed));
    }

    if resp.is_success() {
        if sent_end != total {
            warn!(
                sent_end,
                total, "server reported completion before the end of the source"
            );
        }
        return Ok(UploadProgress::complete(total));
    }

    Err(ClientError::Transport {
        status: resp.status,
        body: resp.body_text(),
    })
}
