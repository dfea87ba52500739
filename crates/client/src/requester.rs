//! Shared request plumbing: credential, observation, cancellation.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::ClientError;
use crate::auth::CredentialProvider;
use crate::observe::Observer;
use crate::transport::{HttpRequest, HttpResponse, Transport};

/// Sends single requests on behalf of the uploader and the poller.
///
/// Cheap to clone; the transport is shared and stateless from our side.
#[derive(Clone)]
pub struct Requester {
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialProvider>,
    observer: Arc<dyn Observer>,
}

impl Requester {
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialProvider>,
        observer: Arc<dyn Observer>,
    ) -> Self {
        Self {
            transport,
            credentials,
            observer,
        }
    }

    pub fn observer(&self) -> &dyn Observer {
        self.observer.as_ref()
    }

    /// Attaches the credential and performs exactly one exchange.
    ///
    /// Cancellation is checked before anything is sent, and an in-flight
    /// exchange is abandoned as soon as `cancel` fires. `payload` is only
    /// used for observation.
    pub async fn send(
        &self,
        mut request: HttpRequest,
        payload: &serde_json::Value,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, ClientError> {
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        let url = request.url.clone();
        let credential = self.credentials.credential().await?;
        let (name, value) = credential.header();
        request.headers.push((name.to_string(), value));

        self.observer.on_request(request.method, &url, payload);

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ClientError::Cancelled),
            resp = self.transport.send(request) => resp,
        };

        if let Err(e) = &result {
            self.observer.on_error(&url, e);
        }
        result
    }
}

/// Sleeps for `delay` unless `cancel` fires first.
pub(crate) async fn sleep_or_cancel(
    delay: Duration,
    cancel: &CancellationToken,
) -> Result<(), ClientError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ClientError::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}
