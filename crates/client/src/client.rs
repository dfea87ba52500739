//! High-level client tying configuration, transport and credentials
//! together.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use vidrelay_protocol::{MediaReference, UploadMetadata};

use crate::ClientError;
use crate::auth::{Credential, CredentialProvider};
use crate::config::ClientConfig;
use crate::observe::{Observer, TracingObserver};
use crate::poller::OperationPoller;
use crate::requester::Requester;
use crate::transport::Transport;
use crate::uploader::Uploader;

/// Entry point for uploading media and watching operations.
///
/// Cheap to clone. Uploaders and pollers handed out by one client share
/// its transport.
#[derive(Clone)]
pub struct MediaClient {
    config: ClientConfig,
    requester: Requester,
}

impl MediaClient {
    /// Creates a client using the configured API key and tracing
    /// observation.
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self, ClientError> {
        let credential = Credential::ApiKey(config.resolved_credential()?);
        Self::with_parts(
            config,
            transport,
            Arc::new(credential),
            Arc::new(TracingObserver),
        )
    }

    /// Creates a client with an explicit credential provider and observer.
    pub fn with_parts(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialProvider>,
        observer: Arc<dyn Observer>,
    ) -> Result<Self, ClientError> {
        config.validate()?;
        Ok(Self {
            requester: Requester::new(transport, credentials, observer),
            config,
        })
    }

    /// Creates a client over a `reqwest` transport honoring the configured
    /// timeout.
    #[cfg(feature = "reqwest")]
    pub fn from_config(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = crate::ReqwestTransport::new(config.timeout())?;
        Self::new(config, Arc::new(transport))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn uploader(&self) -> Uploader {
        Uploader::new(
            self.requester.clone(),
            self.config.upload_url(),
            self.config.retry_policy(),
        )
    }

    pub fn poller(&self) -> OperationPoller {
        OperationPoller::new(
            self.requester.clone(),
            self.config.base_url.clone(),
            self.config.operations_url(),
            self.config.retry_policy(),
        )
    }

    /// Uploads a file from disk with the configured chunk size, using the
    /// file name as display name.
    pub async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        cancel: &CancellationToken,
    ) -> Result<MediaReference, ClientError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                ClientError::InvalidArgument(format!("{} has no file name", path.display()))
            })?;

        let mut file = tokio::fs::File::open(path).await?;
        self.uploader()
            .upload_all(
                &UploadMetadata::new(file_name, mime_type),
                &mut file,
                self.config.chunk_size,
                cancel,
            )
            .await
    }
}
