//! Credential seam.
//!
//! The client asks its [`CredentialProvider`] once per request, so
//! short-lived tokens can be refreshed by the provider without the upload
//! or polling logic knowing about it.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use vidrelay_protocol::constants::{HEADER_API_KEY, HEADER_AUTHORIZATION};

use crate::ClientError;

/// Authentication strategy for the API.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// `X-API-Key: {key}`
    ApiKey(String),
    /// `Authorization: Bearer {token}`
    Bearer(String),
}

impl Credential {
    /// Header name and value carrying this credential.
    pub fn header(&self) -> (&'static str, String) {
        match self {
            Credential::ApiKey(key) => (HEADER_API_KEY, key.clone()),
            Credential::Bearer(token) => (HEADER_AUTHORIZATION, format!("Bearer {token}")),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Credential::ApiKey(s) | Credential::Bearer(s) => s.is_empty(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::ApiKey(_) => f.write_str("ApiKey([REDACTED])"),
            Credential::Bearer(_) => f.write_str("Bearer([REDACTED])"),
        }
    }
}

/// Boxed future returned by [`CredentialProvider::credential`].
pub type CredentialFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Credential, ClientError>> + Send + 'a>>;

/// Supplies the credential attached to each request.
pub trait CredentialProvider: Send + Sync {
    fn credential(&self) -> CredentialFuture<'_>;
}

/// A fixed credential is its own provider.
impl CredentialProvider for Credential {
    fn credential(&self) -> CredentialFuture<'_> {
        Box::pin(async move {
            if self.is_empty() {
                return Err(ClientError::Credential("no credential configured".into()));
            }
            Ok(self.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_shapes() {
        assert_eq!(
            Credential::ApiKey("k".into()).header(),
            ("X-API-Key", "k".to_string())
        );
        assert_eq!(
            Credential::Bearer("t".into()).header(),
            ("Authorization", "Bearer t".to_string())
        );
    }

    #[test]
    fn debug_hides_secret() {
        let dbg = format!("{:?}", Credential::ApiKey("super-secret".into()));
        assert!(!dbg.contains("super-secret"));
    }

    #[tokio::test]
    async fn empty_static_credential_is_rejected() {
        let err = Credential::ApiKey(String::new()).credential().await.unwrap_err();
        assert!(matches!(err, ClientError::Credential(_)));
        assert!(Credential::Bearer("t".into()).credential().await.is_ok());
    }
}
