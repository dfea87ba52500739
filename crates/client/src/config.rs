//! Client configuration.
//!
//! Values come from defaults, a JSON file ([`ClientConfig::load`]) or the
//! environment ([`ClientConfig::from_env`]). Missing JSON fields fall back
//! to defaults.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vidrelay_protocol::constants::{
    DEFAULT_BASE_URL, DEFAULT_CHUNK_SIZE, OPERATIONS_PATH, RESUMABLE_UPLOAD_PATH,
};
use vidrelay_transfer::RetryPolicy;

use crate::ClientError;

/// Environment variables consulted for the credential, in order.
pub const CREDENTIAL_ENV_VARS: &[&str] = &["GEMINI_API_KEY", "GOOGLE_GEMINI_API_KEY", "GEMINI_KEY"];

const ENV_BASE_URL: &str = "VIDRELAY_BASE_URL";
const ENV_TIMEOUT_MS: &str = "VIDRELAY_TIMEOUT_MS";
const ENV_MAX_RETRIES: &str = "VIDRELAY_MAX_RETRIES";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    /// API root, e.g. `https://host/v1`.
    pub base_url: String,
    /// API key. Empty means "resolve from the environment".
    #[serde(skip_serializing_if = "String::is_empty")]
    pub credential: String,
    /// Per-request timeout applied by the transport.
    pub timeout_ms: u64,
    pub max_retries: u32,
    /// Base delay for exponential backoff.
    pub retry_backoff_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retry_delay_ms: Option<u64>,
    /// Defaults to `{base_url}/operations`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operations_endpoint: Option<String>,
    pub chunk_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            credential: String::new(),
            timeout_ms: 100_000,
            max_retries: 3,
            retry_backoff_ms: 250,
            max_retry_delay_ms: None,
            operations_endpoint: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ClientError> {
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Builds configuration from defaults plus environment overrides.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let mut config = ClientConfig::default();

        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.is_empty()) {
            config.base_url = url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            config.timeout_ms = raw
                .parse()
                .map_err(|_| ClientError::Config(format!("{ENV_TIMEOUT_MS}: not a number: {raw}")))?;
        }
        if let Some(raw) = lookup(ENV_MAX_RETRIES) {
            config.max_retries = raw
                .parse()
                .map_err(|_| ClientError::Config(format!("{ENV_MAX_RETRIES}: not a number: {raw}")))?;
        }
        if let Some(key) = credential_from(&lookup) {
            config.credential = key;
        }

        config.validate()?;
        Ok(config)
    }

    /// The explicit credential, or the first non-empty environment fallback.
    pub fn resolved_credential(&self) -> Result<String, ClientError> {
        if !self.credential.is_empty() {
            return Ok(self.credential.clone());
        }
        credential_from(&|key: &str| std::env::var(key).ok()).ok_or_else(|| {
            ClientError::Credential(format!(
                "no API key configured; set one of {}",
                CREDENTIAL_ENV_VARS.join(", ")
            ))
        })
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.base_url.trim().is_empty() {
            return Err(ClientError::Config("baseUrl must not be empty".into()));
        }
        if self.chunk_size == 0 {
            return Err(ClientError::Config("chunkSize must be greater than zero".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_backoff_ms),
            max_delay: self.max_retry_delay_ms.map(Duration::from_millis),
        }
    }

    /// `{base_url}/{path}` with exactly one slash in between.
    pub fn api_url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    pub fn upload_url(&self) -> String {
        self.api_url(RESUMABLE_UPLOAD_PATH)
    }

    pub fn operations_url(&self) -> String {
        match &self.operations_endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => self.api_url(OPERATIONS_PATH),
        }
    }
}

/// Joins `base` and `path` with exactly one slash.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn credential_from(lookup: &dyn Fn(&str) -> Option<String>) -> Option<String> {
    CREDENTIAL_ENV_VARS
        .iter()
        .filter_map(|key| lookup(key))
        .find(|v| !v.is_empty())
}
