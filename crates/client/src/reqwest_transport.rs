//! [`Transport`] over `reqwest`.

use std::time::Duration;

use reqwest::redirect::Policy;

use crate::ClientError;
use crate::transport::{HttpRequest, HttpResponse, Method, Transport, TransportFuture};

/// HTTP transport backed by a pooled `reqwest::Client`.
///
/// Redirects are disabled so that 308 answers reach the uploader.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wraps an existing client. It must not follow redirects.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
        Box::pin(async move {
            let method = match request.method {
                Method::Get => reqwest::Method::GET,
                Method::Post => reqwest::Method::POST,
                Method::Put => reqwest::Method::PUT,
            };

            let mut builder = self.client.request(method, &request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if !request.body.is_empty() || request.method == Method::Put {
                builder = builder.body(request.body);
            }

            let resp = builder.send().await.map_err(connection_error)?;

            let status = resp.status().as_u16();
            let headers = resp
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = resp.bytes().await.map_err(connection_error)?.to_vec();

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        })
    }
}

fn connection_error(e: reqwest::Error) -> ClientError {
    if e.is_builder() {
        ClientError::InvalidArgument(e.to_string())
    } else {
        ClientError::Connection(e.to_string())
    }
}
