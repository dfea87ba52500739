//! Request/response observation.
//!
//! The client reports every exchange to an [`Observer`]. The default
//! [`TracingObserver`] turns them into `tracing` events with stable event
//! codes so log pipelines can filter on them.

use serde_json::Value;
use tracing::{error, info};

use crate::ClientError;
use crate::transport::Method;

pub const EVENT_REQUEST: u32 = 1000;
pub const EVENT_RESPONSE: u32 = 1001;
pub const EVENT_ERROR: u32 = 1099;

const REDACTED: &str = "[REDACTED]";

/// Keys whose values never reach the logs (compared case-insensitively).
const SECRET_KEYS: &[&str] = &[
    "apikey",
    "api_key",
    "x-api-key",
    "authorization",
    "credential",
    "token",
    "password",
    "secret",
];

/// Receives request, response and error notifications.
pub trait Observer: Send + Sync {
    fn on_request(&self, method: Method, url: &str, payload: &Value);
    fn on_response(&self, url: &str, status: u16, payload: &Value);
    fn on_error(&self, url: &str, error: &ClientError);
}

/// Emits observations as `tracing` events with secrets redacted.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_request(&self, method: Method, url: &str, payload: &Value) {
        info!(
            event = EVENT_REQUEST,
            method = method.as_str(),
            url,
            payload = %redact(payload),
            "request"
        );
    }

    fn on_response(&self, url: &str, status: u16, payload: &Value) {
        info!(
            event = EVENT_RESPONSE,
            url,
            status,
            payload = %redact(payload),
            "response"
        );
    }

    fn on_error(&self, url: &str, err: &ClientError) {
        error!(event = EVENT_ERROR, url, error = %err, "request failed");
    }
}

/// Discards all observations.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn on_request(&self, _method: Method, _url: &str, _payload: &Value) {}
    fn on_response(&self, _url: &str, _status: u16, _payload: &Value) {}
    fn on_error(&self, _url: &str, _error: &ClientError) {}
}

/// Returns a copy of `value` with every secret-looking field replaced.
pub fn redact(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let v = if is_secret_key(k) {
                        Value::String(REDACTED.into())
                    } else {
                        redact(v)
                    };
                    (k.clone(), v)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

fn is_secret_key(key: &str) -> bool {
    SECRET_KEYS.iter().any(|s| key.eq_ignore_ascii_case(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redacts_nested_secrets() {
        let input = json!({
            "fileName": "clip.mp4",
            "apiKey": "k-123",
            "headers": [{"Authorization": "Bearer abc"}, {"Accept": "*/*"}],
            "auth": {"TOKEN": "t", "user": "me"}
        });
        let out = redact(&input);
        assert_eq!(out["fileName"], "clip.mp4");
        assert_eq!(out["apiKey"], REDACTED);
        assert_eq!(out["headers"][0]["Authorization"], REDACTED);
        assert_eq!(out["headers"][1]["Accept"], "*/*");
        assert_eq!(out["auth"]["TOKEN"], REDACTED);
        assert_eq!(out["auth"]["user"], "me");
    }

    #[test]
    fn scalars_pass_through() {
        assert_eq!(redact(&json!(42)), json!(42));
        assert_eq!(redact(&Value::Null), Value::Null);
    }
}
