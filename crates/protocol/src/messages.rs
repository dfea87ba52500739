use serde::{Deserialize, Serialize};

use crate::types::{Operation, OperationError};

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Caller-supplied description of the media being uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadata {
    pub file_name: String,
    pub mime_type: String,
}

impl UploadMetadata {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Announces this media with a known total size.
    pub fn with_size(&self, total_bytes: u64) -> StartUploadRequest {
        StartUploadRequest {
            file_name: self.file_name.clone(),
            mime_type: self.mime_type.clone(),
            total_bytes,
        }
    }
}

/// Body of the request that opens a resumable upload session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartUploadRequest {
    pub file_name: String,
    pub mime_type: String,
    pub total_bytes: u64,
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// JSON operation resource as returned by the operations endpoint.
///
/// `done == false` means still running. Once done, exactly one of
/// `response` or `error` is expected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResource {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationError>,
}

impl From<OperationResource> for Operation {
    fn from(res: OperationResource) -> Self {
        let op = match (res.error, res.done) {
            // An error is terminal even if the server forgot to flip `done`.
            (Some(error), _) => Operation::failed(res.name, error),
            (None, true) => Operation::done(res.name, res.response),
            (None, false) => Operation::pending(res.name),
        };
        op.with_metadata(res.metadata)
    }
}

impl From<&Operation> for OperationResource {
    fn from(op: &Operation) -> Self {
        Self {
            name: op.name().to_string(),
            done: op.is_terminal(),
            metadata: op.metadata().cloned(),
            response: op.result().cloned(),
            error: op.error().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OperationStatus;

    #[test]
    fn start_upload_request_is_camel_case() {
        let req = UploadMetadata::new("clip.mp4", "video/mp4").with_size(4096);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "fileName": "clip.mp4",
                "mimeType": "video/mp4",
                "totalBytes": 4096
            })
        );
    }

    #[test]
    fn pending_resource_decodes_to_pending() {
        let res: OperationResource =
            serde_json::from_str(r#"{"name":"operations/abc"}"#).unwrap();
        let op = Operation::from(res);
        assert_eq!(op.status(), OperationStatus::Pending);
        assert_eq!(op.name(), "operations/abc");
    }

    #[test]
    fn done_resource_carries_response() {
        let res: OperationResource = serde_json::from_str(
            r#"{"name":"operations/abc","done":true,"response":{"text":"a cat"}}"#,
        )
        .unwrap();
        let op = Operation::from(res);
        assert!(op.is_done());
        assert_eq!(op.result().unwrap()["text"], "a cat");
    }

    #[test]
    fn error_resource_decodes_to_failed() {
        let res: OperationResource = serde_json::from_str(
            r#"{"name":"operations/abc","done":true,
                "error":{"code":13,"message":"internal","details":[{"reason":"x"}]}}"#,
        )
        .unwrap();
        let op = Operation::from(res);
        assert!(op.is_failed());
        assert!(op.result().is_none());
        let err = op.error().unwrap();
        assert_eq!(err.code, 13);
        assert_eq!(err.message, "internal");
        assert!(err.details.is_some());
    }

    #[test]
    fn operation_back_to_resource() {
        let op = Operation::done("operations/x", Some(serde_json::json!(1)))
            .with_metadata(Some(serde_json::json!({"progress": 100})));
        let res = OperationResource::from(&op);
        assert!(res.done);
        assert_eq!(res.response, Some(serde_json::json!(1)));
        assert_eq!(Operation::from(res), op);
    }
}
