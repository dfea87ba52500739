fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use vidrelay_protocol::messages::{OperationResource, StartUploadRequest};
    use vidrelay_protocol::{
        MediaReference, Operation, OperationStatus, UploadProgress, UploadSession,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Deserializes a fixture, re-serializes it, and compares the JSON
    /// values (key order is irrelevant for `Value` equality).
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  wire: {fixture}\n  ours: {reserialized}"
        );
        parsed
    }

    /// Decodes an operation fixture and checks it survives the trip through
    /// the client-side `Operation` entity unchanged.
    fn operation_fixture(name: &str) -> Operation {
        let resource: OperationResource = roundtrip_test(name);
        let op = Operation::from(resource.clone());
        assert_eq!(
            OperationResource::from(&op),
            resource,
            "operation {name} changed shape"
        );
        op
    }

    // --- Upload ---

    #[test]
    fn fixture_start_upload_request() {
        let req: StartUploadRequest = roundtrip_test("start_upload_request.json");
        assert_eq!(req.total_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn fixture_upload_session() {
        let session: UploadSession = roundtrip_test("upload_session.json");
        assert_eq!(session.upload_id().len(), 32);
    }

    #[test]
    fn fixture_upload_progress() {
        let partial: UploadProgress = roundtrip_test("upload_progress_partial.json");
        assert!(!partial.is_complete());

        let complete: UploadProgress = roundtrip_test("upload_progress_complete.json");
        assert!(complete.is_complete());
    }

    #[test]
    fn fixture_media_reference() {
        roundtrip_test::<MediaReference>("media_reference.json");
    }

    #[test]
    fn session_with_empty_uri_is_rejected() {
        let mut fixture = load_fixture("upload_session.json");
        fixture["sessionUri"] = serde_json::json!("");
        assert!(serde_json::from_value::<UploadSession>(fixture).is_err());
    }

    #[test]
    fn progress_with_mismatched_total_is_rejected() {
        let mut fixture = load_fixture("upload_progress_complete.json");
        fixture["bytesCommitted"] = serde_json::json!(5);
        assert!(serde_json::from_value::<UploadProgress>(fixture).is_err());
    }

    // --- Operations ---

    #[test]
    fn fixture_operation_pending() {
        let op = operation_fixture("operation_pending.json");
        assert_eq!(op.status(), OperationStatus::Pending);
        assert!(op.metadata().is_some());
    }

    #[test]
    fn fixture_operation_done() {
        let op = operation_fixture("operation_done.json");
        assert_eq!(op.status(), OperationStatus::Done);
        assert!(op.result().is_some());
    }

    #[test]
    fn fixture_operation_failed() {
        let op = operation_fixture("operation_failed.json");
        assert_eq!(op.status(), OperationStatus::Failed);
        let error = op.error().expect("failed operation carries an error");
        assert_eq!(error.code, 3);
        assert!(error.details.is_some());
    }
}
