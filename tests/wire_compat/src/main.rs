fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use taskpilot_protocol::messages::{
        DeleteResponse, ErrorBody, FileListResponse, UploadResponse,
    };
    use taskpilot_protocol::types::{StoredFile, UploadProgress, UploadStatus};

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

    /// Deserializes a fixture, re-serializes it, and compares the JSON values
    /// (key order does not matter).
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
            "roundtrip mismatch for {name}:\n  server: {fixture}\n  client: {reserialized}"
        );
        parsed
    }

    #[test]
    fn fixture_stored_file() {
        let file = roundtrip_test::<StoredFile>("stored_file.json");
        assert_eq!(file.mime_type, "text/plain");
        assert_eq!(file.size, 500);
    }

    #[test]
    fn fixture_upload_response_success() {
        let resp = roundtrip_test::<UploadResponse>("upload_response_success.json");
        assert!(resp.success);
        let file = resp.file.unwrap();
        assert_eq!(file.name, "Syllabus Fall.pdf");
        assert_eq!(file.uploaded_at.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn fixture_upload_response_error() {
        let resp = roundtrip_test::<UploadResponse>("upload_response_error.json");
        assert!(!resp.success);
        assert!(resp.file.is_none());
        assert_eq!(resp.reason(), Some("virus detected"));
    }

    #[test]
    fn fixture_file_list_response() {
        let resp = roundtrip_test::<FileListResponse>("file_list_response.json");
        assert_eq!(resp.files.len(), 2);
        assert_eq!(resp.files[1].mime_type, "image/png");
    }

    #[test]
    fn fixture_delete_response() {
        let resp = roundtrip_test::<DeleteResponse>("delete_response.json");
        assert!(resp.success);
    }

    #[test]
    fn fixture_delete_response_error() {
        let resp = roundtrip_test::<DeleteResponse>("delete_response_error.json");
        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("File not found"));
    }

    #[test]
    fn fixture_upload_progress() {
        let progress = roundtrip_test::<UploadProgress>("upload_progress.json");
        assert_eq!(progress.status, UploadStatus::Error);
        assert_eq!(progress.progress, 40);
    }

    #[test]
    fn error_bodies_from_failed_requests() {
        let body: ErrorBody =
            serde_json::from_value(load_fixture("delete_response_error.json")).unwrap();
        assert_eq!(body.reason(), Some("File not found"));

        let empty: ErrorBody = serde_json::from_str("{}").unwrap();
        assert!(empty.reason().is_none());
    }

    #[test]
    fn list_without_files_key_is_empty() {
        let resp: FileListResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.files.is_empty());
    }

    #[test]
    fn every_fixture_is_covered() {
        let mut names: Vec<String> = fs::read_dir(fixtures_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(
            names,
            [
                "delete_response.json",
                "delete_response_error.json",
                "file_list_response.json",
                "stored_file.json",
                "upload_progress.json",
                "upload_response_error.json",
                "upload_response_success.json",
            ]
        );
    }
}
