use serde::{Deserialize, Serialize};

use crate::types::StoredFile;

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// Response to `POST /files/upload`.
///
/// `file` is only present when `success` is true. Failures carry a reason in
/// `error` or `message` (the server is not consistent about which).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<StoredFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl UploadResponse {
    /// Returns the server-provided failure reason, preferring `error`.
    pub fn reason(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }
}

/// Response to `GET /files`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileListResponse {
    #[serde(default)]
    pub files: Vec<StoredFile>,
}

/// Response to `DELETE /files/:id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body shape shared by every non-2xx response from the API.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Returns the human-readable reason, preferring `message`.
    pub fn reason(&self) -> Option<&str> {
        self.message.as_deref().or(self.error.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_response_success_with_file() {
        let json = r#"{"success":true,"file":{"id":"f1","name":"notes.txt","size":500,"type":"text/plain","url":"/uploads/f1","uploadedAt":"2025-03-01T09:15:00Z"}}"#;
        let resp: UploadResponse = serde_json::from_str(json).unwrap();
        assert!(resp.success);
        assert_eq!(resp.file.unwrap().name, "notes.txt");
        assert!(resp.error.is_none());
    }

    #[test]
    fn upload_response_reason_prefers_error() {
        let resp = UploadResponse {
            success: false,
            file: None,
            error: Some("virus detected".into()),
            message: Some("rejected".into()),
        };
        assert_eq!(resp.reason(), Some("virus detected"));

        let resp = UploadResponse {
            error: None,
            ..resp
        };
        assert_eq!(resp.reason(), Some("rejected"));
    }

    #[test]
    fn file_list_missing_files_defaults_empty() {
        let resp: FileListResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.files.is_empty());
    }

    #[test]
    fn delete_response_omit_empty() {
        let resp = DeleteResponse {
            success: true,
            message: None,
            error: None,
        };
        assert_eq!(serde_json::to_string(&resp).unwrap(), r#"{"success":true}"#);
    }

    #[test]
    fn error_body_prefers_message() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"error":"Bad Request","message":"File too large"}"#).unwrap();
        assert_eq!(body.reason(), Some("File too large"));

        let body: ErrorBody = serde_json::from_str(r#"{"error":"Bad Request"}"#).unwrap();
        assert_eq!(body.reason(), Some("Bad Request"));
    }
}
