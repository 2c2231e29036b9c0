use std::path::Path;

/// Detects a MIME content type from a file path extension.
///
/// Only knows the types the storage endpoint accepts; anything else returns
/// `None` and is left for validation to reject.
pub fn detect_content_type(path: impl AsRef<Path>) -> Option<&'static str> {
    let ext = path
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("pdf") => Some("application/pdf"),
        Some("doc") => Some("application/msword"),
        Some("docx") => {
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        }
        Some("txt") => Some("text/plain"),
        Some("jpg" | "jpeg") => Some("image/jpeg"),
        Some("png") => Some("image/png"),
        Some("gif") => Some("image/gif"),
        _ => None,
    }
}
