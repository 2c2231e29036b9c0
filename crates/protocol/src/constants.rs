use std::time::Duration;

/// Base URL of the file storage API when nothing else is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3001/api";

/// Timeout applied to every request (upload, list, delete, download).
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum accepted file size in bytes (10 MiB).
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default number of stored files a user may keep.
pub const DEFAULT_MAX_FILES: usize = 10;

/// How long a completed upload stays visible before it is cleared.
pub const COMPLETED_LINGER: Duration = Duration::from_secs(2);

/// MIME types accepted by client-side validation.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
    "image/jpeg",
    "image/png",
    "image/gif",
];

/// File extensions offered by the file picker, matching [`ALLOWED_MIME_TYPES`].
pub const ACCEPTED_EXTENSIONS: &str = ".pdf,.doc,.docx,.txt,.jpg,.jpeg,.png,.gif";

// ---------------------------------------------------------------------------
// Endpoints (relative to the API base URL)
// ---------------------------------------------------------------------------

/// `POST` multipart upload.
pub const UPLOAD_PATH: &str = "/files/upload";

/// `GET` list of stored files.
pub const FILES_PATH: &str = "/files";

/// Path of a single stored file (`DELETE`). `id` must already be URL-encoded.
pub fn file_path(id: &str) -> String {
    format!("{FILES_PATH}/{id}")
}

/// Path of a stored file's content (`GET`). `id` must already be URL-encoded.
pub fn download_path(id: &str) -> String {
    format!("{FILES_PATH}/{id}/download")
}

// ---------------------------------------------------------------------------
// Multipart form field names
// ---------------------------------------------------------------------------

pub const FIELD_FILE: &str = "file";
pub const FIELD_FILE_NAME: &str = "fileName";
pub const FIELD_FILE_TYPE: &str = "fileType";
pub const FIELD_FILE_SIZE: &str = "fileSize";
