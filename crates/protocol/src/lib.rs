pub mod constants;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use constants::{ALLOWED_MIME_TYPES, DEFAULT_MAX_FILES, MAX_FILE_SIZE, REQUEST_TIMEOUT};
pub use messages::{DeleteResponse, FileListResponse, UploadResponse};
pub use types::{StoredFile, UploadProgress, UploadStatus};
