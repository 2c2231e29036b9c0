//! Client-side upload bookkeeping: validation, per-file attempt state and
//! progress reporting.

mod format;
mod mime;
mod payload;
mod progress;
mod types;
mod validation;

pub use format::{FileKind, format_file_size};
pub use mime::detect_content_type;
pub use payload::FilePayload;
pub use progress::{ProgressFn, ProgressReporter, percent_of};
pub use types::UploadAttempt;
pub use validation::{validate_download_name, validate_file};

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    InvalidFile(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),
}
