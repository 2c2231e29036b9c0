//! File manager error types.

use taskpilot_file_client::ClientError;
use taskpilot_transfer::TransferError;

/// Errors produced by the file registry and upload orchestrator.
///
/// Display strings are the user-facing banner texts.
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("Failed to load files")]
    Load(#[source] ClientError),

    #[error("{0}")]
    Delete(String),

    #[error("Failed to download file")]
    Download(#[source] ClientError),

    #[error("Maximum {max} files allowed")]
    TooManyFiles { max: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Transfer(#[from] TransferError),
}
