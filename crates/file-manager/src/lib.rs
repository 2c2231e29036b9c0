//! File registry and upload orchestration.
//!
//! This crate holds the client-side state of the file manager. It has no UI
//! and reaches the network only through a
//! [`FileTransport`](taskpilot_file_client::FileTransport), which the
//! composition root provides.
//!
//! # Flow
//!
//! 1. **Validate**: oversized or disallowed files fail before any request
//! 2. **Upload**: one attempt per file, progress streamed into the registry
//! 3. **Settle**: success publishes a stored file, failure keeps the payload
//! 4. **Recover**: failed attempts can be retried or dismissed

pub mod confirm;
pub mod error;
pub mod manager;
pub mod orchestrator;
pub mod registry;
pub mod state;

#[cfg(test)]
mod mock;

// Re-export primary types for convenience.
pub use confirm::Confirm;
pub use error::ManagerError;
pub use manager::FileManager;
pub use orchestrator::{CANCELLED_MESSAGE, UploadEvent, UploadOrchestrator, UploadOutcome};
pub use registry::{DeleteOutcome, FileRegistry, FilesObserver};
pub use state::{FailedUpload, RegistrySnapshot};
