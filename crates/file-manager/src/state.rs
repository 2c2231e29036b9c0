//! Immutable view of the registry's state.

use std::collections::HashMap;

use taskpilot_protocol::types::{StoredFile, UploadStatus};
use taskpilot_transfer::{FilePayload, UploadAttempt};

/// A failed attempt's original payload, kept so a retry does not need the
/// user to pick the file again.
#[derive(Debug, Clone)]
pub struct FailedUpload {
    pub attempt_id: String,
    pub payload: FilePayload,
}

/// Point-in-time copy of everything the registry tracks.
///
/// The registry swaps whole snapshots, so a reader holding one never sees a
/// half-applied update.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    pub(crate) files: Vec<StoredFile>,
    pub(crate) attempts: HashMap<String, UploadAttempt>,
    pub(crate) failed: HashMap<String, FailedUpload>,
    pub(crate) last_error: Option<String>,
    pub(crate) loading: bool,
}

impl RegistrySnapshot {
    /// Stored files in the order they were listed or added.
    pub fn files(&self) -> &[StoredFile] {
        &self.files
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn file(&self, id: &str) -> Option<&StoredFile> {
        self.files.iter().find(|f| f.id == id)
    }

    /// Visible upload attempts, oldest first.
    pub fn attempts(&self) -> Vec<&UploadAttempt> {
        let mut attempts: Vec<_> = self.attempts.values().collect();
        attempts.sort_by_key(|a| a.created_at());
        attempts
    }

    pub fn attempt(&self, id: &str) -> Option<&UploadAttempt> {
        self.attempts.get(id)
    }

    /// Returns `true` if a retryable record exists for `id`.
    pub fn is_retryable(&self, id: &str) -> bool {
        self.failed.contains_key(id)
    }

    /// Ids of attempts that can be retried, oldest first.
    pub fn failed_ids(&self) -> Vec<&str> {
        self.attempts()
            .into_iter()
            .filter(|a| a.status() == UploadStatus::Error && self.failed.contains_key(a.id()))
            .map(|a| a.id())
            .collect()
    }

    /// Banner text from the last failed registry operation.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Adds `file`, replacing any stored file with the same id.
    pub(crate) fn upsert_file(&mut self, file: StoredFile) {
        match self.files.iter_mut().find(|f| f.id == file.id) {
            Some(existing) => *existing = file,
            None => self.files.push(file),
        }
    }
}
