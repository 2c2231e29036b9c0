//! The file registry: the single owner of stored files and upload attempts.
//!
//! State lives behind `Mutex<Arc<RegistrySnapshot>>`. Every mutation clones
//! on write with `Arc::make_mut`, so snapshots handed out earlier stay valid
//! and unchanged. The lock is never held across an `.await`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use taskpilot_file_client::FileTransport;
use taskpilot_protocol::types::{StoredFile, UploadStatus};
use taskpilot_transfer::{FilePayload, UploadAttempt, validate_download_name};
use tracing::{debug, info, warn};

use crate::confirm::Confirm;
use crate::error::ManagerError;
use crate::state::{FailedUpload, RegistrySnapshot};

/// Callback receiving the full stored-file list after it changes.
pub type FilesObserver = Box<dyn Fn(&[StoredFile]) + Send + Sync>;

/// Result of [`FileRegistry::delete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The user did not confirm; nothing was sent.
    Declined,
}

/// Holds the stored files and upload attempts for one session.
pub struct FileRegistry {
    transport: Arc<dyn FileTransport>,
    state: Mutex<Arc<RegistrySnapshot>>,
    observers: Mutex<Vec<FilesObserver>>,
    max_files: usize,
}

impl FileRegistry {
    /// Creates an empty registry allowing at most `max_files` stored files.
    pub fn new(transport: Arc<dyn FileTransport>, max_files: usize) -> Self {
        Self {
            transport,
            state: Mutex::new(Arc::new(RegistrySnapshot::default())),
            observers: Mutex::new(Vec::new()),
            max_files,
        }
    }

    /// Registers a callback invoked with the stored-file list on load, add
    /// and delete.
    pub fn on_files_changed(&self, observer: impl Fn(&[StoredFile]) + Send + Sync + 'static) {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(observer));
    }

    /// Current state.
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        Arc::clone(&self.state.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn files(&self) -> Vec<StoredFile> {
        self.snapshot().files().to_vec()
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    pub fn last_error(&self) -> Option<String> {
        self.snapshot().last_error().map(str::to_string)
    }

    pub fn clear_error(&self) {
        self.mutate(|s| s.last_error = None);
    }

    pub(crate) fn transport(&self) -> &Arc<dyn FileTransport> {
        &self.transport
    }

    /// Applies `f` to a private copy of the state and publishes it.
    fn mutate<R>(&self, f: impl FnOnce(&mut RegistrySnapshot) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(Arc::make_mut(&mut guard))
    }

    /// Like [`mutate`](Self::mutate), then hands the new file list to every
    /// observer.
    ///
    /// The observers lock is taken first and held until delivery ends, so
    /// concurrent changes reach observers in the order they were published.
    /// Lock order is always observers, then state.
    fn mutate_and_notify(&self, f: impl FnOnce(&mut RegistrySnapshot)) {
        let observers = self.observers.lock().unwrap_or_else(PoisonError::into_inner);
        let snapshot = {
            let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            f(Arc::make_mut(&mut guard));
            Arc::clone(&guard)
        };
        for observer in observers.iter() {
            observer(snapshot.files());
        }
    }

    fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.mutate(|s| s.last_error = Some(message));
    }

    /// Fetches the stored-file list and replaces local state with it.
    pub async fn load_all(&self) -> Result<(), ManagerError> {
        self.mutate(|s| s.loading = true);

        match self.transport.list().await {
            Ok(files) => {
                debug!(count = files.len(), "loaded stored files");
                self.mutate_and_notify(|s| {
                    s.files = files;
                    s.loading = false;
                });
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "failed to load files");
                let err = ManagerError::Load(e);
                let message = err.to_string();
                self.mutate(|s| {
                    s.loading = false;
                    s.last_error = Some(message);
                });
                Err(err)
            }
        }
    }

    /// Deletes a stored file after the user confirms `Delete {name}?`.
    pub async fn delete(
        &self,
        id: &str,
        display_name: &str,
        confirm: &dyn Confirm,
    ) -> Result<DeleteOutcome, ManagerError> {
        if !confirm.confirm(&format!("Delete {display_name}?")) {
            return Ok(DeleteOutcome::Declined);
        }

        match self.transport.remove(id).await {
            Ok(()) => {
                info!(id = %id, name = %display_name, "file deleted");
                self.mutate_and_notify(|s| s.files.retain(|f| f.id != id));
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) => {
                warn!(id = %id, error = %e, "delete failed");
                let message = e.remote_message().unwrap_or("Failed to delete file").to_string();
                self.set_error(message.clone());
                Err(ManagerError::Delete(message))
            }
        }
    }

    /// Saves a stored file's content as `dest_dir/display_name`.
    ///
    /// Content goes to a temporary sibling first and is renamed into place,
    /// so a failed download never leaves a truncated file behind.
    pub async fn download(
        &self,
        id: &str,
        display_name: &str,
        dest_dir: &Path,
    ) -> Result<PathBuf, ManagerError> {
        let result = self.download_inner(id, display_name, dest_dir).await;
        if let Err(e) = &result {
            warn!(id = %id, error = %e, "download failed");
            self.set_error("Failed to download file");
        }
        result
    }

    async fn download_inner(
        &self,
        id: &str,
        display_name: &str,
        dest_dir: &Path,
    ) -> Result<PathBuf, ManagerError> {
        validate_download_name(display_name)?;
        let bytes = self
            .transport
            .fetch_bytes(id)
            .await
            .map_err(ManagerError::Download)?;

        let target = dest_dir.join(display_name);
        let tmp = dest_dir.join(format!(".{display_name}.part"));

        let written = match tokio::fs::write(&tmp, &bytes).await {
            Ok(()) => tokio::fs::rename(&tmp, &target).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        info!(id = %id, path = %target.display(), size = bytes.len(), "file downloaded");
        Ok(target)
    }

    /// Rejects a batch of `incoming` files that would exceed the limit.
    pub fn check_capacity(&self, incoming: usize) -> Result<(), ManagerError> {
        let current = self.snapshot().file_count();
        if current + incoming > self.max_files {
            let err = ManagerError::TooManyFiles {
                max: self.max_files,
            };
            self.set_error(err.to_string());
            return Err(err);
        }
        Ok(())
    }

    /// Drops a failed attempt and its retry record. Returns `false` if there
    /// was nothing to drop.
    pub fn dismiss(&self, id: &str) -> bool {
        self.mutate(|s| {
            let had_record = s.failed.remove(id).is_some();
            let had_attempt = s
                .attempts
                .get(id)
                .is_some_and(|a| a.status() == UploadStatus::Error);
            if had_attempt {
                s.attempts.remove(id);
            }
            had_record || had_attempt
        })
    }

    pub(crate) fn insert_attempt(&self, attempt: UploadAttempt) {
        self.mutate(|s| {
            s.attempts.insert(attempt.id().to_string(), attempt);
        });
    }

    /// Applies `f` to the attempt `id`; returns what `f` returned, or
    /// `false` if the attempt is gone.
    pub(crate) fn update_attempt(&self, id: &str, f: impl FnOnce(&mut UploadAttempt) -> bool) -> bool {
        self.mutate(|s| s.attempts.get_mut(id).is_some_and(f))
    }

    /// Completes attempt `id` and publishes `file`.
    pub(crate) fn complete_attempt(&self, id: &str, file: StoredFile) {
        self.mutate_and_notify(|s| {
            if let Some(attempt) = s.attempts.get_mut(id) {
                attempt.complete();
            }
            s.upsert_file(file);
        });
    }

    /// Fails attempt `id` and keeps `payload` for a retry.
    pub(crate) fn fail_attempt(&self, id: &str, message: &str, payload: FilePayload) {
        self.mutate(|s| {
            if let Some(attempt) = s.attempts.get_mut(id) {
                attempt.fail(message);
            }
            s.failed.insert(
                id.to_string(),
                FailedUpload {
                    attempt_id: id.to_string(),
                    payload,
                },
            );
        });
    }

    /// Removes a completed attempt from view. Returns `true` if removed.
    pub(crate) fn clear_completed(&self, id: &str) -> bool {
        self.mutate(|s| {
            let completed = s
                .attempts
                .get(id)
                .is_some_and(|a| a.status() == UploadStatus::Completed);
            if completed {
                s.attempts.remove(id);
            }
            completed
        })
    }

    /// Removes the retry record and attempt for `id`, returning the payload.
    pub(crate) fn take_failed(&self, id: &str) -> Option<FilePayload> {
        self.mutate(|s| {
            let record = s.failed.remove(id)?;
            s.attempts.remove(&record.attempt_id);
            Some(record.payload)
        })
    }
}
