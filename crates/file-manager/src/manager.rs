//! One-stop handle combining the registry and the orchestrator.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use taskpilot_file_client::FileTransport;
use taskpilot_transfer::FilePayload;
use tokio::sync::mpsc;

use crate::error::ManagerError;
use crate::orchestrator::{UploadEvent, UploadOrchestrator, UploadOutcome};
use crate::registry::FileRegistry;
use crate::state::RegistrySnapshot;

/// The file manager as a front end sees it.
pub struct FileManager {
    registry: Arc<FileRegistry>,
    uploads: UploadOrchestrator,
}

impl FileManager {
    pub fn new(transport: Arc<dyn FileTransport>, max_files: usize) -> Self {
        let registry = Arc::new(FileRegistry::new(transport, max_files));
        let uploads = UploadOrchestrator::new(Arc::clone(&registry));
        Self { registry, uploads }
    }

    /// Overrides how long completed attempts stay visible.
    pub fn with_linger(mut self, linger: Duration) -> Self {
        self.uploads = self.uploads.with_linger(linger);
        self
    }

    pub fn registry(&self) -> &Arc<FileRegistry> {
        &self.registry
    }

    pub fn uploads(&self) -> &UploadOrchestrator {
        &self.uploads
    }

    /// Takes the upload event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<UploadEvent>> {
        self.uploads.take_events()
    }

    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.registry.snapshot()
    }

    /// Reloads the stored-file list.
    pub async fn refresh(&self) -> Result<(), ManagerError> {
        self.registry.load_all().await
    }

    /// Uploads a batch; see [`UploadOrchestrator::submit_batch`].
    pub async fn upload(&self, files: Vec<FilePayload>) -> Result<Vec<UploadOutcome>, ManagerError> {
        self.uploads.submit_batch(files).await
    }

    /// Retries every retryable failed upload concurrently.
    pub async fn retry_failed(&self) -> Vec<UploadOutcome> {
        let ids: Vec<String> = self
            .registry
            .snapshot()
            .failed_ids()
            .into_iter()
            .map(str::to_string)
            .collect();
        join_all(ids.iter().map(|id| self.uploads.retry(id)))
            .await
            .into_iter()
            .flatten()
            .collect()
    }
}
