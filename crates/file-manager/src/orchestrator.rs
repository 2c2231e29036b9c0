//! Upload orchestrator.
//!
//! Runs one state machine per submitted file, feeds progress and outcomes
//! into the [`FileRegistry`], and publishes [`UploadEvent`]s.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::future::join_all;
use taskpilot_protocol::constants::COMPLETED_LINGER;
use taskpilot_protocol::types::StoredFile;
use taskpilot_transfer::{FilePayload, ProgressFn, UploadAttempt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ManagerError;
use crate::registry::FileRegistry;

/// Shown when the transport fails without a server-provided reason.
const GENERIC_UPLOAD_ERROR: &str = "Upload failed";

/// Recorded on attempts abandoned through [`UploadOrchestrator::cancel`].
pub const CANCELLED_MESSAGE: &str = "Upload cancelled";

/// Notification emitted as uploads move through their lifecycle.
#[derive(Debug, Clone)]
pub enum UploadEvent {
    /// A new attempt was created.
    Started { id: String, file_name: String },
    /// The attempt's completion percentage moved.
    Progress { id: String, percent: u8 },
    /// The file is stored remotely.
    Completed { id: String, file: StoredFile },
    /// The attempt failed and can be retried.
    Failed { id: String, error: String },
    /// The attempt was removed from view.
    Cleared { id: String },
}

/// How a single submitted upload settled.
#[derive(Debug, Clone)]
pub enum UploadOutcome {
    Completed { id: String, file: StoredFile },
    Failed { id: String, error: String },
}

impl UploadOutcome {
    /// Attempt identifier.
    pub fn id(&self) -> &str {
        match self {
            UploadOutcome::Completed { id, .. } | UploadOutcome::Failed { id, .. } => id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Completed { .. })
    }
}

/// Drives uploads against the registry's transport.
pub struct UploadOrchestrator {
    registry: Arc<FileRegistry>,
    events_tx: mpsc::Sender<UploadEvent>,
    events_rx: Option<mpsc::Receiver<UploadEvent>>,
    in_flight: Mutex<HashMap<String, CancellationToken>>,
    linger: Duration,
}

impl UploadOrchestrator {
    /// Creates an orchestrator that records into `registry`.
    pub fn new(registry: Arc<FileRegistry>) -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        Self {
            registry,
            events_tx,
            events_rx: Some(events_rx),
            in_flight: Mutex::new(HashMap::new()),
            linger: COMPLETED_LINGER,
        }
    }

    /// Overrides how long completed attempts stay visible.
    pub fn with_linger(mut self, linger: Duration) -> Self {
        self.linger = linger;
        self
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<UploadEvent>> {
        self.events_rx.take()
    }

    pub fn registry(&self) -> &Arc<FileRegistry> {
        &self.registry
    }

    fn emit(&self, event: UploadEvent) {
        emit(&self.events_tx, event);
    }

    /// Uploads one file and returns once it has settled.
    ///
    /// Invalid files never reach the network: their attempt moves to
    /// `uploading`, then fails with the validation message and stays
    /// retryable like any failure.
    pub async fn submit(&self, payload: FilePayload) -> UploadOutcome {
        let attempt = UploadAttempt::new(payload.name());
        let id = attempt.id().to_string();
        self.registry.insert_attempt(attempt);
        self.emit(UploadEvent::Started {
            id: id.clone(),
            file_name: payload.name().to_string(),
        });

        // Registered before the attempt shows as uploading, so anything
        // visible as in flight can be cancelled.
        let token = CancellationToken::new();
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), token.clone());
        self.registry.update_attempt(&id, UploadAttempt::start);

        let result = match payload.validate() {
            Err(e) => {
                debug!(id = %id, error = %e, "file rejected before upload");
                Err(e.to_string())
            }
            Ok(()) => {
                let on_progress = self.progress_callback(&id);
                tokio::select! {
                    biased;
                    () = token.cancelled() => Err(CANCELLED_MESSAGE.to_string()),
                    r = self.registry.transport().upload(&payload, on_progress) => r.map_err(|e| {
                        warn!(id = %id, error = %e, "upload failed");
                        e.remote_message().unwrap_or(GENERIC_UPLOAD_ERROR).to_string()
                    }),
                }
            }
        };

        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);

        match result {
            Ok(file) => self.complete(id, file),
            Err(error) => self.fail(id, error, payload),
        }
    }

    /// Uploads a batch concurrently after the capacity check.
    ///
    /// A batch that would exceed the registry's file limit is rejected as a
    /// whole before any upload starts.
    pub async fn submit_batch(
        &self,
        payloads: Vec<FilePayload>,
    ) -> Result<Vec<UploadOutcome>, ManagerError> {
        self.registry.clear_error();
        self.registry.check_capacity(payloads.len())?;
        Ok(join_all(payloads.into_iter().map(|p| self.submit(p))).await)
    }

    /// Resubmits a failed upload with its original payload.
    ///
    /// Returns `None` (and does nothing) if `id` has no retry record.
    pub async fn retry(&self, id: &str) -> Option<UploadOutcome> {
        let payload = self.registry.take_failed(id)?;
        info!(id = %id, name = %payload.name(), "retrying upload");
        self.emit(UploadEvent::Cleared { id: id.to_string() });
        Some(self.submit(payload).await)
    }

    /// Drops a failed upload without retrying. Idempotent.
    pub fn dismiss(&self, id: &str) -> bool {
        let removed = self.registry.dismiss(id);
        if removed {
            self.emit(UploadEvent::Cleared { id: id.to_string() });
        }
        removed
    }

    /// Abandons an in-flight upload; it fails with [`CANCELLED_MESSAGE`].
    ///
    /// Returns `false` for unknown or already settled attempts.
    pub fn cancel(&self, id: &str) -> bool {
        let in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        match in_flight.get(id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    fn progress_callback(&self, id: &str) -> ProgressFn {
        let registry = Arc::clone(&self.registry);
        let tx = self.events_tx.clone();
        let id = id.to_string();
        Arc::new(move |percent| {
            if registry.update_attempt(&id, |a| a.set_progress(percent)) {
                emit(
                    &tx,
                    UploadEvent::Progress {
                        id: id.clone(),
                        percent,
                    },
                );
            }
        })
    }

    fn complete(&self, id: String, file: StoredFile) -> UploadOutcome {
        info!(id = %id, file_id = %file.id, name = %file.name, "upload completed");
        self.registry.complete_attempt(&id, file.clone());
        self.emit(UploadEvent::Completed {
            id: id.clone(),
            file: file.clone(),
        });

        let registry = Arc::clone(&self.registry);
        let tx = self.events_tx.clone();
        let linger = self.linger;
        let cleared = id.clone();
        tokio::spawn(async move {
            tokio::time::sleep(linger).await;
            if registry.clear_completed(&cleared) {
                emit(&tx, UploadEvent::Cleared { id: cleared });
            }
        });

        UploadOutcome::Completed { id, file }
    }

    fn fail(&self, id: String, error: String, payload: FilePayload) -> UploadOutcome {
        self.registry.fail_attempt(&id, &error, payload);
        self.emit(UploadEvent::Failed {
            id: id.clone(),
            error: error.clone(),
        });
        UploadOutcome::Failed { id, error }
    }
}

/// Best-effort send: a full or unread channel drops the event.
fn emit(tx: &mpsc::Sender<UploadEvent>, event: UploadEvent) {
    if let Err(e) = tx.try_send(event) {
        debug!(error = %e, "upload event dropped");
    }
}
