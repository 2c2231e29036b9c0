//! In-memory [`FileTransport`] for tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use taskpilot_file_client::{ClientError, FileTransport, TransportFuture};
use taskpilot_protocol::types::StoredFile;
use taskpilot_transfer::{FilePayload, ProgressFn};

/// Scripted outcome of one upload call.
pub(crate) enum Upload {
    /// Reports 25, 60, 100 and returns a stored file.
    Succeed,
    /// Server answered 2xx with `success: false`.
    Reject(&'static str),
    /// Connection-level failure.
    Timeout,
    /// Never resolves.
    Hang,
}

pub(crate) struct MockTransport {
    uploads: Mutex<VecDeque<Upload>>,
    pub(crate) uploaded: Mutex<Vec<FilePayload>>,
    upload_calls: AtomicUsize,
    pub(crate) list: Mutex<Option<Vec<StoredFile>>>,
    pub(crate) remove_error: Mutex<Option<ClientError>>,
    pub(crate) removed: Mutex<Vec<String>>,
    pub(crate) content: Mutex<Option<Vec<u8>>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self {
            uploads: Mutex::new(VecDeque::new()),
            uploaded: Mutex::new(Vec::new()),
            upload_calls: AtomicUsize::new(0),
            list: Mutex::new(Some(Vec::new())),
            remove_error: Mutex::new(None),
            removed: Mutex::new(Vec::new()),
            content: Mutex::new(None),
        }
    }

    /// Queues upload outcomes; once exhausted, uploads succeed.
    pub(crate) fn with_uploads(self, script: Vec<Upload>) -> Self {
        *self.uploads.lock().unwrap() = script.into();
        self
    }

    pub(crate) fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }
}

pub(crate) fn stored(id: &str, payload: &FilePayload) -> StoredFile {
    StoredFile {
        id: id.into(),
        name: payload.name().into(),
        size: payload.size(),
        mime_type: payload.mime_type().into(),
        url: format!("/uploads/{id}"),
        uploaded_at: Utc::now(),
    }
}

impl FileTransport for MockTransport {
    fn upload<'a>(
        &'a self,
        payload: &'a FilePayload,
        on_progress: ProgressFn,
    ) -> TransportFuture<'a, Result<StoredFile, ClientError>> {
        Box::pin(async move {
            let n = self.upload_calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.uploaded.lock().unwrap().push(payload.clone());
            let step = self.uploads.lock().unwrap().pop_front();

            match step.unwrap_or(Upload::Succeed) {
                Upload::Succeed => {
                    for p in [25, 60] {
                        on_progress(p);
                        tokio::task::yield_now().await;
                    }
                    on_progress(100);
                    Ok(stored(&format!("srv-{n}"), payload))
                }
                Upload::Reject(reason) => {
                    on_progress(40);
                    Err(ClientError::Rejected(reason.into()))
                }
                Upload::Timeout => Err(ClientError::Timeout),
                Upload::Hang => std::future::pending().await,
            }
        })
    }

    fn list(&self) -> TransportFuture<'_, Result<Vec<StoredFile>, ClientError>> {
        Box::pin(async move {
            self.list.lock().unwrap().clone().ok_or(ClientError::Api {
                status: 500,
                message: Some("db down".into()),
            })
        })
    }

    fn remove<'a>(&'a self, id: &'a str) -> TransportFuture<'a, Result<(), ClientError>> {
        Box::pin(async move {
            if let Some(e) = self.remove_error.lock().unwrap().take() {
                return Err(e);
            }
            self.removed.lock().unwrap().push(id.to_string());
            Ok(())
        })
    }

    fn fetch_bytes<'a>(
        &'a self,
        _id: &'a str,
    ) -> TransportFuture<'a, Result<Vec<u8>, ClientError>> {
        Box::pin(async move {
            self.content.lock().unwrap().clone().ok_or(ClientError::Api {
                status: 404,
                message: Some("File not found".into()),
            })
        })
    }
}
