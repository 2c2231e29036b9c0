use std::time::Instant;

use chrono::Utc;
use taskpilot_protocol::types::{UploadProgress, UploadStatus};

/// One file's passage from local selection to remote storage.
///
/// Transitions are forward-only: `pending -> uploading -> completed | error`.
/// Every mutator returns `false` and leaves the attempt untouched when the
/// requested change is not legal from the current state.
#[derive(Debug, Clone)]
pub struct UploadAttempt {
    id: String,
    file_name: String,
    percent: u8,
    status: UploadStatus,
    error: Option<String>,
    created_at: Instant,
}

impl UploadAttempt {
    /// Creates a pending attempt with a fresh identifier.
    ///
    /// The identifier combines the file name, a millisecond timestamp and a
    /// random UUID, so two selections of the same file in the same instant
    /// still get distinct ids.
    pub fn new(file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let id = format!(
            "{}-{}-{}",
            file_name,
            Utc::now().timestamp_millis(),
            uuid::Uuid::new_v4()
        );
        Self {
            id,
            file_name,
            percent: 0,
            status: UploadStatus::Pending,
            error: None,
            created_at: Instant::now(),
        }
    }

    /// Moves a pending attempt to `uploading`.
    pub fn start(&mut self) -> bool {
        self.transition(UploadStatus::Uploading)
    }

    /// Records a new completion percentage.
    ///
    /// Only applies while uploading, and never moves backwards.
    pub fn set_progress(&mut self, percent: u8) -> bool {
        let percent = percent.min(100);
        if self.status != UploadStatus::Uploading || percent < self.percent {
            return false;
        }
        self.percent = percent;
        true
    }

    /// Marks the attempt as stored remotely. Sets the percentage to 100.
    pub fn complete(&mut self) -> bool {
        if !self.transition(UploadStatus::Completed) {
            return false;
        }
        self.percent = 100;
        true
    }

    /// Marks an uploading attempt as failed with a user-facing message.
    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        if !self.transition(UploadStatus::Error) {
            return false;
        }
        self.error = Some(message.into());
        true
    }

    fn transition(&mut self, next: UploadStatus) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        true
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    /// Error message, present only in the `error` state.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// When the attempt was created; used to keep display order stable.
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Returns `true` while the attempt is pending or uploading.
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Snapshot suitable for rendering or serializing.
    pub fn progress(&self) -> UploadProgress {
        UploadProgress {
            file_id: self.id.clone(),
            file_name: self.file_name.clone(),
            progress: self.percent,
            status: self.status,
            error: self.error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_attempt_is_pending() {
        let a = UploadAttempt::new("notes.txt");
        assert_eq!(a.status(), UploadStatus::Pending);
        assert_eq!(a.percent(), 0);
        assert!(a.error().is_none());
        assert!(a.is_active());
        assert!(a.id().starts_with("notes.txt-"));
    }

    #[test]
    fn same_name_gets_distinct_ids() {
        let a = UploadAttempt::new("notes.txt");
        let b = UploadAttempt::new("notes.txt");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn happy_path() {
        let mut a = UploadAttempt::new("notes.txt");
        assert!(a.start());
        assert!(a.set_progress(40));
        assert!(a.set_progress(99));
        assert!(a.complete());

        assert_eq!(a.status(), UploadStatus::Completed);
        assert_eq!(a.percent(), 100);
        assert!(!a.is_active());
    }

    #[test]
    fn progress_never_moves_backwards() {
        let mut a = UploadAttempt::new("notes.txt");
        a.start();
        a.set_progress(60);
        assert!(!a.set_progress(30));
        assert_eq!(a.percent(), 60);
    }

    #[test]
    fn progress_ignored_unless_uploading() {
        let mut a = UploadAttempt::new("notes.txt");
        assert!(!a.set_progress(10));
        assert_eq!(a.percent(), 0);

        a.start();
        a.complete();
        assert!(!a.set_progress(50));
        assert_eq!(a.percent(), 100);
    }

    #[test]
    fn progress_clamps_to_100() {
        let mut a = UploadAttempt::new("notes.txt");
        a.start();
        assert!(a.set_progress(250));
        assert_eq!(a.percent(), 100);
    }

    #[test]
    fn fail_records_message() {
        let mut a = UploadAttempt::new("notes.txt");
        a.start();
        a.set_progress(30);
        assert!(a.fail("virus detected"));

        assert_eq!(a.status(), UploadStatus::Error);
        assert_eq!(a.error(), Some("virus detected"));
        assert_eq!(a.percent(), 30);
    }

    #[test]
    fn pending_attempt_cannot_fail() {
        let mut a = UploadAttempt::new("movie.mp4");
        assert!(!a.fail("File type not allowed"));
        assert_eq!(a.status(), UploadStatus::Pending);
        assert!(a.error().is_none());
    }

    #[test]
    fn terminal_states_are_final() {
        let mut done = UploadAttempt::new("a.txt");
        done.start();
        done.complete();
        assert!(!done.fail("late error"));
        assert!(!done.start());
        assert_eq!(done.status(), UploadStatus::Completed);
        assert!(done.error().is_none());

        let mut failed = UploadAttempt::new("b.txt");
        failed.start();
        failed.fail("boom");
        assert!(!failed.complete());
        assert!(!failed.fail("again"));
        assert_eq!(failed.error(), Some("boom"));
    }

    #[test]
    fn cannot_complete_without_starting() {
        let mut a = UploadAttempt::new("a.txt");
        assert!(!a.complete());
        assert_eq!(a.status(), UploadStatus::Pending);
    }

    #[test]
    fn progress_snapshot() {
        let mut a = UploadAttempt::new("notes.txt");
        a.start();
        a.set_progress(75);
        let p = a.progress();
        assert_eq!(p.file_id, a.id());
        assert_eq!(p.file_name, "notes.txt");
        assert_eq!(p.progress, 75);
        assert_eq!(p.status, UploadStatus::Uploading);
        assert!(p.error.is_none());
    }
}
