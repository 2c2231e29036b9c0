use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Callback invoked with an upload's completion percentage (0-100).
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// Converts `loaded` out of `total` bytes into a whole percentage.
///
/// Rounds to the nearest integer. A zero `total` counts as complete.
pub fn percent_of(loaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let loaded = loaded.min(total) as u128;
    ((loaded * 100 + total as u128 / 2) / total as u128) as u8
}

/// Turns a stream of "bytes sent" notifications into percentage callbacks.
///
/// Only strictly increasing percentages are forwarded, so the callback sees a
/// monotonic sequence even when clones report from different tasks. The
/// callback runs under the reporter's lock and must not report back into it.
#[derive(Clone)]
pub struct ProgressReporter {
    inner: Arc<ReporterInner>,
}

struct ReporterInner {
    total: u64,
    sent: AtomicU64,
    last: Mutex<u8>,
    callback: ProgressFn,
}

impl ProgressReporter {
    /// Creates a reporter for a transfer of `total` bytes.
    pub fn new(total: u64, callback: ProgressFn) -> Self {
        Self {
            inner: Arc::new(ReporterInner {
                total,
                sent: AtomicU64::new(0),
                last: Mutex::new(0),
                callback,
            }),
        }
    }

    /// Records `bytes` more sent and notifies if the percentage moved.
    pub fn advance(&self, bytes: u64) {
        let sent = self.inner.sent.fetch_add(bytes, Ordering::AcqRel) + bytes;
        // Hold the last step below 100 until the server confirms.
        let percent = percent_of(sent, self.inner.total).min(99);
        self.report(percent);
    }

    /// Reports 100% once the transfer is confirmed.
    pub fn finish(&self) {
        self.report(100);
    }

    /// Last percentage forwarded to the callback.
    pub fn last_reported(&self) -> u8 {
        *self.inner.last.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn report(&self, percent: u8) {
        let mut last = self.inner.last.lock().unwrap_or_else(PoisonError::into_inner);
        if percent > *last {
            *last = percent;
            (self.inner.callback)(percent);
        }
    }
}
