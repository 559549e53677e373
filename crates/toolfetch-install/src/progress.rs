//! Progress reporting and cooperative cancellation

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Receives progress of a background download
///
/// The downloader polls [`ProgressSink::is_cancelled`] between chunks and
/// stops as soon as it returns `true`.
pub trait ProgressSink: Send + Sync {
    /// Completed share of the download, `0.0..=1.0`
    fn set_fraction(&self, fraction: f64);

    fn set_text(&self, text: &str);

    fn is_cancelled(&self) -> bool;
}

/// Shared cancellation flag
///
/// Clones observe the same flag; cancelling is permanent.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// [`ProgressSink`] that records the latest state for a host to read
#[derive(Debug, Default)]
pub struct Progress {
    fraction: AtomicU64,
    text: Mutex<String>,
    cancel: CancelToken,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Progress cancelled through `token`
    pub fn with_cancel(token: CancelToken) -> Self {
        Self {
            cancel: token,
            ..Self::default()
        }
    }

    pub fn fraction(&self) -> f64 {
        f64::from_bits(self.fraction.load(Ordering::SeqCst))
    }

    pub fn text(&self) -> String {
        self.text
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl ProgressSink for Progress {
    fn set_fraction(&self, fraction: f64) {
        self.fraction.store(fraction.to_bits(), Ordering::SeqCst);
    }

    fn set_text(&self, text: &str) {
        *self.text.lock().unwrap_or_else(PoisonError::into_inner) = text.to_string();
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
