//! Background execution of downloads

use crate::progress::{Progress, ProgressSink};
use std::sync::Arc;
use std::thread;
use tracing::warn;

/// Unit of work handed to [`BackgroundTasks::spawn`]
pub type Task = Box<dyn FnOnce(&dyn ProgressSink) + Send + 'static>;

/// Host facility running work off the calling context
///
/// An implementation that drops `task` without running it leaves the
/// corresponding handle resolving to an interrupted error.
pub trait BackgroundTasks: Send + Sync {
    fn spawn(&self, title: &str, task: Task);
}

/// Runs each task on its own named thread
#[derive(Clone)]
pub struct ThreadTasks {
    sink: Arc<dyn ProgressSink>,
}

impl ThreadTasks {
    /// Tasks report into a private [`Progress`] nobody reads
    pub fn new() -> Self {
        Self::with_sink(Arc::new(Progress::new()))
    }

    /// Tasks report into (and are cancelled through) `sink`
    pub fn with_sink(sink: Arc<dyn ProgressSink>) -> Self {
        Self { sink }
    }
}

impl Default for ThreadTasks {
    fn default() -> Self {
        Self::new()
    }
}

impl BackgroundTasks for ThreadTasks {
    fn spawn(&self, title: &str, task: Task) {
        let sink = Arc::clone(&self.sink);
        let spawned = thread::Builder::new()
            .name(format!("toolfetch: {title}"))
            .spawn(move || task(sink.as_ref()));

        if let Err(e) = spawned {
            warn!(title, error = %e, "could not start background task");
        }
    }
}

/// Runs each task to completion on the calling thread
///
/// For hosts without a background facility, and for tests.
#[derive(Clone)]
pub struct InlineTasks {
    sink: Arc<dyn ProgressSink>,
}

impl InlineTasks {
    pub fn new() -> Self {
        Self::with_sink(Arc::new(Progress::new()))
    }

    pub fn with_sink(sink: Arc<dyn ProgressSink>) -> Self {
        Self { sink }
    }
}

impl Default for InlineTasks {
    fn default() -> Self {
        Self::new()
    }
}

impl BackgroundTasks for InlineTasks {
    fn spawn(&self, _title: &str, task: Task) {
        task(self.sink.as_ref());
    }
}
