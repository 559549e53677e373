//! Polling acquisition of an exclusive fs2 lock

use super::{LockError, LockGuard};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

const FIRST_BACKOFF: Duration = Duration::from_millis(10);
const MAX_BACKOFF: Duration = Duration::from_millis(500);
/// Waits longer than this are reported once at info level
const REPORT_WAIT_AFTER: Duration = Duration::from_secs(2);

pub(crate) fn acquire_with_retry(
    lock_path: &Path,
    timeout: Duration,
    description: &str,
) -> Result<LockGuard, LockError> {
    let io_error = |operation: &str| {
        let operation = operation.to_string();
        move |source: io::Error| LockError::Io {
            source,
            path: lock_path.to_path_buf(),
            operation,
        }
    };

    if let Some(parent) = lock_path.parent() {
        fs::create_dir_all(parent).map_err(io_error("create parent directories"))?;
    }

    let started = Instant::now();
    let mut backoff = FIRST_BACKOFF;
    let mut reported = false;

    loop {
        let file = open_lock_file(lock_path).map_err(io_error("open lock file"))?;

        let contended = match file.try_lock_exclusive() {
            Ok(()) => {
                tracing::debug!(path = %lock_path.display(), %description, "lock acquired");
                return Ok(LockGuard {
                    file,
                    path: lock_path.to_path_buf(),
                });
            }
            Err(e) if is_contended(&e) => e,
            Err(e) => return Err(io_error("acquire lock")(e)),
        };

        let waited = started.elapsed();
        if waited >= timeout {
            tracing::debug!(error = %contended, "giving up on contended lock");
            return Err(LockError::Timeout {
                path: lock_path.to_path_buf(),
                description: description.to_string(),
            });
        }

        if !reported && waited >= REPORT_WAIT_AFTER {
            tracing::info!(
                path = %lock_path.display(),
                %description,
                "another process is installing this version, waiting"
            );
            reported = true;
        }

        thread::sleep(backoff.min(timeout - waited));
        backoff = (backoff * 2).min(MAX_BACKOFF);
    }
}

fn open_lock_file(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
}

/// Unix reports `WouldBlock`, Windows `ERROR_LOCK_VIOLATION`
fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
