//! Advisory file locks for version directories
//!
//! Two `ensure` calls for the same tool and version write the same download
//! and command files. The install phase holds an exclusive fs2 lock on a
//! lock file next to the command so those writes are serialized across
//! threads and processes.

use std::path::{Path, PathBuf};
use std::time::Duration;

mod acquire;
mod error;
mod guard;

pub use error::LockError;
pub use guard::LockGuard;


/// Acquires an exclusive lock on the specified path with a timeout.
///
/// If the lock cannot be acquired immediately, acquisition is retried with
/// exponential backoff until `timeout` elapses. Parent directories of
/// `lock_path` are created as needed.
///
/// # Errors
///
/// Returns `LockError::Timeout` when the lock is still held by someone else
/// after `timeout`, `LockError::Io` when the lock file cannot be created.
///
/// # Examples
///
/// ```no_run
/// use toolfetch_core::lock::acquire_lock;
/// use std::time::Duration;
/// use std::path::Path;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let lock_path = Path::new("/tmp/odo/cache/1.0.0/.odo.lock");
/// let guard = acquire_lock(lock_path, Duration::from_secs(30), "install odo 1.0.0")?;
/// // Critical section here
/// drop(guard);
/// # Ok(())
/// # }
/// ```
pub fn acquire_lock(
    lock_path: &Path,
    timeout: Duration,
    description: &str,
) -> Result<LockGuard, LockError> {
    acquire::acquire_with_retry(lock_path, timeout, description)
}

/// Lock file guarding the installation of `command_path`
///
/// ```rust
/// use std::path::{Path, PathBuf};
/// use toolfetch_core::lock::lock_path_for;
///
/// assert_eq!(
///     lock_path_for(Path::new("/base/cache/1.0.0/odo")),
///     PathBuf::from("/base/cache/1.0.0/.odo.lock")
/// );
/// ```
pub fn lock_path_for(command_path: &Path) -> PathBuf {
    let name = command_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "install".to_string());
    command_path.with_file_name(format!(".{name}.lock"))
}
