use std::path::PathBuf;
use thiserror::Error;

/// Failure to take the install lock of a version directory
#[derive(Error, Debug)]
pub enum LockError {
    /// Another install kept the lock past the timeout
    #[error("timed out waiting for lock {} ({description})", path.display())]
    Timeout { path: PathBuf, description: String },

    #[error("could not {operation} for lock {}", path.display())]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
        operation: String,
    },
}
