//! RAII lock guard for automatic lock release

use std::fs::File;
use std::path::{Path, PathBuf};

/// RAII guard for file locks
///
/// The fs2 advisory lock is tied to the open file descriptor, so dropping the
/// guard (closing `file`) releases it, including on early returns and panics.
#[derive(Debug)]
pub struct LockGuard {
    #[allow(dead_code)]
    pub(crate) file: File,
    pub(crate) path: PathBuf,
}

impl LockGuard {
    /// Path of the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }
}
