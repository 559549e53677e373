//! Test utilities for toolfetch
//!
//! This crate provides shared testing utilities used across the toolfetch workspace:
//! scratch directories, fake tool executables, archive fixtures and tools
//! configuration documents.

pub mod fixtures;
pub mod scripts;

pub use fixtures::{
    ToolDocument, bzip2_bytes, gzip_bytes, tar_bytes, tar_gz_bytes, tar_xz_bytes, xz_bytes,
    zip_bytes, zip_bytes_with_data_descriptors, zstd_bytes,
};
pub use scripts::{fake_tool, fake_tool_with_exit};

use tempfile::TempDir;

/// Creates a temporary directory within `.tmp/` at the project root
///
/// All test temporary files end up in a single gitignored location that is
/// easy to clean up manually if a test run is interrupted.
///
/// # Panics
///
/// Panics if the current directory is unknown or `.tmp/` cannot be created.
///
/// # Examples
///
/// ```rust
/// use toolfetch_testkit::temp_dir_in_workspace;
///
/// let temp = temp_dir_in_workspace();
/// let file_path = temp.path().join("test.txt");
/// std::fs::write(&file_path, "test data").unwrap();
/// // Cleanup happens automatically when temp is dropped
/// ```
pub fn temp_dir_in_workspace() -> TempDir {
    try_temp_dir_in_workspace().expect("Failed to create temporary directory in .tmp/")
}

/// Alternative with Result for non-test code
pub fn try_temp_dir_in_workspace() -> std::io::Result<TempDir> {
    let workspace_root = std::env::current_dir()?;
    let tmp_base = workspace_root.join(".tmp");
    std::fs::create_dir_all(&tmp_base)?;
    TempDir::new_in(&tmp_base)
}
