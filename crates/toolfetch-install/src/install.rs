//! Download and installation into the version cache
//!
//! This module performs the background half of an `ensure` call:
//!
//! - Streaming the artifact next to the command path with progress and
//!   cancellation checks between chunks
//! - Unwrapping it through the layers named by its extensions
//! - Writing the payload (or every archive entry) atomically beside the
//!   command and marking it executable
//!
//! The whole phase runs under an advisory lock on the version directory, so
//! concurrent installs of the same tool and version download only once.

use crate::fetch::{FetchError, Fetcher};
use crate::handle::ToolInstance;
use crate::progress::ProgressSink;
use crate::unwrap::{self, EntryKind, UnwrapError, Unwrapped};
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use toolfetch_core::lock::{LockError, acquire_lock, lock_path_for};
use toolfetch_core::{Result, ToolError};
use tracing::{debug, info};
use url::Url;

/// Size of the download buffer; progress and cancellation are checked once
/// per chunk
pub const BUFFER_SIZE: usize = 4096;

/// Install error types
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("download from {url} failed")]
    Download {
        url: Url,
        #[source]
        source: FetchError,
    },

    #[error("failed to {operation}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },

    #[error("could not unpack download")]
    Decompression(#[from] UnwrapError),

    #[error("{} was not found after unpacking {}", command.display(), download.display())]
    MissingCommand { command: PathBuf, download: PathBuf },

    #[error(transparent)]
    Lock(#[from] LockError),
}

fn io_error(operation: impl Into<String>) -> impl FnOnce(io::Error) -> InstallError {
    let operation = operation.into();
    move |source| InstallError::Io { operation, source }
}

/// How a download loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    Complete { bytes: u64 },
    /// Stopped through the progress sink; the partial file stays on disk
    Cancelled { bytes: u64 },
}

/// Streams `url` into `dest`, reporting progress after every chunk
///
/// The fraction is `bytes / content length`; when the server announces no
/// length (or zero) no fraction is reported. A sink that is already
/// cancelled stops the download before any request is sent.
pub fn download_to(
    fetcher: &dyn Fetcher,
    url: &Url,
    dest: &Path,
    progress: &dyn ProgressSink,
) -> std::result::Result<DownloadOutcome, InstallError> {
    if progress.is_cancelled() {
        info!(%url, "download cancelled before it started");
        return Ok(DownloadOutcome::Cancelled { bytes: 0 });
    }

    let response = fetcher.fetch(url).map_err(|source| InstallError::Download {
        url: url.clone(),
        source,
    })?;
    let total = response.content_length.filter(|&len| len > 0);
    let mut body = response.body;

    let mut file =
        File::create(dest).map_err(io_error(format!("create {}", dest.display())))?;

    let mut downloaded: u64 = 0;
    let mut buffer = [0; BUFFER_SIZE];

    loop {
        if progress.is_cancelled() {
            info!(%url, bytes = downloaded, "download cancelled");
            return Ok(DownloadOutcome::Cancelled { bytes: downloaded });
        }

        let bytes_read = match body.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(io_error(format!("read from {url}"))(e)),
        };

        file.write_all(&buffer[..bytes_read])
            .map_err(io_error(format!("write {}", dest.display())))?;

        downloaded += bytes_read as u64;

        if let Some(total) = total {
            progress.set_fraction(downloaded as f64 / total as f64);
        }
    }

    file.sync_all()
        .map_err(io_error(format!("sync {}", dest.display())))?;

    debug!(%url, bytes = downloaded, dest = %dest.display(), "download complete");
    Ok(DownloadOutcome::Complete { bytes: downloaded })
}

/// Unwraps `download` and installs the result as `target`
///
/// A single payload stream becomes `target` itself; archive entries are
/// written next to `target` under their entry names. Every installed file is
/// marked executable. Returns the installed files.
pub fn install_download(
    download: &Path,
    dl_file_name: &str,
    target: &Path,
) -> std::result::Result<Vec<PathBuf>, InstallError> {
    let file = File::open(download).map_err(io_error(format!("open {}", download.display())))?;

    match unwrap::unwrap(dl_file_name, BufReader::new(file))? {
        Unwrapped::Stream(mut payload) => {
            write_executable(target, &mut payload)?;
            Ok(vec![target.to_path_buf()])
        }
        Unwrapped::Archive(archive) => {
            let dir = parent_dir(target)?;
            let mut installed = Vec::new();

            archive.for_each_entry(|entry| -> std::result::Result<(), InstallError> {
                let dest = dir.join(&entry.path);
                match entry.kind {
                    EntryKind::Directory => {
                        fs::create_dir_all(&dest)
                            .map_err(io_error(format!("create directory {}", dest.display())))?;
                    }
                    EntryKind::File => {
                        if let Some(parent) = dest.parent() {
                            fs::create_dir_all(parent).map_err(io_error(format!(
                                "create parent directory {}",
                                parent.display()
                            )))?;
                        }
                        write_executable(&dest, entry.reader)?;
                        installed.push(dest);
                    }
                }
                Ok(())
            })?;

            if !target.is_file() {
                return Err(InstallError::MissingCommand {
                    command: target.to_path_buf(),
                    download: download.to_path_buf(),
                });
            }
            Ok(installed)
        }
    }
}

fn parent_dir(path: &Path) -> std::result::Result<&Path, InstallError> {
    path.parent().ok_or_else(|| InstallError::Io {
        operation: format!("get parent directory of {}", path.display()),
        source: io::Error::other("no parent directory"),
    })
}

/// Writes `reader` to `dest` through a temporary file in the same directory
///
/// `dest` only ever appears complete and executable.
fn write_executable(dest: &Path, reader: &mut dyn Read) -> std::result::Result<(), InstallError> {
    let dir = parent_dir(dest)?;

    let mut temp = tempfile::NamedTempFile::new_in(dir)
        .map_err(io_error(format!("create temporary file in {}", dir.display())))?;

    io::copy(reader, &mut temp).map_err(io_error(format!("write {}", dest.display())))?;

    temp.as_file()
        .sync_all()
        .map_err(io_error("sync temporary file"))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(temp.path(), fs::Permissions::from_mode(0o755))
            .map_err(io_error("set permissions on temporary file"))?;
    }

    temp.persist(dest).map_err(|e| InstallError::Io {
        operation: format!("rename temporary file to {}", dest.display()),
        source: e.error,
    })?;

    Ok(())
}

/// Adds the executable bits (owner, group, other)
#[cfg(unix)]
pub fn set_executable_permissions(path: &Path) -> std::result::Result<(), InstallError> {
    use std::os::unix::fs::PermissionsExt;

    let metadata =
        fs::metadata(path).map_err(io_error(format!("get metadata for {}", path.display())))?;

    let mut permissions = metadata.permissions();
    let mode = permissions.mode();
    permissions.set_mode(mode | 0o111);

    fs::set_permissions(path, permissions)
        .map_err(io_error(format!("set permissions for {}", path.display())))
}

#[cfg(not(unix))]
pub fn set_executable_permissions(_path: &Path) -> std::result::Result<(), InstallError> {
    Ok(())
}

/// Background half of an `ensure` call for one tool
#[derive(Debug, Clone)]
pub struct InstallJob {
    pub tool: String,
    pub url: Url,
    pub dl_file_name: String,
    /// Final command path, `<baseDir>/cache/<version>/<cmdFileName>`
    pub target: PathBuf,
    pub lock_timeout: Duration,
}

enum JobOutcome {
    Installed,
    /// Another invocation installed the target while we waited for the lock
    AlreadyInstalled,
    Cancelled,
}

impl InstallJob {
    /// Downloads and installs, wrapping failures with the tool name
    pub fn run(&self, fetcher: &dyn Fetcher, progress: &dyn ProgressSink) -> Result<ToolInstance> {
        let command = self.target.display().to_string();

        match self.execute(fetcher, progress) {
            Ok(JobOutcome::Installed) => {
                info!(tool = %self.tool, path = %command, "tool installed");
                Ok(ToolInstance::downloaded(command))
            }
            Ok(JobOutcome::AlreadyInstalled) => Ok(ToolInstance::existing(command)),
            Ok(JobOutcome::Cancelled) => Err(ToolError::Cancelled {
                tool: self.tool.clone(),
            }),
            Err(e) => Err(ToolError::setup(&self.tool, e)),
        }
    }

    /// `dlFileName` equals `cmdFileName`: the artifact is the command itself
    pub fn downloads_command(&self) -> bool {
        self.target.file_name() == Some(std::ffi::OsStr::new(&self.dl_file_name))
    }

    /// Where the artifact is downloaded: `dlFileName` next to the target,
    /// or a staging name when that would be the target itself
    pub fn download_path(&self) -> PathBuf {
        if self.downloads_command() {
            self.target
                .with_file_name(format!("{}.download", self.dl_file_name))
        } else {
            self.target.with_file_name(&self.dl_file_name)
        }
    }

    fn execute(
        &self,
        fetcher: &dyn Fetcher,
        progress: &dyn ProgressSink,
    ) -> std::result::Result<JobOutcome, InstallError> {
        let dir = parent_dir(&self.target)?;
        fs::create_dir_all(dir).map_err(io_error(format!("create directory {}", dir.display())))?;

        let _guard = acquire_lock(
            &lock_path_for(&self.target),
            self.lock_timeout,
            &format!("install {}", self.tool),
        )?;

        if self.target.exists() {
            debug!(tool = %self.tool, "installed by a concurrent invocation");
            return Ok(JobOutcome::AlreadyInstalled);
        }

        let download = self.download_path();
        progress.set_text(&format!("Downloading {}", self.dl_file_name));
        info!(tool = %self.tool, url = %self.url, "downloading");

        match download_to(fetcher, &self.url, &download, progress)? {
            DownloadOutcome::Cancelled { .. } => return Ok(JobOutcome::Cancelled),
            DownloadOutcome::Complete { .. } => {}
        }

        progress.set_text(&format!("Installing {}", self.tool));
        if self.downloads_command() {
            fs::rename(&download, &self.target).map_err(io_error(format!(
                "move {} to {}",
                download.display(),
                self.target.display()
            )))?;
            set_executable_permissions(&self.target)?;
        } else {
            let installed = install_download(&download, &self.dl_file_name, &self.target)?;
            debug!(tool = %self.tool, files = installed.len(), "installed files");
        }

        Ok(JobOutcome::Installed)
    }
}
