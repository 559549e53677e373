//! Ensuring external command-line tools are installed at a compatible version.
//!
//! Given a tools configuration document, this crate resolves the entry for
//! the running platform, probes the version of the installed command,
//! evaluates it against the required-version pattern and, when needed,
//! downloads, unwraps and installs the tool into a version-scoped cache.
//!
//! # Architecture
//!
//! - [`platform`]: platform keys and entry resolution
//! - [`version`]: version probing and the compatibility policy
//! - [`unwrap`]: extension-driven decompression and archive reading
//! - [`install`]: download loop and installation into the cache
//! - [`manager`]: the orchestrator, [`ToolManager`]
//! - [`handle`]: the completion handle returned by every `ensure` call
//!
//! Collaborators the host can replace: [`fetch::Fetcher`],
//! [`runner::CommandRunner`], [`confirm::Confirm`],
//! [`tasks::BackgroundTasks`] and [`progress::ProgressSink`].
//!
//! # Managed Cache Structure
//!
//! ```text
//! <baseDir>/cache/<version>/
//!     <cmdFileName>         installed command
//!     <dlFileName>          downloaded artifact
//!     .<cmdFileName>.lock   install lock
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use toolfetch_install::{Progress, ThreadTasks, ToolManager};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let progress = Arc::new(Progress::new());
//! let manager = ToolManager::builder()
//!     .silent_confirm()
//!     .tasks(ThreadTasks::with_sink(progress.clone()))
//!     .build()?;
//!
//! let handle = manager.ensure_tool("odo", &"tools.json".parse()?);
//! // progress.cancel() from another thread stops the download
//! let odo = handle.wait()?;
//! println!("{}", odo.command);
//! # Ok(())
//! # }
//! ```

pub mod config_source;
pub mod confirm;
pub mod fetch;
pub mod handle;
pub mod install;
pub mod manager;
pub mod platform;
pub mod progress;
pub mod runner;
pub mod tasks;
pub mod unwrap;
pub mod version;

// Re-export commonly used types
pub use config_source::load_tools_config;
pub use confirm::{AlwaysConfirm, Confirm, DownloadPrompt, NeverConfirm};
pub use fetch::{FetchError, FetchResponse, Fetcher, HttpFetcher};
pub use handle::{ToolHandle, ToolInstance};
pub use install::InstallError;
pub use manager::{DEFAULT_LOCK_TIMEOUT, ToolManager, ToolManagerBuilder, ToolStatus};
pub use platform::Platform;
pub use progress::{CancelToken, Progress, ProgressSink};
pub use runner::{CommandRunner, SystemRunner};
pub use tasks::{BackgroundTasks, InlineTasks, Task, ThreadTasks};

// Type alias for convenience
pub type Result<T> = toolfetch_core::Result<T>;
