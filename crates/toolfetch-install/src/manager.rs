//! The download orchestrator
//!
//! [`ToolManager`] ties the pieces together for one `ensure` call:
//!
//! ```text
//! ensure_tool(name, locator)
//!     ↓
//! 1. Load config            → ToolNotFound if the tool is absent
//! 2. Resolve platform entry → PlatformNotFound if no key matches
//! 3. Target path            → <baseDir>/cache/<version>/<cmdFileName>
//! 4. Probe installed version (cmdFileName on PATH)
//! 5. Compatible?            → { cmdFileName, downloaded: false }
//! 6. Target exists?         → { target, downloaded: false }
//! 7. Silent or confirmed?   → otherwise { cmdFileName, downloaded: false }
//!     ↓ (background task)
//! 8. Download next to the target (cancellable)
//! 9. Unwrap, install, mark executable
//!     ↓
//! 10. { target, downloaded: true } or Setup error naming the tool
//! ```
//!
//! Steps 1 to 7 run on the calling thread; the handle returned by
//! [`ToolManager::ensure_tool`] is already resolved unless a download starts.

use crate::confirm::{AlwaysConfirm, Confirm, DownloadPrompt, NeverConfirm};
use crate::config_source::load_tools_config;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::handle::{ToolHandle, ToolInstance};
use crate::install::InstallJob;
use crate::platform::Platform;
use crate::progress::ProgressSink;
use crate::runner::{CommandRunner, SystemRunner};
use crate::tasks::{BackgroundTasks, ThreadTasks};
use crate::version::{VersionPolicy, VersionProbe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use toolfetch_core::path::{HOME_PLACEHOLDER, home_dir};
use toolfetch_core::{ConfigLocator, PlatformEntry, Result, ToolConfig, ToolError, ToolsConfig};
use tracing::{debug, info};

/// Default time to wait for a concurrent install of the same version
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(600);

/// What the engine knows about a tool before deciding to download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolStatus {
    pub tool: String,
    /// Platform key whose entry was selected
    pub platform: String,
    pub required_version: String,
    /// Version reported by the command on `PATH`, empty if none
    pub current_version: String,
    pub compatible: bool,
    /// Command as found on `PATH`
    pub command: String,
    /// Location in the version cache
    pub target: PathBuf,
    pub silent: bool,
}

impl ToolStatus {
    /// Whether the version cache already holds the command
    pub fn cached(&self) -> bool {
        self.target.exists()
    }
}

enum Decision {
    Done(ToolInstance),
    Download(InstallJob),
}

/// Caller-owned engine ensuring tools are installed
///
/// Collaborators are injected through [`ToolManagerBuilder`]; nothing is
/// shared between managers.
///
/// # Examples
///
/// ```no_run
/// use toolfetch_install::ToolManager;
/// use toolfetch_core::ConfigLocator;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let manager = ToolManager::builder().silent_confirm().build()?;
/// let locator: ConfigLocator = "tools.json".parse()?;
///
/// let odo = manager.ensure_tool_blocking("odo", &locator)?;
/// println!("run {} (downloaded: {})", odo.command, odo.downloaded);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ToolManager {
    fetcher: Arc<dyn Fetcher>,
    runner: Arc<dyn CommandRunner>,
    confirm: Arc<dyn Confirm>,
    tasks: Arc<dyn BackgroundTasks>,
    platform: Platform,
    lock_timeout: Duration,
    home: Option<PathBuf>,
}

impl ToolManager {
    pub fn builder() -> ToolManagerBuilder {
        ToolManagerBuilder::default()
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Ensures `tool` from the document at `locator` is available
    ///
    /// Never fails synchronously: every failure resolves the returned handle.
    pub fn ensure_tool(&self, tool: &str, locator: &ConfigLocator) -> ToolHandle {
        match self.load_config(locator) {
            Ok(config) => self.ensure_tool_with_config(tool, &config, &locator.to_string()),
            Err(e) => ToolHandle::ready(tool, Err(e)),
        }
    }

    /// Reads the tools document at `locator` through the manager's fetcher
    pub fn load_config(&self, locator: &ConfigLocator) -> Result<ToolsConfig> {
        Ok(load_tools_config(locator, self.fetcher.as_ref())?)
    }

    /// [`ToolManager::ensure_tool`], waiting for the result
    pub fn ensure_tool_blocking(
        &self,
        tool: &str,
        locator: &ConfigLocator,
    ) -> Result<ToolInstance> {
        self.ensure_tool(tool, locator).wait()
    }

    /// Ensures `tool` from an already loaded document
    ///
    /// `source` names the document in error messages.
    pub fn ensure_tool_with_config(
        &self,
        tool: &str,
        config: &ToolsConfig,
        source: &str,
    ) -> ToolHandle {
        match self.decide(tool, config, source) {
            Ok(Decision::Done(instance)) => ToolHandle::ready(tool, Ok(instance)),
            Ok(Decision::Download(job)) => self.spawn(job),
            Err(e) => ToolHandle::ready(tool, Err(e)),
        }
    }

    /// Resolves, probes and evaluates `tool` without downloading anything
    pub fn status(&self, tool: &str, config: &ToolsConfig, source: &str) -> Result<ToolStatus> {
        let (status, _, _) = self.inspect(tool, config, source)?;
        Ok(status)
    }

    fn inspect<'c>(
        &self,
        name: &str,
        config: &'c ToolsConfig,
        source: &str,
    ) -> Result<(ToolStatus, &'c ToolConfig, &'c PlatformEntry)> {
        let tool = config.tool(name).ok_or_else(|| ToolError::ToolNotFound {
            tool: name.to_string(),
            location: source.to_string(),
        })?;

        let entry = self
            .platform
            .resolve(tool)
            .ok_or_else(|| ToolError::PlatformNotFound {
                tool: name.to_string(),
                platform: self.platform.key(),
                location: source.to_string(),
            })?;

        let home = self.home_for(&tool.base_dir)?;
        let target = tool.install_path(&home, entry);

        let invalid = |pattern: &str, e: regex::Error| ToolError::InvalidPattern {
            tool: name.to_string(),
            pattern: pattern.to_string(),
            reason: e.to_string(),
        };
        let probe = VersionProbe::new(&tool.version_extract_regexp)
            .map_err(|e| invalid(&tool.version_extract_regexp, e))?;
        let policy = VersionPolicy::new(&tool.version_match_regexp)
            .map_err(|e| invalid(&tool.version_match_regexp, e))?;

        let current_version =
            probe.probe(self.runner.as_ref(), &entry.cmd_file_name, &tool.version_args());
        let compatible = policy.is_compatible(&current_version);
        debug!(
            tool = name,
            current = %current_version,
            required = %tool.version,
            compatible,
            "evaluated installed version"
        );

        let status = ToolStatus {
            tool: name.to_string(),
            platform: self.platform.key(),
            required_version: tool.version.clone(),
            current_version,
            compatible,
            command: entry.cmd_file_name.clone(),
            target,
            silent: tool.silent_mode,
        };
        Ok((status, tool, entry))
    }

    fn decide(&self, name: &str, config: &ToolsConfig, source: &str) -> Result<Decision> {
        let (status, tool, entry) = self.inspect(name, config, source)?;

        if status.compatible {
            return Ok(Decision::Done(ToolInstance::existing(status.command)));
        }

        if status.cached() {
            debug!(tool = name, path = %status.target.display(), "using cached download");
            return Ok(Decision::Done(ToolInstance::existing(
                status.target.display().to_string(),
            )));
        }

        if !tool.silent_mode {
            let prompt = DownloadPrompt {
                tool: name.to_string(),
                current_version: status.current_version.clone(),
                required_version: tool.version.clone(),
            };
            if !self.confirm.confirm(&prompt) {
                info!(tool = name, "download declined, using command from PATH");
                return Ok(Decision::Done(ToolInstance::existing(status.command)));
            }
        }

        Ok(Decision::Download(InstallJob {
            tool: name.to_string(),
            url: entry.url.clone(),
            dl_file_name: entry.dl_file_name.clone(),
            target: status.target,
            lock_timeout: self.lock_timeout,
        }))
    }

    fn spawn(&self, job: InstallJob) -> ToolHandle {
        let (completer, handle) = ToolHandle::pending(&job.tool);
        let fetcher = Arc::clone(&self.fetcher);
        let title = format!("Downloading {}", job.tool);

        self.tasks.spawn(
            &title,
            Box::new(move |progress: &dyn ProgressSink| {
                completer.complete(job.run(fetcher.as_ref(), progress))
            }),
        );

        handle
    }

    /// Home directory, required only when `base_dir` uses the placeholder
    fn home_for(&self, base_dir: &str) -> Result<PathBuf> {
        if !base_dir.contains(HOME_PLACEHOLDER) {
            return Ok(PathBuf::new());
        }

        self.home
            .clone()
            .or_else(home_dir)
            .ok_or_else(|| ToolError::HomeNotFound {
                template: base_dir.to_string(),
            })
    }
}

/// Builder for [`ToolManager`]
///
/// Unset collaborators default to [`HttpFetcher`], [`SystemRunner`],
/// [`ThreadTasks`] and a confirmation that declines every download.
#[derive(Default)]
pub struct ToolManagerBuilder {
    fetcher: Option<Arc<dyn Fetcher>>,
    runner: Option<Arc<dyn CommandRunner>>,
    confirm: Option<Arc<dyn Confirm>>,
    tasks: Option<Arc<dyn BackgroundTasks>>,
    platform: Option<Platform>,
    lock_timeout: Option<Duration>,
    home: Option<PathBuf>,
}

impl ToolManagerBuilder {
    pub fn fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Some(Arc::new(fetcher));
        self
    }

    pub fn runner(mut self, runner: impl CommandRunner + 'static) -> Self {
        self.runner = Some(Arc::new(runner));
        self
    }

    pub fn confirm(mut self, confirm: impl Confirm + 'static) -> Self {
        self.confirm = Some(Arc::new(confirm));
        self
    }

    /// Accept every download without asking
    pub fn silent_confirm(self) -> Self {
        self.confirm(AlwaysConfirm)
    }

    pub fn tasks(mut self, tasks: impl BackgroundTasks + 'static) -> Self {
        self.tasks = Some(Arc::new(tasks));
        self
    }

    /// Resolve platform entries for `platform` instead of the running one
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    /// Directory substituted for `$HOME` in `baseDir`
    pub fn home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    /// # Errors
    ///
    /// Fails only when the default HTTP client cannot be constructed.
    pub fn build(self) -> std::result::Result<ToolManager, reqwest::Error> {
        let fetcher: Arc<dyn Fetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpFetcher::new()?),
        };

        Ok(ToolManager {
            fetcher,
            runner: self.runner.unwrap_or_else(|| Arc::new(SystemRunner::new())),
            confirm: self.confirm.unwrap_or_else(|| Arc::new(NeverConfirm)),
            tasks: self.tasks.unwrap_or_else(|| Arc::new(ThreadTasks::new())),
            platform: self.platform.unwrap_or_else(Platform::current),
            lock_timeout: self.lock_timeout.unwrap_or(DEFAULT_LOCK_TIMEOUT),
            home: self.home,
        })
    }
}
