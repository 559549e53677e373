//! External command execution

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

/// Runs a program non-interactively and returns its captured output
///
/// A non-zero exit status is not an error as long as the program ran;
/// whatever it printed is returned.
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &str, args: &[String]) -> io::Result<String>;
}

impl<F> CommandRunner for F
where
    F: Fn(&str, &[String]) -> io::Result<String> + Send + Sync,
{
    fn run(&self, program: &str, args: &[String]) -> io::Result<String> {
        self(program, args)
    }
}

/// Spawns real processes
///
/// Bare program names are looked up on `PATH` (or on the search path given
/// to [`SystemRunner::with_search_path`]); names with a directory part are
/// used as they are. Output is stdout followed by stderr.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    search_path: Option<OsString>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve bare names against `paths` (same syntax as `PATH`) instead of
    /// the process environment
    pub fn with_search_path(paths: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(paths.into()),
        }
    }

    fn locate(&self, program: &str) -> io::Result<PathBuf> {
        let located = match &self.search_path {
            Some(paths) => {
                let cwd = std::env::current_dir()?;
                which::which_in(program, Some(paths), cwd)
            }
            None => which::which(program),
        };

        located.map_err(|e| io::Error::new(io::ErrorKind::NotFound, format!("{program}: {e}")))
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> io::Result<String> {
        let path = self.locate(program)?;
        debug!(program = %path.display(), ?args, "running version command");

        let output = Command::new(&path)
            .args(args)
            .stdin(Stdio::null())
            .output()?;

        if !output.status.success() {
            debug!(
                program = %path.display(),
                status = %output.status,
                "version command exited unsuccessfully"
            );
        }

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&String::from_utf8_lossy(&output.stderr));
        }

        Ok(text)
    }
}
