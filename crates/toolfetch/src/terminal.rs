//! Interactive prompt and progress output on the controlling terminal

use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use toolfetch_install::{CancelToken, Confirm, DownloadPrompt, ProgressSink};
use tracing::debug;

/// Exit status after Ctrl-C
pub const EXIT_CANCELLED: i32 = 130;

/// Routes Ctrl-C for one `ensure` run
///
/// Until the download starts an interrupt ends the process. Once it runs the
/// interrupt cancels the download so the partial file is cleaned up.
#[derive(Clone, Default)]
pub struct Interrupt {
    cancel: CancelToken,
    downloading: Arc<AtomicBool>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&self) {
        let interrupt = self.clone();
        let handler = move || {
            if !interrupt.interrupt() {
                eprintln!();
                std::process::exit(EXIT_CANCELLED);
            }
        };
        if let Err(e) = ctrlc::set_handler(handler) {
            debug!(error = %e, "could not install Ctrl-C handler");
        }
    }

    /// Returns `true` when a running download was cancelled
    fn interrupt(&self) -> bool {
        if self.downloading.load(Ordering::SeqCst) {
            self.cancel.cancel();
            true
        } else {
            false
        }
    }

    fn start_download(&self) {
        self.downloading.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Asks on stderr and reads the answer from stdin
///
/// Anything but `y`/`yes` declines, including a closed stdin.
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, prompt: &DownloadPrompt) -> bool {
        let mut err = io::stderr().lock();
        let _ = write!(err, "{}: {} [y/N] ", prompt.title().bold(), prompt.message());
        let _ = err.flush();
        drop(err);

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_yes(&answer),
            Err(_) => false,
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Prints download progress to stderr in ten percent steps
pub struct TerminalProgress {
    interrupt: Interrupt,
    last_step: Mutex<Option<u8>>,
}

impl TerminalProgress {
    pub fn new(interrupt: Interrupt) -> Self {
        Self {
            interrupt,
            last_step: Mutex::new(None),
        }
    }
}

impl ProgressSink for TerminalProgress {
    fn set_fraction(&self, fraction: f64) {
        let step = (fraction.clamp(0.0, 1.0) * 10.0).floor() as u8;
        let Ok(mut last) = self.last_step.lock() else {
            return;
        };
        if *last == Some(step) {
            return;
        }
        *last = Some(step);
        eprintln!("  {}%", u32::from(step) * 10);
    }

    fn set_text(&self, text: &str) {
        self.interrupt.start_download();
        eprintln!("{} {}", "→".cyan(), text);
    }

    fn is_cancelled(&self) -> bool {
        self.interrupt.is_cancelled()
    }
}
