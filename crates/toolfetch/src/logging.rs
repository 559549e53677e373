//! Tracing subscriber for the command line

use std::io;
use tracing_subscriber::EnvFilter;

/// Installs a stderr subscriber
///
/// `RUST_LOG` selects the filter; without it only warnings are shown.
/// `--verbose` forces debug output for the toolfetch crates.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("toolfetch=debug,toolfetch_install=debug,toolfetch_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}
