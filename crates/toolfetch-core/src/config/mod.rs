//! Tools configuration document
//!
//! The document lists every managed tool under `tools.<name>`:
//!
//! ```json
//! {
//!   "tools": {
//!     "odo": {
//!       "version": "1.0.0",
//!       "versionCmd": "version",
//!       "versionExtractRegExp": "odo v(\\d+\\.\\d+\\.\\d+).*",
//!       "versionMatchRegExpr": "1\\..*",
//!       "baseDir": "$HOME/.tools/odo",
//!       "silentMode": false,
//!       "platforms": {
//!         "lnx": {
//!           "url": "https://example.com/odo/v1.0.0/odo-linux-amd64.tar.gz",
//!           "cmdFileName": "odo",
//!           "dlFileName": "odo-linux-amd64.tar.gz"
//!         }
//!       }
//!     }
//!   }
//! }
//! ```

mod locator;
mod model;

pub use locator::ConfigLocator;
pub use model::{PlatformEntry, ToolConfig, ToolsConfig};

use thiserror::Error;

/// Errors raised while reading or parsing a tools configuration document
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read tools config {location}")]
    Read {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch tools config {location}: {reason}")]
    Fetch { location: String, reason: String },

    #[error("failed to parse tools config {location}")]
    Parse {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid tools config location '{0}'")]
    InvalidLocation(String),
}
