//! Shared building blocks for toolfetch.
//!
//! - [`config`]: the tools configuration document and its loader
//! - [`error`]: the error taxonomy surfaced to callers of the engine
//! - [`lock`]: advisory file locks guarding a version directory
//! - [`path`]: `$HOME` expansion and archive entry path validation

pub mod config;
pub mod error;
pub mod lock;
pub mod path;

// Re-export commonly used types
pub use config::{ConfigError, ConfigLocator, PlatformEntry, ToolConfig, ToolsConfig};
pub use error::{Result, ToolError};
