use crate::config::ConfigError;
use thiserror::Error;

/// Boxed error carried as the cause of a failed tool setup
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum ToolError {
    // Resolution errors
    #[error("TOOL_NOT_FOUND: Tool {tool} not found in config file {location}")]
    ToolNotFound { tool: String, location: String },

    #[error(
        "PLATFORM_NOT_FOUND: Tool {tool} has no entry for platform '{platform}' in config file {location}"
    )]
    PlatformNotFound {
        tool: String,
        platform: String,
        location: String,
    },

    // Config errors
    #[error("CONFIG_INVALID: invalid tools configuration")]
    Config(#[from] ConfigError),

    #[error("PATTERN_INVALID: tool {tool}: invalid regular expression '{pattern}': {reason}")]
    InvalidPattern {
        tool: String,
        pattern: String,
        reason: String,
    },

    #[error("HOME_NOT_FOUND: could not determine home directory to expand '{template}'")]
    HomeNotFound { template: String },

    // Download/install errors
    #[error("TOOL_SETUP_FAILED: Error while setting tool {tool}.")]
    Setup {
        tool: String,
        #[source]
        source: BoxError,
    },

    #[error("TOOL_DOWNLOAD_CANCELLED: download of tool {tool} was cancelled")]
    Cancelled { tool: String },

    #[error("TOOL_INTERRUPTED: setup of tool {tool} ended without a result")]
    Interrupted { tool: String },
}

impl ToolError {
    /// Wraps a download or install failure with the tool name
    pub fn setup(tool: impl Into<String>, source: impl Into<BoxError>) -> Self {
        ToolError::Setup {
            tool: tool.into(),
            source: source.into(),
        }
    }

    /// True when the attempt was abandoned through the cancellation flag
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ToolError::Cancelled { .. })
    }

    /// True for the NotFound class (unknown tool or unsupported platform)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ToolError::ToolNotFound { .. } | ToolError::PlatformNotFound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ToolError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn test_setup_error_names_tool_and_keeps_cause() {
        let err = ToolError::setup("odo", io::Error::other("connection reset"));

        assert_eq!(
            err.to_string(),
            "TOOL_SETUP_FAILED: Error while setting tool odo."
        );
        let source = err.source().expect("setup error should carry its cause");
        assert_eq!(source.to_string(), "connection reset");
    }

    #[test]
    fn test_not_found_classification() {
        let missing_tool = ToolError::ToolNotFound {
            tool: "kn".to_string(),
            location: "tools.json".to_string(),
        };
        let missing_platform = ToolError::PlatformNotFound {
            tool: "kn".to_string(),
            platform: "lnx-arm64".to_string(),
            location: "tools.json".to_string(),
        };
        let cancelled = ToolError::Cancelled {
            tool: "kn".to_string(),
        };

        assert!(missing_tool.is_not_found());
        assert!(missing_platform.is_not_found());
        assert!(!cancelled.is_not_found());
        assert!(cancelled.is_cancelled());
        assert!(missing_platform.to_string().contains("lnx-arm64"));
    }
}
