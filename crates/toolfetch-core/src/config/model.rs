use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use url::Url;

/// Root of the tools configuration document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub tools: BTreeMap<String, ToolConfig>,
}

/// One managed tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolConfig {
    /// Required version, also the name of the cache subdirectory
    pub version: String,

    /// Arguments appended to the command to print its version
    #[serde(default)]
    pub version_cmd: String,

    /// Regex with one capture group, matched against whole output lines
    #[serde(default, rename = "versionExtractRegExp")]
    pub version_extract_regexp: String,

    /// Regex the extracted version must fully match; empty accepts any version
    #[serde(default, rename = "versionMatchRegExpr")]
    pub version_match_regexp: String,

    /// Install root; `$HOME` is replaced with the user's home directory
    pub base_dir: String,

    /// Download without asking for confirmation
    #[serde(default)]
    pub silent_mode: bool,

    /// Keyed by `<os>-<arch>` or `<os>`
    pub platforms: BTreeMap<String, PlatformEntry>,
}

/// Per-platform download and installation metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformEntry {
    pub url: Url,
    pub cmd_file_name: String,
    pub dl_file_name: String,
}

impl ToolsConfig {
    /// Parses a JSON document; `location` only labels errors
    pub fn from_json(content: &str, location: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|source| ConfigError::Parse {
            location: location.to_string(),
            source,
        })
    }

    /// Reads and parses a JSON document from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let location = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            location: location.clone(),
            source,
        })?;

        Self::from_json(&content, &location)
    }

    pub fn tool(&self, name: &str) -> Option<&ToolConfig> {
        self.tools.get(name)
    }
}

impl ToolConfig {
    /// Version subcommand split into arguments
    pub fn version_args(&self) -> Vec<String> {
        self.version_cmd
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    /// `<baseDir>/cache/<version>` with `$HOME` expanded
    pub fn version_dir(&self, home: &Path) -> PathBuf {
        crate::path::expand_home(&self.base_dir, home)
            .join("cache")
            .join(&self.version)
    }

    /// Final location of the command for `platform`
    pub fn install_path(&self, home: &Path, platform: &PlatformEntry) -> PathBuf {
        self.version_dir(home).join(&platform.cmd_file_name)
    }
}
