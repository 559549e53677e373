//! Platform keys and per-platform entry resolution
//!
//! Tool documents key their download metadata by `<os>-<arch>` (for example
//! `lnx-amd64`) or by `<os>` alone. Resolution prefers the specific key and
//! falls back to the OS-only one.

use std::fmt;
use toolfetch_core::{PlatformEntry, ToolConfig};

/// Normalized operating system and CPU architecture identifiers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Platform {
    os: String,
    arch: String,
}

impl Platform {
    /// Platform of the running process
    pub fn current() -> Self {
        Self::new(
            os_id(std::env::consts::OS),
            arch_id(std::env::consts::ARCH),
        )
    }

    /// Arbitrary platform, ids are used verbatim
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    pub fn os(&self) -> &str {
        &self.os
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// `<os>-<arch>`
    pub fn key(&self) -> String {
        format!("{}-{}", self.os, self.arch)
    }

    /// Keys in lookup order: specific first, then OS-only
    pub fn lookup_keys(&self) -> [String; 2] {
        [self.key(), self.os.clone()]
    }

    /// Entry of `tool` for this platform
    pub fn resolve<'a>(&self, tool: &'a ToolConfig) -> Option<&'a PlatformEntry> {
        self.lookup_keys()
            .iter()
            .find_map(|key| tool.platforms.get(key))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

/// Short identifier used in platform keys for a `std::env::consts::OS` value
pub fn os_id(os: &str) -> &str {
    match os {
        "windows" => "win",
        "macos" => "osx",
        "linux" => "lnx",
        "solaris" | "illumos" => "sun",
        other => other,
    }
}

/// Short identifier used in platform keys for a `std::env::consts::ARCH` value
pub fn arch_id(arch: &str) -> &str {
    match arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "x86",
        "powerpc" | "powerpc64" => "ppc",
        "sparc" | "sparc64" => "sparc",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn entry(cmd: &str) -> PlatformEntry {
        PlatformEntry {
            url: format!("https://example.com/{cmd}").parse().unwrap(),
            cmd_file_name: cmd.to_string(),
            dl_file_name: format!("{cmd}.tar.gz"),
        }
    }

    fn tool(keys: &[(&str, &str)]) -> ToolConfig {
        ToolConfig {
            version: "1.0.0".to_string(),
            version_cmd: "version".to_string(),
            version_extract_regexp: String::new(),
            version_match_regexp: String::new(),
            base_dir: "/opt/x".to_string(),
            silent_mode: false,
            platforms: keys
                .iter()
                .map(|(key, cmd)| (key.to_string(), entry(cmd)))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn test_specific_key_preferred_over_os_key() {
        let tool = tool(&[("lnx", "a"), ("lnx-amd64", "b")]);
        let resolved = Platform::new("lnx", "amd64").resolve(&tool).unwrap();
        assert_eq!(resolved.cmd_file_name, "b");
    }

    #[test]
    fn test_falls_back_to_os_key() {
        let tool = tool(&[("lnx", "a"), ("lnx-amd64", "b")]);
        let resolved = Platform::new("lnx", "arm64").resolve(&tool).unwrap();
        assert_eq!(resolved.cmd_file_name, "a");
    }

    #[test]
    fn test_specific_key_only() {
        let tool = tool(&[("osx-arm64", "c")]);
        assert!(Platform::new("osx", "arm64").resolve(&tool).is_some());
        assert!(Platform::new("osx", "amd64").resolve(&tool).is_none());
    }

    #[test]
    fn test_not_found() {
        let tool = tool(&[("win", "d")]);
        assert!(Platform::new("lnx", "amd64").resolve(&tool).is_none());
    }

    #[test]
    fn test_normalized_ids() {
        assert_eq!(os_id("windows"), "win");
        assert_eq!(os_id("macos"), "osx");
        assert_eq!(os_id("linux"), "lnx");
        assert_eq!(os_id("illumos"), "sun");
        assert_eq!(os_id("freebsd"), "freebsd");
        assert_eq!(arch_id("x86_64"), "amd64");
        assert_eq!(arch_id("aarch64"), "arm64");
        assert_eq!(arch_id("powerpc64"), "ppc");
        assert_eq!(arch_id("riscv64"), "riscv64");
    }

    #[test]
    #[cfg(all(target_os = "linux", target_arch = "x86_64"))]
    fn test_current_linux_amd64() {
        assert_eq!(Platform::current().key(), "lnx-amd64");
    }

    #[test]
    fn test_display_is_specific_key() {
        let platform = Platform::new("win", "x86");
        assert_eq!(platform.to_string(), "win-x86");
        assert_eq!(platform.lookup_keys(), ["win-x86".to_string(), "win".to_string()]);
    }
}
