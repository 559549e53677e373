//! Version probing and the compatibility policy
//!
//! Both patterns are applied with full-match semantics: a line (or version)
//! must match the whole regular expression, not merely contain a match.

use crate::runner::CommandRunner;
use regex::Regex;
use tracing::{debug, warn};

/// Compiles `pattern` so that it only matches whole strings
///
/// ```rust
/// use toolfetch_install::version::full_match_regex;
///
/// let re = full_match_regex(r"1\.\d+").unwrap();
/// assert!(re.is_match("1.2"));
/// assert!(!re.is_match("v1.2"));
/// assert!(!re.is_match("1.2-rc"));
/// ```
pub fn full_match_regex(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"\A(?:{pattern})\z"))
}

/// Extracts a version from the output of a tool's version command
#[derive(Debug, Clone)]
pub struct VersionProbe {
    extract: Regex,
}

impl VersionProbe {
    /// `extract_pattern` should hold one capture group around the version
    pub fn new(extract_pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            extract: full_match_regex(extract_pattern)?,
        })
    }

    /// Capture group 1 of the first line that fully matches, or `""`
    pub fn extract(&self, output: &str) -> String {
        output
            .lines()
            .find_map(|line| self.extract.captures(line))
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    }

    /// Runs `command args` and extracts the version from its output
    ///
    /// Execution failures yield `""`: an unknown version is treated as an
    /// incompatible one by the caller.
    pub fn probe(&self, runner: &dyn CommandRunner, command: &str, args: &[String]) -> String {
        match runner.run(command, args) {
            Ok(output) => {
                let version = self.extract(&output);
                debug!(command, version = %version, "probed installed version");
                version
            }
            Err(e) => {
                debug!(command, error = %e, "version command could not be run");
                String::new()
            }
        }
    }
}

/// Decides whether an installed version satisfies the requirement
#[derive(Debug, Clone)]
pub struct VersionPolicy {
    matcher: Option<Regex>,
}

impl VersionPolicy {
    /// Empty or whitespace-only `match_pattern` accepts any non-empty version
    pub fn new(match_pattern: &str) -> Result<Self, regex::Error> {
        let matcher = if match_pattern.trim().is_empty() {
            None
        } else {
            Some(full_match_regex(match_pattern)?)
        };

        Ok(Self { matcher })
    }

    pub fn is_compatible(&self, version: &str) -> bool {
        match &self.matcher {
            Some(re) => re.is_match(version),
            None => !version.trim().is_empty(),
        }
    }
}

/// One-shot form of [`VersionProbe::probe`]; an invalid pattern yields `""`
pub fn probe(
    runner: &dyn CommandRunner,
    command: &str,
    args: &[String],
    extract_pattern: &str,
) -> String {
    match VersionProbe::new(extract_pattern) {
        Ok(probe) => probe.probe(runner, command, args),
        Err(e) => {
            warn!(pattern = extract_pattern, error = %e, "invalid version extraction pattern");
            String::new()
        }
    }
}

/// One-shot form of [`VersionPolicy::is_compatible`]
///
/// ```rust
/// use toolfetch_install::version::is_compatible;
///
/// assert!(is_compatible("1.2.3", ""));
/// assert!(!is_compatible("", ""));
/// assert!(!is_compatible("1.2.3", r"2\..*"));
/// assert!(is_compatible("2.0.0", r"2\..*"));
/// ```
pub fn is_compatible(version: &str, match_pattern: &str) -> bool {
    match VersionPolicy::new(match_pattern) {
        Ok(policy) => policy.is_compatible(version),
        Err(e) => {
            warn!(pattern = match_pattern, error = %e, "invalid version match pattern");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn canned(output: &'static str) -> impl CommandRunner {
        move |_: &str, _: &[String]| -> io::Result<String> { Ok(output.to_string()) }
    }

    #[test]
    fn test_extract_requires_full_line_match() {
        let probe = VersionProbe::new(r"odo v(\d+\.\d+\.\d+)").unwrap();
        // substring match on the first line must not count
        let output = "built with odo v9.9.9 toolchain\nodo v1.2.3\nodo v4.5.6";
        assert_eq!(probe.extract(output), "1.2.3");
    }

    #[test]
    fn test_extract_no_match_is_empty() {
        let probe = VersionProbe::new(r"kn (\S+)").unwrap();
        assert_eq!(probe.extract("Version: 0.2.0\nBuild: today"), "");
        assert_eq!(probe.extract(""), "");
    }

    #[test]
    fn test_extract_handles_crlf() {
        let probe = VersionProbe::new(r"tool (\S+)").unwrap();
        assert_eq!(probe.extract("header\r\ntool 3.1\r\n"), "3.1");
    }

    #[test]
    fn test_extract_without_capture_group_is_empty() {
        let probe = VersionProbe::new(r"tool \S+").unwrap();
        assert_eq!(probe.extract("tool 3.1"), "");
    }

    #[test]
    fn test_probe_runner_failure_is_empty() {
        let failing = |_: &str, _: &[String]| -> io::Result<String> {
            Err(io::Error::new(io::ErrorKind::NotFound, "missing"))
        };
        assert_eq!(probe(&failing, "odo", &[], r"odo v(\S+)"), "");
    }

    #[test]
    fn test_probe_passes_arguments() {
        let runner = |program: &str, args: &[String]| -> io::Result<String> {
            Ok(format!("{program} {}", args.join(" ")))
        };
        let args = vec!["version".to_string(), "--client".to_string()];
        assert_eq!(probe(&runner, "odo", &args, r"odo (version) --client"), "version");
    }

    #[test]
    fn test_probe_invalid_pattern_is_empty() {
        assert_eq!(probe(&canned("odo v1"), "odo", &[], "odo v(("), "");
    }

    #[test]
    fn test_policy_empty_pattern() {
        assert!(is_compatible("1.2.3", ""));
        assert!(!is_compatible("", ""));
        assert!(!is_compatible("   ", ""));
        // whitespace-only pattern counts as empty
        assert!(is_compatible("0.1", "  "));
    }

    #[test]
    fn test_policy_pattern_is_full_match() {
        assert!(!is_compatible("1.2.3", r"2\..*"));
        assert!(is_compatible("2.0.0", r"2\..*"));
        assert!(!is_compatible("12.0.0", r"2\..*"));
        assert!(!is_compatible("2.0", r"2"));
    }

    #[test]
    fn test_policy_pattern_rejects_empty_version() {
        assert!(!is_compatible("", r"1\..*"));
        // an explicit pattern decides alone, even for the empty version
        assert!(is_compatible("", r".*"));
    }

    #[test]
    fn test_policy_invalid_pattern() {
        assert!(VersionPolicy::new("(").is_err());
        assert!(!is_compatible("1.0", "("));
    }
}
