//! Path helpers for install locations and archive entries
//!
//! Archive entry names come from downloaded data and are joined onto the
//! install directory, so they are validated component by component rather
//! than with `Path::is_absolute()`:
//!
//! - Unix: `Path::new("/tmp").is_absolute()` → `true`
//! - Windows: `Path::new("/tmp").is_absolute()` → `false` (rooted, not absolute!)

use std::path::{Component, Path, PathBuf};

/// Placeholder replaced by the home directory in `baseDir`
pub const HOME_PLACEHOLDER: &str = "$HOME";

/// Replace every `$HOME` occurrence in `template` with `home`
///
/// # Examples
///
/// ```rust
/// use std::path::{Path, PathBuf};
/// use toolfetch_core::path::expand_home;
///
/// let dir = expand_home("$HOME/.tools/odo", Path::new("/home/dev"));
/// assert_eq!(dir, PathBuf::from("/home/dev/.tools/odo"));
///
/// // Templates without the placeholder are used as is
/// assert_eq!(expand_home("/opt/odo", Path::new("/home/dev")), PathBuf::from("/opt/odo"));
/// ```
pub fn expand_home(template: &str, home: &Path) -> PathBuf {
    if !template.contains(HOME_PLACEHOLDER) {
        return PathBuf::from(template);
    }
    PathBuf::from(template.replace(HOME_PLACEHOLDER, &home.to_string_lossy()))
}

/// Home directory of the current user
pub fn home_dir() -> Option<PathBuf> {
    dirs::home_dir()
}

/// Check if path is absolute OR rooted (cross-platform)
///
/// ```rust
/// use std::path::Path;
/// use toolfetch_core::path::has_absolute_or_rooted_component;
///
/// assert!(has_absolute_or_rooted_component(Path::new("/etc/passwd")));
/// assert!(!has_absolute_or_rooted_component(Path::new("bin/odo")));
/// ```
pub fn has_absolute_or_rooted_component(path: &Path) -> bool {
    if path.is_absolute() {
        return true;
    }

    path.components()
        .any(|c| matches!(c, Component::RootDir | Component::Prefix(_)))
}

/// Relative path of an archive entry, or `None` if it would leave the
/// install directory
///
/// `.` components are dropped; `..`, roots and prefixes are rejected, as
/// are names with no normal component at all.
///
/// ```rust
/// use std::path::{Path, PathBuf};
/// use toolfetch_core::path::enclosed_entry_path;
///
/// assert_eq!(enclosed_entry_path(Path::new("./bin/odo")), Some(PathBuf::from("bin/odo")));
/// assert_eq!(enclosed_entry_path(Path::new("../odo")), None);
/// assert_eq!(enclosed_entry_path(Path::new("/usr/bin/odo")), None);
/// ```
pub fn enclosed_entry_path(name: &Path) -> Option<PathBuf> {
    if has_absolute_or_rooted_component(name) {
        return None;
    }

    let mut enclosed = PathBuf::new();
    for component in name.components() {
        match component {
            Component::Normal(part) => enclosed.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if enclosed.as_os_str().is_empty() {
        None
    } else {
        Some(enclosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_home_replaces_all_occurrences() {
        let expanded = expand_home("$HOME/a/$HOME", Path::new("/h"));
        assert_eq!(expanded, PathBuf::from("/h/a//h"));
    }

    #[test]
    fn test_expand_home_without_placeholder() {
        assert_eq!(
            expand_home("relative/dir", Path::new("/h")),
            PathBuf::from("relative/dir")
        );
    }

    #[test]
    fn test_enclosed_entry_path_plain_name() {
        assert_eq!(
            enclosed_entry_path(Path::new("odo")),
            Some(PathBuf::from("odo"))
        );
    }

    #[test]
    fn test_enclosed_entry_path_rejects_traversal_in_middle() {
        assert_eq!(enclosed_entry_path(Path::new("bin/../../odo")), None);
    }

    #[test]
    fn test_enclosed_entry_path_rejects_empty_and_dot() {
        assert_eq!(enclosed_entry_path(Path::new("")), None);
        assert_eq!(enclosed_entry_path(Path::new(".")), None);
    }

    #[test]
    fn test_enclosed_entry_path_keeps_trailing_directory_name() {
        assert_eq!(
            enclosed_entry_path(Path::new("bin/")),
            Some(PathBuf::from("bin"))
        );
    }
}
