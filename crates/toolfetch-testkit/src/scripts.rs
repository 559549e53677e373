//! Fake tool executables
//!
//! Version probing runs real processes, so tests install tiny scripts that
//! print canned output instead of shipping real binaries.

use std::fs;
use std::path::{Path, PathBuf};

/// Writes an executable named `name` in `dir` printing `output`
///
/// On Unix this is a `#!/bin/sh` script; on Windows a `.bat` file (the
/// returned path then carries the `.bat` extension).
pub fn fake_tool(dir: &Path, name: &str, output: &str) -> PathBuf {
    fake_tool_with_exit(dir, name, output, 0)
}

/// Like [`fake_tool`], exiting with `exit_code` after printing
pub fn fake_tool_with_exit(dir: &Path, name: &str, output: &str, exit_code: i32) -> PathBuf {
    fs::create_dir_all(dir).unwrap();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        let mut script = String::from("#!/bin/sh\n");
        for line in output.lines() {
            script.push_str(&format!("echo '{}'\n", line.replace('\'', r"'\''")));
        }
        script.push_str(&format!("exit {exit_code}\n"));
        fs::write(&path, script).unwrap();

        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }

    #[cfg(windows)]
    {
        let path = dir.join(format!("{name}.bat"));
        let mut script = String::from("@echo off\r\n");
        for line in output.lines() {
            script.push_str(&format!("echo {line}\r\n"));
        }
        script.push_str(&format!("exit /b {exit_code}\r\n"));
        fs::write(&path, script).unwrap();
        path
    }
}
