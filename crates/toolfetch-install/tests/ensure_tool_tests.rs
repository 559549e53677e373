//! End-to-end tests of `ToolManager::ensure_tool`
//!
//! Downloads are served by mockito; version probes run through a
//! `SystemRunner` whose search path is a scratch directory, so the machine's
//! own `PATH` never leaks into a test.

use mockito::{Mock, Server, ServerGuard};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use toolfetch_core::{ConfigLocator, ToolError, ToolsConfig};
use toolfetch_install::{
    AlwaysConfirm, DownloadPrompt, InlineTasks, NeverConfirm, Platform, Progress, SystemRunner,
    ThreadTasks, ToolInstance, ToolManager, ToolManagerBuilder,
};
use toolfetch_testkit::{ToolDocument, gzip_bytes, tar_gz_bytes};

const ARCHIVE: &str = "tool-linux-amd64.tar.gz";
const SCRIPT: &[u8] = b"#!/bin/sh\necho 'x v1.0.0'\n";

struct Fixture {
    server: ServerGuard,
    base: TempDir,
    bin: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            server: Server::new(),
            base: TempDir::new().unwrap(),
            bin: TempDir::new().unwrap(),
        }
    }

    fn serve(&mut self, name: &str, body: Vec<u8>, hits: usize) -> Mock {
        self.server
            .mock("GET", format!("/{name}").as_str())
            .with_status(200)
            .with_body(body)
            .expect(hits)
            .create()
    }

    fn document(&self, dl_file_name: &str, silent: bool) -> ToolDocument {
        ToolDocument::new("x", "1.0.0", self.base.path())
            .version_cmd("version")
            .extract_regexp(r"x v(\S+)")
            .silent(silent)
            .platform(
                "lnx",
                &format!("{}/{dl_file_name}", self.server.url()),
                "x",
                dl_file_name,
            )
    }

    fn config(&self, dl_file_name: &str, silent: bool) -> ToolsConfig {
        ToolsConfig::from_json(&self.document(dl_file_name, silent).to_json(), "test").unwrap()
    }

    fn manager(&self) -> ToolManagerBuilder {
        ToolManager::builder()
            .runner(SystemRunner::with_search_path(self.bin.path()))
            .platform(Platform::new("lnx", "amd64"))
            .tasks(InlineTasks::new())
    }

    fn target(&self) -> std::path::PathBuf {
        self.base.path().join("cache").join("1.0.0").join("x")
    }
}

/// Messages of `err` and all of its sources, joined with `: `
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut messages = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        messages.push(cause.to_string());
        source = cause.source();
    }
    messages.join(": ")
}

fn assert_executable(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(path).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111, "{} should be executable", path.display());
    }
    #[cfg(not(unix))]
    assert!(path.exists());
}

#[test]
fn test_declined_download_trusts_path_and_writes_nothing() {
    let mut fx = Fixture::new();
    let mock = fx.serve(ARCHIVE, tar_gz_bytes(&[("x", SCRIPT)]), 0);
    let manager = fx.manager().confirm(NeverConfirm).build().unwrap();

    let instance = manager
        .ensure_tool_with_config("x", &fx.config(ARCHIVE, false), "test")
        .wait()
        .unwrap();

    assert_eq!(instance, ToolInstance::existing("x"));
    assert!(!fx.base.path().join("cache").exists());
    mock.assert();
}

#[test]
fn test_missing_tool_prompt_text() {
    let fx = Fixture::new();
    let prompts = Arc::new(std::sync::Mutex::new(Vec::new()));
    let seen = Arc::clone(&prompts);
    let manager = fx
        .manager()
        .confirm(move |prompt: &DownloadPrompt| {
            seen.lock().unwrap().push((prompt.title(), prompt.message()));
            false
        })
        .build()
        .unwrap();

    manager
        .ensure_tool_with_config("x", &fx.config(ARCHIVE, false), "test")
        .wait()
        .unwrap();

    assert_eq!(
        prompts.lock().unwrap().as_slice(),
        [(
            "x tool required".to_string(),
            "x not found , do you want to download x 1.0.0 ?".to_string()
        )]
    );
}

#[test]
fn test_confirmed_download_installs_into_version_cache() {
    let mut fx = Fixture::new();
    let mock = fx.serve(ARCHIVE, tar_gz_bytes(&[("x", SCRIPT)]), 1);
    let manager = fx.manager().confirm(AlwaysConfirm).build().unwrap();

    let instance = manager
        .ensure_tool_with_config("x", &fx.config(ARCHIVE, false), "test")
        .wait()
        .unwrap();

    let target = fx.target();
    assert_eq!(instance, ToolInstance::downloaded(target.display().to_string()));
    assert_eq!(fs::read(&target).unwrap(), SCRIPT);
    assert_executable(&target);
    assert!(target.with_file_name(ARCHIVE).exists());
    mock.assert();
}

#[test]
fn test_second_call_short_circuits_on_cached_target() {
    let mut fx = Fixture::new();
    let mock = fx.serve(ARCHIVE, tar_gz_bytes(&[("x", SCRIPT)]), 1);
    let asked = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&asked);
    let manager = fx
        .manager()
        .confirm(move |_: &DownloadPrompt| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        })
        .build()
        .unwrap();
    let config = fx.config(ARCHIVE, false);

    let first = manager.ensure_tool_with_config("x", &config, "test").wait().unwrap();
    let second = manager.ensure_tool_with_config("x", &config, "test").wait().unwrap();

    assert!(first.downloaded);
    assert_eq!(second, ToolInstance::existing(first.command.clone()));
    assert_eq!(asked.load(Ordering::SeqCst), 1);
    mock.assert();
}

#[test]
fn test_compressed_single_binary() {
    let mut fx = Fixture::new();
    let mock = fx.serve("x-linux.gz", gzip_bytes(SCRIPT), 1);
    let manager = fx.manager().build().unwrap();

    let instance = manager
        .ensure_tool_with_config("x", &fx.config("x-linux.gz", true), "test")
        .wait()
        .unwrap();

    assert!(instance.downloaded);
    assert_eq!(fs::read(fx.target()).unwrap(), SCRIPT);
    assert_executable(&fx.target());
    mock.assert();
}

#[test]
fn test_uncompressed_binary_named_like_command() {
    let mut fx = Fixture::new();
    let mock = fx.serve("x", SCRIPT.to_vec(), 1);
    let manager = fx.manager().build().unwrap();

    let instance = manager
        .ensure_tool_with_config("x", &fx.config("x", true), "test")
        .wait()
        .unwrap();

    assert!(instance.downloaded);
    assert_eq!(fs::read(fx.target()).unwrap(), SCRIPT);
    assert_executable(&fx.target());
    mock.assert();
}

#[test]
fn test_cancelled_download_never_succeeds() {
    let mut fx = Fixture::new();
    let _mock = fx.serve(ARCHIVE, tar_gz_bytes(&[("x", SCRIPT)]), 1);
    let progress = Arc::new(Progress::new());
    progress.cancel();
    let manager = fx
        .manager()
        .tasks(ThreadTasks::with_sink(progress))
        .build()
        .unwrap();

    let err = manager
        .ensure_tool_with_config("x", &fx.config(ARCHIVE, true), "test")
        .wait()
        .unwrap_err();

    assert!(err.is_cancelled(), "unexpected error: {err}");
    assert!(!fx.target().exists());
}

#[test]
fn test_http_failure_is_setup_error_naming_tool() {
    let mut fx = Fixture::new();
    let _mock = fx
        .server
        .mock("GET", format!("/{ARCHIVE}").as_str())
        .with_status(404)
        .create();
    let manager = fx.manager().build().unwrap();

    let err = manager
        .ensure_tool_with_config("x", &fx.config(ARCHIVE, true), "test")
        .wait()
        .unwrap_err();

    assert!(matches!(err, ToolError::Setup { ref tool, .. } if tool == "x"));
    assert_eq!(err.to_string(), "TOOL_SETUP_FAILED: Error while setting tool x.");
    assert!(!fx.target().exists());
}

#[test]
fn test_empty_tar_is_setup_error() {
    let mut fx = Fixture::new();
    let _mock = fx.serve(ARCHIVE, tar_gz_bytes(&[]), 1);
    let manager = fx.manager().build().unwrap();

    let err = manager
        .ensure_tool_with_config("x", &fx.config(ARCHIVE, true), "test")
        .wait()
        .unwrap_err();

    let chain = error_chain(&err);
    assert!(chain.contains("No TAR entry found"), "got: {chain}");
}

#[test]
fn test_ensure_tool_from_config_file() {
    let mut fx = Fixture::new();
    let mock = fx.serve(ARCHIVE, tar_gz_bytes(&[("x", SCRIPT)]), 1);
    let config_dir = TempDir::new().unwrap();
    let path = fx.document(ARCHIVE, true).write_to(config_dir.path());
    let manager = fx.manager().build().unwrap();

    let instance = manager
        .ensure_tool_blocking("x", &ConfigLocator::from(path))
        .unwrap();

    assert!(instance.downloaded);
    mock.assert();
}

#[test]
fn test_ensure_tool_from_config_url() {
    let mut fx = Fixture::new();
    let archive = fx.serve(ARCHIVE, tar_gz_bytes(&[("x", SCRIPT)]), 1);
    let document = fx.document(ARCHIVE, true).to_json();
    let config = fx
        .server
        .mock("GET", "/tools.json")
        .with_status(200)
        .with_body(document)
        .create();
    let manager = fx.manager().build().unwrap();
    let locator = ConfigLocator::parse(&format!("{}/tools.json", fx.server.url())).unwrap();

    let instance = manager.ensure_tool_blocking("x", &locator).unwrap();

    assert!(instance.downloaded);
    archive.assert();
    config.assert();
}

#[test]
fn test_unknown_tool_in_config_file() {
    let fx = Fixture::new();
    let config_dir = TempDir::new().unwrap();
    let path = fx.document(ARCHIVE, true).write_to(config_dir.path());
    let manager = fx.manager().build().unwrap();

    let err = manager
        .ensure_tool_blocking("odo", &ConfigLocator::from(path.clone()))
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(err.to_string().contains(&path.display().to_string()));
}

#[test]
fn test_handle_can_be_awaited() {
    let mut fx = Fixture::new();
    let mock = fx.serve(ARCHIVE, tar_gz_bytes(&[("x", SCRIPT)]), 1);
    let manager = fx.manager().tasks(ThreadTasks::new()).build().unwrap();
    let config = fx.config(ARCHIVE, true);

    let handle = manager.ensure_tool_with_config("x", &config, "test");
    let instance = futures::executor::block_on(handle).unwrap();

    assert!(instance.downloaded);
    mock.assert();
}

#[cfg(unix)]
mod with_installed_tool {
    use super::*;
    use toolfetch_testkit::fake_tool;

    #[test]
    fn test_compatible_tool_on_path_is_used() {
        let mut fx = Fixture::new();
        let mock = fx.serve(ARCHIVE, tar_gz_bytes(&[("x", SCRIPT)]), 0);
        fake_tool(fx.bin.path(), "x", "x v1.0.0");
        let manager = fx.manager().confirm(AlwaysConfirm).build().unwrap();

        let instance = manager
            .ensure_tool_with_config("x", &fx.config(ARCHIVE, false), "test")
            .wait()
            .unwrap();

        assert_eq!(instance, ToolInstance::existing("x"));
        mock.assert();
    }

    #[test]
    fn test_outdated_tool_on_path_is_replaced() {
        let mut fx = Fixture::new();
        let mock = fx.serve(ARCHIVE, tar_gz_bytes(&[("x", SCRIPT)]), 1);
        fake_tool(fx.bin.path(), "x", "Client:\nx v0.9.0");
        let document = fx.document(ARCHIVE, false).match_regexp(r"1\..*");
        let config = ToolsConfig::from_json(&document.to_json(), "test").unwrap();
        let prompts = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen = Arc::clone(&prompts);
        let manager = fx
            .manager()
            .confirm(move |prompt: &DownloadPrompt| {
                seen.lock().unwrap().push(prompt.current_version.clone());
                true
            })
            .build()
            .unwrap();

        let instance = manager.ensure_tool_with_config("x", &config, "test").wait().unwrap();

        assert!(instance.downloaded);
        assert_eq!(prompts.lock().unwrap().as_slice(), ["0.9.0".to_string()]);
        mock.assert();
    }
}
