//! Integration tests for install locking (parallel installs of same version)
//!
//! These tests verify that file locking prevents corruption when multiple
//! threads try to install the same tool version simultaneously.

use mockito::Server;
use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;
use toolfetch_core::ToolsConfig;
use toolfetch_core::lock::{acquire_lock, lock_path_for};
use toolfetch_install::{InlineTasks, InstallError, Platform, SystemRunner, ToolManager};
use toolfetch_testkit::{ToolDocument, tar_gz_bytes};

const BINARY: &[u8] = b"#!/bin/sh\necho 'x v1.0.0'\n";

fn config(base: &std::path::Path, version: &str, url: &str) -> ToolsConfig {
    let json = ToolDocument::new("x", version, base)
        .extract_regexp(r"x v(\S+)")
        .silent(true)
        .platform("lnx", url, "x", "x.tar.gz")
        .to_json();
    ToolsConfig::from_json(&json, "test").unwrap()
}

fn manager(bin: &TempDir) -> ToolManager {
    ToolManager::builder()
        .runner(SystemRunner::with_search_path(bin.path()))
        .platform(Platform::new("lnx", "amd64"))
        .tasks(InlineTasks::new())
        .build()
        .unwrap()
}

#[test]
fn test_parallel_install_same_version_downloads_once() {
    // Without locking, concurrent installs would both download and write
    // the same command file.
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/x.tar.gz")
        .with_status(200)
        .with_body(tar_gz_bytes(&[("x", BINARY)]))
        .expect(1)
        .create();

    let base = TempDir::new().unwrap();
    let bin = TempDir::new().unwrap();
    let manager = Arc::new(manager(&bin));
    let config = Arc::new(config(base.path(), "1.0.0", &format!("{}/x.tar.gz", server.url())));

    const NUM_THREADS: usize = 3;
    let barrier = Arc::new(Barrier::new(NUM_THREADS));

    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let config = Arc::clone(&config);
            let barrier = Arc::clone(&barrier);

            thread::spawn(move || {
                barrier.wait();
                manager
                    .ensure_tool_with_config("x", &config, "test")
                    .wait()
                    .unwrap()
            })
        })
        .collect();

    let instances: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    mock.assert();

    let downloaded = instances.iter().filter(|i| i.downloaded).count();
    assert_eq!(downloaded, 1, "exactly one thread should install");
    for instance in &instances[1..] {
        assert_eq!(instance.command, instances[0].command);
    }

    let target = base.path().join("cache/1.0.0/x");
    assert_eq!(fs::read(&target).unwrap(), BINARY, "binary should not be corrupted");
}

#[test]
fn test_concurrent_installs_different_versions_no_conflict() {
    // Locks are per version directory, not global
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/x.tar.gz")
        .with_status(200)
        .with_body(tar_gz_bytes(&[("x", BINARY)]))
        .expect(2)
        .create();

    let base = TempDir::new().unwrap();
    let bin = TempDir::new().unwrap();
    let manager = Arc::new(manager(&bin));
    let url = format!("{}/x.tar.gz", server.url());

    let handles: Vec<_> = ["1.0.0", "2.0.0"]
        .into_iter()
        .map(|version| {
            let manager = Arc::clone(&manager);
            let config = config(base.path(), version, &url);

            thread::spawn(move || {
                manager
                    .ensure_tool_with_config("x", &config, "test")
                    .wait()
                    .unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap().downloaded);
    }

    mock.assert();
    assert!(base.path().join("cache/1.0.0/x").exists());
    assert!(base.path().join("cache/2.0.0/x").exists());
}

#[test]
fn test_lock_timeout_is_setup_error() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/x.tar.gz")
        .with_status(200)
        .with_body(tar_gz_bytes(&[("x", BINARY)]))
        .expect(0)
        .create();

    let base = TempDir::new().unwrap();
    let bin = TempDir::new().unwrap();
    let target = base.path().join("cache/1.0.0/x");
    let _held =
        acquire_lock(&lock_path_for(&target), Duration::from_secs(1), "test holder").unwrap();

    let manager = ToolManager::builder()
        .runner(SystemRunner::with_search_path(bin.path()))
        .platform(Platform::new("lnx", "amd64"))
        .tasks(InlineTasks::new())
        .lock_timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    let config = config(base.path(), "1.0.0", &format!("{}/x.tar.gz", server.url()));

    let err = manager
        .ensure_tool_with_config("x", &config, "test")
        .wait()
        .unwrap_err();

    let source = std::error::Error::source(&err).unwrap();
    let install_error = source.downcast_ref::<InstallError>().unwrap();
    assert!(matches!(install_error, InstallError::Lock(_)));
    mock.assert();
}
