//! Common test utilities for livebuild integration tests.
//!
//! This module provides:
//! - `TestEnv`: isolated project and home directories plus a CLI runner
//! - `UpcaseAdapter`: a compiler adapter that needs no external tools
//! - `Recording`: a reload transport that records every reload
//! - `wait_until`: polling helper for the watch loop

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use livebuild::compiler::{
    CompilerAdapter, Family, TransformContext, TransformFailure, Transformed,
};
use livebuild::{LiveBuildResult, ReloadTransport};

/// Result of running the livebuild binary
#[derive(Debug)]
pub struct TestResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl TestResult {
    /// Combine stdout and stderr
    pub fn combined_output(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// Isolated project and home directories
pub struct TestEnv {
    pub project_root: TempDir,
    pub home_dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            project_root: tempfile::tempdir().unwrap(),
            home_dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Get path relative to project root
    pub fn project_path(&self, relative: &str) -> PathBuf {
        self.project_root.path().join(relative)
    }

    /// Write a file below the project root, creating parent directories
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.project_path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.project_path(relative)).unwrap()
    }

    /// Run livebuild from the project root
    pub fn run(&self, args: &[&str]) -> TestResult {
        let output = Command::new(env!("CARGO_BIN_EXE_livebuild"))
            .current_dir(self.project_root.path())
            .args(args)
            .env("HOME", self.home_dir.path())
            .env("XDG_CONFIG_HOME", self.home_dir.path().join(".config"))
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .env_remove("LIVEBUILD_LOG")
            .env_remove("LIVEBUILD_FORCE")
            .env_remove("LIVEBUILD_MONITOR")
            .env_remove("LIVEBUILD_SOURCE_MAP")
            .env_remove("LIVEBUILD_RELOAD")
            .env_remove("LIVEBUILD_BROWSERS")
            .env_remove("LIVEBUILD_URLS")
            .output()
            .expect("Failed to execute livebuild");

        TestResult {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

/// Upper-cases the source. A line containing `FAIL` fails with a
/// `file:line:` prefixed message.
#[derive(Debug)]
pub struct UpcaseAdapter;

impl CompilerAdapter for UpcaseAdapter {
    fn name(&self) -> &str {
        "upcase"
    }

    fn family(&self) -> Family {
        Family::Css
    }

    fn transform(&self, ctx: &TransformContext<'_>) -> Result<Transformed, TransformFailure> {
        if let Some(index) = ctx.source_text.lines().position(|l| l.contains("FAIL")) {
            return Err(TransformFailure::new(format!(
                "{}:{}: error: unexpected FAIL",
                ctx.source_file.display(),
                index + 1
            )));
        }
        Ok(Transformed::new(ctx.source_text.to_uppercase()))
    }
}

/// Records the targets of every reload
#[derive(Debug, Default, Clone)]
pub struct Recording(pub Arc<Mutex<Vec<Vec<String>>>>);

impl Recording {
    pub fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

impl ReloadTransport for Recording {
    fn trigger_reload(&self, targets: &[String]) -> LiveBuildResult<()> {
        self.0.lock().unwrap().push(targets.to_vec());
        Ok(())
    }
}

/// Poll `condition` until it holds or `timeout` passes
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(20));
    }
    condition()
}

/// Touch `path` with new content, making sure its mtime moves forward
pub fn rewrite(path: &Path, content: &str) {
    let before = std::fs::metadata(path).and_then(|m| m.modified()).ok();
    std::fs::write(path, content).unwrap();
    if let Some(before) = before {
        let after = std::fs::metadata(path).unwrap().modified().unwrap();
        if after <= before {
            let file = std::fs::File::options().write(true).open(path).unwrap();
            file.set_modified(before + Duration::from_secs(1)).unwrap();
        }
    }
}
