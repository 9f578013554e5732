//! Coalesced browser reloads
//!
//! Reload requests arriving while one is already pending are dropped. The
//! first request starts a short timer; when it fires the transport is called
//! once with every reload target.


use std::path::Path;
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::{LiveBuildError, LiveBuildResult};
use crate::fs::normalized_extension;

/// Default delay between the first request and the reload
pub const DEFAULT_DELAY: Duration = Duration::from_millis(200);

/// Extensions whose updates trigger a reload by default
pub const DEFAULT_EXTENSIONS: &[&str] = &["css", "html", "js"];

/// Browsers that can be asked to reload
pub const KNOWN_BROWSERS: &[&str] = &["Canary", "Chrome", "Firefox", "Opera", "Safari", "WebKit"];

/// URL prefixes `localhost` stands for
pub const LOCALHOST: &[&str] = &[
    "file:///",
    "file://localhost/",
    "http://localhost/",
    "http://localhost:",
    "http://127.0.0.1/",
    "http://127.0.0.1:",
    "http://0.0.0.0/",
    "http://0.0.0.0:",
];

/// Performs the actual reload
pub trait ReloadTransport: Send + Sync {
    fn trigger_reload(&self, targets: &[String]) -> LiveBuildResult<()>;
}

/// Runs a command with the targets appended as arguments
#[derive(Debug, Clone)]
pub struct CommandTransport {
    program: String,
    args: Vec<String>,
}

impl CommandTransport {
    /// `command` is the program followed by its leading arguments
    pub fn new(command: &[String]) -> LiveBuildResult<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| LiveBuildError::configuration("The reload command is empty"))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl ReloadTransport for CommandTransport {
    fn trigger_reload(&self, targets: &[String]) -> LiveBuildResult<()> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .args(targets)
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(LiveBuildError::Io(std::io::Error::other(format!(
                "{} exited with {}",
                self.program, status
            ))))
        }
    }
}

/// Only logs the reload; used when no reload command is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

impl ReloadTransport for LogTransport {
    fn trigger_reload(&self, targets: &[String]) -> LiveBuildResult<()> {
        info!(targets = targets.len(), "reload");
        Ok(())
    }
}

struct Shared {
    pending: AtomicBool,
    transport: Box<dyn ReloadTransport>,
    targets: Vec<String>,
}

impl Shared {
    fn fire(&self) {
        if !self.pending.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Err(err) = self.transport.trigger_reload(&self.targets) {
            warn!(error = %err, "reload failed");
        }
    }
}

/// Coalesces reload requests into at most one pending reload
pub struct Reloader {
    shared: Arc<Shared>,
    extensions: Vec<String>,
    delay: Duration,
}

impl std::fmt::Debug for Reloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reloader")
            .field("targets", &self.shared.targets)
            .field("extensions", &self.extensions)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl Reloader {
    pub fn new(
        transport: Box<dyn ReloadTransport>,
        targets: Vec<String>,
        extensions: Vec<String>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                pending: AtomicBool::new(false),
                transport,
                targets,
            }),
            extensions: extensions.iter().map(normalized_extension).collect(),
            delay: DEFAULT_DELAY,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn targets(&self) -> &[String] {
        &self.shared.targets
    }

    /// Whether an update of `file` should reload the browser
    pub fn should_reload(&self, file: &Path) -> bool {
        self.extensions.contains(&normalized_extension(file))
    }

    pub fn is_pending(&self) -> bool {
        self.shared.pending.load(Ordering::SeqCst)
    }

    /// Schedule a reload unless one is already pending
    pub fn request(&self) {
        if self.shared.pending.swap(true, Ordering::SeqCst) {
            return;
        }
        let shared = Arc::clone(&self.shared);
        let delay = self.delay;
        let spawned = thread::Builder::new()
            .name("livebuild-reload".to_string())
            .spawn(move || {
                thread::sleep(delay);
                shared.fire();
            });
        if let Err(err) = spawned {
            warn!(error = %err, "cannot schedule reload, reloading now");
            self.shared.fire();
        }
    }

    /// Run a pending reload now
    pub fn flush(&self) {
        self.shared.fire();
    }
}

impl Drop for Reloader {
    fn drop(&mut self) {
        self.flush();
    }
}

/// Arguments for the reload transport: the browsers followed by the URL
/// prefixes. `localhost` expands to the local prefixes and `all` means every
/// tab, i.e. no URL filter.
pub fn reload_targets(browsers: &[String], urls: &[String]) -> Vec<String> {
    let mut targets: Vec<String> = Vec::new();
    let mut push = |value: &str| {
        if !targets.iter().any(|t| t == value) {
            targets.push(value.to_string());
        }
    };

    for browser in browsers {
        push(browser);
    }
    if !urls.iter().any(|u| u == "all") {
        let expands = urls.iter().any(|u| u == "localhost");
        for url in urls.iter().filter(|u| *u != "localhost") {
            push(url);
        }
        if expands {
            for url in LOCALHOST {
                push(url);
            }
        }
    }
    targets
}

/// Canonical spelling of a known browser name, matched case-insensitively
pub fn known_browser(name: &str) -> Option<&'static str> {
    KNOWN_BROWSERS
        .iter()
        .copied()
        .find(|b| b.eq_ignore_ascii_case(name.trim()))
}
