//! Monitor, compile and reload wired together

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::compiler::{compiled_dir_for, Compiler};
use crate::config::Settings;
use crate::error::{LiveBuildError, LiveBuildResult};
use crate::fs::short_path;
use crate::monitor::{Monitor, LATENCY};
use crate::registry::ExtensionRegistry;
use crate::reload::{CommandTransport, LogTransport, ReloadTransport, Reloader};

use super::event::{display, PipelineEvent};

/// Build the reloader described by `settings`, or `None` when reloading is
/// disabled
pub fn reloader_for(settings: &Settings) -> LiveBuildResult<Option<Reloader>> {
    if !settings.reload {
        return Ok(None);
    }
    let transport: Box<dyn ReloadTransport> = if settings.reload_command.is_empty() {
        Box::new(LogTransport)
    } else {
        Box::new(CommandTransport::new(&settings.reload_command)?)
    };
    Ok(Some(
        Reloader::new(
            transport,
            settings.reload_targets.clone(),
            settings.reload_extensions.clone(),
        )
        .with_delay(settings.reload_delay),
    ))
}

/// Drives the initial compile pass and the watch loop
#[derive(Debug)]
pub struct Orchestrator {
    settings: Settings,
    registry: Arc<ExtensionRegistry>,
    reloader: Option<Reloader>,
    latency: Duration,
}

impl Orchestrator {
    pub fn new(
        settings: Settings,
        registry: Arc<ExtensionRegistry>,
        reloader: Option<Reloader>,
    ) -> Self {
        Self {
            settings,
            registry,
            reloader,
            latency: LATENCY,
        }
    }

    /// Event batching window of the monitor
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Monitor over the configured sources and every compiled or reloaded
    /// extension
    pub fn monitor(&self) -> Monitor {
        Monitor::new(
            &self.settings.source_files,
            &self.settings.source_dirs,
            &self.settings.monitor_extensions(),
        )
        .with_latency(self.latency)
    }

    /// Compile every monitored file, reload once, then watch until `running`
    /// is cleared. A pending reload is flushed before returning.
    pub fn run(
        &self,
        running: Arc<AtomicBool>,
        on_event: impl Fn(PipelineEvent),
    ) -> LiveBuildResult<()> {
        let result = self.run_inner(&running, &on_event);
        if let Some(reloader) = &self.reloader {
            reloader.flush();
        }
        on_event(PipelineEvent::Shutdown);
        result
    }

    fn run_inner(&self, running: &AtomicBool, on_event: &impl Fn(PipelineEvent)) -> LiveBuildResult<()> {
        let mut monitor = self.monitor();
        let files = monitor.files()?;
        for file in &files {
            self.compile(file, self.settings.force, on_event)?;
        }
        self.reload(None, on_event);

        if !self.settings.monitor {
            return Ok(());
        }

        on_event(PipelineEvent::MonitorStarted {
            files: files.len(),
            directories: monitor.directories().iter().map(|d| display(d)).collect(),
        });
        info!(directories = monitor.directories().len(), "monitoring");

        monitor.monitor(running, |file| {
            on_event(PipelineEvent::FileChanged {
                path: display(file),
            });
            self.compile_and_reload(file, on_event)
        })
    }

    /// Handle one changed file: compile it unconditionally, then reload its
    /// compiled file and the file itself where their extensions ask for it
    pub fn compile_and_reload(
        &self,
        file: &Path,
        on_event: &impl Fn(PipelineEvent),
    ) -> LiveBuildResult<()> {
        if let Some(compiler) = self.compile(file, true, on_event)? {
            self.reload(Some(compiler.compiled_file()), on_event);
        }
        self.reload(Some(file), on_event);
        Ok(())
    }

    /// Compile `file` when compiling is enabled, a compiler is registered for
    /// it and it is stale (or `force` is set).
    ///
    /// Compile failures are reported and swallowed; the compiler is returned
    /// either way since its compiled file holds the output or the error.
    pub fn compile(
        &self,
        file: &Path,
        force: bool,
        on_event: &impl Fn(PipelineEvent),
    ) -> LiveBuildResult<Option<Compiler>> {
        if !self.settings.compile {
            return Ok(None);
        }
        let Some(compiler) = self.compiler_for(file)? else {
            return Ok(None);
        };
        if !force && !compiler.should_compile() {
            debug!(file = %file.display(), "up to date");
            return Ok(None);
        }

        on_event(PipelineEvent::compile_started(&compiler));
        debug!(
            "Compile: {} ({})",
            file_name(compiler.source_file()),
            parent_dir(compiler.source_file())
        );

        match compiler.compile() {
            Ok(written) => {
                for path in written {
                    debug!("Updated: {} ({})", file_name(&path), parent_dir(&path));
                    on_event(PipelineEvent::Updated {
                        path: display(&path),
                    });
                }
            }
            Err(LiveBuildError::Compile(err)) => {
                debug!(file = %short_path(err.file()), line = ?err.line(), "compile error");
                on_event(PipelineEvent::compile_failed(&err));
            }
            Err(other) => return Err(other),
        }
        Ok(Some(compiler))
    }

    fn compiler_for(&self, file: &Path) -> LiveBuildResult<Option<Compiler>> {
        let Some(adapter) = self.registry.lookup(file) else {
            return Ok(None);
        };
        let compiled_file = self
            .settings
            .compiled_files
            .get(file)
            .and_then(|c| c.as_deref());
        let compiled_dir = compiled_dir_for(file, &self.settings.compiled_dirs);

        Compiler::new(
            adapter,
            &self.registry,
            file,
            compiled_file,
            compiled_dir.as_deref(),
        )
        .map(Some)
    }

    /// Request a reload: always for `None`, otherwise only when the file's
    /// extension is a reload extension
    fn reload(&self, file: Option<&Path>, on_event: &impl Fn(PipelineEvent)) {
        let Some(reloader) = &self.reloader else {
            return;
        };
        if file.map_or(true, |f| reloader.should_reload(f)) {
            reloader.request();
            on_event(PipelineEvent::ReloadRequested);
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn parent_dir(path: &Path) -> String {
    short_path(path.parent().unwrap_or_else(|| Path::new("")))
}
