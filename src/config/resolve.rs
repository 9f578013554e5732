//! Turning a [`Config`] into the settings the pipeline runs with

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use crate::compiler::CommandAdapter;
use crate::error::{LiveBuildError, LiveBuildResult};
use crate::fs::{expand_path, normalized_extension};
use crate::options::OptionAssignment;
use crate::registry::ExtensionRegistry;
use crate::reload::{known_browser, reload_targets, KNOWN_BROWSERS};

use super::types::{CompilerConfig, Config};

/// Validated, immutable pipeline settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub source_files: Vec<PathBuf>,
    pub source_dirs: Vec<PathBuf>,
    /// Explicit compiled file per source file
    pub compiled_files: BTreeMap<PathBuf, Option<PathBuf>>,
    /// Compiled directory per source directory
    pub compiled_dirs: BTreeMap<PathBuf, Option<PathBuf>>,
    pub monitor: bool,
    pub force: bool,
    pub compile: bool,
    pub compile_extensions: Vec<String>,
    pub reload: bool,
    pub reload_extensions: Vec<String>,
    pub browsers: Vec<String>,
    pub reload_targets: Vec<String>,
    pub reload_command: Vec<String>,
    pub reload_delay: Duration,
}

impl Settings {
    /// Validate `config` against the registry and expand the source paths.
    pub fn resolve(config: &Config, registry: &ExtensionRegistry) -> LiveBuildResult<Self> {
        let mut settings = Settings {
            source_files: Vec::new(),
            source_dirs: Vec::new(),
            compiled_files: BTreeMap::new(),
            compiled_dirs: BTreeMap::new(),
            monitor: config.watch.monitor,
            force: config.watch.force,
            compile: config.compile.enabled,
            compile_extensions: compile_extensions(config, registry)?,
            reload: config.reload.enabled,
            reload_extensions: unique(config.reload.extensions.iter().map(normalized_extension)),
            browsers: browsers(&config.reload.browsers)?,
            reload_targets: Vec::new(),
            reload_command: config.reload.command.clone(),
            reload_delay: Duration::from_millis(config.reload.delay_ms),
        };
        settings.reload_targets = reload_targets(&settings.browsers, &config.reload.urls);

        if config.paths.sources.is_empty() {
            return Err(LiveBuildError::configuration(
                "No directory or file provided. To monitor files in the current directory:\n\
                 livebuild .",
            ));
        }
        for entry in &config.paths.sources {
            settings.add_source(entry)?;
        }

        debug!(
            files = settings.source_files.len(),
            dirs = settings.source_dirs.len(),
            "resolved sources"
        );
        Ok(settings)
    }

    fn add_source(&mut self, entry: &str) -> LiveBuildResult<()> {
        let mut parts = entry.splitn(2, ':');
        let source = expand_path(parts.next().unwrap_or_default());
        let compiled = parts.next().filter(|c| !c.is_empty()).map(expand_path);

        if source.is_dir() {
            if let Some(dir) = compiled.as_ref().filter(|c| c.is_file()) {
                return Err(LiveBuildError::configuration(format!(
                    "Expected a directory, but got a filename: '{}'",
                    dir.display()
                )));
            }
            if !self.source_dirs.contains(&source) {
                self.source_dirs.push(source.clone());
            }
            self.compiled_dirs.insert(source, compiled);
        } else if source.is_file() {
            if let Some(file) = compiled.as_ref().filter(|c| c.is_dir()) {
                return Err(LiveBuildError::configuration(format!(
                    "Expected a filename, but got a directory: '{}'",
                    file.display()
                )));
            }
            if !self.source_files.contains(&source) {
                self.source_files.push(source.clone());
            }
            self.compiled_files.insert(source, compiled);
        } else {
            return Err(LiveBuildError::configuration(format!(
                "No such file or directory: '{}'",
                source.display()
            )));
        }
        Ok(())
    }

    /// Extensions the monitor watches: the compiled ones when compiling and
    /// the reloading ones when reloading
    pub fn monitor_extensions(&self) -> Vec<String> {
        let mut exts = Vec::new();
        if self.compile {
            exts.extend(self.compile_extensions.iter().cloned());
        }
        if self.reload {
            exts.extend(self.reload_extensions.iter().cloned());
        }
        unique(exts)
    }
}

fn compile_extensions(config: &Config, registry: &ExtensionRegistry) -> LiveBuildResult<Vec<String>> {
    if config.compile.extensions.is_empty() {
        return Ok(registry.extensions());
    }
    let extensions = unique(config.compile.extensions.iter().map(normalized_extension));
    for ext in &extensions {
        if registry.lookup(ext).is_none() {
            return Err(registry.unknown_extension(ext));
        }
    }
    Ok(extensions)
}

fn browsers(requested: &[String]) -> LiveBuildResult<Vec<String>> {
    if requested.is_empty() {
        return Ok(KNOWN_BROWSERS.iter().map(|b| b.to_string()).collect());
    }
    let mut browsers = Vec::new();
    for name in requested {
        let browser = known_browser(name).ok_or_else(|| {
            LiveBuildError::configuration(format!(
                "Unknown browser '{}'. The supported browsers are:\n{}",
                name,
                KNOWN_BROWSERS.join(" ")
            ))
        })?;
        browsers.push(browser.to_string());
    }
    Ok(unique(browsers))
}

fn unique(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

/// Register user-defined compilers and apply source map and option settings
pub fn configure_registry(config: &Config, registry: &mut ExtensionRegistry) -> LiveBuildResult<()> {
    for compiler in &config.compilers {
        let adapter = command_adapter(compiler)?;
        let adapter = adapter.into_ref();
        for ext in &compiler.extensions {
            registry.register(ext, adapter.clone());
        }
    }

    if config.compile.source_map {
        registry.enable_source_maps(true);
    }

    for raw in &config.compile.options {
        let assignment = OptionAssignment::parse(raw)?;
        registry.apply_assignment(&assignment)?;
    }
    Ok(())
}

fn command_adapter(config: &CompilerConfig) -> LiveBuildResult<CommandAdapter> {
    if config.extensions.is_empty() {
        return Err(LiveBuildError::configuration(format!(
            "The compiler '{}' has no extensions",
            config.name
        )));
    }
    let mut adapter =
        CommandAdapter::new(config.name.clone(), config.family, config.program.clone())
            .args(config.args.iter().cloned());
    if let Some(output) = &config.output {
        adapter = adapter.compiled_extension(output.clone());
    }
    if !config.requires.is_empty() {
        adapter = adapter.requires(config.requires.clone());
    }
    Ok(adapter)
}
