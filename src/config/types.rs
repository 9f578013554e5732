//! Configuration type definitions

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::compiler::{Family, LibraryRequirement};
use crate::error::LiveBuildResult;
use crate::reload::{DEFAULT_DELAY, DEFAULT_EXTENSIONS};

use super::loader::{self, ConfigWarning};

/// Watch loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Keep running after the initial compile
    #[serde(default = "default_true")]
    pub monitor: bool,

    /// Compile every file at startup, even when up to date
    #[serde(default)]
    pub force: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            monitor: true,
            force: false,
        }
    }
}

/// Compile configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Extensions to compile; empty means every registered one
    #[serde(default)]
    pub extensions: Vec<String>,

    #[serde(default)]
    pub source_map: bool,

    /// Compiler options as `EXT:KEY[:VALUE]`
    #[serde(default)]
    pub options: Vec<String>,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            extensions: Vec::new(),
            source_map: false,
            options: Vec::new(),
        }
    }
}

/// Reload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_reload_extensions")]
    pub extensions: Vec<String>,

    /// Browsers to reload; empty means every known browser
    #[serde(default)]
    pub browsers: Vec<String>,

    #[serde(default = "default_urls")]
    pub urls: Vec<String>,

    /// Program and leading arguments of the reload transport
    #[serde(default)]
    pub command: Vec<String>,

    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            extensions: default_reload_extensions(),
            browsers: Vec::new(),
            urls: default_urls(),
            command: Vec::new(),
            delay_ms: default_delay_ms(),
        }
    }
}

/// Source paths, each `SOURCE` or `SOURCE:COMPILED`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathsConfig {
    #[serde(default)]
    pub sources: Vec<String>,
}

/// A user-defined command-backed compiler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    pub name: String,

    pub extensions: Vec<String>,

    /// Compiled extension; defaults to the family's
    #[serde(default)]
    pub output: Option<String>,

    #[serde(default)]
    pub family: Family,

    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Libraries to check; defaults to the program itself
    #[serde(default)]
    pub requires: Vec<LibraryRequirement>,
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub compile: CompileConfig,

    #[serde(default)]
    pub reload: ReloadConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub compilers: Vec<CompilerConfig>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> LiveBuildResult<Self> {
        let (config, _warnings) = loader::load_with_warnings(path)?;
        Ok(config)
    }

    /// Load configuration and collect non-fatal warnings (e.g. unknown keys).
    pub fn load_with_warnings(path: &Path) -> LiveBuildResult<(Self, Vec<ConfigWarning>)> {
        loader::load_with_warnings(path)
    }

    /// Apply environment variable overrides (LIVEBUILD_* prefix)
    pub fn with_env_overrides(self) -> Self {
        loader::with_env_overrides(self)
    }
}

fn default_true() -> bool {
    true
}

fn default_reload_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

fn default_urls() -> Vec<String> {
    vec!["localhost".to_string()]
}

fn default_delay_ms() -> u64 {
    DEFAULT_DELAY.as_millis() as u64
}
