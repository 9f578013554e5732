//! Configuration module for livebuild
//!
//! Configuration hierarchy:
//! 1. CLI flags (highest priority)
//! 2. Environment variables (LIVEBUILD_*)
//! 3. Project config (./livebuild.toml)
//! 4. User config (~/.config/livebuild/config.toml)
//! 5. Built-in defaults (lowest priority)
//!
//! Only one file is read: the project config when present, otherwise the
//! user config. `--config` names the file explicitly.

mod loader;
mod resolve;
#[cfg(test)]
mod tests;
mod types;

pub use loader::{
    apply_env_overrides, load_or_default, load_with_warnings, with_env_overrides, ConfigWarning,
    LoadedConfig, PROJECT_CONFIG,
};
pub use resolve::{configure_registry, Settings};
pub use types::{CompileConfig, CompilerConfig, Config, PathsConfig, ReloadConfig, WatchConfig};
