//! livebuild - monitor, compile and reload
//!
//! livebuild watches source files and directories, recompiles stale sources
//! through pluggable compiler adapters and asks the browser to reload once
//! compiled artifacts change. Compile errors are written into the compiled
//! file so they show up where the output would have.

pub mod app;
pub mod compiler;
pub mod config;
pub mod error;
pub mod fs;
pub mod monitor;
pub mod options;
pub mod registry;
pub mod reload;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use app::{reloader_for, Orchestrator, PipelineEvent};
pub use compiler::{AdapterRef, CommandAdapter, CompileError, Compiler, CompilerAdapter, Family};
pub use config::{Config, Settings};
pub use error::{LiveBuildError, LiveBuildResult};
pub use monitor::Monitor;
pub use options::{OptionValue, OptionsMap};
pub use registry::ExtensionRegistry;
pub use reload::{CommandTransport, LogTransport, ReloadTransport, Reloader};
