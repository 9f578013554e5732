//! Error types for livebuild
//!
//! Uses `thiserror` for library errors. Only [`LiveBuildError::Compile`] is
//! expected during a watch session; every other variant aborts the step that
//! produced it.

use std::path::PathBuf;
use thiserror::Error;

use crate::compiler::CompileError;

/// Result type alias for livebuild operations
pub type LiveBuildResult<T> = Result<T, LiveBuildError>;

/// Main error type for livebuild operations
#[derive(Error, Debug)]
pub enum LiveBuildError {
    /// Invalid configuration (identical source/compiled paths, unknown
    /// extension, malformed option, missing source, ...)
    #[error("{message}")]
    Configuration { message: String },

    /// A declared library required by a compiler could not be loaded
    #[error("{message}\nTry: install {package}{}", version_hint(.version))]
    Dependency {
        library: String,
        package: String,
        version: Option<String>,
        message: String,
    },

    /// A library failed to load for a reason unrelated to the library itself
    #[error("failed to load '{library}': {message}")]
    Library { library: String, message: String },

    /// The underlying compiler failed; the error artifact has been written
    #[error(transparent)]
    Compile(Box<CompileError>),

    /// Walking or watching the monitored tree failed
    #[error("monitor failed{}: {source}", path_hint(.path))]
    MonitorIo {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("invalid config {file}: {message}")]
    InvalidConfig { file: PathBuf, message: String },
}

impl LiveBuildError {
    /// Shorthand for a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        LiveBuildError::Configuration {
            message: message.into(),
        }
    }

    /// Wrap a `notify` failure as a monitor error
    pub(crate) fn monitor(path: Option<PathBuf>, err: impl ToString) -> Self {
        LiveBuildError::MonitorIo {
            path,
            source: std::io::Error::other(err.to_string()),
        }
    }

    /// True for the one error kind the orchestrator recovers from
    pub fn is_compile(&self) -> bool {
        matches!(self, LiveBuildError::Compile(_))
    }
}

impl From<CompileError> for LiveBuildError {
    fn from(err: CompileError) -> Self {
        LiveBuildError::Compile(Box::new(err))
    }
}

fn version_hint(version: &Option<String>) -> String {
    match version {
        Some(v) => format!(" -v '{}'", v),
        None => String::new(),
    }
}

fn path_hint(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!(" for {}", p.display()),
        None => String::new(),
    }
}
