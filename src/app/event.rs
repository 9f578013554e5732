//! Pipeline event types

use std::path::Path;

use crate::compiler::{CompileError, Compiler};

/// Progress events for the human and NDJSON output
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    MonitorStarted {
        files: usize,
        directories: Vec<String>,
    },
    FileChanged {
        path: String,
    },
    CompileStarted {
        source: String,
        /// Compiled file followed by the source map, when one is written
        outputs: Vec<String>,
    },
    Updated {
        path: String,
    },
    CompileFailed {
        source: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        line: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        column: Option<usize>,
        message: String,
    },
    ReloadRequested,
    Shutdown,
}

impl PipelineEvent {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub(crate) fn compile_started(compiler: &Compiler) -> Self {
        let mut outputs = vec![display(compiler.compiled_file())];
        outputs.extend(compiler.source_map_file().as_deref().map(display));
        PipelineEvent::CompileStarted {
            source: display(compiler.source_file()),
            outputs,
        }
    }

    pub(crate) fn compile_failed(error: &CompileError) -> Self {
        PipelineEvent::CompileFailed {
            source: display(error.file()),
            line: error.line(),
            column: error.column(),
            message: error.message().to_string(),
        }
    }
}

pub(crate) fn display(path: &Path) -> String {
    path.display().to_string()
}
