//! The compiler adapter contract
//!
//! An adapter wraps one external compiler. It is stateless with respect to
//! files: per-file state lives in [`super::Compiler`], which owns the
//! source/compiled paths and drives the adapter through its lifecycle.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::library::LibraryRequirement;
use super::render::ErrorRenderKind;
use crate::options::OptionsMap;

/// Shared handle to a registered adapter
pub type AdapterRef = Arc<dyn CompilerAdapter>;

/// The output family an adapter belongs to.
///
/// A family is also an option/library scope shared by all of its adapters
/// and decides how compile errors are rendered into the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    #[default]
    Plain,
    Css,
    Js,
    Html,
}

impl Family {
    /// Scope name used for shared options and library declarations
    pub fn scope(self) -> &'static str {
        match self {
            Family::Plain => "plain",
            Family::Css => "css",
            Family::Js => "js",
            Family::Html => "html",
        }
    }

    /// Default compiled extension for adapters of this family
    pub fn compiled_extension(self) -> &'static str {
        match self {
            Family::Plain => "",
            Family::Css => "css",
            Family::Js => "js",
            Family::Html => "html",
        }
    }

    pub fn render_kind(self) -> ErrorRenderKind {
        match self {
            Family::Plain => ErrorRenderKind::Plain,
            Family::Css => ErrorRenderKind::Css,
            Family::Js => ErrorRenderKind::Js,
            Family::Html => ErrorRenderKind::Html,
        }
    }
}

/// Everything an adapter gets to see for one compile
#[derive(Debug)]
pub struct TransformContext<'a> {
    pub source_file: &'a Path,
    pub compiled_file: &'a Path,
    pub source_text: &'a str,
    pub options: &'a OptionsMap,
    /// Set when the adapter should also produce a source map
    pub source_map_file: Option<&'a Path>,
}

/// Successful compiler output
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transformed {
    pub text: String,
    pub source_map: Option<String>,
}

impl Transformed {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_map: None,
        }
    }

    pub fn with_source_map(mut self, map: impl Into<String>) -> Self {
        self.source_map = Some(map.into());
        self
    }
}

/// A raw compiler failure.
///
/// Compilers disagree on how they report positions: some expose explicit
/// line/column values, some embed `file:line:col` in the message, some only
/// in a backtrace. All three are kept so the normalizer can pick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformFailure {
    pub message: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
    pub backtrace: Vec<String>,
}

impl TransformFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_column(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }

    pub fn with_backtrace(mut self, backtrace: Vec<String>) -> Self {
        self.backtrace = backtrace;
        self
    }
}

impl fmt::Display for TransformFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TransformFailure {}

/// A pluggable compiler.
///
/// Implementations are registered per source extension in the
/// [`crate::registry::ExtensionRegistry`].
pub trait CompilerAdapter: Send + Sync + fmt::Debug {
    /// Option scope of this adapter, unique per adapter
    fn name(&self) -> &str;

    fn family(&self) -> Family;

    /// Extension of the compiled file, possibly empty
    fn compiled_extension(&self) -> &str {
        self.family().compiled_extension()
    }

    /// Scopes this adapter inherits library declarations from, most specific
    /// first
    fn ancestry(&self) -> Vec<String> {
        vec![self.name().to_string(), self.family().scope().to_string()]
    }

    fn render_kind(&self) -> ErrorRenderKind {
        self.family().render_kind()
    }

    /// Libraries declared by the adapter itself
    fn libraries(&self) -> Vec<LibraryRequirement> {
        Vec::new()
    }

    /// Option key that turns source maps on, for adapters that support them
    fn source_map_key(&self) -> Option<&str> {
        None
    }

    /// Adapter-specific view of the configured options for one file
    fn prepare_options(&self, _source_file: &Path, options: OptionsMap) -> OptionsMap {
        options
    }

    fn transform(&self, ctx: &TransformContext<'_>) -> Result<Transformed, TransformFailure>;
}
