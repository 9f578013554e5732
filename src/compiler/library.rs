//! Library requirements of compiler adapters
//!
//! Adapters and families declare the external libraries (executables for the
//! command-backed adapters) they need. The declarations are checked when a
//! [`super::Compiler`] is built, so a missing tool fails fast with install
//! guidance instead of surfacing later as a confusing compile error.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{LiveBuildError, LiveBuildResult};

/// One declared dependency
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LibraryRequirement {
    /// Name the loader resolves (an executable for command adapters)
    pub library: String,
    /// Package to install when the library is missing
    #[serde(default)]
    pub package: Option<String>,
    /// Version constraint shown in the install hint
    #[serde(default)]
    pub version: Option<String>,
}

impl LibraryRequirement {
    pub fn new(library: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            package: None,
            version: None,
        }
    }

    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Package name, defaulting to the library name
    pub fn package_name(&self) -> &str {
        self.package.as_deref().unwrap_or(&self.library)
    }
}

/// A failed load as reported by a [`LibraryLoader`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub message: String,
}

impl LoadFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Resolves library requirements
pub trait LibraryLoader: Send + Sync {
    fn load(&self, requirement: &LibraryRequirement) -> Result<(), LoadFailure>;
}

/// Resolves libraries as executables on `PATH`
#[derive(Debug, Clone, Default)]
pub struct ExecutableLoader {
    search_path: Option<Vec<PathBuf>>,
}

impl ExecutableLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Search these directories instead of `PATH`
    pub fn with_search_path(search_path: Vec<PathBuf>) -> Self {
        Self {
            search_path: Some(search_path),
        }
    }

    fn directories(&self) -> Result<Vec<PathBuf>, LoadFailure> {
        if let Some(dirs) = &self.search_path {
            return Ok(dirs.clone());
        }
        let path = std::env::var_os("PATH")
            .ok_or_else(|| LoadFailure::new("PATH is not set, cannot search for executables"))?;
        Ok(std::env::split_paths(&path).collect())
    }
}

impl LibraryLoader for ExecutableLoader {
    fn load(&self, requirement: &LibraryRequirement) -> Result<(), LoadFailure> {
        let name = &requirement.library;
        if Path::new(name).components().count() > 1 {
            return if is_executable(Path::new(name)) {
                Ok(())
            } else {
                Err(LoadFailure::new(format!("cannot load such file -- {}", name)))
            };
        }

        let found = self
            .directories()?
            .iter()
            .any(|dir| is_executable(&dir.join(name)));
        if found {
            Ok(())
        } else {
            Err(LoadFailure::new(format!(
                "cannot load such file -- {} (not found in PATH)",
                name
            )))
        }
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file()
}

/// Load one requirement, turning loader failures into errors.
///
/// A failure that names the declared library or package is a missing
/// dependency and gets install guidance. Anything else happened while the
/// library itself was loading and is passed on unchanged.
pub fn load_requirement(
    loader: &dyn LibraryLoader,
    requirement: &LibraryRequirement,
) -> LiveBuildResult<()> {
    let Err(failure) = loader.load(requirement) else {
        return Ok(());
    };

    if names_requirement(&failure.message, requirement) {
        Err(LiveBuildError::Dependency {
            library: requirement.library.clone(),
            package: requirement.package_name().to_string(),
            version: requirement.version.clone(),
            message: failure.message,
        })
    } else {
        Err(LiveBuildError::Library {
            library: requirement.library.clone(),
            message: failure.message,
        })
    }
}

fn names_requirement(message: &str, requirement: &LibraryRequirement) -> bool {
    let pattern = format!(
        r"(^|[^\w-])({}|{})($|[^\w-])",
        regex::escape(&requirement.library),
        regex::escape(requirement.package_name())
    );
    Regex::new(&pattern)
        .map(|re| re.is_match(message))
        .unwrap_or(false)
}
