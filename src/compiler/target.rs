//! Source to compiled path mapping

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{LiveBuildError, LiveBuildResult};
use crate::fs::{absolute, replace_directory, replace_extension};

/// The pair of files one compiler works on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledTarget {
    pub source_file: PathBuf,
    pub compiled_file: PathBuf,
}

impl CompiledTarget {
    /// Resolve the compiled path for `source_file`.
    ///
    /// An explicit `compiled_file` wins. Otherwise the source extension is
    /// replaced by `compiled_extension` and the directory by `compiled_dir`
    /// when one is given.
    pub fn new(
        source_file: &Path,
        compiled_file: Option<&Path>,
        compiled_dir: Option<&Path>,
        compiled_extension: &str,
    ) -> LiveBuildResult<Self> {
        let compiled_file = match compiled_file {
            Some(file) => file.to_path_buf(),
            None => replace_directory(
                &replace_extension(source_file, compiled_extension),
                compiled_dir,
            ),
        };

        if absolute(source_file) == absolute(&compiled_file) {
            return Err(LiveBuildError::configuration(
                "The source and compiled filenames are identical",
            ));
        }

        Ok(Self {
            source_file: source_file.to_path_buf(),
            compiled_file,
        })
    }
}

/// Compiled directory for `file` given the configured source to compiled
/// directory mappings.
///
/// The longest source directory containing `file` wins and the file's
/// sub-path below it is kept (`src/js/app.coffee` with `src => out` maps to
/// `out/js`). A mapping to `None` means "next to the source" and stops the
/// search.
pub fn compiled_dir_for(
    file: &Path,
    compiled_dirs: &BTreeMap<PathBuf, Option<PathBuf>>,
) -> Option<PathBuf> {
    let (source_dir, compiled_dir) = compiled_dirs
        .iter()
        .filter(|(source_dir, _)| file.starts_with(source_dir))
        .max_by_key(|(source_dir, _)| source_dir.components().count())?;
    let compiled_dir = compiled_dir.as_ref()?;

    let parent = file.parent().unwrap_or_else(|| Path::new(""));
    match parent.strip_prefix(source_dir) {
        Ok(rest) if !rest.as_os_str().is_empty() => Some(compiled_dir.join(rest)),
        _ => Some(compiled_dir.clone()),
    }
}
