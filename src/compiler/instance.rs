//! Per-file compiler lifecycle

use std::path::{Path, PathBuf};

use tracing::debug;

use super::render::render;
use super::target::CompiledTarget;
use super::{AdapterRef, CompileError, TransformContext, TransformFailure, Transformed};
use crate::error::LiveBuildResult;
use crate::fs::{is_up_to_date, write_file};
use crate::options::OptionsMap;
use crate::registry::ExtensionRegistry;

/// One adapter bound to one source file
#[derive(Debug)]
pub struct Compiler {
    adapter: AdapterRef,
    target: CompiledTarget,
    options: OptionsMap,
}

impl Compiler {
    /// Bind `adapter` to `source_file`.
    ///
    /// Fails with a configuration error when the compiled file would
    /// overwrite the source, and with a dependency error when one of the
    /// adapter's libraries is missing.
    pub fn new(
        adapter: AdapterRef,
        registry: &ExtensionRegistry,
        source_file: &Path,
        compiled_file: Option<&Path>,
        compiled_dir: Option<&Path>,
    ) -> LiveBuildResult<Self> {
        let target = CompiledTarget::new(
            source_file,
            compiled_file,
            compiled_dir,
            adapter.compiled_extension(),
        )?;
        registry.require_libraries(adapter.as_ref())?;
        let options = adapter.prepare_options(source_file, registry.options_for(adapter.name()));

        Ok(Self {
            adapter,
            target,
            options,
        })
    }

    pub fn adapter(&self) -> &AdapterRef {
        &self.adapter
    }

    pub fn source_file(&self) -> &Path {
        &self.target.source_file
    }

    pub fn compiled_file(&self) -> &Path {
        &self.target.compiled_file
    }

    /// Side artifact path, present when the adapter supports source maps and
    /// they are turned on
    pub fn source_map_file(&self) -> Option<PathBuf> {
        let key = self.adapter.source_map_key()?;
        if !self.options.get(key).is_some_and(|v| v.is_enabled()) {
            return None;
        }
        let mut name = self.target.compiled_file.clone().into_os_string();
        name.push(".map");
        Some(PathBuf::from(name))
    }

    /// Copy of the options this compiler runs with
    pub fn options(&self) -> OptionsMap {
        self.options.clone()
    }

    pub fn should_compile(&self) -> bool {
        !is_up_to_date(&self.target.compiled_file, &self.target.source_file)
    }

    /// Compile the source file, returning every file written.
    ///
    /// On failure the compiled file is overwritten with a rendering of the
    /// error before the error is returned.
    pub fn compile(&self) -> LiveBuildResult<Vec<PathBuf>> {
        let source_map_file = self.source_map_file();

        match self.transform(source_map_file.as_deref()) {
            Ok(output) => {
                write_file(self.compiled_file(), &output.text)?;
                let mut written = vec![self.compiled_file().to_path_buf()];
                if let (Some(map_file), Some(map)) = (source_map_file, output.source_map) {
                    write_file(&map_file, &map)?;
                    written.push(map_file);
                }
                Ok(written)
            }
            Err(failure) => {
                let error = CompileError::new(failure, self.source_file());
                debug!(
                    file = %self.source_file().display(),
                    line = ?error.line(),
                    "compile failed, writing error artifact"
                );
                write_file(
                    self.compiled_file(),
                    &render(self.adapter.render_kind(), &error),
                )?;
                Err(error.into())
            }
        }
    }

    fn transform(&self, source_map_file: Option<&Path>) -> Result<Transformed, TransformFailure> {
        let source_text = std::fs::read_to_string(self.source_file()).map_err(|e| {
            TransformFailure::new(format!("{} - {}", e, self.source_file().display()))
        })?;

        self.adapter.transform(&TransformContext {
            source_file: self.source_file(),
            compiled_file: self.compiled_file(),
            source_text: &source_text,
            options: &self.options,
            source_map_file,
        })
    }
}
