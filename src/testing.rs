//! Test doubles shared by the unit tests

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::compiler::{
    AdapterRef, CompilerAdapter, Family, LibraryLoader, LibraryRequirement, LoadFailure,
    TransformContext, TransformFailure, Transformed,
};
use crate::options::OptionsMap;
use crate::registry::ExtensionRegistry;

/// Upper-cases the source. A line containing `FAIL` fails the compile with a
/// `file:line:` prefixed message.
#[derive(Debug)]
pub struct FakeAdapter {
    name: String,
    family: Family,
    libraries: Vec<LibraryRequirement>,
    source_map_key: Option<String>,
    pub calls: AtomicUsize,
}

impl FakeAdapter {
    pub fn new(name: &str, family: Family) -> Self {
        Self {
            name: name.to_string(),
            family,
            libraries: Vec::new(),
            source_map_key: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn requiring(mut self, requirement: LibraryRequirement) -> Self {
        self.libraries.push(requirement);
        self
    }

    pub fn with_source_map_key(mut self, key: &str) -> Self {
        self.source_map_key = Some(key.to_string());
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl CompilerAdapter for FakeAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn family(&self) -> Family {
        self.family
    }

    fn libraries(&self) -> Vec<LibraryRequirement> {
        self.libraries.clone()
    }

    fn source_map_key(&self) -> Option<&str> {
        self.source_map_key.as_deref()
    }

    fn prepare_options(&self, source_file: &Path, mut options: OptionsMap) -> OptionsMap {
        options.insert(
            "filename".to_string(),
            crate::options::OptionValue::Str(source_file.display().to_string()),
        );
        options
    }

    fn transform(&self, ctx: &TransformContext<'_>) -> Result<Transformed, TransformFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(index) = ctx.source_text.lines().position(|l| l.contains("FAIL")) {
            return Err(TransformFailure::new(format!(
                "{}:{}: error: unexpected FAIL",
                ctx.source_file.display(),
                index + 1
            )));
        }
        let output = Transformed::new(ctx.source_text.to_uppercase());
        Ok(match ctx.source_map_file {
            Some(_) => output.with_source_map("{\"version\":3}"),
            None => output,
        })
    }
}

/// Records load requests and fails for the named libraries
#[derive(Debug, Default)]
pub struct StubLoader {
    pub missing: Vec<String>,
    pub loads: Mutex<Vec<String>>,
}

impl StubLoader {
    pub fn missing(libraries: &[&str]) -> Self {
        Self {
            missing: libraries.iter().map(|s| s.to_string()).collect(),
            loads: Mutex::new(Vec::new()),
        }
    }

    pub fn loads(&self) -> Vec<String> {
        self.loads.lock().unwrap().clone()
    }
}

impl LibraryLoader for StubLoader {
    fn load(&self, requirement: &LibraryRequirement) -> Result<(), LoadFailure> {
        self.loads.lock().unwrap().push(requirement.library.clone());
        if self.missing.contains(&requirement.library) {
            Err(LoadFailure::new(format!(
                "cannot load such file -- {}",
                requirement.library
            )))
        } else {
            Ok(())
        }
    }
}

/// A registry with no loader failures and the given adapters
pub fn registry_with(adapters: &[(&str, AdapterRef)]) -> ExtensionRegistry {
    let mut registry = ExtensionRegistry::with_loader(Arc::new(StubLoader::default()));
    for (ext, adapter) in adapters {
        registry.register(ext, adapter.clone());
    }
    registry
}
