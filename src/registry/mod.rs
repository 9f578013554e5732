//! Extension registry
//!
//! Maps normalized source extensions to compiler adapters and owns the
//! per-scope option tables and library declarations. One registry is built at
//! startup, configured, then shared read-only with the watch loop.


use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::compiler::{
    builtin_adapters, load_requirement, AdapterRef, CompilerAdapter, ExecutableLoader,
    LibraryLoader, LibraryRequirement,
};
use crate::error::{LiveBuildError, LiveBuildResult};
use crate::fs::normalized_extension;
use crate::options::{OptionAssignment, OptionValue, OptionsMap};

pub struct ExtensionRegistry {
    adapters: BTreeMap<String, AdapterRef>,
    options: HashMap<String, OptionsMap>,
    libraries: HashMap<String, Vec<LibraryRequirement>>,
    loader: Arc<dyn LibraryLoader>,
    loaded: Mutex<HashSet<LibraryRequirement>>,
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("extensions", &self.extensions())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtensionRegistry {
    /// An empty registry resolving libraries on `PATH`
    pub fn new() -> Self {
        Self::with_loader(Arc::new(ExecutableLoader::new()))
    }

    pub fn with_loader(loader: Arc<dyn LibraryLoader>) -> Self {
        Self {
            adapters: BTreeMap::new(),
            options: HashMap::new(),
            libraries: HashMap::new(),
            loader,
            loaded: Mutex::new(HashSet::new()),
        }
    }

    /// A registry with the built-in adapters registered
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_builtins();
        registry
    }

    pub fn register_builtins(&mut self) {
        for (extensions, adapter) in builtin_adapters() {
            for ext in extensions {
                self.register(ext, adapter.clone());
            }
        }
    }

    /// Register `adapter` for `extension`, replacing any earlier registration
    pub fn register(&mut self, extension: &str, adapter: AdapterRef) {
        let extension = normalized_extension(extension);
        debug!(extension = %extension, adapter = adapter.name(), "registered compiler");
        self.adapters.insert(extension, adapter);
    }

    /// Adapter for a file name or bare extension
    pub fn lookup(&self, file: impl AsRef<Path>) -> Option<AdapterRef> {
        self.adapters.get(&normalized_extension(file)).cloned()
    }

    /// Registered extensions, sorted
    pub fn extensions(&self) -> Vec<String> {
        self.adapters.keys().cloned().collect()
    }

    /// Copy of the extension to adapter table
    pub fn compilers(&self) -> BTreeMap<String, AdapterRef> {
        self.adapters.clone()
    }

    pub fn set_option(&mut self, scope: &str, key: impl Into<String>, value: OptionValue) {
        self.options
            .entry(scope.to_string())
            .or_default()
            .insert(key.into(), value);
    }

    /// Copy of the options of `scope`; changing it does not affect the
    /// registry
    pub fn options_for(&self, scope: &str) -> OptionsMap {
        self.options.get(scope).cloned().unwrap_or_default()
    }

    /// Apply a parsed `EXT:KEY:VALUE` assignment to the adapter registered
    /// for `EXT`
    pub fn apply_assignment(&mut self, assignment: &OptionAssignment) -> LiveBuildResult<()> {
        let adapter = self
            .lookup(&assignment.extension)
            .ok_or_else(|| self.unknown_extension(&assignment.extension))?;
        let scope = adapter.name().to_string();
        self.set_option(&scope, assignment.key.clone(), assignment.value.clone());
        Ok(())
    }

    pub fn unknown_extension(&self, extension: &str) -> LiveBuildError {
        LiveBuildError::configuration(format!(
            "No compiler registered for '{}' files. The supported file types are:\n{}",
            extension,
            self.extensions().join(" ")
        ))
    }

    /// Declare a library for every adapter in `scope` (an adapter name or a
    /// family scope)
    pub fn require_library(&mut self, scope: &str, requirement: LibraryRequirement) {
        self.libraries
            .entry(scope.to_string())
            .or_default()
            .push(requirement);
    }

    /// Every library `adapter` needs: its own declarations plus those of its
    /// scopes. Empty when nothing is declared.
    pub fn libraries_for(&self, adapter: &dyn CompilerAdapter) -> Vec<LibraryRequirement> {
        let mut requirements = adapter.libraries();
        for scope in adapter.ancestry() {
            if let Some(declared) = self.libraries.get(&scope) {
                requirements.extend(declared.iter().cloned());
            }
        }
        let mut seen = HashSet::new();
        requirements.retain(|r| seen.insert(r.clone()));
        requirements
    }

    /// Load every library `adapter` needs. Each requirement is loaded once
    /// per registry.
    pub fn require_libraries(&self, adapter: &dyn CompilerAdapter) -> LiveBuildResult<()> {
        for requirement in self.libraries_for(adapter) {
            if self.is_loaded(&requirement) {
                continue;
            }
            load_requirement(self.loader.as_ref(), &requirement)?;
            if let Ok(mut loaded) = self.loaded.lock() {
                loaded.insert(requirement);
            }
        }
        Ok(())
    }

    fn is_loaded(&self, requirement: &LibraryRequirement) -> bool {
        self.loaded
            .lock()
            .map(|loaded| loaded.contains(requirement))
            .unwrap_or(false)
    }

    /// Turn source maps on or off for every adapter that supports them
    pub fn enable_source_maps(&mut self, enabled: bool) {
        let keys: Vec<(String, String)> = self
            .adapters
            .values()
            .filter_map(|a| Some((a.name().to_string(), a.source_map_key()?.to_string())))
            .collect();
        for (scope, key) in keys {
            self.set_option(&scope, key, OptionValue::Bool(enabled));
        }
    }
}
