use anyhow::{Result, anyhow};
use log::trace;
use path_clean::clean;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    constants::{INDEX_FILES, RESOLVE_EXTENSIONS},
    error::ShakeError,
    paths::is_relative_request,
    resolver::Resolver,
    types::ModuleId,
};

/// Build-tool collaborators the pipelines depend on.
///
/// `resolve` must be idempotent for the same (specifier, importer) pair
/// within one build. `load` returns the module's processed source, i.e.
/// the text after any earlier transform stages.
pub trait Host: Send + Sync {
    fn resolve(&self, specifier: &str, importer: &ModuleId) -> Result<Option<ModuleId>>;

    fn load(&self, id: &ModuleId) -> Result<String>;
}

impl<H: Host + ?Sized> Host for Arc<H> {
    fn resolve(&self, specifier: &str, importer: &ModuleId) -> Result<Option<ModuleId>> {
        (**self).resolve(specifier, importer)
    }

    fn load(&self, id: &ModuleId) -> Result<String> {
        (**self).load(id)
    }
}

/// Host backed by the file system.
#[derive(Debug, Default)]
pub struct FsHost {
    resolver: Resolver,
}

impl FsHost {
    pub fn new(root: PathBuf, tsconfig_paths: HashMap<String, Vec<String>>) -> Self {
        Self { resolver: Resolver::new(root, tsconfig_paths) }
    }
}

impl Host for FsHost {
    fn resolve(&self, specifier: &str, importer: &ModuleId) -> Result<Option<ModuleId>> {
        Ok(self.resolver.resolve(importer.as_path(), specifier).map(ModuleId::from))
    }

    fn load(&self, id: &ModuleId) -> Result<String> {
        let code = fs::read_to_string(id.as_path())
            .map_err(|error| ShakeError::Read { path: id.as_path().to_path_buf(), error })?;
        Ok(code)
    }
}

/// Host over an in-memory set of modules keyed by absolute path.
///
/// Only relative specifiers resolve; probing follows the on-disk rules
/// (exact path, extensions, index files).
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    modules: HashMap<String, String>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, path: &str, code: &str) -> Self {
        self.insert(path, code);
        self
    }

    pub fn insert(&mut self, path: &str, code: &str) {
        self.modules.insert(path.to_string(), code.to_string());
    }

    pub fn ids(&self) -> Vec<ModuleId> {
        let mut ids: Vec<ModuleId> = self.modules.keys().map(ModuleId::new).collect();
        ids.sort();
        ids
    }

    fn probe(&self, base: &Path) -> Option<ModuleId> {
        let base = base.to_string_lossy();
        let candidates = std::iter::once(base.to_string())
            .chain(RESOLVE_EXTENSIONS.iter().map(|ext| format!("{}.{}", base, ext)))
            .chain(INDEX_FILES.iter().map(|index| format!("{}/{}", base, index)));

        for candidate in candidates {
            if self.modules.contains_key(&candidate) {
                return Some(ModuleId::new(candidate));
            }
        }
        None
    }
}

impl Host for MemoryHost {
    fn resolve(&self, specifier: &str, importer: &ModuleId) -> Result<Option<ModuleId>> {
        if !is_relative_request(specifier) {
            trace!("MemoryHost does not resolve bare specifier '{}'", specifier);
            return Ok(None);
        }
        let joined = match importer.as_path().parent() {
            Some(dir) if !specifier.starts_with('/') => dir.join(specifier),
            _ => PathBuf::from(specifier),
        };
        let cleaned = PathBuf::from(clean(joined.to_string_lossy().to_string()));
        Ok(self.probe(&cleaned))
    }

    fn load(&self, id: &ModuleId) -> Result<String> {
        self.modules.get(id.as_str()).cloned().ok_or_else(|| anyhow!("module '{}' not found", id))
    }
}
