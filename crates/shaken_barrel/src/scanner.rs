use anyhow::Result;
use log::{debug, info, trace, warn};
use rayon::prelude::*;
use shaken_core::{
    DEFAULT_IGNORE, DEFAULT_PATTERNS, ModuleId, ShakeError, collect_files, lex_module,
};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Where to look for barrel files.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub root: PathBuf,
    pub patterns: Vec<String>,
    pub ignore: Vec<String>,
}

impl ScanOptions {
    /// Default source globs under `root`, skipping `node_modules`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            patterns: DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect(),
            ignore: DEFAULT_IGNORE.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn with_patterns(mut self, patterns: Vec<String>) -> Self {
        if !patterns.is_empty() {
            self.patterns = patterns;
        }
        self
    }

    pub fn with_ignore(mut self, ignore: Vec<String>) -> Self {
        self.ignore.extend(ignore);
        self
    }
}

/// Lists the files under the scan root that forward bindings from other
/// modules.
///
/// Files that cannot be read or lexed are skipped with a warning; only an
/// invalid glob fails the scan.
pub fn scan_candidates(options: &ScanOptions) -> Result<Vec<ModuleId>> {
    info!("Scanning {} for barrel files", options.root.display());
    let files = collect_files(&options.root, &options.patterns, &options.ignore)?;
    debug!("Checking {} files for re-exports", files.len());

    let mut candidates: Vec<ModuleId> = files
        .par_iter()
        .filter_map(|path| match is_candidate(path) {
            Ok(true) => Some(ModuleId::from_path(path)),
            Ok(false) => None,
            Err(e) => {
                warn!("Skipping {}: {:#}", path.display(), e);
                None
            }
        })
        .collect();

    candidates.sort();
    info!("Found {} barrel candidates", candidates.len());
    Ok(candidates)
}

fn is_candidate(path: &Path) -> Result<bool, ShakeError> {
    let source = fs::read_to_string(path)
        .map_err(|error| ShakeError::Read { path: path.to_path_buf(), error })?;
    let clauses = lex_module(path, &source)?;
    let barrel = clauses.has_re_exports();
    if barrel {
        trace!("Barrel candidate: {}", path.display());
    }
    Ok(barrel)
}
