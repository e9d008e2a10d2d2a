use anyhow::{Context, Result};
use ignore::{WalkBuilder, overrides::OverrideBuilder};
use log::{debug, info, trace, warn};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{constants::JS_TS_EXTENSIONS, error::ShakeError, types::FileRewrite};

/// Walks `root` and returns the files matching any of `patterns` and none of
/// `ignore`.
///
/// Patterns are gitignore-style globs relative to the root. Only files with a
/// lexable extension are returned. `.gitignore` files are honoured; entries
/// that cannot be read are skipped.
pub fn collect_files(root: &Path, patterns: &[String], ignore: &[String]) -> Result<Vec<PathBuf>> {
    debug!("Collecting files under {} matching {:?}", root.display(), patterns);

    let mut overrides = OverrideBuilder::new(root);
    for pattern in patterns {
        overrides.add(pattern).map_err(|e| ShakeError::Pattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
    }
    for pattern in ignore {
        let negated = format!("!{}", pattern);
        overrides.add(&negated).map_err(|e| ShakeError::Pattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
    }
    let overrides = overrides
        .build()
        .map_err(|e| ShakeError::Pattern { pattern: patterns.join(", "), message: e.to_string() })?;

    let walker = WalkBuilder::new(root)
        .hidden(false)
        .ignore(true)
        .git_ignore(true)
        .overrides(overrides)
        .build();

    let mut files = Vec::new();
    for res in walker {
        let dent = match res {
            Ok(dent) => dent,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !dent.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        if !has_lexable_extension(dent.path()) {
            trace!("Skipping non-script file: {}", dent.path().display());
            continue;
        }
        trace!("Collected file: {}", dent.path().display());
        files.push(dent.path().canonicalize().unwrap_or_else(|_| dent.path().to_path_buf()));
    }

    files.sort();
    debug!("Collected {} files", files.len());
    Ok(files)
}

fn has_lexable_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| JS_TS_EXTENSIONS.contains(&ext))
}

/// Writes rewritten sources back over their files.
pub fn write_rewrites(rewrites: &[FileRewrite]) -> Result<()> {
    for rewrite in rewrites {
        trace!("Writing {}", rewrite.path.display());
        fs::write(&rewrite.path, &rewrite.code)
            .with_context(|| format!("Failed to write {}", rewrite.path.display()))?;
    }
    info!("Wrote {} files", rewrites.len());
    Ok(())
}
