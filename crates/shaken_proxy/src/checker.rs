use anyhow::{Context, Result, anyhow};
use log::{debug, info, trace, warn};
use rayon::prelude::*;
use shaken_core::{
    FileFailure, FileRewrite, ModuleId, RewriteReport, TransformOutput, collect_files,
    write_rewrites,
};
use std::{fs, path::PathBuf, thread};

use crate::{
    config::{Config, ProxyConfigFile},
    rewriter::proxy_imports,
};

pub fn run_import_proxy(mut cfg: Config) -> Result<RewriteReport> {
    info!("Starting import proxy");

    cfg.project.initialize()?;
    let root = cfg.project.root()?.clone();

    let routes = ProxyConfigFile::load(&cfg.config)?.compile()?;
    if routes.is_empty() {
        warn!("No routes configured in {}", cfg.config.display());
    }
    debug!("Loaded {} routes", routes.len());

    let files = collect_files(&root, &cfg.project.patterns(), &cfg.project.ignore())?;
    if files.is_empty() {
        warn!("No source files found under {}", root.display());
        return Err(anyhow!("No source files found under {}", root.display()));
    }

    info!("Proxying imports of {} files in parallel", files.len());
    let results: Vec<(PathBuf, Result<Option<TransformOutput>>)> = files
        .par_iter()
        .map(|path| {
            trace!("Thread {:?} processing: {}", thread::current().id(), path.display());
            let result = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))
                .and_then(|code| {
                    Ok(proxy_imports(&routes, &code, &ModuleId::from_path(path))?)
                });
            (path.clone(), result)
        })
        .collect();

    let mut report = RewriteReport { files_analyzed: files.len(), ..Default::default() };
    for (path, result) in results {
        match result {
            Ok(Some(output)) => report.rewrites.push(FileRewrite {
                path,
                statements: output.statements,
                code: output.code,
            }),
            Ok(None) => {}
            Err(e) => {
                warn!("Failed to proxy {}: {:#}", path.display(), e);
                report.failures.push(FileFailure { path, message: format!("{:#}", e) });
            }
        }
    }

    // Failed files keep their original text, the rest can be written safely
    if cfg.project.write {
        write_rewrites(&report.rewrites)?;
    }

    info!(
        "Import proxy complete. {} files rewritten, {} failed",
        report.rewrites.len(),
        report.failures.len()
    );
    Ok(report)
}
