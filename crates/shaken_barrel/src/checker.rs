use anyhow::{Result, anyhow};
use log::{debug, info, trace, warn};
use rayon::prelude::*;
use shaken_core::{
    FileFailure, FileRewrite, FsHost, Host, ModuleId, RewriteReport, TransformOutput,
    collect_files, write_rewrites,
};
use std::{path::PathBuf, thread};

use crate::{config::Config, scanner::scan_candidates, session::BarrelSession};

pub fn run_barrel_shake(mut cfg: Config) -> Result<RewriteReport> {
    info!("Starting barrel shake");

    // Initialize config (resolve root, load tsconfig paths)
    cfg.project.initialize()?;
    let root = cfg.project.root()?.clone();
    let options = cfg.scan_options()?;

    let candidates = scan_candidates(&options)?;
    let files = collect_files(&root, &options.patterns, &options.ignore)?;
    if files.is_empty() {
        warn!("No source files found under {}", root.display());
        return Err(anyhow!("No source files found under {}", root.display()));
    }
    info!("Found {} source files and {} barrel candidates", files.len(), candidates.len());

    let host = FsHost::new(root, cfg.project.tsconfig_paths.clone());
    let session = BarrelSession::from_candidates(host, candidates);

    // Build the index before fanning out so workers only read it
    let index = session.index();
    debug!("Indexed {} barrels, {} with export tables", index.barrels(), index.tables());

    info!("Rewriting {} files in parallel", files.len());
    let results: Vec<(PathBuf, Result<Option<TransformOutput>>)> = files
        .par_iter()
        .map(|path| {
            trace!("Thread {:?} processing: {}", thread::current().id(), path.display());
            let id = ModuleId::from_path(path);
            let result = session.host().load(&id).map(|code| session.transform(&code, &id));
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
                warn!("Failed to rewrite {}: {:#}", path.display(), e);
                report.failures.push(FileFailure { path, message: format!("{:#}", e) });
            }
        }
    }

    if cfg.project.write {
        write_rewrites(&report.rewrites)?;
    }

    info!(
        "Barrel shake complete. {} files rewritten, {} failed",
        report.rewrites.len(),
        report.failures.len()
    );
    Ok(report)
}
