use std::{
    env,
    io::{self, Write},
    path::Path,
};

use colored::Colorize;
use log::{debug, trace};

use crate::{
    paths::make_relative,
    types::{FileFailure, FileRewrite},
};

/// Relativize a path to the current working directory for clickable links
fn display_path(path: &Path) -> String {
    let Ok(cwd) = env::current_dir() else {
        debug!("Failed to get current directory");
        return path.display().to_string();
    };
    match make_relative(path, &cwd) {
        Some(rel) => {
            trace!("Relativized {:?} to {:?}", path, rel);
            rel.to_string_lossy().to_string()
        }
        None => path.display().to_string(),
    }
}

pub fn print_nothing_to_rewrite<W: Write>(writer: &mut W, files_analyzed: usize) -> io::Result<()> {
    debug!("Nothing to rewrite");
    writeln!(
        writer,
        "{} Nothing to rewrite in {} files.",
        "✓".green().bold(),
        files_analyzed.to_string().cyan()
    )?;
    writer.flush()?;
    Ok(())
}

pub fn print_rewrites<W: Write>(
    writer: &mut W,
    rewrites: &[FileRewrite],
    written: bool,
) -> io::Result<()> {
    debug!("Printing {} rewritten files", rewrites.len());
    let total: usize = rewrites.iter().map(|r| r.statements).sum();
    let verb = if written { "Rewrote" } else { "Would rewrite" };

    writeln!(
        writer,
        "{} {} {} import statements in {} files\n",
        "✎".yellow().bold(),
        verb,
        total.to_string().yellow(),
        rewrites.len().to_string().yellow()
    )?;

    // Busiest files first, then by path for stable output
    let mut sorted: Vec<&FileRewrite> = rewrites.iter().collect();
    sorted.sort_by(|a, b| b.statements.cmp(&a.statements).then_with(|| a.path.cmp(&b.path)));

    for (idx, rewrite) in sorted.iter().enumerate() {
        let prefix = if idx == sorted.len() - 1 { "└──" } else { "├──" };
        writeln!(
            writer,
            "{}  {} ({} statements)",
            prefix.dimmed(),
            display_path(&rewrite.path).blue(),
            rewrite.statements.to_string().cyan()
        )?;
    }

    writer.flush()?;
    Ok(())
}

pub fn print_failures<W: Write>(writer: &mut W, failures: &[FileFailure]) -> io::Result<()> {
    if failures.is_empty() {
        return Ok(());
    }

    writeln!(writer, "\n{}", "─".repeat(60).dimmed())?;
    writeln!(
        writer,
        "{} {} files could not be rewritten",
        "✗".red().bold(),
        failures.len().to_string().red().bold()
    )?;
    for failure in failures {
        // Errors can span lines; keep one failure per line
        let message = failure.message.split_whitespace().collect::<Vec<_>>().join(" ");
        writeln!(writer, "  {}: {}", display_path(&failure.path).blue(), message)?;
    }

    writer.flush()?;
    Ok(())
}
