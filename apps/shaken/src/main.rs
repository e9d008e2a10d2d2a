use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use log::{debug, info};
use shaken_core::RewriteReport;
use std::io::{BufWriter, Write};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "shaken")]
#[command(about = "Rewrite JavaScript/TypeScript imports to skip barrels and proxies", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Rewrite imports of barrel files into direct imports
    Barrels(shaken_barrel::Config),
    /// Rewrite imports of proxied specifiers using a routes file
    Proxy(shaken_proxy::Config),
}

fn main() -> Result<()> {
    env_logger::init();

    // stdio is blocked by LineWriter, use a BufWriter to reduce syscalls.
    // See https://github.com/rust-lang/rust/issues/60673
    let mut stdout = BufWriter::new(std::io::stdout());

    let cli = Cli::parse();
    debug!("Parsed CLI arguments: {:?}", cli.command);

    let start = Instant::now();
    let num_threads = rayon::current_num_threads();

    let (report, json, written) = match cli.command {
        Commands::Barrels(cfg) => {
            info!("Running barrel shake (using {} threads)", num_threads);
            let (json, write) = (cfg.project.json, cfg.project.write);
            (shaken_barrel::run_barrel_shake(cfg)?, json, write)
        }
        Commands::Proxy(cfg) => {
            info!(
                "Running import proxy with routes from {} (using {} threads)",
                cfg.config.display(),
                num_threads
            );
            let (json, write) = (cfg.project.json, cfg.project.write);
            (shaken_proxy::run_import_proxy(cfg)?, json, write)
        }
    };
    debug!("{} rewrites, {} failures", report.rewrites.len(), report.failures.len());

    if json {
        serde_json::to_writer_pretty(&mut stdout, &report)?;
        writeln!(stdout)?;
    } else {
        print_report(&mut stdout, &report, written)?;
        writeln!(
            stdout,
            "\n{} Finished in {}ms on {} files (using {} threads).",
            "●".bright_blue(),
            start.elapsed().as_millis().to_string().cyan(),
            report.files_analyzed.to_string().cyan(),
            num_threads.to_string().cyan()
        )?;
    }
    stdout.flush()?;

    if !report.failures.is_empty() {
        // Non-zero exit to fail CI
        std::process::exit(1);
    }
    Ok(())
}

fn print_report<W: Write>(writer: &mut W, report: &RewriteReport, written: bool) -> Result<()> {
    if report.rewrites.is_empty() {
        shaken_core::print_nothing_to_rewrite(writer, report.files_analyzed)?;
    } else {
        shaken_core::print_rewrites(writer, &report.rewrites, written)?;
    }
    shaken_core::print_failures(writer, &report.failures)?;
    Ok(())
}
