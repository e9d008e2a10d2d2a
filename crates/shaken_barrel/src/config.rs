use clap::Parser;
use shaken_core::ProjectArgs;

use crate::scanner::ScanOptions;

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "barrels")]
#[command(about = "Rewrite imports of barrel files into direct imports of their origin modules")]
pub struct Config {
    #[command(flatten)]
    pub project: ProjectArgs,
}

impl Config {
    /// Discovery settings for an initialized project.
    pub(crate) fn scan_options(&self) -> anyhow::Result<ScanOptions> {
        let root = self.project.root()?;
        Ok(ScanOptions {
            root: root.clone(),
            patterns: self.project.patterns(),
            ignore: self.project.ignore(),
        })
    }
}
