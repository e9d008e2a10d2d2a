use anyhow::{Result, anyhow};
use clap::Args;
use ignore::WalkBuilder;
use log::{debug, info, trace};
use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
};

use crate::constants::{DEFAULT_IGNORE, DEFAULT_PATTERNS};

/// Project selection flags shared by every pipeline.
#[derive(Debug, Clone, Default, Args)]
pub struct ProjectArgs {
    /// Root directory of the project (defaults to git root)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Glob selecting the files to process, relative to the root (repeatable)
    #[arg(long = "pattern", value_name = "GLOB")]
    pub patterns: Vec<String>,

    /// Glob excluded from processing (repeatable)
    #[arg(long = "ignore", value_name = "GLOB")]
    pub ignore: Vec<String>,

    /// Write rewritten files back to disk
    #[arg(long)]
    pub write: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    #[clap(skip)]
    pub tsconfig_paths: HashMap<String, Vec<String>>,
}

impl ProjectArgs {
    /// Resolves the root directory and loads tsconfig path aliases
    pub fn initialize(&mut self) -> Result<()> {
        let root = if let Some(r) = self.root.take() {
            debug!("Using provided root directory: {:?}", r);
            r.canonicalize().unwrap_or(r)
        } else {
            debug!("No root provided, searching for git root");
            find_git_root()?
        };
        info!("Using root directory: {}", root.display());

        self.tsconfig_paths = read_tsconfig_paths(&root);
        debug!("Found {} tsconfig path aliases", self.tsconfig_paths.len());

        self.root = Some(root);
        Ok(())
    }

    /// Get the root directory, returning an error if not initialized
    pub fn root(&self) -> Result<&PathBuf> {
        self.root
            .as_ref()
            .ok_or_else(|| anyhow!("Config not initialized - call initialize() first"))
    }

    pub fn patterns(&self) -> Vec<String> {
        if self.patterns.is_empty() {
            DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect()
        } else {
            self.patterns.clone()
        }
    }

    pub fn ignore(&self) -> Vec<String> {
        DEFAULT_IGNORE.iter().map(|p| p.to_string()).chain(self.ignore.iter().cloned()).collect()
    }
}

pub fn find_git_root() -> Result<PathBuf> {
    debug!("Searching for git root");
    let start = env::current_dir()?;
    trace!("Starting search from: {:?}", start);

    start
        .ancestors()
        .find(|dir| {
            trace!("Checking for .git in: {:?}", dir);
            dir.join(".git").exists()
        })
        .map(|dir| {
            debug!("Found git root at: {:?}", dir);
            dir.to_path_buf()
        })
        .ok_or_else(|| anyhow!("Could not find .git directory in any parent folder"))
}

/// Collects `compilerOptions.paths` aliases from every tsconfig.json under `root`.
///
/// Aliases and targets have their trailing `/*` removed; targets are made
/// absolute against the tsconfig's `baseUrl`.
pub fn read_tsconfig_paths(root: &Path) -> HashMap<String, Vec<String>> {
    debug!("Reading tsconfig paths from root: {:?}", root);
    let mut paths = HashMap::new();

    let walker = WalkBuilder::new(root).hidden(false).git_ignore(true).build();
    let tsconfigs = walker
        .filter_map(|e| e.ok())
        .filter(|e| e.path().file_name().and_then(|n| n.to_str()) == Some("tsconfig.json"));

    for entry in tsconfigs {
        let tsconfig_path = entry.path();
        trace!("Found tsconfig at: {:?}", tsconfig_path);
        let Ok(content) = fs::read_to_string(tsconfig_path) else {
            continue;
        };

        let Ok(json) = serde_json::from_str::<serde_json::Value>(&strip_line_comments(&content))
        else {
            debug!("Skipping unparsable tsconfig: {:?}", tsconfig_path);
            continue;
        };

        let Some(compiler_options) = json.get("compilerOptions") else {
            continue;
        };
        let Some(paths_obj) = compiler_options.get("paths").and_then(|p| p.as_object()) else {
            continue;
        };

        let base_url = compiler_options.get("baseUrl").and_then(|b| b.as_str()).unwrap_or(".");
        let base_path = tsconfig_path.parent().unwrap_or(root).join(base_url);

        for (alias, targets) in paths_obj {
            let resolved: Vec<String> = targets
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(|t| t.as_str())
                .map(|t| base_path.join(t.trim_end_matches("/*")).to_string_lossy().to_string())
                .collect();

            if !resolved.is_empty() {
                let alias_key = alias.trim_end_matches("/*").to_string();
                trace!("Found tsconfig path alias: '{}' -> {:?}", alias_key, resolved);
                paths.insert(alias_key, resolved);
            }
        }
    }

    debug!("Loaded {} tsconfig path aliases", paths.len());
    paths
}

/// Removes `//` comments that are not inside a string literal.
fn strip_line_comments(content: &str) -> String {
    content
        .lines()
        .map(|line| {
            let mut in_string = false;
            let mut escaped = false;
            let bytes = line.as_bytes();
            for (idx, &b) in bytes.iter().enumerate() {
                match b {
                    _ if escaped => escaped = false,
                    b'\\' if in_string => escaped = true,
                    b'"' => in_string = !in_string,
                    b'/' if !in_string && bytes.get(idx + 1) == Some(&b'/') => {
                        return &line[..idx];
                    }
                    _ => {}
                }
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, path: &str, content: &str) -> PathBuf {
        let file_path = dir.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    #[test]
    fn test_read_tsconfig_paths_simple() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let tsconfig_content = r#"
{
  "compilerOptions": {
    "baseUrl": ".",
    "paths": {
      "@components/*": ["src/components/*"],
      "@utils": ["src/utils"]
    }
  }
}
"#;
        create_test_file(root, "tsconfig.json", tsconfig_content);

        let paths = read_tsconfig_paths(root);
        assert_eq!(paths.len(), 2);
        assert!(paths.contains_key("@utils"));
        let components = paths.get("@components").unwrap();
        assert_eq!(components.len(), 1);
        assert!(components[0].contains("src/components"));
        assert!(!paths.contains_key("@components/*"));
    }

    #[test]
    fn test_read_tsconfig_paths_with_base_url() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let tsconfig_content = r#"
{
  "compilerOptions": {
    "baseUrl": "src",
    "paths": { "@components/*": ["components/*"] }
  }
}
"#;
        create_test_file(root, "tsconfig.json", tsconfig_content);

        let paths = read_tsconfig_paths(root);
        assert!(paths.get("@components").unwrap()[0].contains("src/components"));
    }

    #[test]
    fn test_read_tsconfig_paths_with_comments_and_urls() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let tsconfig_content = r#"
{
  // This is a comment
  "$schema": "https://json.schemastore.org/tsconfig", // trailing
  "compilerOptions": {
    "paths": {
      "@/*": ["src/*"] // Path comment
    }
  }
}
"#;
        create_test_file(root, "tsconfig.json", tsconfig_content);

        let paths = read_tsconfig_paths(root);
        assert_eq!(paths.len(), 1);
        assert!(paths.contains_key("@"));
    }

    #[test]
    fn test_read_tsconfig_paths_empty() {
        let temp_dir = TempDir::new().unwrap();
        assert!(read_tsconfig_paths(temp_dir.path()).is_empty());
    }

    #[test]
    fn test_strip_line_comments_keeps_strings() {
        assert_eq!(strip_line_comments(r#""a": "b//c" // x"#), r#""a": "b//c" "#);
        assert_eq!(strip_line_comments(r#""a\"//": 1"#), r#""a\"//": 1"#);
    }

    #[test]
    fn test_project_args_defaults() {
        let args = ProjectArgs::default();
        assert_eq!(args.patterns(), vec![DEFAULT_PATTERNS[0].to_string()]);
        assert_eq!(args.ignore(), vec!["**/node_modules".to_string()]);
        assert!(args.root().is_err());
    }

    #[test]
    fn test_project_args_initialize_with_root() {
        let temp_dir = TempDir::new().unwrap();
        create_test_file(
            temp_dir.path(),
            "tsconfig.json",
            r#"{ "compilerOptions": { "paths": { "@": ["../alias"] } } }"#,
        );
        let mut args = ProjectArgs {
            root: Some(temp_dir.path().to_path_buf()),
            ..ProjectArgs::default()
        };
        args.initialize().unwrap();
        assert_eq!(args.root().unwrap(), &temp_dir.path().canonicalize().unwrap());
        assert!(args.tsconfig_paths.contains_key("@"));
    }
}
