use dashmap::DashMap;
use log::{debug, trace};
use path_clean::clean;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::{
    constants::{INDEX_FILES, RESOLVE_EXTENSIONS},
    paths::is_relative_request,
};

/// On-disk module specifier resolution.
///
/// Handles relative specifiers, tsconfig path aliases and `node_modules`
/// packages. Results are cached per (importer, specifier).
#[derive(Debug, Default)]
pub struct Resolver {
    root: PathBuf,
    tsconfig_paths: HashMap<String, Vec<String>>,
    cache: DashMap<(PathBuf, String), Option<PathBuf>>,
}

impl Resolver {
    pub fn new(root: PathBuf, tsconfig_paths: HashMap<String, Vec<String>>) -> Self {
        Self { root, tsconfig_paths, cache: DashMap::new() }
    }

    #[cfg(test)]
    fn cached(&self) -> usize {
        self.cache.len()
    }

    pub fn resolve(&self, from_file: &Path, request: &str) -> Option<PathBuf> {
        let key = (from_file.to_path_buf(), request.to_string());
        if let Some(v) = self.cache.get(&key) {
            trace!("Cache hit for resolve: '{}' from {}", request, from_file.display());
            return v.clone();
        }

        let resolved = if is_relative_request(request) {
            self.resolve_relative(from_file, request)
        } else {
            self.resolve_alias(request).or_else(|| self.resolve_package(from_file, request))
        };

        match &resolved {
            Some(p) => debug!("Resolved '{}' from {} to {}", request, from_file.display(), p.display()),
            None => trace!("Failed to resolve '{}' from {}", request, from_file.display()),
        }
        self.cache.insert(key, resolved.clone());
        resolved
    }

    fn resolve_relative(&self, from_file: &Path, request: &str) -> Option<PathBuf> {
        let base = from_file.parent().unwrap_or(&self.root);
        let joined = if request.starts_with('/') { PathBuf::from(request) } else { base.join(request) };
        resolve_file(&PathBuf::from(clean(joined.to_string_lossy().to_string())))
    }

    fn resolve_alias(&self, request: &str) -> Option<PathBuf> {
        // Longest alias first so `@app` wins over `@`
        let mut aliases: Vec<(&String, &Vec<String>)> = self
            .tsconfig_paths
            .iter()
            .filter(|(alias, _)| alias_matches(alias, request))
            .collect();
        aliases.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        aliases.into_iter().find_map(|(alias, targets)| {
            trace!("Matched alias '{}' for request '{}'", alias, request);
            let remainder = request[alias.len()..].trim_start_matches('/');
            targets.iter().find_map(|target| {
                let candidate = if remainder.is_empty() {
                    PathBuf::from(target)
                } else {
                    PathBuf::from(target).join(remainder)
                };
                resolve_file(&PathBuf::from(clean(candidate.to_string_lossy().to_string())))
            })
        })
    }

    fn resolve_package(&self, from_file: &Path, pkg: &str) -> Option<PathBuf> {
        trace!("Walking up from {:?} to find node_modules for '{}'", from_file, pkg);
        let start = from_file.parent().unwrap_or(&self.root);
        for dir in start.ancestors() {
            if let Some(found) = resolve_node_module(dir, pkg) {
                return Some(found);
            }
            // Stop at workspace root
            if dir == self.root {
                break;
            }
        }
        None
    }
}

fn alias_matches(alias: &str, request: &str) -> bool {
    request == alias
        || (request.starts_with(alias)
            && (alias.ends_with('/') || request[alias.len()..].starts_with('/')))
}

fn resolve_file(p: &Path) -> Option<PathBuf> {
    let canonical = |c: PathBuf| Some(c.canonicalize().unwrap_or(c));

    if p.is_file() {
        return canonical(p.to_path_buf());
    }

    for ext in RESOLVE_EXTENSIONS {
        let candidate = PathBuf::from(format!("{}.{}", p.display(), ext));
        if candidate.is_file() {
            return canonical(candidate);
        }
    }

    INDEX_FILES.iter().map(|index| p.join(index)).find(|c| c.is_file()).and_then(canonical)
}

fn resolve_node_module(dir: &Path, pkg: &str) -> Option<PathBuf> {
    let nm = dir.join("node_modules").join(pkg);
    if !nm.exists() {
        return None;
    }
    trace!("Checking node_modules at: {:?}", nm);

    let manifest = fs::read_to_string(nm.join("package.json"))
        .ok()
        .and_then(|txt| serde_json::from_str::<serde_json::Value>(&txt).ok());

    if let Some(v) = manifest {
        let entry_points = package_entry_points(&v);
        for entry in entry_points {
            if let Some(resolved) = resolve_file(&nm.join(entry.trim_start_matches("./"))) {
                return Some(resolved);
            }
        }
    }

    resolve_file(&nm)
}

/// Candidate entry files of a package manifest, in priority order.
fn package_entry_points(manifest: &serde_json::Value) -> Vec<&str> {
    let mut entries = Vec::new();

    match manifest.get("exports") {
        Some(serde_json::Value::String(s)) => entries.push(s.as_str()),
        Some(serde_json::Value::Object(obj)) => match obj.get(".") {
            Some(serde_json::Value::String(s)) => entries.push(s.as_str()),
            Some(serde_json::Value::Object(conditions)) => {
                for key in ["import", "require", "default"] {
                    if let Some(s) = conditions.get(key).and_then(|x| x.as_str()) {
                        entries.push(s);
                    }
                }
            }
            _ => {}
        },
        _ => {}
    }

    for field in ["module", "main"] {
        if let Some(s) = manifest.get(field).and_then(|x| x.as_str()) {
            entries.push(s);
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, path: &str, content: &str) -> PathBuf {
        let file_path = dir.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path.canonicalize().unwrap()
    }

    #[test]
    fn test_resolve_relative_with_extension_probe() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        let main = create_test_file(&root, "src/main.js", "");
        let foo = create_test_file(&root, "src/utils/foo.ts", "");

        let resolver = Resolver::new(root, HashMap::new());
        assert_eq!(resolver.resolve(&main, "./utils/foo"), Some(foo));
    }

    #[test]
    fn test_resolve_directory_index() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        let main = create_test_file(&root, "src/main.js", "");
        let index = create_test_file(&root, "src/utils/index.js", "");

        let resolver = Resolver::new(root, HashMap::new());
        assert_eq!(resolver.resolve(&main, "./utils"), Some(index));
        assert_eq!(resolver.cached(), 1);
    }

    #[test]
    fn test_resolve_tsconfig_alias() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        let main = create_test_file(&root, "src/main.ts", "");
        let alias = create_test_file(&root, "alias/index.ts", "");
        let button = create_test_file(&root, "src/components/Button.tsx", "");

        let mut paths = HashMap::new();
        paths.insert("@".to_string(), vec![root.join("alias").to_string_lossy().to_string()]);
        paths.insert(
            "@components".to_string(),
            vec![root.join("src/components").to_string_lossy().to_string()],
        );

        let resolver = Resolver::new(root, paths);
        assert_eq!(resolver.resolve(&main, "@"), Some(alias));
        assert_eq!(resolver.resolve(&main, "@components/Button"), Some(button));
        assert_eq!(resolver.resolve(&main, "@scope/pkg"), None);
    }

    #[test]
    fn test_resolve_node_module_exports_field() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        let main = create_test_file(&root, "src/main.js", "");
        create_test_file(
            &root,
            "node_modules/pkg/package.json",
            r#"{ "exports": { ".": { "import": "./dist/index.mjs" } } }"#,
        );
        let entry = create_test_file(&root, "node_modules/pkg/dist/index.mjs", "");

        let resolver = Resolver::new(root, HashMap::new());
        assert_eq!(resolver.resolve(&main, "pkg"), Some(entry));
    }

    #[test]
    fn test_resolve_node_module_main_field() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        let main = create_test_file(&root, "src/main.js", "");
        create_test_file(&root, "node_modules/lib/package.json", r#"{ "main": "lib/entry.js" }"#);
        let entry = create_test_file(&root, "node_modules/lib/lib/entry.js", "");

        let resolver = Resolver::new(root, HashMap::new());
        assert_eq!(resolver.resolve(&main, "lib"), Some(entry));
    }

    #[test]
    fn test_unresolvable_request() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        let main = create_test_file(&root, "src/main.js", "");

        let resolver = Resolver::new(root, HashMap::new());
        assert_eq!(resolver.resolve(&main, "./missing"), None);
        assert_eq!(resolver.resolve(&main, "missing-pkg"), None);
    }
}
