use path_clean::clean;
use std::path::{Component, Path, PathBuf};

/// Whether a `from` specifier is resolved against the importing file.
pub fn is_relative_request(request: &str) -> bool {
    request.starts_with("./") || request.starts_with("../") || request.starts_with('/')
}

/// Create a relative path from `base` to `target`
pub fn make_relative(target: &Path, base: &Path) -> Option<PathBuf> {
    let target: Vec<Component> = target.components().collect();
    let base: Vec<Component> = base.components().collect();

    // Paths on different roots (or drive prefixes) have no relative form
    if target.first() != base.first() {
        return None;
    }

    let common = target.iter().zip(&base).take_while(|(t, b)| t == b).count();

    let mut result = PathBuf::new();
    for _ in &base[common..] {
        result.push("..");
    }
    for component in &target[common..] {
        result.push(component.as_os_str());
    }

    if result.as_os_str().is_empty() { Some(PathBuf::from(".")) } else { Some(result) }
}

/// Re-expresses `request`, written inside `declared_in`, as a specifier that
/// works from `consumer`.
///
/// Bare specifiers (packages, path aliases) mean the same thing everywhere
/// and are returned unchanged.
pub fn rebase_request(declared_in: &Path, request: &str, consumer: &Path) -> String {
    if !is_relative_request(request) {
        return request.to_string();
    }

    let joined = match declared_in.parent() {
        Some(dir) if !request.starts_with('/') => dir.join(request),
        _ => PathBuf::from(request),
    };
    let target = PathBuf::from(clean(joined.to_string_lossy().to_string()));

    let Some(base) = consumer.parent() else {
        return target.to_string_lossy().to_string();
    };
    let Some(rel) = make_relative(&target, base) else {
        return target.to_string_lossy().to_string();
    };

    let rel = rel.to_string_lossy().replace('\\', "/");
    if rel.starts_with("../") || rel == ".." { rel } else { format!("./{}", rel) }
}
