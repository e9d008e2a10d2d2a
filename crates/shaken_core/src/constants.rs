//! Constants for file extensions, resolution strategies and default globs.
//!
//! ## Supported Extensions
//!
//! - **TypeScript**: `.ts`, `.tsx`, `.mts` (ES module), `.cts` (CommonJS)
//! - **JavaScript**: `.js`, `.jsx`, `.mjs` (ES module), `.cjs` (CommonJS)

/// File extensions for JavaScript/TypeScript files that can be lexed
pub const JS_TS_EXTENSIONS: &[&str] = &[
    "ts",  // TypeScript
    "tsx", // TypeScript with JSX
    "mts", // TypeScript module
    "cts", // TypeScript CommonJS
    "js",  // JavaScript
    "jsx", // JavaScript with JSX
    "mjs", // JavaScript module
    "cjs", // JavaScript CommonJS
];

/// Extensions to try when resolving module imports (in priority order)
pub const RESOLVE_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"];

/// Index file names to try when resolving directory imports
pub const INDEX_FILES: &[&str] = &[
    "index.ts",
    "index.tsx",
    "index.mts",
    "index.cts",
    "index.js",
    "index.jsx",
    "index.mjs",
    "index.cjs",
];

/// Globs selecting the files a pipeline looks at when none are configured
pub const DEFAULT_PATTERNS: &[&str] = &["**/*.{js,jsx,ts,tsx,mjs,mts}"];

/// Globs that are always excluded from collection
pub const DEFAULT_IGNORE: &[&str] = &["**/node_modules"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_extensions_matches_js_ts_extensions() {
        assert_eq!(RESOLVE_EXTENSIONS.len(), JS_TS_EXTENSIONS.len());
        for ext in RESOLVE_EXTENSIONS {
            assert!(
                JS_TS_EXTENSIONS.contains(ext),
                "RESOLVE_EXTENSIONS contains '{}' which is not in JS_TS_EXTENSIONS",
                ext
            );
        }
    }

    #[test]
    fn test_index_files_uses_all_extensions() {
        assert_eq!(INDEX_FILES.len(), JS_TS_EXTENSIONS.len());
        for ext in JS_TS_EXTENSIONS {
            let expected = format!("index.{}", ext);
            assert!(INDEX_FILES.contains(&expected.as_str()), "INDEX_FILES missing '{}'", expected);
        }
    }

    #[test]
    fn test_default_patterns_only_cover_lexable_extensions() {
        for pattern in DEFAULT_PATTERNS {
            let (_, alternatives) = pattern.split_once('{').unwrap();
            for ext in alternatives.trim_end_matches('}').split(',') {
                assert!(JS_TS_EXTENSIONS.contains(&ext), "'{}' cannot be lexed", ext);
            }
        }
    }
}
