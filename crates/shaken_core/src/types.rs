use serde::Serialize;
use std::{
    fmt,
    path::{Path, PathBuf},
};

/// Resolved identity of a module, as produced by a [`crate::Host`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ModuleId(String);

impl ModuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn from_path(path: &Path) -> Self {
        Self(path.to_string_lossy().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<PathBuf> for ModuleId {
    fn from(path: PathBuf) -> Self {
        Self::from_path(&path)
    }
}

/// Statement keyword of a clause carrying a `from` specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Import,
    Export,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Import => "import",
            Keyword::Export => "export",
        }
    }
}

/// One `imported as local` pair of a clause.
///
/// Default bindings use `default` as the imported name, namespace forms
/// (`* as ns`) use `*`. For `export ... from` clauses `local` is the
/// exported name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameBinding {
    pub imported: String,
    pub local: String,
    pub type_only: bool,
}

impl NameBinding {
    pub fn new(imported: impl Into<String>, local: impl Into<String>) -> Self {
        Self { imported: imported.into(), local: local.into(), type_only: false }
    }

    pub fn is_namespace(&self) -> bool {
        self.imported == "*"
    }

    pub fn is_default(&self) -> bool {
        self.imported == "default"
    }
}

/// Source range and shape of a statement with a `from` specifier.
#[derive(Debug, Clone)]
pub struct ImportSpan {
    pub start: u32,
    pub end: u32,
    pub raw: String,
    pub specifier: String,
    pub keyword: Keyword,
    pub names: Vec<NameBinding>,
    /// `export * from '...'` without an alias
    pub star_export: bool,
    /// `import type ...` / `export type ... from`
    pub type_only: bool,
}

impl ImportSpan {
    pub fn has_namespace(&self) -> bool {
        self.names.iter().any(NameBinding::is_namespace)
    }
}

/// An export without a `from` clause.
///
/// `local` is the binding the export refers to inside the module, when it
/// has one (`export { a as b }`, `export const b`, `export default a`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalExport {
    pub start: u32,
    pub end: u32,
    pub exported: String,
    pub local: Option<String>,
}

/// Lexed import/export surface of a module.
#[derive(Debug, Clone, Default)]
pub struct ModuleClauses {
    pub imports: Vec<ImportSpan>,
    pub exports: Vec<LocalExport>,
}

impl ModuleClauses {
    /// Finds the import statement that introduced `local` into scope.
    pub fn import_binding(&self, local: &str) -> Option<(&ImportSpan, &NameBinding)> {
        self.imports
            .iter()
            .filter(|span| span.keyword == Keyword::Import && !span.type_only)
            .find_map(|span| {
                span.names.iter().find(|b| b.local == local && !b.type_only).map(|b| (span, b))
            })
    }

    /// Whether any export forwards a binding from another module.
    pub fn has_re_exports(&self) -> bool {
        let forwards = self.imports.iter().any(|span| span.keyword == Keyword::Export);
        forwards
            || self
                .exports
                .iter()
                .filter_map(|export| export.local.as_deref())
                .any(|local| self.import_binding(local).is_some())
    }

    pub fn re_export_spans(&self) -> impl Iterator<Item = &ImportSpan> {
        self.imports.iter().filter(|span| span.keyword == Keyword::Export && !span.type_only)
    }
}

/// Rewritten module text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
    pub code: String,
    /// Number of original statements that were replaced
    pub statements: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileRewrite {
    pub path: PathBuf,
    pub statements: usize,
    #[serde(skip)]
    pub code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RewriteReport {
    pub rewrites: Vec<FileRewrite>,
    pub failures: Vec<FileFailure>,
    pub files_analyzed: usize,
}
