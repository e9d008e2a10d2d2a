//! Core utilities shared by the shaken pipelines.
//!
//! This crate provides the pieces both import rewriters are built from:
//! - Lexing the import/export clauses of JS/TS modules into offset spans
//! - Module identity and the host collaborators (resolution, source loading)
//! - Collecting project files with glob patterns
//! - Splicing replacement text and emitting import statements
//! - Project configuration and rewrite reporting

mod collector;
mod config;
mod constants;
mod emit;
mod error;
mod host;
mod lexer;
mod paths;
mod reporter;
mod resolver;
mod splice;
mod types;

// Re-export public API
pub use collector::{collect_files, write_rewrites};
pub use config::{ProjectArgs, find_git_root, read_tsconfig_paths};
pub use constants::{DEFAULT_IGNORE, DEFAULT_PATTERNS, INDEX_FILES, JS_TS_EXTENSIONS, RESOLVE_EXTENSIONS};
pub use emit::{render_binding, render_namespace, render_statement};
pub use error::ShakeError;
pub use host::{FsHost, Host, MemoryHost};
pub use lexer::{lex_module, source_type_for};
pub use paths::{is_relative_request, make_relative, rebase_request};
pub use reporter::{print_failures, print_nothing_to_rewrite, print_rewrites};
pub use resolver::Resolver;
pub use splice::Splicer;
pub use types::{
    FileFailure, FileRewrite, ImportSpan, Keyword, LocalExport, ModuleClauses, ModuleId,
    NameBinding, RewriteReport, TransformOutput,
};
