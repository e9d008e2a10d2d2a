use std::path::PathBuf;

use thiserror::Error;

/// Failures produced while discovering, lexing and resolving modules.
#[derive(Debug, Error)]
pub enum ShakeError {
    /// The import/export clauses of a module could not be lexed.
    #[error("failed to lex '{path}': {message}")]
    Lex { path: PathBuf, message: String },

    /// A `from` specifier did not resolve to a module.
    #[error("cannot resolve '{request}' from '{importer}'")]
    Unresolved { request: String, importer: String },

    /// A module could not be read.
    #[error("failed to read '{path}': {error}")]
    Read {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// A glob pattern in the configuration is invalid.
    #[error("invalid glob pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },
}

impl ShakeError {
    /// Builds a lex error from the parser's diagnostics.
    pub fn lex(path: PathBuf, diagnostics: &[String]) -> Self {
        let message = diagnostics.join("; ");
        Self::Lex { path, message }
    }
}
