use std::path::PathBuf;

use thiserror::Error;

/// Failures of the import proxy.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// A route matched the specifier but has no target for an imported name.
    ///
    /// Fatal for the file: dropping the binding would leave broken code.
    #[error("no proxy target for '{name}' imported from '{specifier}' in '{file}'")]
    Unmapped { name: String, specifier: String, file: String },

    #[error("invalid route pattern '{pattern}': {error}")]
    InvalidPattern {
        pattern: String,
        #[source]
        error: regex::Error,
    },

    #[error("invalid proxy config '{path}': {error}")]
    InvalidConfig {
        path: PathBuf,
        #[source]
        error: serde_json::Error,
    },
}
