//! Import proxying for JavaScript/TypeScript projects.
//!
//! Routes pair a regex over module specifiers with a resolver that says
//! which module really provides each imported name. Every import (or
//! `export ... from`) of a routed specifier is replaced with one statement
//! per target module.
//!
//! # Examples
//!
//! ```
//! use shaken_core::ModuleId;
//! use shaken_proxy::{ProxyTarget, RouteTable, proxy_imports};
//!
//! # fn main() -> Result<(), shaken_proxy::ProxyError> {
//! let routes = RouteTable::new().route(r"\bbarrel1\b", |name: &str| match name {
//!     "foo" => Some(ProxyTarget::renamed("./utils/foo", "foo1")),
//!     "bar" => Some(ProxyTarget::new("./utils/bar")),
//!     _ => None,
//! })?;
//!
//! let id = ModuleId::new("/src/main.js");
//! let output = proxy_imports(&routes, "import { foo, bar } from 'barrel1';", &id)?;
//! assert_eq!(
//!     output.map(|o| o.code).as_deref(),
//!     Some("import { foo1 as foo } from \"./utils/foo\";\nimport { bar } from \"./utils/bar\";")
//! );
//! # Ok(())
//! # }
//! ```

mod checker;
mod config;
mod error;
mod rewriter;
mod routes;

// Re-export public API
pub use checker::run_import_proxy;
pub use config::{Config, ProxyConfigFile, RouteConfig, RuleConfig};
pub use error::ProxyError;
pub use rewriter::proxy_imports;
pub use routes::{ProxyResolver, ProxyTarget, Route, RouteTable};
