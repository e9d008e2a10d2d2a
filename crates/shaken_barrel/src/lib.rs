//! Barrel shaking for JavaScript/TypeScript projects.
//!
//! A barrel is a module that only re-exports bindings of other modules.
//! Importing through one makes bundlers pull in everything it forwards, so
//! this crate rewrites consumer imports to point at the modules that
//! actually define the imported names:
//!
//! ```text
//! import { add, format } from './utils';
//! // becomes
//! import { add } from "./utils/math";
//! import { fmt as format } from "./utils/fmt";
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use shaken_barrel::{BarrelSession, ScanOptions};
//! use shaken_core::{FsHost, ModuleId};
//!
//! let host = FsHost::new("/path/to/project".into(), Default::default());
//! let session = BarrelSession::new(host, ScanOptions::new("/path/to/project"));
//!
//! let id = ModuleId::new("/path/to/project/src/app.ts");
//! if let Some(output) = session.transform("import { add } from './utils';", &id) {
//!     println!("{}", output.code);
//! }
//! ```

mod checker;
mod config;
mod graph;
mod rewriter;
mod scanner;
mod session;
mod types;

// Re-export public API
pub use checker::run_barrel_shake;
pub use config::Config;
pub use graph::BarrelIndex;
pub use rewriter::rewrite_imports;
pub use scanner::{ScanOptions, scan_candidates};
pub use session::BarrelSession;
pub use types::{ExportBinding, ExportTable, OriginName};
