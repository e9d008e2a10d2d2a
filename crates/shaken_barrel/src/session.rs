use log::{debug, info, warn};
use shaken_core::{Host, ModuleId, TransformOutput, lex_module};
use std::sync::OnceLock;

use crate::{
    graph::BarrelIndex,
    rewriter::rewrite_imports,
    scanner::{ScanOptions, scan_candidates},
};

/// State of one build.
///
/// Barrel discovery and the export tables are computed on first use and
/// shared by every later [`BarrelSession::transform`] call, including calls
/// made concurrently from several threads.
pub struct BarrelSession<H: Host> {
    host: H,
    options: Option<ScanOptions>,
    candidates: OnceLock<Vec<ModuleId>>,
    index: OnceLock<BarrelIndex>,
}

impl<H: Host> BarrelSession<H> {
    pub fn new(host: H, options: ScanOptions) -> Self {
        Self { host, options: Some(options), candidates: OnceLock::new(), index: OnceLock::new() }
    }

    /// Session over barrels that are already known, skipping discovery.
    pub fn from_candidates(host: H, candidates: Vec<ModuleId>) -> Self {
        Self { host, options: None, candidates: OnceLock::from(candidates), index: OnceLock::new() }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn candidates(&self) -> &[ModuleId] {
        self.candidates.get_or_init(|| {
            let Some(options) = &self.options else {
                return Vec::new();
            };
            match scan_candidates(options) {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!("Barrel discovery failed, nothing will be rewritten: {:#}", e);
                    Vec::new()
                }
            }
        })
    }

    pub fn index(&self) -> &BarrelIndex {
        self.index.get_or_init(|| BarrelIndex::build(&self.host, self.candidates()))
    }

    /// Rewrites the barrel imports of one module.
    ///
    /// `None` means the module passes through unchanged: it is a barrel
    /// itself, it cannot be lexed, or it imports no known barrel names.
    pub fn transform(&self, code: &str, id: &ModuleId) -> Option<TransformOutput> {
        let index = self.index();
        if index.is_barrel(id) {
            debug!("Leaving barrel {} as is", id);
            return None;
        }
        if index.tables() == 0 {
            return None;
        }

        let clauses = match lex_module(id.as_path(), code) {
            Ok(clauses) => clauses,
            Err(e) => {
                warn!("{}", e);
                return None;
            }
        };

        let output = rewrite_imports(code, id, &clauses, index, &self.host)?;
        info!("Rewrote {} barrel imports in {}", output.statements, id);
        Some(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shaken_core::MemoryHost;
    use std::{fs, sync::Arc, thread};
    use tempfile::TempDir;

    const RE_EXPORT: &str = "import { foo1, foo2 } from './foo';
import * as world from './world';

export * from './hello';
export { default as bar, bar1 } from './bar';
export { foo2, foo1 as foo };
export * as baz from './baz';
export { nested } from './nested';
export { world };
";

    fn playground() -> MemoryHost {
        MemoryHost::new()
            .with_module("/src/re-export.js", RE_EXPORT)
            .with_module("/src/hello.js", "export const hello = 'hello';")
            .with_module("/src/bar.js", "export default 'bar';\nexport const bar1 = 'bar1';")
            .with_module("/src/foo.js", "export const foo1 = 1;\nexport const foo2 = 2;")
            .with_module("/src/baz.js", "export const baz = 'baz';")
            .with_module("/src/world.js", "export const world = 'world';")
            .with_module("/src/nested/index.js", "export { nested } from './deep';")
            .with_module("/src/nested/deep.js", "export const nested = 'nested';")
    }

    fn session(host: MemoryHost) -> BarrelSession<MemoryHost> {
        BarrelSession::from_candidates(host, vec![ModuleId::new("/src/re-export.js")])
    }

    #[test]
    fn test_playground_consumer() {
        let session = session(playground());
        let code = "import { hello, bar, bar1, foo, foo2, nested, baz, world } from './re-export';\n\
                    console.log(hello, bar, bar1, foo, foo2, nested, baz, world);\n";
        let out = session.transform(code, &ModuleId::new("/src/main.js")).unwrap();

        let expected = [
            "import { hello } from \"./hello\";",
            "import { default as bar, bar1 } from \"./bar\";",
            "import { foo1 as foo, foo2 } from \"./foo\";",
            "import { nested } from \"./nested/deep\";",
            "import * as baz from \"./baz\";",
            "import * as world from \"./world\";",
        ];
        let lines: Vec<&str> = out.code.lines().take(expected.len()).collect();
        assert_eq!(lines, expected);
        assert!(out.code.ends_with("console.log(hello, bar, bar1, foo, foo2, nested, baz, world);\n"));
        assert_eq!(out.statements, 1);
    }

    #[test]
    fn test_rewriting_is_idempotent() {
        let session = session(playground());
        let id = ModuleId::new("/src/main.js");
        let once = session.transform("import { hello, foo } from './re-export';", &id).unwrap();
        assert!(session.transform(&once.code, &id).is_none());
    }

    #[test]
    fn test_barrels_are_not_rewritten() {
        let session = session(playground());
        assert!(session.transform(RE_EXPORT, &ModuleId::new("/src/re-export.js")).is_none());
    }

    #[test]
    fn test_files_without_barrel_imports_pass_through() {
        let session = session(playground());
        let id = ModuleId::new("/src/main.js");
        assert!(session.transform("import { hello } from './hello';", &id).is_none());
        assert!(session.transform("const x = 1;", &id).is_none());
    }

    #[test]
    fn test_unlexable_consumer_passes_through() {
        let session = session(playground());
        let id = ModuleId::new("/src/main.js");
        assert!(session.transform("import { hello from './re-export';", &id).is_none());
    }

    #[test]
    fn test_sessions_are_independent() {
        let first = session(playground());
        let second = BarrelSession::from_candidates(playground(), Vec::new());
        let id = ModuleId::new("/src/main.js");
        let code = "import { hello } from './re-export';";
        assert!(first.transform(code, &id).is_some());
        assert!(second.transform(code, &id).is_none());
    }

    #[test]
    fn test_concurrent_transforms_share_one_index() {
        let session = Arc::new(session(playground()));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let session = Arc::clone(&session);
                thread::spawn(move || {
                    let id = ModuleId::new(format!("/src/consumer{}.js", i));
                    session.transform("import { foo } from './re-export';", &id).map(|o| o.code)
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().as_deref(), Some("import { foo1 as foo } from \"./foo\";"));
        }
        assert!(std::ptr::eq(session.index(), session.index()));
    }

    #[test]
    fn test_discovery_from_disk() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/index.js"), "export { a } from './a';").unwrap();
        fs::write(root.join("src/a.js"), "export const a = 1;").unwrap();

        let host = shaken_core::FsHost::new(root.clone(), Default::default());
        let session = BarrelSession::new(host, ScanOptions::new(&root));
        assert_eq!(session.candidates(), &[ModuleId::from_path(&root.join("src/index.js"))]);

        let id = ModuleId::from_path(&root.join("src/main.js"));
        let out = session.transform("import { a } from './index';", &id).unwrap();
        assert_eq!(out.code, "import { a } from \"./a\";");
    }
}
