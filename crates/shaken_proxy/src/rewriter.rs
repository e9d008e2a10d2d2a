use indexmap::IndexMap;
use log::{debug, trace, warn};
use shaken_core::{
    ImportSpan, ModuleId, Splicer, TransformOutput, lex_module, render_binding, render_namespace,
    render_statement,
};

use crate::{
    error::ProxyError,
    routes::{Route, RouteTable},
};

/// Redirects every import or export-from of a routed specifier to the
/// modules its route names.
///
/// Returns `Ok(None)` when nothing was rewritten, including when the file
/// cannot be lexed. A name the route cannot place fails the whole file.
pub fn proxy_imports(
    routes: &RouteTable,
    code: &str,
    id: &ModuleId,
) -> Result<Option<TransformOutput>, ProxyError> {
    if !routes.matches_source(code) {
        trace!("No route pattern occurs in {}", id);
        return Ok(None);
    }

    let clauses = match lex_module(id.as_path(), code) {
        Ok(clauses) => clauses,
        Err(e) => {
            warn!("{}", e);
            return Ok(None);
        }
    };

    let mut splicer = Splicer::new(code);
    for span in clauses.imports.iter().filter(|span| !span.type_only) {
        let Some(route) = routes.route_for(&span.specifier) else {
            continue;
        };
        if span.star_export {
            warn!("Cannot proxy `export * from '{}'` in {}, leaving it as is", span.specifier, id);
            continue;
        }
        if span.names.is_empty() {
            trace!("Side-effect import of '{}' in {} is not proxied", span.specifier, id);
            continue;
        }

        let replacement = expand(span, route, id)?;
        debug!("Proxying '{}' in {}", span.specifier, id);
        splicer.overwrite(span.start, span.end, replacement);
    }

    if splicer.is_empty() {
        return Ok(None);
    }
    let statements = splicer.len();
    Ok(Some(TransformOutput { code: splicer.finish(), statements }))
}

/// One statement per target id, of the same kind as `span`.
fn expand(span: &ImportSpan, route: &Route, id: &ModuleId) -> Result<String, ProxyError> {
    let mut groups: IndexMap<String, Vec<String>> = IndexMap::new();
    let mut namespaces = Vec::new();

    for name in &span.names {
        // A namespace has no imported name; its alias is what gets routed
        let requested = if name.is_namespace() { &name.local } else { &name.imported };
        let target = route.resolve(requested).filter(|target| !target.id.is_empty()).ok_or_else(
            || ProxyError::Unmapped {
                name: requested.clone(),
                specifier: span.specifier.clone(),
                file: id.to_string(),
            },
        )?;

        if name.is_namespace() {
            namespaces.push(render_namespace(span.keyword, &name.local, &target.id));
        } else {
            let canonical = target.name.as_deref().unwrap_or(&name.imported);
            groups.entry(target.id).or_default().push(render_binding(
                canonical,
                &name.local,
                name.type_only,
            ));
        }
    }

    let mut statements: Vec<String> = groups
        .iter()
        .map(|(target, bindings)| render_statement(span.keyword, bindings, target))
        .collect();
    statements.extend(namespaces);
    Ok(statements.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::ProxyTarget;

    fn barrel1(name: &str) -> Option<ProxyTarget> {
        if name.contains("foo") {
            return Some(ProxyTarget {
                id: "./utils/foo".to_string(),
                name: (name == "foo").then(|| "foo1".to_string()),
            });
        }
        if name.contains("bar") || name == "default" {
            return Some(ProxyTarget::new("./utils/bar"));
        }
        if name.contains("baz") {
            return Some(ProxyTarget::new("./utils/baz"));
        }
        None
    }

    fn routes() -> RouteTable {
        RouteTable::new().route(r"\bbarrel1\b", barrel1).unwrap()
    }

    fn proxy(code: &str) -> Result<Option<TransformOutput>, ProxyError> {
        proxy_imports(&routes(), code, &ModuleId::new("/src/main.js"))
    }

    #[test]
    fn test_names_fan_out_by_target() {
        let out = proxy("import { foo, bar } from 'barrel1';\nfoo(bar);\n").unwrap().unwrap();
        assert_eq!(
            out.code,
            "import { foo1 as foo } from \"./utils/foo\";\nimport { bar } from \"./utils/bar\";\nfoo(bar);\n"
        );
        assert_eq!(out.statements, 1);
    }

    #[test]
    fn test_same_target_names_share_a_statement() {
        let out = proxy("import { foo, foo2 as f2, bar } from 'barrel1';").unwrap().unwrap();
        assert_eq!(
            out.code,
            "import { foo1 as foo, foo2 as f2 } from \"./utils/foo\";\nimport { bar } from \"./utils/bar\";"
        );
    }

    #[test]
    fn test_unmapped_name_fails_the_file() {
        let err = proxy("import { foo, qux } from 'barrel1';").unwrap_err();
        match err {
            ProxyError::Unmapped { name, specifier, file } => {
                assert_eq!(name, "qux");
                assert_eq!(specifier, "barrel1");
                assert_eq!(file, "/src/main.js");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_target_id_is_unmapped() {
        let routes = RouteTable::new().route("pkg", |_: &str| Some(ProxyTarget::new(""))).unwrap();
        let result = proxy_imports(&routes, "import { a } from 'pkg';", &ModuleId::new("/a.js"));
        assert!(matches!(result, Err(ProxyError::Unmapped { .. })));
    }

    #[test]
    fn test_anchored_pattern_routes_exact_specifier() {
        let routes = RouteTable::new().route("^barrel1$", barrel1).unwrap();
        let id = ModuleId::new("/src/main.js");

        let out = proxy_imports(&routes, "import { foo } from 'barrel1';\n", &id).unwrap().unwrap();
        assert_eq!(out.code, "import { foo1 as foo } from \"./utils/foo\";\n");

        let untouched = proxy_imports(&routes, "import { foo } from 'barrel10';\n", &id).unwrap();
        assert!(untouched.is_none());
    }

    #[test]
    fn test_string_names_stay_quoted() {
        let routes = RouteTable::new()
            .route("^kebab$", |name: &str| Some(ProxyTarget::new(format!("./parts/{}", name))))
            .unwrap();
        let id = ModuleId::new("/src/main.js");

        let out = proxy_imports(&routes, "import { \"a-b\" as ab } from 'kebab';", &id)
            .unwrap()
            .unwrap();
        assert_eq!(out.code, "import { \"a-b\" as ab } from \"./parts/a-b\";");
        assert!(lex_module(id.as_path(), &out.code).is_ok());

        let out = proxy_imports(&routes, "export { \"a-b\" } from 'kebab';", &id).unwrap().unwrap();
        assert_eq!(out.code, "export { \"a-b\" } from \"./parts/a-b\";");
    }

    #[test]
    fn test_files_without_routed_specifiers_pass_through() {
        assert!(proxy("import { foo } from './local';").unwrap().is_none());
        assert!(proxy("import { foo } from 'barrel10';").unwrap().is_none());
    }

    #[test]
    fn test_pattern_only_in_other_text_is_not_rewritten() {
        let code = "import { foo } from './local';\nconst name = 'barrel1';\n";
        assert!(proxy(code).unwrap().is_none());
    }

    #[test]
    fn test_unlexable_file_passes_through() {
        assert!(proxy("import { foo from 'barrel1';").unwrap().is_none());
    }

    #[test]
    fn test_export_from_keeps_statement_kind() {
        let out = proxy("export { foo, baz as b } from 'barrel1';").unwrap().unwrap();
        assert_eq!(
            out.code,
            "export { foo1 as foo } from \"./utils/foo\";\nexport { baz as b } from \"./utils/baz\";"
        );
    }

    #[test]
    fn test_namespace_routes_by_alias() {
        let out = proxy("import * as baz from 'barrel1';").unwrap().unwrap();
        assert_eq!(out.code, "import * as baz from \"./utils/baz\";");

        let out = proxy("export * as bazNs from 'barrel1';").unwrap().unwrap();
        assert_eq!(out.code, "export * as bazNs from \"./utils/baz\";");
    }

    #[test]
    fn test_default_import_routes_default() {
        let out = proxy("import Bar, { foo } from 'barrel1';").unwrap().unwrap();
        assert_eq!(
            out.code,
            "import { default as Bar } from \"./utils/bar\";\nimport { foo1 as foo } from \"./utils/foo\";"
        );
    }

    #[test]
    fn test_star_side_effect_and_type_only_statements_are_left_alone() {
        let code = "export * from 'barrel1';\nimport 'barrel1';\n";
        assert!(proxy(code).unwrap().is_none());

        let ts = proxy_imports(
            &routes(),
            "import type { qux } from 'barrel1';",
            &ModuleId::new("/src/main.ts"),
        )
        .unwrap();
        assert!(ts.is_none());
    }

    #[test]
    fn test_every_matching_statement_is_rewritten() {
        let code = "import { foo } from 'barrel1';\nimport { x } from './x';\nimport { bar } from 'barrel1';\n";
        let out = proxy(code).unwrap().unwrap();
        assert_eq!(out.statements, 2);
        assert_eq!(
            out.code,
            "import { foo1 as foo } from \"./utils/foo\";\nimport { x } from './x';\nimport { bar } from \"./utils/bar\";\n"
        );
    }
}
