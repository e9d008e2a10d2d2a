use indexmap::IndexMap;
use log::{debug, trace, warn};
use shaken_core::{
    Host, ImportSpan, Keyword, ModuleClauses, ModuleId, Splicer, TransformOutput, render_binding,
    render_namespace, render_statement,
};

use crate::{
    graph::BarrelIndex,
    types::{ExportTable, OriginName},
};

/// Replaces every import of a barrel in `code` with direct imports of the
/// modules that define the imported names.
///
/// Returns `None` when no statement changed.
pub fn rewrite_imports<H: Host>(
    code: &str,
    id: &ModuleId,
    clauses: &ModuleClauses,
    index: &BarrelIndex,
    host: &H,
) -> Option<TransformOutput> {
    let mut splicer = Splicer::new(code);

    for span in clauses.imports.iter().filter(|span| is_rewritable(span)) {
        let target = match host.resolve(&span.specifier, id) {
            Ok(Some(target)) => target,
            Ok(None) => {
                trace!("'{}' does not resolve from {}", span.specifier, id);
                continue;
            }
            Err(e) => {
                warn!("Error resolving '{}' from {}: {:#}", span.specifier, id, e);
                continue;
            }
        };
        let Some(table) = index.table(&target) else {
            continue;
        };

        if let Some(replacement) = expand_import(span, table, id) {
            debug!("Rewriting import of barrel '{}' in {}", span.specifier, id);
            splicer.overwrite(span.start, span.end, replacement);
        }
    }

    if splicer.is_empty() {
        return None;
    }
    let statements = splicer.len();
    Some(TransformOutput { code: splicer.finish(), statements })
}

/// `import { a } from './x'` style statements. Namespace and side-effect
/// imports need the whole barrel and stay as they are.
fn is_rewritable(span: &ImportSpan) -> bool {
    span.keyword == Keyword::Import
        && !span.type_only
        && !span.names.is_empty()
        && !span.has_namespace()
}

/// Direct imports equivalent to `span`, one statement per origin module.
///
/// Names the table does not know are kept in a trailing statement that still
/// imports from the barrel. `None` when no name could be redirected.
fn expand_import(span: &ImportSpan, table: &ExportTable, consumer: &ModuleId) -> Option<String> {
    let mut groups: IndexMap<&ModuleId, (String, Vec<String>)> = IndexMap::new();
    let mut namespaces = Vec::new();
    let mut residual = Vec::new();

    for name in &span.names {
        let found = if name.type_only { None } else { table.get(&name.imported) };
        let Some(binding) = found else {
            trace!("'{}' is not forwarded by '{}'", name.imported, span.specifier);
            residual.push(render_binding(&name.imported, &name.local, name.type_only));
            continue;
        };

        let specifier = binding.specifier_for(consumer);
        match &binding.origin_name {
            OriginName::Namespace => {
                namespaces.push(render_namespace(Keyword::Import, &name.local, &specifier));
            }
            origin_name => {
                let (_, bindings) =
                    groups.entry(&binding.origin).or_insert_with(|| (specifier, Vec::new()));
                bindings.push(render_binding(origin_name.as_str(), &name.local, false));
            }
        }
    }

    if groups.is_empty() && namespaces.is_empty() {
        return None;
    }

    let mut statements: Vec<String> = groups
        .into_values()
        .map(|(specifier, bindings)| render_statement(Keyword::Import, &bindings, &specifier))
        .collect();
    statements.extend(namespaces);
    if !residual.is_empty() {
        statements.push(render_statement(Keyword::Import, &residual, &span.specifier));
    }
    Some(statements.join("\n"))
}
