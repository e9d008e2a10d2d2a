use anyhow::{Context, Result};
use dashmap::DashMap;
use indexmap::IndexMap;
use log::{debug, info, trace, warn};
use rayon::prelude::*;
use shaken_core::{
    Host, ImportSpan, ModuleClauses, ModuleId, ShakeError, is_relative_request, lex_module,
};
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use crate::types::{ExportBinding, ExportTable, OriginName};

/// How a module provides one of its export names.
#[derive(Debug, Clone)]
enum Provided {
    /// Defined by the module itself
    Local,
    Forwarded(ExportBinding),
}

#[derive(Debug, Default)]
struct ModuleExports {
    source: String,
    entries: IndexMap<String, Provided>,
}

/// Export closure over the module graph.
///
/// The exports of each visited module are computed once and shared, so deep
/// `export *` chains are flattened in a single pass. Modules on the current
/// visiting stack are not re-entered, which is what terminates cycles. A
/// module whose exports were cut short by such a cycle is not memoized, so
/// its table does not depend on which barrel was visited first.
pub(crate) struct ExportGraph<'h, H: Host> {
    host: &'h H,
    memo: DashMap<ModuleId, Arc<ModuleExports>>,
}

impl<'h, H: Host> ExportGraph<'h, H> {
    pub(crate) fn new(host: &'h H) -> Self {
        Self { host, memo: DashMap::new() }
    }

    /// Builds the table of names `barrel` forwards from other modules.
    pub(crate) fn table_for(&self, barrel: &ModuleId) -> Result<ExportTable> {
        let exports = self.exports_of(barrel, &mut Visit::default())?;
        let mut table = ExportTable::new(exports.source.clone());
        for provided in exports.entries.values() {
            if let Provided::Forwarded(binding) = provided {
                table.insert(binding.clone());
            }
        }
        debug!("Export table for {} has {} forwarded names", barrel, table.len());
        Ok(table)
    }

    fn exports_of(&self, id: &ModuleId, visit: &mut Visit) -> Result<Arc<ModuleExports>> {
        if let Some(hit) = self.memo.get(id) {
            trace!("Cache hit for exports: {}", id);
            return Ok(Arc::clone(hit.value()));
        }

        let source = self.host.load(id).with_context(|| format!("Failed to load {}", id))?;
        let clauses = lex_module(id.as_path(), &source)?;

        let depth = visit.stack.len();
        let outer_cut = visit.cut.take();
        visit.stack.push(id.clone());
        let entries = self.collect_entries(id, &clauses, visit);
        visit.stack.pop();

        // A cut at `id` itself leaves its own names complete
        let cut = visit.cut.take().filter(|&at| at < depth);
        visit.cut = match (outer_cut, cut) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };

        let exports = Arc::new(ModuleExports { source, entries });
        if cut.is_none() {
            self.memo.insert(id.clone(), Arc::clone(&exports));
        } else {
            trace!("Not caching exports of {} cut short by a cycle", id);
        }
        Ok(exports)
    }

    fn collect_entries(
        &self,
        id: &ModuleId,
        clauses: &ModuleClauses,
        visit: &mut Visit,
    ) -> IndexMap<String, Provided> {
        let mut explicit: IndexMap<String, Provided> = IndexMap::new();

        // export { a, b as c } from './x' / export * as ns from './x'
        for span in clauses.re_export_spans().filter(|s| !s.star_export) {
            let Some(target) = self.resolve(span, id) else {
                continue;
            };
            for name in span.names.iter().filter(|b| !b.type_only) {
                let binding = self.forward(id, span, &target, &name.imported, &name.local, visit);
                explicit.entry(name.local.clone()).or_insert(Provided::Forwarded(binding));
            }
        }

        // export { a } where `a` came from an import, or a local definition
        for export in &clauses.exports {
            let imported = export.local.as_deref().and_then(|local| clauses.import_binding(local));
            let provided = match imported {
                Some((span, name)) => match self.resolve(span, id) {
                    Some(target) => Provided::Forwarded(self.forward(
                        id,
                        span,
                        &target,
                        &name.imported,
                        &export.exported,
                        visit,
                    )),
                    None => Provided::Local,
                },
                None => Provided::Local,
            };
            explicit.entry(export.exported.clone()).or_insert(provided);
        }

        // export * from './x': explicit names shadow, conflicting stars cancel out
        let mut starred: IndexMap<String, Option<ExportBinding>> = IndexMap::new();
        for span in clauses.re_export_spans().filter(|s| s.star_export) {
            let Some(target) = self.resolve(span, id) else {
                continue;
            };
            if visit.cuts(&target) {
                debug!("Skipping cyclic export * from '{}' in {}", span.specifier, id);
                continue;
            }
            let target_exports = match self.exports_of(&target, visit) {
                Ok(exports) => exports,
                Err(e) => {
                    warn!("Cannot read exports of '{}' from {}: {:#}", span.specifier, id, e);
                    continue;
                }
            };

            // Package internals are never exposed to consumers
            let traverse = is_relative_request(&span.specifier);
            for (name, provided) in &target_exports.entries {
                if name == "default" || explicit.contains_key(name) {
                    continue;
                }
                let binding = match provided {
                    Provided::Forwarded(deeper) if traverse => {
                        ExportBinding { local_name: name.clone(), ..deeper.clone() }
                    }
                    _ => ExportBinding {
                        origin: target.clone(),
                        origin_name: OriginName::Named(name.clone()),
                        local_name: name.clone(),
                        declared_in: id.clone(),
                        request: span.specifier.clone(),
                    },
                };
                if binding.origin == *id {
                    continue;
                }

                match starred.get_mut(name) {
                    None => {
                        starred.insert(name.clone(), Some(binding));
                    }
                    Some(slot) => {
                        if slot.as_ref().is_some_and(|existing| !existing.same_origin(&binding)) {
                            debug!("Export '{}' of {} is ambiguous between star exports", name, id);
                            *slot = None;
                        }
                    }
                }
            }
        }

        let mut entries = explicit;
        for (name, binding) in starred {
            if let Some(binding) = binding {
                trace!("{} forwards '{}' from {}", id, name, binding.origin);
                entries.insert(name, Provided::Forwarded(binding));
            }
        }
        entries
    }

    /// Binding for `imported` of `target`, followed to its definition when
    /// `target` itself forwards it.
    fn forward(
        &self,
        id: &ModuleId,
        span: &ImportSpan,
        target: &ModuleId,
        imported: &str,
        exported: &str,
        visit: &mut Visit,
    ) -> ExportBinding {
        let direct = ExportBinding {
            origin: target.clone(),
            origin_name: OriginName::from_imported(imported),
            local_name: exported.to_string(),
            declared_in: id.clone(),
            request: span.specifier.clone(),
        };

        if imported == "*" || !is_relative_request(&span.specifier) || visit.cuts(target) {
            return direct;
        }

        match self.exports_of(target, visit) {
            Ok(exports) => match exports.entries.get(imported) {
                Some(Provided::Forwarded(deeper)) if deeper.origin != *id => {
                    trace!("Following '{}' through {} to {}", imported, target, deeper.origin);
                    ExportBinding { local_name: exported.to_string(), ..deeper.clone() }
                }
                _ => direct,
            },
            Err(e) => {
                debug!("Not following '{}' into {}: {:#}", imported, target, e);
                direct
            }
        }
    }

    fn resolve(&self, span: &ImportSpan, importer: &ModuleId) -> Option<ModuleId> {
        match self.host.resolve(&span.specifier, importer) {
            Ok(Some(target)) => Some(target),
            Ok(None) => {
                let err = ShakeError::Unresolved {
                    request: span.specifier.clone(),
                    importer: importer.to_string(),
                };
                warn!("{}", err);
                None
            }
            Err(e) => {
                warn!("Error resolving '{}' from {}: {:#}", span.specifier, importer, e);
                None
            }
        }
    }
}

/// Modules being visited, and the shallowest of them a cycle was cut at.
#[derive(Debug, Default)]
struct Visit {
    stack: Vec<ModuleId>,
    cut: Option<usize>,
}

impl Visit {
    /// Whether `target` is being visited. Records the cut when it is.
    fn cuts(&mut self, target: &ModuleId) -> bool {
        let Some(depth) = self.stack.iter().position(|m| m == target) else {
            return false;
        };
        self.cut = Some(self.cut.map_or(depth, |at| at.min(depth)));
        true
    }
}

/// Barrel files of a build and the export tables built for them.
///
/// Written once by [`BarrelIndex::build`], read-only afterwards.
#[derive(Debug, Default)]
pub struct BarrelIndex {
    barrels: HashSet<ModuleId>,
    tables: HashMap<ModuleId, Arc<ExportTable>>,
}

impl BarrelIndex {
    /// Builds the export table of every candidate.
    ///
    /// Each barrel settles independently: a barrel whose table cannot be
    /// built is logged and left without a table, so its consumers pass
    /// through untouched.
    pub fn build<H: Host>(host: &H, candidates: &[ModuleId]) -> Self {
        info!("Building export tables for {} barrel candidates", candidates.len());
        let graph = ExportGraph::new(host);

        let results: Vec<(ModuleId, Result<ExportTable>)> =
            candidates.par_iter().map(|id| (id.clone(), graph.table_for(id))).collect();

        let mut index = BarrelIndex::default();
        for (id, result) in results {
            match result {
                Ok(table) if table.is_empty() => {
                    debug!("{} forwards nothing, no table stored", id);
                }
                Ok(table) => {
                    index.tables.insert(id.clone(), Arc::new(table));
                }
                Err(e) => warn!("Failed to build export table for {}: {:#}", id, e),
            }
            index.barrels.insert(id);
        }

        info!("Built {} export tables", index.tables.len());
        index
    }

    pub fn is_barrel(&self, id: &ModuleId) -> bool {
        self.barrels.contains(id)
    }

    pub fn table(&self, id: &ModuleId) -> Option<&ExportTable> {
        self.tables.get(id).map(|t| t.as_ref())
    }

    pub fn barrels(&self) -> usize {
        self.barrels.len()
    }

    pub fn tables(&self) -> usize {
        self.tables.len()
    }
}
