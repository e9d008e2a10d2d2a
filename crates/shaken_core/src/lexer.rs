use log::{debug, trace};
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_parser::{Parser as OxcParser, ParserReturn};
use oxc_span::{SourceType, Span};
use std::path::Path;

use crate::{
    error::ShakeError,
    types::{ImportSpan, Keyword, LocalExport, ModuleClauses, NameBinding},
};

/// Lexes the top-level import and export clauses of a module.
///
/// Only module declarations are inspected; everything else in the program is
/// left alone. Offsets are UTF-8 byte offsets into `source`.
pub fn lex_module(path: &Path, source: &str) -> Result<ModuleClauses, ShakeError> {
    trace!("Lexing module clauses: {}", path.display());
    let st = source_type_for(path);
    let allocator = Allocator::default();
    let ParserReturn { program, errors, panicked, .. } =
        OxcParser::new(&allocator, source, st).parse();

    if panicked || !errors.is_empty() {
        let diagnostics: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        return Err(ShakeError::lex(path.to_path_buf(), &diagnostics));
    }

    let mut clauses = ModuleClauses::default();

    for stmt in &program.body {
        match stmt {
            Statement::ImportDeclaration(decl) => {
                let names = decl
                    .specifiers
                    .iter()
                    .flatten()
                    .map(|spec| match spec {
                        ImportDeclarationSpecifier::ImportSpecifier(s) => NameBinding {
                            imported: export_name(&s.imported),
                            local: s.local.name.to_string(),
                            type_only: s.import_kind.is_type(),
                        },
                        ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                            NameBinding::new("default", s.local.name.as_str())
                        }
                        ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                            NameBinding::new("*", s.local.name.as_str())
                        }
                    })
                    .collect();

                clauses.imports.push(ImportSpan {
                    start: decl.span.start,
                    end: decl.span.end,
                    raw: slice(source, decl.span),
                    specifier: decl.source.value.to_string(),
                    keyword: Keyword::Import,
                    names,
                    star_export: false,
                    type_only: decl.import_kind.is_type(),
                });
            }
            Statement::ExportAllDeclaration(decl) => {
                let names = decl
                    .exported
                    .as_ref()
                    .map(|ns| vec![NameBinding::new("*", export_name(ns))])
                    .unwrap_or_default();

                clauses.imports.push(ImportSpan {
                    start: decl.span.start,
                    end: decl.span.end,
                    raw: slice(source, decl.span),
                    specifier: decl.source.value.to_string(),
                    keyword: Keyword::Export,
                    star_export: decl.exported.is_none(),
                    names,
                    type_only: decl.export_kind.is_type(),
                });
            }
            Statement::ExportNamedDeclaration(decl) => {
                if let Some(src) = &decl.source {
                    let names = decl
                        .specifiers
                        .iter()
                        .map(|s| NameBinding {
                            imported: export_name(&s.local),
                            local: export_name(&s.exported),
                            type_only: s.export_kind.is_type(),
                        })
                        .collect();

                    clauses.imports.push(ImportSpan {
                        start: decl.span.start,
                        end: decl.span.end,
                        raw: slice(source, decl.span),
                        specifier: src.value.to_string(),
                        keyword: Keyword::Export,
                        names,
                        star_export: false,
                        type_only: decl.export_kind.is_type(),
                    });
                    continue;
                }

                if decl.export_kind.is_type() {
                    trace!("Skipping type-only export list in {}", path.display());
                    continue;
                }

                for s in decl.specifiers.iter().filter(|s| !s.export_kind.is_type()) {
                    clauses.exports.push(LocalExport {
                        start: s.span.start,
                        end: s.span.end,
                        exported: export_name(&s.exported),
                        local: Some(export_name(&s.local)),
                    });
                }

                if let Some(declaration) = &decl.declaration {
                    for name in declared_names(declaration) {
                        clauses.exports.push(LocalExport {
                            start: decl.span.start,
                            end: decl.span.end,
                            exported: name.clone(),
                            local: Some(name),
                        });
                    }
                }
            }
            Statement::ExportDefaultDeclaration(decl) => {
                let local = match &decl.declaration {
                    ExportDefaultDeclarationKind::TSInterfaceDeclaration(_) => continue,
                    ExportDefaultDeclarationKind::Identifier(ident) => Some(ident.name.to_string()),
                    _ => None,
                };
                clauses.exports.push(LocalExport {
                    start: decl.span.start,
                    end: decl.span.end,
                    exported: "default".to_string(),
                    local,
                });
            }
            _ => {}
        }
    }

    debug!(
        "Lexed {} from-clauses and {} local exports in {}",
        clauses.imports.len(),
        clauses.exports.len(),
        path.display()
    );
    Ok(clauses)
}

fn export_name(name: &ModuleExportName) -> String {
    match name {
        ModuleExportName::IdentifierName(ident) => ident.name.to_string(),
        ModuleExportName::IdentifierReference(ident) => ident.name.to_string(),
        ModuleExportName::StringLiteral(lit) => lit.value.to_string(),
    }
}

/// Runtime bindings introduced by an exported declaration.
fn declared_names(declaration: &Declaration) -> Vec<String> {
    match declaration {
        Declaration::VariableDeclaration(var) => var
            .declarations
            .iter()
            .filter_map(|d| match &d.id.kind {
                BindingPatternKind::BindingIdentifier(ident) => Some(ident.name.to_string()),
                // Destructured exports are not tracked
                _ => None,
            })
            .collect(),
        Declaration::FunctionDeclaration(func) => {
            func.id.iter().map(|id| id.name.to_string()).collect()
        }
        Declaration::ClassDeclaration(class) => {
            class.id.iter().map(|id| id.name.to_string()).collect()
        }
        Declaration::TSEnumDeclaration(e) if !e.declare => vec![e.id.name.to_string()],
        _ => vec![],
    }
}

fn slice(source: &str, span: Span) -> String {
    source.get(span.start as usize..span.end as usize).unwrap_or_default().to_string()
}

pub fn source_type_for(path: &Path) -> SourceType {
    let ext = path.extension().and_then(|e| e.to_str());

    SourceType::default()
        .with_jsx(matches!(ext, Some("tsx") | Some("jsx")))
        .with_typescript(matches!(ext, Some("ts") | Some("tsx") | Some("mts") | Some("cts")))
        // Everything except CommonJS is parsed with the module goal
        .with_module(!matches!(ext, Some("cjs") | Some("cts")))
}
