//! Rendering of the import/export statements the rewriters splice in.

use crate::types::Keyword;

/// Renders one binding of a braced clause: `name` or `name as alias`.
///
/// Names that are not identifiers (`export { "a-b" }`) are emitted as
/// string literals.
pub fn render_binding(name: &str, alias: &str, type_only: bool) -> String {
    let prefix = if type_only { "type " } else { "" };
    let (name, alias) = (module_export_name(name), module_export_name(alias));
    if name == alias { format!("{prefix}{name}") } else { format!("{prefix}{name} as {alias}") }
}

fn module_export_name(name: &str) -> String {
    if is_identifier_name(name) {
        return name.to_string();
    }
    serde_json::to_string(name).unwrap_or_else(|_| format!("\"{}\"", name))
}

fn is_identifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// `import { a, b2 as b } from "./x";`
///
/// Duplicate renderings are dropped, keeping the first occurrence.
pub fn render_statement(keyword: Keyword, bindings: &[String], specifier: &str) -> String {
    let mut unique: Vec<&str> = Vec::with_capacity(bindings.len());
    for binding in bindings {
        if !unique.contains(&binding.as_str()) {
            unique.push(binding);
        }
    }
    format!("{} {{ {} }} from \"{}\";", keyword.as_str(), unique.join(", "), specifier)
}

/// `import * as ns from "./x";`
pub fn render_namespace(keyword: Keyword, alias: &str, specifier: &str) -> String {
    format!("{} * as {} from \"{}\";", keyword.as_str(), module_export_name(alias), specifier)
}
