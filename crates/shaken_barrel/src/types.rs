use indexmap::IndexMap;
use shaken_core::{ModuleId, rebase_request};

/// Name a binding has in the module that defines it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OriginName {
    Named(String),
    Default,
    /// The module namespace object (`export * as ns`, `import * as ns`)
    Namespace,
}

impl OriginName {
    pub fn from_imported(name: &str) -> Self {
        match name {
            "*" => OriginName::Namespace,
            "default" => OriginName::Default,
            other => OriginName::Named(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            OriginName::Named(name) => name,
            OriginName::Default => "default",
            OriginName::Namespace => "*",
        }
    }
}

/// A barrel export resolved to the module that defines it.
///
/// Importing `local_name` from the barrel is equivalent to importing
/// `origin_name` from `origin`. `declared_in` and `request` record the
/// `from` clause that named the origin, so the specifier can be re-based
/// for any consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBinding {
    pub origin: ModuleId,
    pub origin_name: OriginName,
    pub local_name: String,
    pub declared_in: ModuleId,
    pub request: String,
}

impl ExportBinding {
    pub fn specifier_for(&self, consumer: &ModuleId) -> String {
        rebase_request(self.declared_in.as_path(), &self.request, consumer.as_path())
    }

    pub(crate) fn same_origin(&self, other: &ExportBinding) -> bool {
        self.origin == other.origin && self.origin_name == other.origin_name
    }
}

/// Forwarded exports of one barrel.
#[derive(Debug, Clone, Default)]
pub struct ExportTable {
    /// Processed source the table was built from
    pub source: String,
    bindings: IndexMap<String, ExportBinding>,
}

impl ExportTable {
    pub fn new(source: String) -> Self {
        Self { source, bindings: IndexMap::new() }
    }

    /// Adds a binding unless its local name is already taken.
    pub fn insert(&mut self, binding: ExportBinding) -> bool {
        if self.bindings.contains_key(&binding.local_name) {
            return false;
        }
        self.bindings.insert(binding.local_name.clone(), binding);
        true
    }

    pub fn get(&self, local_name: &str) -> Option<&ExportBinding> {
        self.bindings.get(local_name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bindings grouped by origin module, both in first-seen order.
    pub fn by_origin(&self) -> IndexMap<&ModuleId, Vec<&ExportBinding>> {
        let mut groups: IndexMap<&ModuleId, Vec<&ExportBinding>> = IndexMap::new();
        for binding in self.bindings.values() {
            groups.entry(&binding.origin).or_default().push(binding);
        }
        groups
    }
}
