use log::{debug, trace};
use regex::Regex;
use std::{
    fmt,
    sync::{Arc, LazyLock},
};

use crate::error::ProxyError;

/// Where a proxied name really lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTarget {
    /// Module specifier emitted in place of the proxied one
    pub id: String,
    /// Export name in `id`, when it differs from the requested name
    pub name: Option<String>,
}

impl ProxyTarget {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), name: None }
    }

    pub fn renamed(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: Some(name.into()) }
    }
}

/// Maps a requested import name to its target, or declines with `None`.
pub trait ProxyResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<ProxyTarget>;
}

impl<F> ProxyResolver for F
where
    F: Fn(&str) -> Option<ProxyTarget> + Send + Sync,
{
    fn resolve(&self, name: &str) -> Option<ProxyTarget> {
        self(name)
    }
}

/// A compiled specifier pattern and the resolver for the names it covers.
#[derive(Clone)]
pub struct Route {
    pattern: Regex,
    resolver: Arc<dyn ProxyResolver>,
}

impl Route {
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn matches(&self, specifier: &str) -> bool {
        self.pattern.is_match(specifier)
    }

    pub fn resolve(&self, name: &str) -> Option<ProxyTarget> {
        let target = self.resolver.resolve(name);
        trace!("Route /{}/ resolved '{}' to {:?}", self.pattern, name, target);
        target
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route").field("pattern", &self.pattern.as_str()).finish_non_exhaustive()
    }
}

/// Ordered routes, evaluated first match wins.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles `(pattern, resolver)` pairs, keeping their order.
    pub fn compile<I>(routes: I) -> Result<Self, ProxyError>
    where
        I: IntoIterator<Item = (String, Arc<dyn ProxyResolver>)>,
    {
        let mut table = Self::new();
        for (pattern, resolver) in routes {
            table.push(&pattern, resolver)?;
        }
        debug!("Compiled {} proxy routes", table.len());
        Ok(table)
    }

    /// Appends a route after the existing ones.
    pub fn route<R>(mut self, pattern: &str, resolver: R) -> Result<Self, ProxyError>
    where
        R: ProxyResolver + 'static,
    {
        self.push(pattern, Arc::new(resolver))?;
        Ok(self)
    }

    fn push(&mut self, pattern: &str, resolver: Arc<dyn ProxyResolver>) -> Result<(), ProxyError> {
        let compiled = Regex::new(pattern).map_err(|error| ProxyError::InvalidPattern {
            pattern: pattern.to_string(),
            error,
        })?;
        self.routes.push(Route { pattern: compiled, resolver });
        Ok(())
    }

    pub fn route_for(&self, specifier: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.matches(specifier))
    }

    /// Whether any statement of `code` may have a routed specifier.
    ///
    /// Patterns are tried on every quoted string that follows `from` or
    /// `import`, so anchored patterns see the bare specifier. A `false`
    /// here means no statement of the file can be proxied.
    pub fn matches_source(&self, code: &str) -> bool {
        if self.routes.is_empty() {
            return false;
        }
        if self.routes.iter().any(|route| route.matches(code)) {
            return true;
        }
        specifier_candidates(code).any(|specifier| {
            // Escapes change the specifier's value, let the lexer decide
            specifier.contains('\\') || self.route_for(specifier).is_some()
        })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

static SPECIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?:from|import)\s*(?:/\*(?s:.*?)\*/\s*)*\(?\s*(?:"([^"\n]*)"|'([^'\n]*)')"#)
        .unwrap_or_else(|e| unreachable!("specifier regex is valid: {e}"))
});

/// Raw text of the string literals that can be module specifiers.
fn specifier_candidates(code: &str) -> impl Iterator<Item = &str> {
    SPECIFIER
        .captures_iter(code)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str())
}
