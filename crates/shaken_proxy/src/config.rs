use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, trace};
use regex::Regex;
use serde::Deserialize;
use shaken_core::ProjectArgs;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    error::ProxyError,
    routes::{ProxyResolver, ProxyTarget, RouteTable},
};

#[derive(Debug, Clone, Parser)]
#[command(name = "proxy")]
#[command(about = "Rewrite imports of proxied specifiers to the modules that define each name")]
pub struct Config {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// JSON file describing the proxy routes
    #[arg(long, value_name = "FILE")]
    pub config: PathBuf,
}

/// On-disk form of a route table.
///
/// ```json
/// { "routes": [ { "pattern": "\\bbarrel1\\b",
///                 "rules": [ { "match": "foo", "id": "./utils/foo", "names": { "foo": "foo1" } } ] } ] }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProxyConfigFile {
    pub routes: Vec<RouteConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    /// Regex over module specifiers
    pub pattern: String,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    /// Regex over requested names
    #[serde(rename = "match")]
    pub match_: String,
    pub id: String,
    /// Requested name to export name in `id`
    #[serde(default)]
    pub names: HashMap<String, String>,
}

impl ProxyConfigFile {
    pub fn from_json(path: &Path, json: &str) -> Result<Self, ProxyError> {
        serde_json::from_str(json)
            .map_err(|error| ProxyError::InvalidConfig { path: path.to_path_buf(), error })
    }

    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading proxy routes from {}", path.display());
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read proxy config {}", path.display()))?;
        Ok(Self::from_json(path, &json)?)
    }

    /// Compiles every pattern of the file into a [`RouteTable`].
    pub fn compile(&self) -> Result<RouteTable, ProxyError> {
        let mut routes = Vec::with_capacity(self.routes.len());
        for route in &self.routes {
            let resolver: Arc<dyn ProxyResolver> = Arc::new(RuleResolver::compile(&route.rules)?);
            routes.push((route.pattern.clone(), resolver));
        }
        RouteTable::compile(routes)
    }
}

struct Rule {
    pattern: Regex,
    id: String,
    names: HashMap<String, String>,
}

/// Resolver of a configured route: the first rule matching the name wins.
struct RuleResolver {
    rules: Vec<Rule>,
}

impl RuleResolver {
    fn compile(rules: &[RuleConfig]) -> Result<Self, ProxyError> {
        let rules = rules
            .iter()
            .map(|rule| {
                let pattern = Regex::new(&rule.match_).map_err(|error| {
                    ProxyError::InvalidPattern { pattern: rule.match_.clone(), error }
                })?;
                Ok(Rule { pattern, id: rule.id.clone(), names: rule.names.clone() })
            })
            .collect::<Result<Vec<_>, ProxyError>>()?;
        Ok(Self { rules })
    }
}

impl ProxyResolver for RuleResolver {
    fn resolve(&self, name: &str) -> Option<ProxyTarget> {
        let rule = self.rules.iter().find(|rule| rule.pattern.is_match(name))?;
        trace!("Rule /{}/ matched '{}'", rule.pattern, name);
        Some(ProxyTarget { id: rule.id.clone(), name: rule.names.get(name).cloned() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PLAYGROUND: &str = r#"{
      "routes": [
        {
          "pattern": "\\bbarrel1\\b",
          "rules": [
            { "match": "foo", "id": "./utils/foo", "names": { "foo": "foo1" } },
            { "match": "bar|default", "id": "./utils/bar" },
            { "match": "baz", "id": "./utils/baz" }
          ]
        },
        {
          "pattern": "\\bbarrel2\\b",
          "rules": [
            { "match": "nested", "id": "./nested" },
            { "match": "alias", "id": "@" }
          ]
        }
      ]
    }"#;

    #[test]
    fn test_rules_resolve_in_order() {
        let file = ProxyConfigFile::from_json(Path::new("routes.json"), PLAYGROUND).unwrap();
        let table = file.compile().unwrap();
        assert_eq!(table.len(), 2);

        let barrel1 = table.route_for("barrel1").unwrap();
        assert_eq!(barrel1.resolve("foo"), Some(ProxyTarget::renamed("./utils/foo", "foo1")));
        assert_eq!(barrel1.resolve("foo2"), Some(ProxyTarget::new("./utils/foo")));
        assert_eq!(barrel1.resolve("default"), Some(ProxyTarget::new("./utils/bar")));
        assert_eq!(barrel1.resolve("nested"), None);

        let barrel2 = table.route_for("some/barrel2").unwrap();
        assert_eq!(barrel2.resolve("alias"), Some(ProxyTarget::new("@")));
    }

    #[test]
    fn test_invalid_rule_pattern_is_reported() {
        let json = r#"{ "routes": [ { "pattern": "x", "rules": [ { "match": "[", "id": "./x" } ] } ] }"#;
        let file = ProxyConfigFile::from_json(Path::new("routes.json"), json).unwrap();
        assert!(matches!(file.compile(), Err(ProxyError::InvalidPattern { .. })));
    }

    #[test]
    fn test_malformed_json_is_reported() {
        let err = ProxyConfigFile::from_json(Path::new("routes.json"), "{ \"routes\": 3 }").unwrap_err();
        assert!(err.to_string().contains("routes.json"));
    }

    #[test]
    fn test_load_from_disk() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("routes.json");
        fs::write(&path, PLAYGROUND).unwrap();
        assert_eq!(ProxyConfigFile::load(&path).unwrap().routes.len(), 2);
        assert!(ProxyConfigFile::load(&temp_dir.path().join("missing.json")).is_err());
    }
}
