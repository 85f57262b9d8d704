//! Engine settings file parsing.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::wrapper::types::PackageInfo;

/// Complete engine configuration.
///
/// Expected format:
/// ```toml
/// high_performance = false
/// debug = false
/// properties_configurable = true
///
/// [priorities]
/// "module:my-module" = 10
///
/// [[packages]]
/// id = "my-module"
/// title = "My Module"
/// kind = "module"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Resolve `AUTO` chains to `FAST`, skipping call-time conflict detection.
    pub high_performance: bool,
    /// Also log and announce the internal package's registrations.
    pub debug: bool,
    /// Whether installed slots stay configurable. When false, an emptied
    /// wrapper is kept as a pass-through instead of being torn down.
    pub properties_configurable: bool,
    /// Priorities keyed by `PackageInfo::key()`.
    pub priorities: HashMap<String, f64>,
    /// Known packages. When empty, any package id is accepted.
    pub packages: Vec<PackageInfo>,
}

impl EngineConfig {
    pub fn new() -> Self {
        EngineConfig {
            high_performance: false,
            debug: false,
            properties_configurable: true,
            priorities: HashMap::new(),
            packages: Vec::new(),
        }
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Settings(format!("failed to read '{}': {}", path.display(), e))
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Settings(e.to_string()))
    }

    pub fn find_package(&self, id: &str) -> Option<&PackageInfo> {
        self.packages.iter().find(|p| p.id == id)
    }

    /// Whether `id` names a usable package.
    pub fn package_exists(&self, id: &str) -> bool {
        self.packages.is_empty() || self.find_package(id).is_some()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Source of per-package priorities.
pub trait PriorityLookup {
    fn priority_for(&self, package: &PackageInfo) -> Option<f64>;
}

impl PriorityLookup for EngineConfig {
    fn priority_for(&self, package: &PackageInfo) -> Option<f64> {
        self.priorities.get(&package.key()).copied()
    }
}

/// Default priority of a new registration.
pub fn resolve_priority(lookup: &dyn PriorityLookup, package: &PackageInfo) -> f64 {
    if package.is_internal() {
        return f64::MAX;
    }
    lookup.priority_for(package).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wrapper::types::PackageKind;

    #[test]
    fn test_parse_empty_config() {
        let config = EngineConfig::parse("").unwrap();
        assert!(!config.high_performance);
        assert!(!config.debug);
        assert!(config.properties_configurable);
        assert!(config.priorities.is_empty());
        assert!(config.packages.is_empty());
        assert!(config.package_exists("anything"));
    }

    #[test]
    fn test_parse_full_config() {
        let config = EngineConfig::parse(
            r#"
            high_performance = true
            debug = true
            properties_configurable = false

            [priorities]
            "module:foo" = 10
            "system:bar" = -2.5

            [[packages]]
            id = "foo"
            title = "Foo"

            [[packages]]
            id = "bar"
            kind = "system"
            "#,
        )
        .unwrap();
        assert!(config.high_performance);
        assert!(config.debug);
        assert!(!config.properties_configurable);
        assert_eq!(config.packages.len(), 2);
        assert_eq!(config.find_package("bar").unwrap().kind, PackageKind::System);
        assert!(!config.package_exists("baz"));

        let foo = config.find_package("foo").unwrap().clone();
        let bar = config.find_package("bar").unwrap().clone();
        assert_eq!(resolve_priority(&config, &foo), 10.0);
        assert_eq!(resolve_priority(&config, &bar), -2.5);
        assert_eq!(resolve_priority(&config, &PackageInfo::module("baz")), 0.0);
        assert_eq!(resolve_priority(&config, &PackageInfo::internal()), f64::MAX);
    }

    #[test]
    fn test_parse_invalid_config() {
        assert!(matches!(
            EngineConfig::parse("high_performance = \"yes\""),
            Err(Error::Settings(_))
        ));
        assert!(matches!(
            EngineConfig::load(Path::new("/nonexistent/libwrapper.toml")),
            Err(Error::Settings(_))
        ));
    }
}
