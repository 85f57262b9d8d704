//! Core value types shared by the wrapper engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Package id reserved for the engine's own registrations.
pub const INTERNAL_PACKAGE_ID: &str = "lib-wrapper";

/// How a registration participates in its chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WrapperType {
    /// Always forwards to the next function. Runs first.
    Wrapper,
    /// May or may not forward.
    Mixed,
    /// Never forwards. Only one is reachable per chain, and it runs last.
    Override,
}

impl WrapperType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WrapperType::Wrapper => "WRAPPER",
            WrapperType::Mixed => "MIXED",
            WrapperType::Override => "OVERRIDE",
        }
    }

    /// Position of the type's bucket in a compiled chain.
    pub fn bucket(&self) -> u8 {
        match self {
            WrapperType::Wrapper => 0,
            WrapperType::Mixed => 1,
            WrapperType::Override => 2,
        }
    }
}

impl Default for WrapperType {
    fn default() -> Self {
        WrapperType::Mixed
    }
}

impl fmt::Display for WrapperType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WrapperType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "WRAPPER" => Ok(WrapperType::Wrapper),
            "MIXED" => Ok(WrapperType::Mixed),
            "OVERRIDE" => Ok(WrapperType::Override),
            _ => Err(Error::configuration(
                "",
                format!(
                    "Parameter 'type' must be one of [WRAPPER, MIXED, OVERRIDE], got '{}'.",
                    s
                ),
            )),
        }
    }
}

/// Preferred performance mode of a registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PerfMode {
    /// Call-time conflict detection enabled.
    Normal,
    /// Call-time conflict detection disabled.
    Fast,
    /// Let the `high_performance` setting decide.
    Auto,
}

impl PerfMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PerfMode::Normal => "NORMAL",
            PerfMode::Fast => "FAST",
            PerfMode::Auto => "AUTO",
        }
    }

    /// Collapse `Auto` according to the high-performance setting.
    pub fn resolve(self, high_performance: bool) -> PerfMode {
        match self {
            PerfMode::Auto if high_performance => PerfMode::Fast,
            PerfMode::Auto => PerfMode::Normal,
            other => other,
        }
    }
}

impl Default for PerfMode {
    fn default() -> Self {
        PerfMode::Auto
    }
}

impl fmt::Display for PerfMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PerfMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NORMAL" => Ok(PerfMode::Normal),
            "FAST" => Ok(PerfMode::Fast),
            "AUTO" => Ok(PerfMode::Auto),
            _ => Err(Error::configuration(
                "",
                format!(
                    "Parameter 'perf_mode' must be one of [NORMAL, FAST, AUTO], got '{}'.",
                    s
                ),
            )),
        }
    }
}

/// Which half of a slot a registration applies to.
///
/// `Value` (method slots) and `Get` (property getters) share a list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessorHalf {
    Value,
    Get,
    Set,
}

impl AccessorHalf {
    pub fn is_setter(&self) -> bool {
        matches!(self, AccessorHalf::Set)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    Module,
    System,
    World,
    Internal,
}

impl PackageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageKind::Module => "module",
            PackageKind::System => "system",
            PackageKind::World => "world",
            PackageKind::Internal => "internal",
        }
    }
}

impl Default for PackageKind {
    fn default() -> Self {
        PackageKind::Module
    }
}

/// Identity of a package that registers wrappers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PackageInfo {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub kind: PackageKind,
}

impl PackageInfo {
    pub fn new(id: impl Into<String>, title: impl Into<String>, kind: PackageKind) -> Self {
        PackageInfo {
            id: id.into(),
            title: title.into(),
            kind,
        }
    }

    /// A module package titled by its id.
    pub fn module(id: &str) -> Self {
        PackageInfo::new(id, id, PackageKind::Module)
    }

    pub fn internal() -> Self {
        PackageInfo::new(INTERNAL_PACKAGE_ID, "libWrapper", PackageKind::Internal)
    }

    pub fn is_internal(&self) -> bool {
        self.id == INTERNAL_PACKAGE_ID
    }

    /// Lookup key for per-package settings, e.g. `module:my-module`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.kind.as_str(), self.id)
    }

    pub fn log_string(&self) -> String {
        if self.title.is_empty() || self.title == self.id {
            format!("{} '{}'", self.kind.as_str(), self.id)
        } else {
            format!("{} '{}' ({})", self.kind.as_str(), self.title, self.id)
        }
    }
}

impl PartialEq for PackageInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PackageInfo {}

/// Optional arguments of `register`.
#[derive(Clone, Copy, Debug, Default)]
pub struct RegisterOptions {
    /// Whether the function receives the continuation as first argument.
    /// Defaults to true for everything except OVERRIDE.
    pub chain: Option<bool>,
    pub perf_mode: Option<PerfMode>,
}

impl RegisterOptions {
    pub fn chain(chain: bool) -> Self {
        RegisterOptions {
            chain: Some(chain),
            perf_mode: None,
        }
    }

    pub fn perf_mode(perf_mode: PerfMode) -> Self {
        RegisterOptions {
            chain: None,
            perf_mode: Some(perf_mode),
        }
    }
}

/// Optional arguments of `ignore_conflicts`.
#[derive(Clone, Copy, Debug, Default)]
pub struct IgnoreOptions {
    /// Also ignore confirmed conflicts, not only potential ones.
    pub ignore_errors: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapper_type_parse_is_case_insensitive() {
        assert_eq!("wrapper".parse::<WrapperType>().unwrap(), WrapperType::Wrapper);
        assert_eq!("Mixed".parse::<WrapperType>().unwrap(), WrapperType::Mixed);
        assert_eq!("OVERRIDE".parse::<WrapperType>().unwrap(), WrapperType::Override);
        assert!(matches!(
            "REPLACE".parse::<WrapperType>(),
            Err(Error::Configuration { .. })
        ));
    }

    #[test]
    fn test_perf_mode_resolve() {
        assert_eq!(PerfMode::Auto.resolve(true), PerfMode::Fast);
        assert_eq!(PerfMode::Auto.resolve(false), PerfMode::Normal);
        assert_eq!(PerfMode::Normal.resolve(true), PerfMode::Normal);
        assert!("slow".parse::<PerfMode>().is_err());
    }

    #[test]
    fn test_package_key_and_equality() {
        let a = PackageInfo::new("foo", "Foo", PackageKind::System);
        let b = PackageInfo::module("foo");
        assert_eq!(a.key(), "system:foo");
        assert_eq!(b.key(), "module:foo");
        assert_eq!(a, b);
        assert!(PackageInfo::internal().is_internal());
    }
}
