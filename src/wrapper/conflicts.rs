//! Registration-time conflict checks and conflict-ignore rules.

use crate::error::{Error, Result};
use crate::wrapper::registration::RegistrationList;
use crate::wrapper::resolver::split_target_and_setter;
use crate::wrapper::types::PackageInfo;

/// A reachable OVERRIDE about to be replaced by a higher priority one.
#[derive(Clone, Debug, PartialEq)]
pub struct OverrideLost {
    pub existing: PackageInfo,
    pub replacement: PackageInfo,
}

pub struct ConflictDetector;

impl ConflictDetector {
    /// At most one registration per package and half.
    pub fn check_duplicate(
        list: &RegistrationList,
        package: &PackageInfo,
        target: &str,
    ) -> Result<()> {
        if list.find_by_package(package).is_some() {
            return Err(Error::configuration(
                package.id.as_str(),
                format!(
                    "A wrapper for '{}' has already been registered by {}.",
                    target,
                    package.log_string()
                ),
            ));
        }
        Ok(())
    }

    /// A new OVERRIDE must strictly outrank the reachable one.
    pub fn check_override(
        list: &RegistrationList,
        package: &PackageInfo,
        priority: f64,
        wrapper: &str,
        target: &str,
    ) -> Result<Option<OverrideLost>> {
        match list.reachable_override() {
            None => Ok(None),
            Some(existing) if priority <= existing.priority => Err(Error::AlreadyOverridden {
                package: package.id.clone(),
                existing: existing.package.id.clone(),
                wrapper: wrapper.to_string(),
                target: target.to_string(),
            }),
            Some(existing) => Ok(Some(OverrideLost {
                existing: existing.package.clone(),
                replacement: package.clone(),
            })),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct IgnoreRule {
    pub owner: PackageInfo,
    pub ignored: Vec<String>,
    pub targets: Vec<String>,
    pub ignore_errors: bool,
}

impl IgnoreRule {
    fn matches(&self, a: &PackageInfo, b: &PackageInfo, target: &str, is_error: bool) -> bool {
        if is_error && !self.ignore_errors {
            return false;
        }
        let other = if &self.owner == a {
            b
        } else if &self.owner == b {
            a
        } else {
            return false;
        };
        if !self.ignored.iter().any(|id| id == &other.id) {
            return false;
        }
        let (path, _) = split_target_and_setter(target);
        self.targets.iter().any(|t| t == target || t == path)
    }
}

/// Suppression rules consumed by conflict reporting.
#[derive(Default)]
pub struct ConflictIgnores {
    rules: Vec<IgnoreRule>,
}

impl ConflictIgnores {
    pub fn new() -> Self {
        ConflictIgnores { rules: Vec::new() }
    }

    pub fn register(
        &mut self,
        owner: PackageInfo,
        ignored: Vec<String>,
        targets: Vec<String>,
        ignore_errors: bool,
    ) {
        self.rules.push(IgnoreRule {
            owner,
            ignored,
            targets,
            ignore_errors,
        });
    }

    /// Whether a conflict between `a` and `b` on `target` is suppressed.
    pub fn is_ignored(
        &self,
        a: &PackageInfo,
        b: &PackageInfo,
        target: &str,
        is_error: bool,
    ) -> bool {
        self.rules
            .iter()
            .any(|r| r.matches(a, b, target, is_error))
    }

    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    pub fn clear(&mut self) {
        self.rules.clear();
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
