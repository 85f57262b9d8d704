//! Registration records and the per-half registration list.

use std::rc::Rc;

use uuid::Uuid;

use crate::host::function_object::HostFunction;
use crate::wrapper::types::{AccessorHalf, PackageInfo, PerfMode, WrapperType};

/// One package's contribution to one slot. Immutable once created.
#[derive(Debug)]
pub struct Registration {
    pub id: Uuid,
    pub package: PackageInfo,
    /// Target string as given by the package, including any `#set` suffix.
    pub target: String,
    pub kind: WrapperType,
    pub priority: f64,
    /// Whether `func` receives the continuation as its first argument.
    pub chain: bool,
    pub perf_mode: PerfMode,
    pub half: AccessorHalf,
    pub func: HostFunction,
}

/// The function a package contributes and how it takes part in the chain.
#[derive(Clone, Debug)]
pub struct WrapperFn {
    pub func: HostFunction,
    pub kind: WrapperType,
    pub chain: bool,
    pub perf_mode: PerfMode,
}

impl Registration {
    pub fn new(
        package: PackageInfo,
        target: impl Into<String>,
        priority: f64,
        half: AccessorHalf,
        wrapper: WrapperFn,
    ) -> Self {
        Registration {
            id: Uuid::new_v4(),
            package,
            target: target.into(),
            kind: wrapper.kind,
            priority,
            chain: wrapper.chain,
            perf_mode: wrapper.perf_mode,
            half,
            func: wrapper.func,
        }
    }
}

/// Registrations of one half of a slot, kept in registration order.
#[derive(Default)]
pub struct RegistrationList {
    entries: Vec<Rc<Registration>>,
}

impl RegistrationList {
    pub fn new() -> Self {
        RegistrationList {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, registration: Rc<Registration>) {
        self.entries.push(registration);
    }

    pub fn remove(&mut self, id: &Uuid) -> Option<Rc<Registration>> {
        let index = self.entries.iter().position(|r| &r.id == id)?;
        Some(self.entries.remove(index))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn find_by_package(&self, package: &PackageInfo) -> Option<Rc<Registration>> {
        self.entries.iter().find(|r| &r.package == package).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<Registration>> {
        self.entries.iter()
    }

    /// The OVERRIDE that ends the chain: highest priority, earliest on ties.
    pub fn reachable_override(&self) -> Option<Rc<Registration>> {
        let mut best: Option<&Rc<Registration>> = None;
        for r in self.entries.iter().filter(|r| r.kind == WrapperType::Override) {
            match best {
                Some(b) if r.priority <= b.priority => {}
                _ => best = Some(r),
            }
        }
        best.cloned()
    }

    /// Chain order: WRAPPER, MIXED, then the reachable OVERRIDE. Higher
    /// priority first within a bucket; equal priority keeps registration order.
    pub fn ordered(&self) -> Vec<Rc<Registration>> {
        let mut ordered: Vec<Rc<Registration>> = self
            .entries
            .iter()
            .filter(|r| r.kind != WrapperType::Override)
            .cloned()
            .collect();
        // sort_by is stable
        ordered.sort_by(|a, b| {
            a.kind
                .bucket()
                .cmp(&b.kind.bucket())
                .then_with(|| b.priority.total_cmp(&a.priority))
        });
        if let Some(r) = self.reachable_override() {
            ordered.push(r);
        }
        ordered
    }

    /// The mode all registrations agree on, ignoring `Auto`; `Auto` otherwise.
    pub fn preferred_perf_mode(&self) -> PerfMode {
        let mut preferred = None;
        for r in &self.entries {
            match (r.perf_mode, preferred) {
                (PerfMode::Auto, _) => {}
                (mode, None) => preferred = Some(mode),
                (mode, Some(p)) if mode == p => {}
                _ => return PerfMode::Auto,
            }
        }
        preferred.unwrap_or(PerfMode::Auto)
    }
}
