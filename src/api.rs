//! Public facade of the engine.

use std::cell::{Cell, Ref, RefCell};
use std::rc::{Rc, Weak};

use crate::error::{Error, Result};
use crate::host::function_object::{split_next, HostFunction};
use crate::host::realm::Realm;
use crate::version;
use crate::wrapper::config::{resolve_priority, EngineConfig};
use crate::wrapper::conflicts::ConflictIgnores;
use crate::wrapper::events::{EventBus, EventListener, WrapperEvent};
use crate::wrapper::registration::{Registration, WrapperFn};
use crate::wrapper::registry::WrapperRegistry;
use crate::wrapper::resolver::{self, is_valid_identifier, split_target_and_setter, ResolvedTarget};
use crate::wrapper::slot::Wrapper;
use crate::wrapper::types::{
    AccessorHalf, IgnoreOptions, PackageInfo, PerfMode, RegisterOptions, WrapperType,
    INTERNAL_PACKAGE_ID,
};

struct EngineInner {
    realm: Rc<Realm>,
    settings: Rc<RefCell<EngineConfig>>,
    events: EventBus,
    registry: RefCell<WrapperRegistry>,
    ignores: RefCell<ConflictIgnores>,
    ready: Cell<bool>,
    /// Set once the internal package may no longer register.
    internal_locked: Cell<bool>,
}

/// Entry point for packages: register, unregister and inspect wrappers on
/// the slots of a [`Realm`].
///
/// Cloning is cheap; clones share the same engine.
#[derive(Clone)]
pub struct LibWrapper {
    inner: Rc<EngineInner>,
}

impl LibWrapper {
    pub fn new(realm: Rc<Realm>, settings: EngineConfig) -> Self {
        let settings = Rc::new(RefCell::new(settings));
        let events = EventBus::new();
        LibWrapper {
            inner: Rc::new(EngineInner {
                realm,
                registry: RefCell::new(WrapperRegistry::new(settings.clone(), events.clone())),
                settings,
                events,
                ignores: RefCell::new(ConflictIgnores::new()),
                ready: Cell::new(false),
                internal_locked: Cell::new(false),
            }),
        }
    }

    pub fn realm(&self) -> &Rc<Realm> {
        &self.inner.realm
    }

    pub fn settings(&self) -> Ref<'_, EngineConfig> {
        self.inner.settings.borrow()
    }

    pub fn add_listener(&self, listener: Rc<dyn EventListener>) {
        self.inner.events.subscribe(listener);
    }

    pub fn version(&self) -> String {
        version::version()
    }

    /// `(major, minor, patch, suffix)`
    pub fn versions(&self) -> (u32, u32, u32, u32) {
        version::versions()
    }

    /// Always false: this is the engine itself, not a stand-in shim.
    pub fn is_fallback(&self) -> bool {
        false
    }

    pub fn debug(&self) -> bool {
        self.inner.settings.borrow().debug
    }

    /// In debug mode the internal package's registrations are logged and
    /// announced like everyone else's.
    pub fn set_debug(&self, debug: bool) {
        self.inner.settings.borrow_mut().debug = debug;
    }

    fn notifies(&self, package: &PackageInfo) -> bool {
        self.debug() || !package.is_internal()
    }

    pub fn version_at_least(&self, major: u32, minor: u32, patch: u32, suffix: u32) -> bool {
        version::version_at_least(major, minor, patch, suffix)
    }

    // ====================================================================
    // Readiness
    // ====================================================================

    pub fn is_ready(&self) -> bool {
        self.inner.ready.get()
    }

    /// Start accepting registrations from packages. Also ends the window in
    /// which the internal package may register.
    pub fn mark_ready(&self) {
        self.inner.internal_locked.set(true);
        if self.inner.ready.replace(true) {
            return;
        }
        info!("libWrapper {}: Ready.", version::version());
        self.inner.events.emit(WrapperEvent::Ready {
            version: version::version(),
        });
    }

    /// Become ready the first time `target` is called.
    pub fn install_ready_hook(&self, target: &str) -> Result<()> {
        let engine: Weak<EngineInner> = Rc::downgrade(&self.inner);
        let hook = HostFunction::new("libWrapperInit", move |this, args| {
            let (next, args) = split_next(args)?;
            if let Some(inner) = engine.upgrade() {
                LibWrapper { inner }.mark_ready();
            }
            next.call(this, args)
        });
        let registered = self.register(
            INTERNAL_PACKAGE_ID,
            target,
            hook,
            WrapperType::Wrapper,
            RegisterOptions::perf_mode(PerfMode::Fast),
        );
        self.inner.internal_locked.set(true);
        registered
    }

    fn package_info(&self, package_id: &str) -> Result<PackageInfo> {
        if package_id.is_empty() {
            return Err(Error::configuration(
                package_id,
                "Parameter 'package_id' must be a non-empty string.",
            ));
        }
        if package_id == INTERNAL_PACKAGE_ID {
            if self.inner.internal_locked.get() {
                return Err(Error::configuration(
                    package_id,
                    format!("Not allowed to call libWrapper with package_id='{}'.", package_id),
                ));
            }
            return Ok(PackageInfo::internal());
        }

        let settings = self.inner.settings.borrow();
        match settings.find_package(package_id) {
            Some(info) => Ok(info.clone()),
            None if settings.packages.is_empty() => Ok(PackageInfo::module(package_id)),
            None => Err(Error::configuration(
                package_id,
                format!("Package '{}' is not a valid package.", package_id),
            )),
        }
    }

    // ====================================================================
    // Registration
    // ====================================================================

    /// Register `func` on `target` for package `package_id`.
    ///
    /// A forwarding function (`options.chain`, the default for everything
    /// but OVERRIDE) receives the next function in the chain as its first
    /// argument.
    pub fn register(
        &self,
        package_id: &str,
        target: &str,
        func: HostFunction,
        kind: WrapperType,
        options: RegisterOptions,
    ) -> Result<()> {
        let package = self.package_info(package_id)?;

        if !package.is_internal() && !self.is_ready() {
            return Err(Error::configuration(
                package_id,
                "Not allowed to register wrappers before the engine is ready.",
            ));
        }
        if target.is_empty() {
            return Err(Error::configuration(
                package_id,
                "Parameter 'target' must be a non-empty string.",
            ));
        }
        let chain = options.chain.unwrap_or(kind != WrapperType::Override);
        if kind == WrapperType::Wrapper && !chain {
            return Err(Error::configuration(
                package_id,
                "WRAPPER registrations must receive the next function in the chain.",
            ));
        }
        let contribution = WrapperFn {
            func,
            kind,
            chain,
            perf_mode: options.perf_mode.unwrap_or_default(),
        };

        let resolved = resolver::resolve(&self.inner.realm, target, package_id)?;
        let (wrapper, created) = self
            .inner
            .registry
            .borrow_mut()
            .find_or_create(&resolved, package_id)?;

        let result = self.add_registration(&wrapper, &resolved, &package, target, contribution);
        if result.is_err() && created {
            self.inner.registry.borrow_mut().remove_if_possible(&wrapper);
        }
        result
    }

    fn add_registration(
        &self,
        wrapper: &Rc<Wrapper>,
        resolved: &ResolvedTarget,
        package: &PackageInfo,
        target: &str,
        contribution: WrapperFn,
    ) -> Result<()> {
        if resolved.is_setter && !wrapper.is_property() {
            return Err(Wrapper::not_a_property(resolved, &package.id));
        }
        let half = if resolved.is_setter {
            AccessorHalf::Set
        } else if wrapper.is_property() {
            AccessorHalf::Get
        } else {
            AccessorHalf::Value
        };
        let priority = resolve_priority(&*self.inner.settings.borrow(), package);

        let kind = contribution.kind;
        let registration = Rc::new(Registration::new(package.clone(), target, priority, half, contribution));
        let lost = wrapper.add(registration)?;

        if let Some(lost) = lost {
            warn!(
                "libWrapper: {} has higher priority, and is replacing the 'OVERRIDE' registered by {} for '{}'.",
                lost.replacement.log_string(),
                lost.existing.log_string(),
                wrapper.name()
            );
            self.inner.events.emit(WrapperEvent::OverrideLost {
                existing: lost.existing,
                replacement: lost.replacement,
                wrapper: wrapper.name(),
                target: target.to_string(),
            });
        }

        if self.notifies(package) {
            info!(
                "libWrapper: Registered a wrapper for '{}' by {} with type {}.",
                target,
                package.log_string(),
                kind
            );
            self.inner.events.emit(WrapperEvent::Registered {
                package: package.id.clone(),
                target: target.to_string(),
                kind,
            });
        }
        Ok(())
    }

    /// Remove the registration of `package_id` on `target`. With `fail`, a
    /// missing registration is an error.
    pub fn unregister(&self, package_id: &str, target: &str, fail: bool) -> Result<()> {
        let package = self.package_info(package_id)?;
        let (_, is_setter) = split_target_and_setter(target);

        let wrapper = self.inner.registry.borrow().find(target);
        let found = wrapper.and_then(|w| {
            w.find_registration(&package, is_setter)
                .map(|registration| (w, registration))
        });
        let (wrapper, registration) = match found {
            Some(found) => found,
            None if fail => {
                return Err(Error::configuration(
                    package_id,
                    format!(
                        "Cannot unregister '{}' by {} as no such wrapper has been registered.",
                        target,
                        package.log_string()
                    ),
                ))
            }
            None => return Ok(()),
        };

        wrapper.remove(&registration);
        self.inner.registry.borrow_mut().remove_if_possible(&wrapper);

        if self.notifies(&package) {
            info!(
                "libWrapper: Unregistered the wrapper for '{}' by {}.",
                target,
                package.log_string()
            );
            self.inner.events.emit(WrapperEvent::Unregistered {
                package: package.id.clone(),
                target: target.to_string(),
            });
        }
        Ok(())
    }

    /// Remove every registration of `package_id`, both halves of properties.
    pub fn unregister_all(&self, package_id: &str) -> Result<()> {
        let package = self.package_info(package_id)?;

        let wrappers = self.inner.registry.borrow().wrappers();
        for wrapper in wrappers {
            let name = wrapper.name();
            self.unregister(package_id, &name, false)?;
            if wrapper.is_property() {
                self.unregister(package_id, &format!("{}{}", name, resolver::SETTER_SUFFIX), false)?;
            }
        }

        if self.notifies(&package) {
            info!(
                "libWrapper: Unregistered all wrapper functions by {}.",
                package.log_string()
            );
            self.inner.events.emit(WrapperEvent::UnregisteredAll {
                package: package.id.clone(),
            });
        }
        Ok(())
    }

    /// Record that conflicts between `package_id` and any of `ignore_ids`
    /// on any of `targets` should not be reported.
    pub fn ignore_conflicts(
        &self,
        package_id: &str,
        ignore_ids: &[&str],
        targets: &[&str],
        options: IgnoreOptions,
    ) -> Result<()> {
        let package = self.package_info(package_id)?;

        if !self.is_ready() {
            return Err(Error::configuration(
                package_id,
                "Not allowed to ignore conflicts before the engine is ready.",
            ));
        }
        if !targets.iter().all(|t| is_valid_identifier(t, true)) {
            return Err(Error::configuration(
                package_id,
                "Parameter 'targets' must only contain valid targets.",
            ));
        }

        let ignored: Vec<String> = {
            let settings = self.inner.settings.borrow();
            ignore_ids
                .iter()
                .filter(|id| !id.is_empty() && settings.package_exists(id))
                .map(|id| id.to_string())
                .collect()
        };
        if ignored.is_empty() {
            debug!(
                "libWrapper: Ignoring 'ignore_conflicts' call for {} since none of the package IDs provided exist.",
                package.log_string()
            );
            return Ok(());
        }

        debug!(
            "libWrapper: Ignoring conflicts involving {} and [{}] for targets [{}].",
            package.log_string(),
            ignored.join(", "),
            targets.join(", ")
        );
        self.inner.ignores.borrow_mut().register(
            package,
            ignored,
            targets.iter().map(|t| t.to_string()).collect(),
            options.ignore_errors,
        );
        Ok(())
    }

    pub fn ignores(&self) -> Ref<'_, ConflictIgnores> {
        self.inner.ignores.borrow()
    }

    pub fn clear_ignores(&self) {
        self.inner.ignores.borrow_mut().clear();
    }

    // ====================================================================
    // Maintenance
    // ====================================================================

    /// Drop every registration on `target`.
    pub fn clear(&self, target: &str) {
        self.inner.registry.borrow_mut().clear(target);
    }

    /// Drop every wrapper and restore every intercepted slot.
    pub fn unwrap_all(&self) {
        self.inner.registry.borrow_mut().unwrap_all();
    }

    pub fn wrapper(&self, target: &str) -> Option<Rc<Wrapper>> {
        self.inner.registry.borrow().find(target)
    }

    pub fn wrapper_names(&self) -> Vec<String> {
        self.inner.registry.borrow().names()
    }

    /// Priority for future registrations of the package with settings key `key`.
    pub fn set_priority(&self, key: &str, priority: f64) {
        self.inner
            .settings
            .borrow_mut()
            .priorities
            .insert(key.to_string(), priority);
    }
}
