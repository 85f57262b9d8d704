//! Interception state of one host slot.
//!
//! Installing a wrapper replaces the slot on its owner with an accessor.
//! For a method slot the getter hands out a *handler* bound to the wrapper,
//! and the setter stores whatever is assigned as the new original, so code
//! that reassigns the slot directly ends up underneath the chain instead of
//! replacing it. The original lives under a hidden symbol key shared by every
//! wrapper of the same name; instance assignments land under the same key on
//! the instance.
//!
//! A property slot (an accessor to begin with) gets independent get and set
//! chains whose terminals are the original accessor functions.

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::error::{Error, Result};
use crate::host::function_object::HostFunction;
use crate::host::object::{find_property, get, HostObject, HostObjectType};
use crate::host::object_property::{PropertyDescriptor, PropertyKey};
use crate::host::symbol::SymbolData;
use crate::host::value::HostValue;
use crate::wrapper::chain::{ChainBuilder, ChainCall, CompiledChain};
use crate::wrapper::config::EngineConfig;
use crate::wrapper::conflicts::{ConflictDetector, OverrideLost};
use crate::wrapper::events::{EventBus, WrapperEvent};
use crate::wrapper::registration::{Registration, RegistrationList};
use crate::wrapper::resolver::ResolvedTarget;
use crate::wrapper::types::{PackageInfo, PerfMode, WrapperType};

/// Marks accessor functions installed by a wrapper.
struct WrapperTag(Weak<Wrapper>);

struct ActiveFrame {
    receiver: HostValue,
    /// The terminal while it runs.
    terminal: Option<HostValue>,
}

pub struct Wrapper {
    names: RefCell<Vec<String>>,
    owner: Weak<RefCell<HostObject>>,
    slot: String,
    original_key: PropertyKey,
    is_property: bool,
    /// The owner's own descriptor before installation.
    original: Option<PropertyDescriptor>,
    getters: RefCell<RegistrationList>,
    setters: RefCell<RegistrationList>,
    get_chain: RefCell<Rc<CompiledChain>>,
    set_chain: RefCell<Rc<CompiledChain>>,
    frames: RefCell<Vec<ActiveFrame>>,
    instances: RefCell<Vec<Weak<RefCell<HostObject>>>>,
    settings: Rc<RefCell<EngineConfig>>,
    events: EventBus,
}

impl Wrapper {
    /// Intercept the slot `target` designates and install the accessor.
    pub fn create(
        target: &ResolvedTarget,
        package: &str,
        settings: Rc<RefCell<EngineConfig>>,
        events: EventBus,
    ) -> Result<Rc<Wrapper>> {
        let key = PropertyKey::from(target.name.as_str());
        let own = target.object.borrow().get_own_property(&key).cloned();

        let (is_property, enumerable) = match &own {
            Some(d) if !d.is_configurable() => {
                return Err(Error::configuration(
                    package,
                    format!("Cannot wrap '{}' since it is not configurable.", target.path),
                ))
            }
            Some(d) => (Self::slot_kind(d, &target.path, package)?, d.is_enumerable()),
            None => {
                let prototype = target.object.borrow().get_prototype_of();
                match prototype.and_then(|p| find_property(&p, &key)) {
                    Some((_, d)) => (Self::slot_kind(&d, &target.path, package)?, d.is_enumerable()),
                    None => {
                        return Err(Error::configuration(
                            package,
                            format!("Could not find target '{}'.", target.path),
                        ))
                    }
                }
            }
        };

        if target.is_setter && !is_property {
            return Err(Self::not_a_property(target, package));
        }

        let high_performance = settings.borrow().high_performance;
        let empty = || RefCell::new(Rc::new(ChainBuilder::build(&RegistrationList::new(), high_performance)));
        let wrapper = Rc::new(Wrapper {
            names: RefCell::new(vec![target.path.clone()]),
            owner: Rc::downgrade(&target.object),
            slot: target.name.clone(),
            original_key: PropertyKey::Sym(SymbolData::wrapped_original(&target.name)),
            is_property,
            original: own,
            getters: RefCell::new(RegistrationList::new()),
            setters: RefCell::new(RegistrationList::new()),
            get_chain: empty(),
            set_chain: empty(),
            frames: RefCell::new(Vec::new()),
            instances: RefCell::new(Vec::new()),
            settings,
            events,
        });
        wrapper.install(enumerable, package)?;
        Ok(wrapper)
    }

    pub(crate) fn not_a_property(target: &ResolvedTarget, package: &str) -> Error {
        Error::configuration(
            package,
            format!(
                "Cannot register a wrapper for '{}#set' because '{}' is not a property, and therefore has no setter.",
                target.path, target.path
            ),
        )
    }

    /// Whether a slot with this descriptor is a property (accessor) slot.
    fn slot_kind(descriptor: &PropertyDescriptor, path: &str, package: &str) -> Result<bool> {
        if let Some(wrapper) = Wrapper::from_descriptor(descriptor) {
            return Ok(wrapper.is_property);
        }
        match descriptor {
            PropertyDescriptor::Accessor { .. } => Ok(true),
            PropertyDescriptor::Data {
                value: HostValue::Function(_),
                ..
            } => Ok(false),
            PropertyDescriptor::Data { .. } => Err(Error::configuration(
                package,
                format!("'{}' is neither a function nor a property.", path),
            )),
        }
    }

    fn install(self: &Rc<Self>, enumerable: bool, package: &str) -> Result<()> {
        let owner = self.owner()?;
        if let Some(PropertyDescriptor::Data { value, .. }) = &self.original {
            let stored = owner.borrow_mut().define_own_property(
                self.original_key.clone(),
                PropertyDescriptor::new_hidden(value.clone()),
            );
            if !stored {
                return Err(Error::configuration(
                    package,
                    format!(
                        "Cannot wrap '{}' since its owner does not accept new properties.",
                        self.name()
                    ),
                ));
            }
        }

        let tag: Rc<dyn Any> = Rc::new(WrapperTag(Rc::downgrade(self)));
        let getter = {
            let wrapper = self.clone();
            HostFunction::new(format!("get {}", self.slot), move |this, _| {
                wrapper.on_get(this)
            })
            .with_tag(tag.clone())
        };
        let setter = {
            let wrapper = self.clone();
            HostFunction::new(format!("set {}", self.slot), move |this, args| {
                let value = args.into_iter().next().unwrap_or(HostValue::Undefined);
                wrapper.on_set(this, value)
            })
            .with_tag(tag)
        };

        let descriptor = PropertyDescriptor::Accessor {
            get: Some(getter),
            set: Some(setter),
            enumerable,
            configurable: self.settings.borrow().properties_configurable,
        };
        let installed = owner
            .borrow_mut()
            .define_own_property(self.slot_key(), descriptor);
        if !installed {
            owner.borrow_mut().delete(&self.original_key);
            return Err(Error::configuration(
                package,
                format!("Could not install a wrapper for '{}'.", self.name()),
            ));
        }
        Ok(())
    }

    /// The wrapper that installed `descriptor`, if any.
    pub fn from_descriptor(descriptor: &PropertyDescriptor) -> Option<Rc<Wrapper>> {
        let tag = descriptor.getter()?.tag()?;
        (**tag).downcast_ref::<WrapperTag>()?.0.upgrade()
    }

    /// Display name: the first path the slot was reached through.
    pub fn name(&self) -> String {
        self.names.borrow().first().cloned().unwrap_or_default()
    }

    pub fn names(&self) -> Vec<String> {
        self.names.borrow().clone()
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.names.borrow().iter().any(|n| n == name)
    }

    pub fn add_name(&self, name: &str) {
        if !self.has_name(name) {
            self.names.borrow_mut().push(name.to_string());
        }
    }

    pub fn is_property(&self) -> bool {
        self.is_property
    }

    pub fn is_empty(&self) -> bool {
        self.getters.borrow().is_empty() && self.setters.borrow().is_empty()
    }

    fn slot_key(&self) -> PropertyKey {
        PropertyKey::from(self.slot.as_str())
    }

    fn owner(&self) -> Result<HostObjectType> {
        self.owner.upgrade().ok_or_else(|| {
            let message = format!("the object owning '{}' no longer exists", self.name());
            error!("libWrapper: internal error: {}", message);
            Error::Internal(message)
        })
    }

    fn list(&self, setter: bool) -> &RefCell<RegistrationList> {
        if setter {
            &self.setters
        } else {
            &self.getters
        }
    }

    fn chain(&self, setter: bool) -> &RefCell<Rc<CompiledChain>> {
        if setter {
            &self.set_chain
        } else {
            &self.get_chain
        }
    }

    // ====================================================================
    // Registrations
    // ====================================================================

    /// Append a registration after the duplicate and OVERRIDE checks.
    pub fn add(&self, registration: Rc<Registration>) -> Result<Option<OverrideLost>> {
        let setter = registration.half.is_setter();
        let lost = {
            let list = self.list(setter).borrow();
            ConflictDetector::check_duplicate(&list, &registration.package, &registration.target)?;
            if registration.kind == WrapperType::Override {
                ConflictDetector::check_override(
                    &list,
                    &registration.package,
                    registration.priority,
                    &self.name(),
                    &registration.target,
                )?
            } else {
                None
            }
        };
        self.list(setter).borrow_mut().push(registration);
        self.recompile(setter);
        Ok(lost)
    }

    /// Detach a registration. Returns false if it was not attached.
    pub fn remove(&self, registration: &Registration) -> bool {
        let setter = registration.half.is_setter();
        let removed = self.list(setter).borrow_mut().remove(&registration.id);
        if removed.is_some() {
            self.recompile(setter);
        }
        removed.is_some()
    }

    pub fn clear(&self) {
        self.getters.borrow_mut().clear();
        self.setters.borrow_mut().clear();
        self.recompile(false);
        self.recompile(true);
    }

    pub fn find_registration(&self, package: &PackageInfo, setter: bool) -> Option<Rc<Registration>> {
        self.list(setter).borrow().find_by_package(package)
    }

    /// Registrations in registration order.
    pub fn registrations(&self, setter: bool) -> Vec<Rc<Registration>> {
        self.list(setter).borrow().iter().cloned().collect()
    }

    /// Registrations in the order the compiled chain calls them.
    pub fn chain_order(&self, setter: bool) -> Vec<Rc<Registration>> {
        self.chain(setter).borrow().entries().to_vec()
    }

    pub fn perf_mode(&self, setter: bool) -> PerfMode {
        self.chain(setter).borrow().mode()
    }

    fn recompile(&self, setter: bool) {
        let high_performance = self.settings.borrow().high_performance;
        let compiled = {
            let list = self.list(setter).borrow();
            Rc::new(ChainBuilder::build(&list, high_performance))
        };
        *self.chain(setter).borrow_mut() = compiled;
    }

    pub(crate) fn auto_remove(&self, registration: &Registration) {
        if !self.remove(registration) {
            return;
        }
        info!(
            "libWrapper: {} registered a WRAPPER for '{}' that did not call the next function in the chain. It has been removed.",
            registration.package.log_string(),
            registration.target
        );
        self.events.emit(WrapperEvent::AutoRemoved {
            package: registration.package.clone(),
            wrapper: self.name(),
            target: registration.target.clone(),
        });
    }

    pub(crate) fn report_conflicts(&self, registration: &Registration, skipped: &[PackageInfo]) {
        for other in skipped {
            debug!(
                "libWrapper: potential conflict between {} and {} for '{}'.",
                registration.package.log_string(),
                other.log_string(),
                registration.target
            );
            self.events.emit(WrapperEvent::ConflictDetected {
                package: registration.package.clone(),
                other: other.clone(),
                wrapper: self.name(),
                target: registration.target.clone(),
                is_error: false,
            });
        }
    }

    // ====================================================================
    // Invocation
    // ====================================================================

    /// Run the method chain (or the getter chain of a property).
    pub fn call(self: &Rc<Self>, receiver: &HostValue, args: Vec<HostValue>) -> Result<HostValue> {
        self.run_chain(false, receiver.clone(), args)
    }

    /// Run the setter chain of a property.
    pub fn call_setter(self: &Rc<Self>, receiver: &HostValue, value: HostValue) -> Result<HostValue> {
        if !self.is_property {
            return Err(Error::Type(format!("'{}' is not a property", self.name())));
        }
        self.run_chain(true, receiver.clone(), vec![value])
    }

    fn on_get(self: &Rc<Self>, this: &HostValue) -> Result<HostValue> {
        if self.is_property {
            self.run_chain(false, this.clone(), Vec::new())
        } else {
            self.make_handler(this).map(HostValue::Function)
        }
    }

    fn on_set(self: &Rc<Self>, this: &HostValue, value: HostValue) -> Result<HostValue> {
        if self.is_property {
            self.run_chain(true, this.clone(), vec![value])?;
        } else {
            self.assign_original(this, value)?;
        }
        Ok(HostValue::Undefined)
    }

    fn run_chain(self: &Rc<Self>, setter: bool, receiver: HostValue, args: Vec<HostValue>) -> Result<HostValue> {
        let head = self.chain(setter).borrow().head();
        let frame = {
            let mut frames = self.frames.borrow_mut();
            frames.push(ActiveFrame {
                receiver: receiver.clone(),
                terminal: None,
            });
            frames.len() - 1
        };
        let call = ChainCall {
            wrapper: self.clone(),
            setter,
            receiver,
            frame,
        };
        let result = head(&call, args);
        self.frames.borrow_mut().truncate(frame);
        result
    }

    pub(crate) fn call_terminal(&self, call: &ChainCall, args: Vec<HostValue>) -> Result<HostValue> {
        if self.is_property {
            return if call.setter {
                let value = args.into_iter().next().unwrap_or(HostValue::Undefined);
                self.set_original(&call.receiver, value)
            } else {
                self.get_original(&call.receiver)
            };
        }

        let terminal = self.terminal_for(&call.receiver)?;
        self.mark_terminal(call.frame, Some(terminal.clone()));
        let result = terminal.call(&call.receiver, args);
        self.mark_terminal(call.frame, None);
        result
    }

    fn mark_terminal(&self, frame: usize, terminal: Option<HostValue>) {
        if let Some(f) = self.frames.borrow_mut().get_mut(frame) {
            f.terminal = terminal;
        }
    }

    fn active_terminal(&self, receiver: &HostValue) -> Option<HostValue> {
        self.frames
            .borrow()
            .iter()
            .rev()
            .find(|f| &f.receiver == receiver)
            .and_then(|f| f.terminal.clone())
    }

    fn own_original(&self, object: &HostObjectType) -> Option<HostValue> {
        object
            .borrow()
            .get_own_property(&self.original_key)
            .and_then(|d| d.value().cloned())
    }

    /// The function at the bottom of the method chain for `receiver`.
    ///
    /// Instance assignments below the owner come first. Then a wrapped
    /// ancestor slot, ahead of the owner's own original: inherited wrappers
    /// run before a descendant's unwrapped original. Then the owner's
    /// original, and finally whatever the owner inherits.
    fn terminal_for(&self, receiver: &HostValue) -> Result<HostValue> {
        let owner = self.owner()?;

        if let HostValue::Object(r) = receiver {
            let mut found = None;
            let mut current = Some(r.clone());
            while let Some(o) = current {
                if Rc::ptr_eq(&o, &owner) {
                    if let Some(value) = found {
                        return Ok(value);
                    }
                    break;
                }
                if found.is_none() {
                    found = self.own_original(&o);
                }
                current = o.borrow().get_prototype_of();
            }
        }

        let prototype = owner.borrow().get_prototype_of();
        if let Some(p) = &prototype {
            if let Some((_, descriptor)) = find_property(p, &self.slot_key()) {
                if let Some(ancestor) = Wrapper::from_descriptor(&descriptor) {
                    if !ancestor.is_property {
                        return ancestor.make_handler(receiver).map(HostValue::Function);
                    }
                }
            }
        }

        if let Some(value) = self.own_original(&owner) {
            return Ok(value);
        }
        match prototype {
            Some(p) => get(&p, &self.slot_key(), receiver),
            None => Ok(HostValue::Undefined),
        }
    }

    fn owner_original(&self) -> Result<HostValue> {
        let owner = self.owner()?;
        self.terminal_for(&HostValue::Object(owner))
    }

    /// The function handed out when the method slot is read.
    ///
    /// Read while this wrapper runs a terminal for the same receiver, the
    /// handler binds the owner's original (`super`-style access from a
    /// descendant's original) unless that original is the running terminal
    /// itself, in which case reading the slot is recursion.
    fn make_handler(self: &Rc<Self>, receiver: &HostValue) -> Result<HostFunction> {
        let captured = match self.active_terminal(receiver) {
            Some(running) => {
                let original = self.owner_original()?;
                if original == running {
                    self.terminal_for(receiver)?
                } else {
                    original
                }
            }
            None => self.terminal_for(receiver)?,
        };
        let wrapper = self.clone();
        Ok(HostFunction::new(self.slot.as_str(), move |this, args| {
            wrapper.call_handler(&captured, this, args)
        }))
    }

    fn call_handler(self: &Rc<Self>, captured: &HostValue, this: &HostValue, args: Vec<HostValue>) -> Result<HostValue> {
        match self.active_terminal(this) {
            // A stale reference taken before a reassignment, or `super`.
            Some(running) if &running != captured => captured.call(this, args),
            _ => self.run_chain(false, this.clone(), args),
        }
    }

    fn assign_original(&self, receiver: &HostValue, value: HostValue) -> Result<()> {
        let owner = self.owner()?;
        let target = match receiver {
            HostValue::Object(o) if !Rc::ptr_eq(o, &owner) => {
                let mut instances = self.instances.borrow_mut();
                instances.retain(|w| w.strong_count() > 0);
                let weak = Rc::downgrade(o);
                if !instances.iter().any(|w| w.ptr_eq(&weak)) {
                    instances.push(weak);
                }
                o.clone()
            }
            _ => owner,
        };
        let stored = target
            .borrow_mut()
            .define_own_property(self.original_key.clone(), PropertyDescriptor::new_hidden(value));
        if stored {
            Ok(())
        } else {
            Err(Error::Type(format!(
                "Cannot assign to '{}' on a non-extensible object",
                self.slot
            )))
        }
    }

    fn get_original(&self, receiver: &HostValue) -> Result<HostValue> {
        match &self.original {
            Some(PropertyDescriptor::Accessor { get: Some(getter), .. }) => {
                getter.call(receiver, Vec::new())
            }
            Some(PropertyDescriptor::Accessor { get: None, .. }) => Ok(HostValue::Undefined),
            _ => {
                let prototype = self.owner()?.borrow().get_prototype_of();
                match prototype {
                    Some(p) => get(&p, &self.slot_key(), receiver),
                    None => Ok(HostValue::Undefined),
                }
            }
        }
    }

    fn set_original(&self, receiver: &HostValue, value: HostValue) -> Result<HostValue> {
        let setter = match &self.original {
            Some(PropertyDescriptor::Accessor { set, .. }) => set.clone(),
            _ => {
                let prototype = self.owner()?.borrow().get_prototype_of();
                match prototype.and_then(|p| find_property(&p, &self.slot_key())) {
                    Some((_, PropertyDescriptor::Accessor { set, .. })) => set,
                    _ => None,
                }
            }
        };
        match setter {
            Some(setter) => setter.call(receiver, vec![value]),
            None => Err(Error::Type(format!(
                "Cannot set property '{}' which has only a getter",
                self.name()
            ))),
        }
    }

    // ====================================================================
    // Teardown
    // ====================================================================

    /// Restore the slot to the state it would have without the wrapper.
    /// Returns false if the installed accessor could not be replaced.
    pub fn unwrap(&self) -> bool {
        let owner = match self.owner.upgrade() {
            Some(owner) => owner,
            None => return true,
        };
        let key = self.slot_key();
        let latest = self.own_original(&owner);

        let restored = {
            let mut o = owner.borrow_mut();
            match (&self.original, latest) {
                (
                    Some(PropertyDescriptor::Data {
                        value,
                        writable,
                        enumerable,
                        configurable,
                    }),
                    latest,
                ) => o.define_own_property(
                    key.clone(),
                    PropertyDescriptor::Data {
                        value: latest.unwrap_or_else(|| value.clone()),
                        writable: *writable,
                        enumerable: *enumerable,
                        configurable: *configurable,
                    },
                ),
                (Some(original), _) => o.define_own_property(key.clone(), original.clone()),
                (None, Some(latest)) => {
                    o.define_own_property(key.clone(), PropertyDescriptor::new_data(latest))
                }
                (None, None) => o.delete(&key),
            }
        };
        if !restored {
            warn!(
                "libWrapper: Could not restore '{}' since its slot is not configurable.",
                self.name()
            );
            return false;
        }
        owner.borrow_mut().delete(&self.original_key);

        let instances: Vec<Weak<RefCell<HostObject>>> = self.instances.borrow_mut().drain(..).collect();
        for instance in instances.iter().filter_map(|w| w.upgrade()) {
            if let Some(value) = self.own_original(&instance) {
                let mut i = instance.borrow_mut();
                i.delete(&self.original_key);
                i.define_own_property(key.clone(), PropertyDescriptor::new_data(value));
            }
        }
        true
    }
}
