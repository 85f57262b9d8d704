//! Registry of live wrappers, keyed by the paths their slots were reached through.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Result;
use crate::host::object_property::PropertyKey;
use crate::wrapper::config::EngineConfig;
use crate::wrapper::events::EventBus;
use crate::wrapper::resolver::{split_target_and_setter, ResolvedTarget};
use crate::wrapper::slot::Wrapper;

pub struct WrapperRegistry {
    wrappers: Vec<Rc<Wrapper>>,
    settings: Rc<RefCell<EngineConfig>>,
    events: EventBus,
}

impl WrapperRegistry {
    pub fn new(settings: Rc<RefCell<EngineConfig>>, events: EventBus) -> Self {
        WrapperRegistry {
            wrappers: Vec::new(),
            settings,
            events,
        }
    }

    /// Look up a wrapper by any of its names. A `#set` suffix is ignored.
    pub fn find(&self, name: &str) -> Option<Rc<Wrapper>> {
        let (path, _) = split_target_and_setter(name);
        self.wrappers.iter().find(|w| w.has_name(path)).cloned()
    }

    /// Returns the wrapper for the slot and whether it was created by this call.
    ///
    /// A slot already intercepted but reached through a different path gets
    /// that path as an alias.
    pub fn find_or_create(
        &mut self,
        target: &ResolvedTarget,
        package: &str,
    ) -> Result<(Rc<Wrapper>, bool)> {
        if let Some(wrapper) = self.find(&target.path) {
            return Ok((wrapper, false));
        }

        let existing = target
            .object
            .borrow()
            .get_own_property(&PropertyKey::from(target.name.as_str()))
            .and_then(Wrapper::from_descriptor);
        if let Some(wrapper) = existing {
            if target.is_setter && !wrapper.is_property() {
                return Err(Wrapper::not_a_property(target, package));
            }
            wrapper.add_name(&target.path);
            if !self.wrappers.iter().any(|w| Rc::ptr_eq(w, &wrapper)) {
                self.wrappers.push(wrapper.clone());
            }
            return Ok((wrapper, false));
        }

        let wrapper = Wrapper::create(target, package, self.settings.clone(), self.events.clone())?;
        self.wrappers.push(wrapper.clone());
        Ok((wrapper, true))
    }

    /// Tear an empty wrapper down, unless installed slots are not
    /// re-configurable. Returns whether the wrapper was removed.
    pub fn remove_if_possible(&mut self, wrapper: &Rc<Wrapper>) -> bool {
        if !wrapper.is_empty() || !self.settings.borrow().properties_configurable {
            return false;
        }
        if !wrapper.unwrap() {
            return false;
        }
        self.wrappers.retain(|w| !Rc::ptr_eq(w, wrapper));
        true
    }

    /// Drop every registration of `target` and tear its wrapper down if possible.
    pub fn clear(&mut self, target: &str) {
        if let Some(wrapper) = self.find(target) {
            wrapper.clear();
            self.remove_if_possible(&wrapper);
            info!("libWrapper: Cleared all wrapper functions for '{}'.", target);
        }
    }

    /// Clear and restore every wrapper, then forget them all.
    pub fn unwrap_all(&mut self) {
        for wrapper in self.wrappers.drain(..) {
            wrapper.clear();
            wrapper.unwrap();
        }
    }

    pub fn wrappers(&self) -> Vec<Rc<Wrapper>> {
        self.wrappers.clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.wrappers.iter().map(|w| w.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.wrappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wrappers.is_empty()
    }
}
