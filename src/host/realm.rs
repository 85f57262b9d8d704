use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::host::object::{get_property, set_property, HostObject, HostObjectType};
use crate::host::object_property::PropertyKey;
use crate::host::value::HostValue;

/// The ambient global namespace that target paths are resolved against.
pub struct Realm {
    global: HostObjectType,
}

impl Realm {
    pub fn new() -> Self {
        Realm {
            global: Rc::new(RefCell::new(HostObject::new("global", None))),
        }
    }

    pub fn global(&self) -> &HostObjectType {
        &self.global
    }

    pub fn define_global(&self, name: &str, value: impl Into<HostValue>) -> Result<bool> {
        set_property(&self.global, name, value)
    }

    /// Read a global binding. An unbound name is a reference error.
    pub fn get_global(&self, name: &str) -> Result<HostValue> {
        if !self.global.borrow().has_own_property(&PropertyKey::from(name)) {
            return Err(Error::Reference(format!("{} is not defined", name)));
        }
        get_property(&self.global, name)
    }
}

impl Default for Realm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_global() {
        let realm = Realm::new();
        realm.define_global("answer", 42).unwrap();
        assert_eq!(realm.get_global("answer").unwrap(), HostValue::from(42));
        assert!(matches!(realm.get_global("question"), Err(Error::Reference(_))));
    }
}
