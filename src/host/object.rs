use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::host::object_property::{PropertyDescriptor, PropertyKey};
use crate::host::value::HostValue;

pub type HostObjectType = Rc<RefCell<HostObject>>;

pub struct ObjectBase {
    properties: HashMap<PropertyKey, PropertyDescriptor>,
    is_extensible: bool,
    prototype: Option<HostObjectType>,
}

impl ObjectBase {
    pub fn new(prototype: Option<HostObjectType>) -> Self {
        ObjectBase {
            properties: HashMap::new(),
            is_extensible: true,
            prototype,
        }
    }
}

pub struct HostObject {
    base: ObjectBase,
    class_name: String,
}

impl HostObject {
    pub fn new(class_name: impl Into<String>, prototype: Option<HostObjectType>) -> Self {
        HostObject {
            base: ObjectBase::new(prototype),
            class_name: class_name.into(),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn get_prototype_of(&self) -> Option<HostObjectType> {
        self.base.prototype.clone()
    }

    pub fn is_extensible(&self) -> bool {
        self.base.is_extensible
    }

    pub fn prevent_extensions(&mut self) {
        self.base.is_extensible = false;
    }

    pub fn get_own_property(&self, property: &PropertyKey) -> Option<&PropertyDescriptor> {
        self.base.properties.get(property)
    }

    pub fn has_own_property(&self, property: &PropertyKey) -> bool {
        self.base.properties.contains_key(property)
    }

    /// Returns false when the change is not allowed: a new property on a
    /// non-extensible object, or any change to a non-configurable property
    /// other than updating the value of a writable data property.
    pub fn define_own_property(
        &mut self,
        property: PropertyKey,
        descriptor: PropertyDescriptor,
    ) -> bool {
        match self.base.properties.get_mut(&property) {
            None => {
                if !self.base.is_extensible {
                    return false;
                }
                self.base.properties.insert(property, descriptor);
                true
            }
            Some(current) => {
                if current.is_configurable() {
                    *current = descriptor;
                    return true;
                }
                match (current, descriptor) {
                    (
                        PropertyDescriptor::Data {
                            value,
                            writable: true,
                            enumerable,
                            ..
                        },
                        PropertyDescriptor::Data {
                            value: new_value,
                            configurable: false,
                            enumerable: new_enumerable,
                            ..
                        },
                    ) if *enumerable == new_enumerable => {
                        *value = new_value;
                        true
                    }
                    _ => false,
                }
            }
        }
    }

    pub fn delete(&mut self, property: &PropertyKey) -> bool {
        match self.base.properties.get(property) {
            None => true,
            Some(pd) => {
                if pd.is_configurable() {
                    self.base.properties.remove(property);
                    true
                } else {
                    false
                }
            }
        }
    }
}

pub fn object_create(prototype: Option<HostObjectType>) -> HostObjectType {
    Rc::new(RefCell::new(HostObject::new("Object", prototype)))
}

/// Find the first object on the prototype chain of `o` (including `o`) that
/// owns `property`, with a copy of its descriptor.
pub fn find_property(
    o: &HostObjectType,
    property: &PropertyKey,
) -> Option<(HostObjectType, PropertyDescriptor)> {
    let mut current = Some(o.clone());
    while let Some(obj) = current {
        let found = obj.borrow().get_own_property(property).cloned();
        if let Some(descriptor) = found {
            return Some((obj, descriptor));
        }
        current = obj.borrow().get_prototype_of();
    }
    None
}

pub fn get(o: &HostObjectType, property: &PropertyKey, receiver: &HostValue) -> Result<HostValue> {
    match find_property(o, property) {
        None => Ok(HostValue::Undefined),
        Some((_, PropertyDescriptor::Data { value, .. })) => Ok(value),
        Some((_, PropertyDescriptor::Accessor { get, .. })) => match get {
            None => Ok(HostValue::Undefined),
            Some(getter) => getter.call(receiver, Vec::new()),
        },
    }
}

/// Ordinary assignment. Returns whether the assignment took effect.
pub fn set(
    o: &HostObjectType,
    property: PropertyKey,
    value: HostValue,
    receiver: &HostValue,
) -> Result<bool> {
    match find_property(o, &property) {
        Some((_, PropertyDescriptor::Accessor { set, .. })) => match set {
            None => Ok(false),
            Some(setter) => {
                setter.call(receiver, vec![value])?;
                Ok(true)
            }
        },
        Some((_, PropertyDescriptor::Data {
            writable: false, ..
        })) => Ok(false),
        _ => match receiver {
            HostValue::Object(r) => {
                let mut r = r.borrow_mut();
                let descriptor = match r.get_own_property(&property) {
                    Some(PropertyDescriptor::Data {
                        writable: true,
                        enumerable,
                        configurable,
                        ..
                    }) => PropertyDescriptor::Data {
                        value,
                        writable: true,
                        enumerable: *enumerable,
                        configurable: *configurable,
                    },
                    Some(_) => return Ok(false),
                    None => PropertyDescriptor::new_data(value),
                };
                Ok(r.define_own_property(property, descriptor))
            }
            _ => Ok(false),
        },
    }
}

pub fn get_property(o: &HostObjectType, name: &str) -> Result<HostValue> {
    get(o, &PropertyKey::from(name), &HostValue::Object(o.clone()))
}

pub fn set_property(o: &HostObjectType, name: &str, value: impl Into<HostValue>) -> Result<bool> {
    set(
        o,
        PropertyKey::from(name),
        value.into(),
        &HostValue::Object(o.clone()),
    )
}

pub fn define_property(o: &HostObjectType, name: &str, descriptor: PropertyDescriptor) -> bool {
    o.borrow_mut()
        .define_own_property(PropertyKey::from(name), descriptor)
}

/// `o.name(...args)`
pub fn call_method(o: &HostObjectType, name: &str, args: Vec<HostValue>) -> Result<HostValue> {
    let this = HostValue::Object(o.clone());
    let f = get(o, &PropertyKey::from(name), &this)?;
    match f {
        HostValue::Function(f) => f.call(&this, args),
        other => Err(Error::Type(format!("'{}' is not a function ({})", name, other))),
    }
}

/// Create a class object whose `prototype` property inherits from the
/// parent class's prototype.
pub fn new_class(name: &str, parent: Option<&HostObjectType>) -> Result<HostObjectType> {
    let parent_prototype = match parent {
        Some(p) => Some(class_prototype(p)?),
        None => None,
    };
    let prototype = Rc::new(RefCell::new(HostObject::new(name, parent_prototype)));
    let class = Rc::new(RefCell::new(HostObject::new(
        name,
        parent.cloned(),
    )));
    class.borrow_mut().define_own_property(
        PropertyKey::from("prototype"),
        PropertyDescriptor::Data {
            value: HostValue::Object(prototype),
            writable: false,
            enumerable: false,
            configurable: false,
        },
    );
    Ok(class)
}

pub fn class_prototype(class: &HostObjectType) -> Result<HostObjectType> {
    match get_property(class, "prototype")? {
        HostValue::Object(p) => Ok(p),
        _ => Err(Error::Type(format!(
            "'{}' has no prototype object",
            class.borrow().class_name()
        ))),
    }
}

pub fn new_instance(class: &HostObjectType) -> Result<HostObjectType> {
    let prototype = class_prototype(class)?;
    let name = class.borrow().class_name().to_string();
    Ok(Rc::new(RefCell::new(HostObject::new(name, Some(prototype)))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::function_object::HostFunction;

    #[test]
    fn test_get_walks_prototype_chain() {
        let base = object_create(None);
        set_property(&base, "x", 1).unwrap();
        let derived = object_create(Some(base.clone()));
        assert_eq!(get_property(&derived, "x").unwrap(), HostValue::Number(1.0));
        assert_eq!(get_property(&derived, "y").unwrap(), HostValue::Undefined);
    }

    #[test]
    fn test_set_shadows_inherited_data() {
        let base = object_create(None);
        set_property(&base, "x", 1).unwrap();
        let derived = object_create(Some(base.clone()));
        assert!(set_property(&derived, "x", 2).unwrap());
        assert_eq!(get_property(&base, "x").unwrap(), HostValue::Number(1.0));
        assert_eq!(get_property(&derived, "x").unwrap(), HostValue::Number(2.0));
    }

    #[test]
    fn test_inherited_accessor_receives_receiver() {
        let base = object_create(None);
        let getter = HostFunction::new("get", |this, _| match this {
            HostValue::Object(o) => get_property(o, "secret"),
            _ => Ok(HostValue::Undefined),
        });
        define_property(
            &base,
            "value",
            PropertyDescriptor::new_accessor(Some(getter), None),
        );
        let derived = object_create(Some(base));
        set_property(&derived, "secret", "hidden").unwrap();
        assert_eq!(get_property(&derived, "value").unwrap(), HostValue::from("hidden"));
        // No setter: assignment is refused rather than shadowing the accessor.
        assert!(!set_property(&derived, "value", 3).unwrap());
    }

    #[test]
    fn test_non_configurable_property_is_locked() {
        let o = object_create(None);
        assert!(define_property(
            &o,
            "x",
            PropertyDescriptor::Data {
                value: HostValue::Number(1.0),
                writable: false,
                enumerable: true,
                configurable: false,
            },
        ));
        assert!(!define_property(&o, "x", PropertyDescriptor::new_data(HostValue::Null)));
        assert!(!o.borrow_mut().delete(&PropertyKey::from("x")));
        assert!(!set_property(&o, "x", 5).unwrap());
    }

    #[test]
    fn test_non_extensible_object_rejects_new_properties() {
        let o = object_create(None);
        set_property(&o, "x", 1).unwrap();
        o.borrow_mut().prevent_extensions();
        assert!(!o.borrow().is_extensible());
        assert!(!define_property(&o, "y", PropertyDescriptor::new_data(HostValue::Null)));
        // Existing configurable properties can still change.
        assert!(set_property(&o, "x", 2).unwrap());
        assert_eq!(get_property(&o, "x").unwrap(), HostValue::Number(2.0));
    }

    #[test]
    fn test_class_instances_share_prototype() {
        let a = new_class("A", None).unwrap();
        let b = new_class("B", Some(&a)).unwrap();
        let proto_a = class_prototype(&a).unwrap();
        proto_a.borrow_mut().define_own_property(
            PropertyKey::from("x"),
            PropertyDescriptor::new_data(HostValue::from(HostFunction::new("x", |_, _| {
                Ok(HostValue::from("A.x"))
            }))),
        );
        let instance = new_instance(&b).unwrap();
        assert_eq!(call_method(&instance, "x", vec![]).unwrap(), HostValue::from("A.x"));
        assert!(call_method(&instance, "missing", vec![]).is_err());
    }
}
