//! Host object model.
//!
//! The engine intercepts named slots on dynamic objects: property maps with
//! data and accessor descriptors, chained through prototypes, resolved from a
//! global namespace. This module provides that model.
//!
//! ```text
//! a.x()  →  a (own?) → A.prototype (own?) → Object … → undefined
//!                          │
//!                          └─ Accessor { get } → getter(receiver = a)
//! ```
//!
//! Objects are `Rc<RefCell<HostObject>>`. None of the operations keep a
//! borrow alive while a getter, setter or function runs, so user code may
//! freely re-enter the model.

pub mod function_object;
pub mod object;
pub mod object_property;
pub mod realm;
pub mod symbol;
pub mod value;

pub use function_object::{split_next, HostFunction, NativeFn};
pub use object::{
    call_method, class_prototype, define_property, get, get_property, new_class, new_instance,
    object_create, set, set_property, HostObject, HostObjectType,
};
pub use object_property::{PropertyDescriptor, PropertyKey};
pub use realm::Realm;
pub use symbol::SymbolData;
pub use value::HostValue;
