//! # libwrapper - cooperative method wrapping for dynamic host objects
//!
//! Many independently written packages often need to attach behavior to the
//! *same* method of a shared object. Patching the slot directly makes the
//! last writer win and silently breaks everyone before it. This crate
//! multiplexes every package's contribution to a slot into one
//! deterministic, priority-ordered call chain:
//!
//! - WRAPPER, MIXED and OVERRIDE registrations, ordered by type then priority
//! - detection of competing OVERRIDE registrations
//! - self-healing of WRAPPER registrations that stop forwarding
//! - coexistence with code that reassigns the wrapped slot behind its back
//! - independent get and set chains for accessor properties
//!
//! ## Quick Start
//!
//! ```
//! use std::rc::Rc;
//! use libwrapper::host::{
//!     call_method, class_prototype, define_property, new_class, new_instance, split_next,
//!     HostFunction, HostValue, PropertyDescriptor, Realm,
//! };
//! use libwrapper::{EngineConfig, LibWrapper, RegisterOptions, WrapperType};
//!
//! // class Greeter { hello() { return "hello"; } }
//! let realm = Rc::new(Realm::new());
//! let greeter = new_class("Greeter", None).unwrap();
//! define_property(
//!     &class_prototype(&greeter).unwrap(),
//!     "hello",
//!     PropertyDescriptor::new_data(HostValue::from(HostFunction::new("hello", |_, _| {
//!         Ok(HostValue::from("hello"))
//!     }))),
//! );
//! realm.define_global("Greeter", greeter.clone()).unwrap();
//!
//! let lib = LibWrapper::new(realm, EngineConfig::default());
//! lib.mark_ready();
//!
//! // Wrap it: call the next function in the chain, then decorate its result.
//! lib.register(
//!     "shouty",
//!     "Greeter.prototype.hello",
//!     HostFunction::new("shout", |this, args| {
//!         let (next, args) = split_next(args)?;
//!         let inner = next.call(this, args)?;
//!         Ok(HostValue::from(format!("{}!", inner.as_str().unwrap_or_default())))
//!     }),
//!     WrapperType::Wrapper,
//!     RegisterOptions::default(),
//! )
//! .unwrap();
//!
//! let instance = new_instance(&greeter).unwrap();
//! assert_eq!(call_method(&instance, "hello", vec![]).unwrap(), HostValue::from("hello!"));
//! ```
//!
//! ## Chain order
//!
//! For every slot the chain runs WRAPPER registrations first, then MIXED
//! ones, then the single reachable OVERRIDE or, when there is none, the
//! original implementation. Within a type, higher priority runs first and
//! equal priority runs in registration order. Priorities come from
//! [`EngineConfig`], keyed by [`PackageInfo::key`].
//!
//! ## Architecture
//!
//! - **[`host`]** - Host object model (values, functions, objects, realm)
//! - **[`wrapper`]** - The wrapper-chain engine
//!   - **[`wrapper::resolver`]** - Dotted target paths
//!   - **[`wrapper::slot`]** - Interception state of one slot
//!   - **[`wrapper::chain`]** - Chain compilation and continuations
//!   - **[`wrapper::registry`]** - Live wrappers
//! - **[`api`]** - The [`LibWrapper`] facade packages talk to
//! - **[`error`]** - Error taxonomy

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

pub mod api;
pub mod error;
pub mod host;
pub mod version;
pub mod wrapper;

pub use api::LibWrapper;
pub use error::{Error, Result};
pub use wrapper::{
    EngineConfig, EventListener, IgnoreOptions, PackageInfo, PerfMode, RegisterOptions,
    WrapperEvent, WrapperType,
};
