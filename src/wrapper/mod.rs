//! The wrapper-chain engine.
//!
//! Each intercepted slot gets one [`Wrapper`]. Packages add registrations to
//! it; the registrations are ordered by type and priority and compiled into a
//! chain that runs whenever the slot is called, ending at whatever
//! implementation currently occupies the original position:
//!
//! ```text
//!   caller → WRAPPER… → MIXED… → OVERRIDE | original
//! ```
//!
//! - [`resolver`] turns a dotted target into a host object and slot name.
//! - [`registration`] holds registrations and computes their order.
//! - [`chain`] compiles an ordered list and enforces the continuation rules.
//! - [`conflicts`] guards the single reachable OVERRIDE and stores ignore rules.
//! - [`registry`] keeps the live wrappers.

pub mod chain;
pub mod config;
pub mod conflicts;
pub mod events;
pub mod registration;
pub mod registry;
pub mod resolver;
pub mod slot;
pub mod types;

pub use chain::{ChainBuilder, CompiledChain};
pub use config::{EngineConfig, PriorityLookup};
pub use conflicts::{ConflictDetector, ConflictIgnores, OverrideLost};
pub use events::{EventBus, EventListener, WrapperEvent};
pub use registration::{Registration, RegistrationList, WrapperFn};
pub use registry::WrapperRegistry;
pub use resolver::ResolvedTarget;
pub use slot::Wrapper;
pub use types::{
    AccessorHalf, IgnoreOptions, PackageInfo, PackageKind, PerfMode, RegisterOptions,
    WrapperType, INTERNAL_PACKAGE_ID,
};
