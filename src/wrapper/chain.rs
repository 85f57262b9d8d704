//! Chain compilation and the continuation contract.
//!
//! A chain is compiled right-to-left: the terminal step first, then every
//! registration wrapped around the step after it. Each compiled chain is
//! immutable; a registration change builds a new one, so a call that already
//! started keeps running the chain it began with.

use std::cell::Cell;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::host::function_object::HostFunction;
use crate::host::value::HostValue;
use crate::wrapper::registration::{Registration, RegistrationList};
use crate::wrapper::types::{PackageInfo, PerfMode, WrapperType};
use crate::wrapper::slot::Wrapper;

/// One step of a compiled chain.
pub type ChainFn = Rc<dyn Fn(&ChainCall, Vec<HostValue>) -> Result<HostValue>>;

/// Per-invocation context threaded through every step.
#[derive(Clone)]
pub struct ChainCall {
    pub(crate) wrapper: Rc<Wrapper>,
    pub(crate) setter: bool,
    pub(crate) receiver: HostValue,
    /// Index of this call's frame on the wrapper's frame stack.
    pub(crate) frame: usize,
}

impl ChainCall {
    pub fn receiver(&self) -> &HostValue {
        &self.receiver
    }
}

pub struct CompiledChain {
    entries: Vec<Rc<Registration>>,
    mode: PerfMode,
    head: ChainFn,
}

impl CompiledChain {
    /// Registrations in call order.
    pub fn entries(&self) -> &[Rc<Registration>] {
        &self.entries
    }

    /// Effective performance mode, never `Auto`.
    pub fn mode(&self) -> PerfMode {
        self.mode
    }

    pub(crate) fn head(&self) -> ChainFn {
        self.head.clone()
    }
}

pub struct ChainBuilder;

impl ChainBuilder {
    pub fn build(list: &RegistrationList, high_performance: bool) -> CompiledChain {
        let entries = list.ordered();
        let mode = list.preferred_perf_mode().resolve(high_performance);

        let mut next: ChainFn = Rc::new(|call: &ChainCall, args: Vec<HostValue>| {
            call.wrapper.call_terminal(call, args)
        });
        for (index, registration) in entries.iter().enumerate().rev() {
            let step = ChainStep {
                registration: registration.clone(),
                next,
                followers: skipped_packages(&entries[index + 1..], &registration.package),
                detect_conflicts: mode == PerfMode::Normal,
            };
            next = step.into_fn();
        }

        CompiledChain {
            entries,
            mode,
            head: next,
        }
    }
}

/// Packages whose entries are skipped when `package` does not forward.
fn skipped_packages(rest: &[Rc<Registration>], package: &PackageInfo) -> Vec<PackageInfo> {
    let mut packages: Vec<PackageInfo> = Vec::new();
    for r in rest {
        if &r.package != package && !packages.contains(&r.package) {
            packages.push(r.package.clone());
        }
    }
    packages
}

pub struct ChainStep {
    registration: Rc<Registration>,
    next: ChainFn,
    followers: Vec<PackageInfo>,
    detect_conflicts: bool,
}

impl ChainStep {
    fn into_fn(self) -> ChainFn {
        Rc::new(move |call: &ChainCall, args: Vec<HostValue>| self.invoke(call, args))
    }

    pub fn invoke(&self, call: &ChainCall, args: Vec<HostValue>) -> Result<HostValue> {
        let registration = &self.registration;
        if !registration.chain {
            let result = registration.func.call(&call.receiver, args);
            if result.is_ok() {
                self.report_skipped(call);
            }
            return result;
        }

        let continuation = Rc::new(Continuation::new());
        let next = continuation.bind(call.clone(), self.next.clone(), registration.clone());
        let mut full_args = Vec::with_capacity(args.len() + 1);
        full_args.push(HostValue::Function(next));
        full_args.extend(args);

        let result = registration.func.call(&call.receiver, full_args);
        let forwarded = continuation.expire();

        if result.is_ok() && !forwarded {
            if registration.kind == WrapperType::Wrapper {
                call.wrapper.auto_remove(registration);
            } else {
                self.report_skipped(call);
            }
        }
        result
    }

    fn report_skipped(&self, call: &ChainCall) {
        if self.detect_conflicts && !self.followers.is_empty() {
            call.wrapper
                .report_conflicts(&self.registration, &self.followers);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ContinuationState {
    Pending,
    Called,
    /// The wrapper function that received it has returned.
    Expired,
}

/// The `next` function handed to a forwarding registration.
struct Continuation {
    state: Cell<ContinuationState>,
}

impl Continuation {
    fn new() -> Self {
        Continuation {
            state: Cell::new(ContinuationState::Pending),
        }
    }

    fn bind(
        self: &Rc<Self>,
        call: ChainCall,
        next: ChainFn,
        registration: Rc<Registration>,
    ) -> HostFunction {
        let continuation = self.clone();
        let name = format!("{}#next", registration.package.id);
        HostFunction::new(name, move |this, args| {
            continuation.forward(&call, &next, &registration, this, args)
        })
    }

    fn forward(
        &self,
        call: &ChainCall,
        next: &ChainFn,
        registration: &Registration,
        this: &HostValue,
        args: Vec<HostValue>,
    ) -> Result<HostValue> {
        let misuse = |message: &str| Error::InvalidChainUsage {
            package: registration.package.id.clone(),
            wrapper: call.wrapper.name(),
            message: message.to_string(),
        };

        match self.state.get() {
            ContinuationState::Called => {
                return Err(misuse("the next function in the chain was called more than once"))
            }
            ContinuationState::Expired => {
                return Err(misuse(
                    "the next function in the chain was called after the wrapper returned",
                ))
            }
            ContinuationState::Pending => {}
        }
        if !this.is_undefined() && this != &call.receiver {
            return Err(misuse(
                "the next function in the chain was called with a different receiver",
            ));
        }

        self.state.set(ContinuationState::Called);
        next(call, args)
    }

    /// Returns whether the continuation was called.
    fn expire(&self) -> bool {
        let called = self.state.get() == ContinuationState::Called;
        self.state.set(ContinuationState::Expired);
        called
    }
}
