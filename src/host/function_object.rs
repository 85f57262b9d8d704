use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::host::value::HostValue;

/// Function signature for native callables: receiver and arguments in, value out.
pub type NativeFn = dyn Fn(&HostValue, Vec<HostValue>) -> Result<HostValue>;

/// A callable host function.
///
/// Cloning is cheap and keeps identity: two clones compare equal, two
/// separately created functions never do, even with the same body.
#[derive(Clone)]
pub struct HostFunction {
    name: Rc<str>,
    func: Rc<NativeFn>,
    tag: Option<Rc<dyn Any>>,
}

impl HostFunction {
    pub fn new<F>(name: impl AsRef<str>, func: F) -> Self
    where
        F: Fn(&HostValue, Vec<HostValue>) -> Result<HostValue> + 'static,
    {
        HostFunction {
            name: Rc::from(name.as_ref()),
            func: Rc::new(func),
            tag: None,
        }
    }

    /// Attach opaque data that can later be recovered with [`HostFunction::tag`].
    pub fn with_tag(mut self, tag: Rc<dyn Any>) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> Option<&Rc<dyn Any>> {
        self.tag.as_ref()
    }

    pub fn call(&self, this: &HostValue, args: Vec<HostValue>) -> Result<HostValue> {
        (self.func)(this, args)
    }

    pub fn same_function(&self, other: &HostFunction) -> bool {
        Rc::as_ptr(&self.func) as *const u8 == Rc::as_ptr(&other.func) as *const u8
    }
}

impl PartialEq for HostFunction {
    fn eq(&self, other: &Self) -> bool {
        self.same_function(other)
    }
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostFunction({})", self.name)
    }
}

/// Split the continuation off the front of a forwarding wrapper's arguments.
pub fn split_next(mut args: Vec<HostValue>) -> Result<(HostFunction, Vec<HostValue>)> {
    if args.is_empty() {
        return Err(Error::Type(
            "expected the next function in the chain as first argument".to_string(),
        ));
    }
    let first = args.remove(0);
    match first {
        HostValue::Function(next) => Ok((next, args)),
        other => Err(Error::Type(format!("'{}' is not a function", other))),
    }
}
