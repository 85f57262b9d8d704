use std::fmt;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::host::function_object::HostFunction;
use crate::host::object::HostObjectType;

pub const TYPE_STR_UNDEFINED: &str = "undefined";
pub const TYPE_STR_NULL: &str = "null";

#[derive(Clone)]
pub enum HostValue {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Function(HostFunction),
    Object(HostObjectType),
}

impl HostValue {
    pub fn is_undefined(&self) -> bool {
        matches!(self, HostValue::Undefined)
    }

    pub fn as_function(&self) -> Option<&HostFunction> {
        match self {
            HostValue::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&HostObjectType> {
        match self {
            HostValue::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            HostValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Call this value as a function, failing with a type error otherwise.
    pub fn call(&self, this: &HostValue, args: Vec<HostValue>) -> Result<HostValue> {
        match self {
            HostValue::Function(f) => f.call(this, args),
            other => Err(Error::Type(format!("'{}' is not a function", other))),
        }
    }
}

impl Display for HostValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Undefined => write!(f, "{}", TYPE_STR_UNDEFINED),
            HostValue::Null => write!(f, "{}", TYPE_STR_NULL),
            HostValue::Boolean(b) => write!(f, "{}", b),
            HostValue::Number(n) => write!(f, "{}", n),
            HostValue::String(s) => write!(f, "\"{}\"", s),
            HostValue::Function(func) => write!(f, "function {}() {{ [native code] }}", func.name()),
            HostValue::Object(o) => write!(f, "[object {}]", o.borrow().class_name()),
        }
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Undefined => write!(f, "HostValue::Undefined"),
            HostValue::Null => write!(f, "HostValue::Null"),
            HostValue::Boolean(b) => write!(f, "HostValue::Boolean({})", b),
            HostValue::Number(n) => write!(f, "HostValue::Number({})", n),
            HostValue::String(s) => write!(f, "HostValue::String({:?})", s),
            HostValue::Function(func) => write!(f, "HostValue::Function({})", func.name()),
            HostValue::Object(_) => write!(f, "HostValue::Object(...)"),
        }
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HostValue::Undefined, HostValue::Undefined) => true,
            (HostValue::Null, HostValue::Null) => true,
            (HostValue::Boolean(a), HostValue::Boolean(b)) => a == b,
            (HostValue::Number(a), HostValue::Number(b)) => a == b,
            (HostValue::String(a), HostValue::String(b)) => a == b,
            (HostValue::Function(a), HostValue::Function(b)) => a.same_function(b),
            (HostValue::Object(a), HostValue::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::String(s.to_string())
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::String(s)
    }
}

impl From<f64> for HostValue {
    fn from(n: f64) -> Self {
        HostValue::Number(n)
    }
}

impl From<i32> for HostValue {
    fn from(n: i32) -> Self {
        HostValue::Number(n as f64)
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Boolean(b)
    }
}

impl From<HostFunction> for HostValue {
    fn from(f: HostFunction) -> Self {
        HostValue::Function(f)
    }
}

impl From<HostObjectType> for HostValue {
    fn from(o: HostObjectType) -> Self {
        HostValue::Object(o)
    }
}
