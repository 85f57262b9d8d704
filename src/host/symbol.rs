use std::fmt;
use std::fmt::{Display, Formatter};

/// Symbol keys are never reachable through a dotted target path, which makes
/// them suitable for state the engine hides on host objects.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SymbolData {
    description: String,
}

impl SymbolData {
    pub fn new(description: impl Into<String>) -> Self {
        SymbolData {
            description: description.into(),
        }
    }

    /// The key under which the original implementation of slot `name` is kept
    /// on owners and on instances that were assigned to directly.
    pub fn wrapped_original(name: &str) -> Self {
        SymbolData::new(format!("libWrapper.original.{}", name))
    }
}

impl Display for SymbolData {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description)
    }
}
