//! Error types shared by the host object model and the wrapper engine.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Caller misuse: malformed target, invalid option, duplicate registration,
    /// calling before the engine is ready.
    #[error("libWrapper: {package}: {message}")]
    Configuration { package: String, message: String },

    /// An OVERRIDE registration lost the priority contest against the one
    /// already in place.
    #[error(
        "libWrapper: '{package}' cannot register an OVERRIDE wrapper for '{target}' ({wrapper}) since '{existing}' has already registered one"
    )]
    AlreadyOverridden {
        package: String,
        existing: String,
        wrapper: String,
        target: String,
    },

    /// An invariant inside the engine was broken.
    #[error("libWrapper: internal error: {0}")]
    Internal(String),

    /// A registered function misused the continuation it was handed.
    #[error("libWrapper: '{package}' misused the wrapper chain of '{wrapper}': {message}")]
    InvalidChainUsage {
        package: String,
        wrapper: String,
        message: String,
    },

    #[error("reference error: {0}")]
    Reference(String),

    #[error("type error: {0}")]
    Type(String),

    /// Raised by a user function.
    #[error("uncaught: {0}")]
    Thrown(String),

    #[error("libWrapper: failed to load settings: {0}")]
    Settings(String),
}

impl Error {
    pub fn configuration(package: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Configuration {
            package: package.into(),
            message: message.into(),
        }
    }

    pub fn thrown(message: impl Into<String>) -> Self {
        Error::Thrown(message.into())
    }

    /// Package ids carried by the error, if any.
    pub fn package_ids(&self) -> Vec<&str> {
        match self {
            Error::Configuration { package, .. } | Error::InvalidChainUsage { package, .. } => {
                vec![package.as_str()]
            }
            Error::AlreadyOverridden {
                package, existing, ..
            } => vec![package.as_str(), existing.as_str()],
            _ => Vec::new(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
