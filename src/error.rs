//! Crate-wide error type.
//!
//! Mirrors the error-kind taxonomy in the system design: transient-transport
//! errors are retried by callers, permanent-transport and unconfigured
//! errors are surfaced as source status, parse errors are caught at the
//! adapter boundary, and validation/resource errors carry their own
//! recovery policy (fallback, run failure) one level up.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{source_name}: transient transport error: {message}")]
    Transient {
        source_name: &'static str,
        message: String,
    },

    #[error("{source_name}: permanent transport error: {message}")]
    Permanent {
        source_name: &'static str,
        message: String,
    },

    #[error("{source_name}: unconfigured (missing credential)")]
    Unconfigured { source_name: &'static str },

    #[error("{source_name}: parse error: {message}")]
    Parse {
        source_name: &'static str,
        message: String,
    },

    #[error("AI output failed validation: {0}")]
    Validation(String),

    #[error("resource error: {0}")]
    Resource(String),
}

impl Error {
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transient { .. })
    }

    pub fn source_name(&self) -> Option<&'static str> {
        match self {
            Error::Transient { source_name, .. }
            | Error::Permanent { source_name, .. }
            | Error::Unconfigured { source_name }
            | Error::Parse { source_name, .. } => Some(source_name),
            Error::Validation(_) | Error::Resource(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
