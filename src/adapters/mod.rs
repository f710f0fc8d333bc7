//! Wire-level adapters for the three external services.
//!
//! Each adapter owns its own `reqwest::Client`, applies header-based auth
//! from configuration, and wraps every network call in the source's
//! [`crate::retry::RetryPolicy`]. None of them know anything about
//! [`crate::record::IntelligenceRecord`] — that lift happens in
//! `crate::normalize`.

pub mod macro_source;
pub mod narrative;
pub mod trade;

use crate::error::Error;

/// Classifies a transport failure so the retry layer and the orchestrator
/// agree on what's transient vs. terminal, per the design's error kinds.
pub fn is_transient(status: Option<reqwest::StatusCode>, is_timeout: bool, is_connect: bool) -> bool {
    if is_timeout || is_connect {
        return true;
    }
    match status {
        Some(s) => s.is_server_error(),
        None => false,
    }
}

pub(crate) fn transport_error(source_name: &'static str, err: &reqwest::Error) -> Error {
    let transient = is_transient(err.status(), err.is_timeout(), err.is_connect());
    if transient {
        Error::Transient {
            source_name,
            message: err.to_string(),
        }
    } else {
        Error::Permanent {
            source_name,
            message: err.to_string(),
        }
    }
}
