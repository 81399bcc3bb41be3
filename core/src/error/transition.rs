use thiserror::Error;

use super::error::{ErrorCode, StateError};

/// Failure of a transition attempt. Reported through the `error` lifecycle
/// notification, never returned from `goto` directly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("state '{state}' is not ready: {reason}")]
    NotReady { state: String, reason: String },

    #[error("redirect limit of {limit} exceeded")]
    RedirectLimit { limit: usize },

    #[error("view store unavailable: {0}")]
    ViewStore(String),

    /// A redirect named a state that does not exist.
    #[error("redirect target unavailable: {0}")]
    Lookup(#[from] StateError),
}

impl TransitionError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotReady { .. } => ErrorCode::NotReady,
            Self::RedirectLimit { .. } => ErrorCode::RedirectLimit,
            Self::ViewStore(_) => ErrorCode::Concurrency,
            Self::Lookup(err) => err.error_code(),
        }
    }
}

/// Template resolution failure. `Clone` because resolved templates are shared
/// futures polled by every consumer of a slot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template cannot be resolved: {0}")]
    Unresolvable(String),

    #[error("invalid template path: {0}")]
    InvalidPath(String),

    #[error("template io error: {0}")]
    Io(String),
}

impl TemplateError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Unresolvable(_) | Self::Io(_) => ErrorCode::TemplateError,
            Self::InvalidPath(_) => ErrorCode::InvalidPath,
        }
    }
}
