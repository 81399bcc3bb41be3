use thiserror::Error;

/// Stable error codes, shared by every error family so callers (the CLI in
/// particular) can map failures without matching on each enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    GeneralError = 1,
    ValidationError = 3,
    InvalidName = 10,
    StateNotFound = 11,
    Concurrency = 20,
    NotReady = 30,
    RedirectLimit = 31,
    TemplateError = 40,
    InvalidPath = 41,
}

impl ErrorCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

/// Errors raised while registering or resolving states.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("Invalid name: '{0}'.")]
    InvalidName(String),

    #[error("Could not locate '{segment}' under '{parent}'.")]
    NotFound { segment: String, parent: String },

    #[error("state '{state}' declares a view with an empty name")]
    EmptyViewName { state: String },
}

impl StateError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidName(_) => ErrorCode::InvalidName,
            Self::NotFound { .. } => ErrorCode::StateNotFound,
            Self::EmptyViewName { .. } => ErrorCode::ValidationError,
        }
    }
}

/// Errors raised synchronously by the view store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    #[error("Must define a view name.")]
    MissingName,

    #[error("Can't start multiple transactions")]
    TransactionInProgress,
}

impl ViewError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::MissingName => ErrorCode::ValidationError,
            Self::TransactionInProgress => ErrorCode::Concurrency,
        }
    }
}
