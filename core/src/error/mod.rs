#[allow(clippy::module_inception)]
pub mod error;
pub mod transition;

pub use error::{ErrorCode, StateError, ViewError};
pub use transition::{TemplateError, TransitionError};
