use async_trait::async_trait;

use super::types::TransitionParams;
use crate::error::TransitionError;

/// Decides whether a target state may become current.
///
/// Awaited after `start`; a failure aborts the attempt with an `error`
/// notification and leaves views untouched.
#[async_trait]
pub trait Readiness: Send + Sync {
    async fn ready(&self, state: &str, params: &TransitionParams) -> Result<(), TransitionError>;
}

/// Every state is immediately ready.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysReady;

#[async_trait]
impl Readiness for AlwaysReady {
    async fn ready(&self, _state: &str, _params: &TransitionParams) -> Result<(), TransitionError> {
        Ok(())
    }
}
