//! # Transitions
//!
//! Moves the application from one state to another. An attempt notifies
//! `start` observers (who may cancel or redirect), awaits readiness of the
//! target, then commits the target's views inside a single view transaction
//! and reports `success` or `error`, always followed by `after`.

pub mod bus;
pub mod chain;
pub mod coordinator;
pub mod phase;
pub mod readiness;
pub mod types;

pub use bus::{EventFilter, SubscriptionId, TransitionBus, TransitionControl, TransitionHook};
pub use chain::TransitionChain;
pub use coordinator::TransitionCoordinator;
pub use phase::{PhaseError, PhaseRules, TransitionPhase};
pub use readiness::{AlwaysReady, Readiness};
pub use types::{
    StateTarget, TransitionEvent, TransitionKind, TransitionOutcome, TransitionParams,
};
