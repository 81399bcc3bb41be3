//! Phase rules of a single transition attempt.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where an attempt currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPhase {
    #[default]
    Idle,
    Resolving,
    Cancelled,
    Redirected,
    Awaiting,
    Committing,
    Done,
    Aborting,
    Errored,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PhaseError {
    #[error("Invalid transition phase change from {from:?} to {to:?}")]
    InvalidTransition {
        from: TransitionPhase,
        to: TransitionPhase,
    },
    #[error("Cannot leave terminal phase {phase:?}")]
    FromTerminalPhase { phase: TransitionPhase },
}

pub struct PhaseRules;

impl PhaseRules {
    pub fn validate(from: TransitionPhase, to: TransitionPhase) -> Result<(), PhaseError> {
        if Self::is_terminal(from) {
            return Err(PhaseError::FromTerminalPhase { phase: from });
        }

        let is_valid = match (from, to) {
            (TransitionPhase::Idle, TransitionPhase::Resolving) => true,

            (TransitionPhase::Resolving, TransitionPhase::Cancelled)
            | (TransitionPhase::Resolving, TransitionPhase::Redirected)
            | (TransitionPhase::Resolving, TransitionPhase::Awaiting) => true,

            (TransitionPhase::Awaiting, TransitionPhase::Committing)
            | (TransitionPhase::Awaiting, TransitionPhase::Aborting) => true,

            (TransitionPhase::Committing, TransitionPhase::Done)
            | (TransitionPhase::Committing, TransitionPhase::Aborting) => true,

            (TransitionPhase::Aborting, TransitionPhase::Errored) => true,

            _ => false,
        };

        if is_valid {
            Ok(())
        } else {
            Err(PhaseError::InvalidTransition { from, to })
        }
    }

    /// A redirected attempt is over too, but its work continues in the next
    /// attempt, so it is not reported as terminal.
    pub fn is_terminal(phase: TransitionPhase) -> bool {
        matches!(
            phase,
            TransitionPhase::Done | TransitionPhase::Errored | TransitionPhase::Cancelled
        )
    }

    pub fn description(phase: TransitionPhase) -> &'static str {
        match phase {
            TransitionPhase::Idle => "idle",
            TransitionPhase::Resolving => "resolving target",
            TransitionPhase::Cancelled => "cancelled by observer",
            TransitionPhase::Redirected => "redirected",
            TransitionPhase::Awaiting => "awaiting readiness",
            TransitionPhase::Committing => "committing views",
            TransitionPhase::Done => "done",
            TransitionPhase::Aborting => "aborting",
            TransitionPhase::Errored => "errored",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_is_valid() {
        let path = [
            TransitionPhase::Idle,
            TransitionPhase::Resolving,
            TransitionPhase::Awaiting,
            TransitionPhase::Committing,
            TransitionPhase::Done,
        ];
        for pair in path.windows(2) {
            assert!(PhaseRules::validate(pair[0], pair[1]).is_ok(), "{pair:?}");
        }
    }

    #[test]
    fn test_invalid_phase_changes() {
        assert!(PhaseRules::validate(TransitionPhase::Idle, TransitionPhase::Done).is_err());
        assert!(
            PhaseRules::validate(TransitionPhase::Resolving, TransitionPhase::Committing).is_err()
        );
        assert_eq!(
            PhaseRules::validate(TransitionPhase::Done, TransitionPhase::Resolving),
            Err(PhaseError::FromTerminalPhase {
                phase: TransitionPhase::Done
            })
        );
    }

    #[test]
    fn test_terminal_phases() {
        assert!(PhaseRules::is_terminal(TransitionPhase::Done));
        assert!(PhaseRules::is_terminal(TransitionPhase::Errored));
        assert!(PhaseRules::is_terminal(TransitionPhase::Cancelled));
        assert!(!PhaseRules::is_terminal(TransitionPhase::Redirected));
        assert!(!PhaseRules::is_terminal(TransitionPhase::Awaiting));
    }
}
