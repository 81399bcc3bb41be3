//! Transition events, parameters and outcomes.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TransitionError;
use crate::state::{NodeId, RouteMatch};

/// Lifecycle notification kinds, in the order an attempt can emit them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Start,
    Between,
    Success,
    Error,
    After,
}

/// Parameters of a navigation, split by origin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionParams {
    #[serde(default)]
    pub path: BTreeMap<String, String>,
    #[serde(default)]
    pub search: BTreeMap<String, String>,
}

impl TransitionParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.path.insert(key.into(), value.into());
        self
    }

    pub fn search_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.search.insert(key.into(), value.into());
        self
    }

    /// Search and path parameters merged; path wins on conflicts.
    pub fn all(&self) -> BTreeMap<String, String> {
        let mut all = self.search.clone();
        all.extend(self.path.iter().map(|(k, v)| (k.clone(), v.clone())));
        all
    }
}

impl From<RouteMatch> for TransitionParams {
    fn from(m: RouteMatch) -> Self {
        Self {
            path: m.path_params,
            search: m.search_params,
        }
    }
}

/// What `goto` navigates to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StateTarget {
    Name(String),
    Node(NodeId),
}

impl From<&str> for StateTarget {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for StateTarget {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<&String> for StateTarget {
    fn from(name: &String) -> Self {
        Self::Name(name.clone())
    }
}

impl From<NodeId> for StateTarget {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl fmt::Display for StateTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Node(id) => write!(f, "#{}", id.index()),
        }
    }
}

/// Lifecycle notification of one transition attempt.
#[derive(Debug, Clone)]
pub struct TransitionEvent {
    pub kind: TransitionKind,
    /// Sequence number of the attempt; increases with every `goto`.
    pub attempt: u64,
    /// Fullname of the target state.
    pub to: String,
    /// Fullname of the state active when the attempt started.
    pub from: String,
    pub params: TransitionParams,
    /// Set on `error` notifications.
    pub error: Option<TransitionError>,
    pub timestamp: DateTime<Utc>,
}

impl TransitionEvent {
    pub(crate) fn start(attempt: u64, to: &str, from: &str, params: TransitionParams) -> Self {
        Self {
            kind: TransitionKind::Start,
            attempt,
            to: to.to_string(),
            from: from.to_string(),
            params,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub(crate) fn with_kind(&self, kind: TransitionKind) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
            ..self.clone()
        }
    }

    pub(crate) fn with_error(&self, error: TransitionError) -> Self {
        Self {
            error: Some(error),
            ..self.with_kind(TransitionKind::Error)
        }
    }
}

/// How a `goto` call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The target became current and its views were committed.
    Completed { state: String },
    /// An observer cancelled during `start`.
    Cancelled,
    /// Readiness or commit failed; the previous state stays current.
    Failed(TransitionError),
    /// A newer attempt was issued while this one awaited readiness.
    Superseded,
}

impl TransitionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_params_prefers_path() {
        let params = TransitionParams::new()
            .path_param("post", "1")
            .search_param("post", "9")
            .search_param("page", "2");
        let all = params.all();
        assert_eq!(all.get("post").map(String::as_str), Some("1"));
        assert_eq!(all.get("page").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_error_event_carries_cause() {
        let start = TransitionEvent::start(3, "blog", "root", TransitionParams::new());
        let err = TransitionError::NotReady {
            state: "blog".to_string(),
            reason: "offline".to_string(),
        };
        let event = start.with_error(err.clone());
        assert_eq!(event.kind, TransitionKind::Error);
        assert_eq!(event.attempt, 3);
        assert_eq!(event.error, Some(err));
    }
}
