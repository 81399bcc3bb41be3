//! Which states a transition exits and enters.

use super::types::TransitionParams;
use crate::state::{NodeId, StateNode, StateTree};

/// Exit list (deepest first) and enter list (shallowest first).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionChain {
    pub exits: Vec<NodeId>,
    pub enters: Vec<NodeId>,
}

impl TransitionChain {
    /// States shared by both paths stay active unless one of their own path
    /// parameters changed. `force` re-enters the whole target path.
    pub fn compute(
        tree: &StateTree,
        from: NodeId,
        from_params: &TransitionParams,
        to: NodeId,
        to_params: &TransitionParams,
        force: bool,
    ) -> Self {
        let from_path = tree.path_to(from);
        let to_path = tree.path_to(to);

        let mut shared = 0;
        if !force {
            while shared < from_path.len()
                && shared < to_path.len()
                && from_path[shared] == to_path[shared]
                && !params_changed(tree.node(to_path[shared]), from_params, to_params)
            {
                shared += 1;
            }
        }

        Self {
            exits: from_path[shared..].iter().rev().copied().collect(),
            enters: to_path[shared..].to_vec(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.exits.is_empty() && self.enters.is_empty()
    }
}

fn params_changed(node: &StateNode, a: &TransitionParams, b: &TransitionParams) -> bool {
    node.param_names()
        .iter()
        .any(|name| a.path.get(name) != b.path.get(name))
}
