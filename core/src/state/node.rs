//! 状态节点

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::transition::bus::TransitionHook;
use crate::view::ViewArgs;

/// 节点在状态树 arena 中的下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// 状态树中的一个节点
#[derive(Clone)]
pub struct StateNode {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) fullname: String,
    pub(crate) parent: Option<NodeId>,
    /// 子节点（按注册顺序）
    pub(crate) children: Vec<(String, NodeId)>,
    /// 自身声明的路由片段
    pub(crate) fragment: Option<String>,
    /// 组合后的完整路由
    pub(crate) route: Option<String>,
    pub(crate) param_names: Vec<String>,
    pub(crate) reload_on_search: bool,
    pub(crate) on_enter: Option<TransitionHook>,
    pub(crate) on_exit: Option<TransitionHook>,
    pub(crate) views: Vec<(String, ViewArgs)>,
}

impl StateNode {
    pub(crate) fn new(id: NodeId, name: &str, fullname: String, parent: Option<NodeId>) -> Self {
        Self {
            id,
            name: name.to_string(),
            fullname,
            parent,
            children: Vec::new(),
            fragment: None,
            route: None,
            param_names: Vec::new(),
            reload_on_search: true,
            on_enter: None,
            on_exit: None,
            views: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fullname(&self) -> &str {
        &self.fullname
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn child(&self, name: &str) -> Option<NodeId> {
        self.children
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| *id)
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, NodeId)> + '_ {
        self.children.iter().map(|(n, id)| (n.as_str(), *id))
    }

    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    pub fn reload_on_search(&self) -> bool {
        self.reload_on_search
    }

    pub fn on_enter(&self) -> Option<&TransitionHook> {
        self.on_enter.as_ref()
    }

    pub fn on_exit(&self) -> Option<&TransitionHook> {
        self.on_exit.as_ref()
    }

    pub fn views(&self) -> &[(String, ViewArgs)] {
        &self.views
    }
}

impl fmt::Debug for StateNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateNode")
            .field("id", &self.id)
            .field("fullname", &self.fullname)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("fragment", &self.fragment)
            .field("route", &self.route)
            .field("param_names", &self.param_names)
            .field("reload_on_search", &self.reload_on_search)
            .field("views", &self.views.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
