//! 状态树：注册、名称解析与路由组合

use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;

use super::definition::{Children, StateDefinition};
use super::node::{NodeId, StateNode};
use super::route::{compose_route, param_names, RouteBinding, RouteMeta, RouteRegistry};
use crate::error::StateError;

lazy_static! {
    // 每一段都是标识符：不能以数字开头
    static ref NAME_RE: Regex = Regex::new(r"^[A-Za-z_]\w*(\.[A-Za-z_]\w*)*$").unwrap();
}

const ROOT_NAME: &str = "root";

/// 状态树
///
/// 节点保存在 arena 中，父子关系以 [`NodeId`] 表示；另有 fullname -> id 索引。
/// 配置阶段构建，之后只读。
pub struct StateTree {
    nodes: Vec<StateNode>,
    index: HashMap<String, NodeId>,
    routes: Vec<RouteBinding>,
    registry: Option<Arc<dyn RouteRegistry>>,
}

impl std::fmt::Debug for StateTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateTree")
            .field("nodes", &self.nodes.len())
            .field("index", &self.index)
            .field("routes", &self.routes)
            .field("registry", &self.registry.is_some())
            .finish()
    }
}

impl StateTree {
    /// 创建只包含根节点的状态树
    pub fn new() -> Self {
        let root = StateNode::new(NodeId::ROOT, ROOT_NAME, ROOT_NAME.to_string(), None);
        let mut index = HashMap::new();
        index.insert(ROOT_NAME.to_string(), NodeId::ROOT);

        Self {
            nodes: vec![root],
            index,
            routes: Vec::new(),
            registry: None,
        }
    }

    /// 创建状态树，并把每条状态路由同时注册到外部路由匹配器
    pub fn with_route_registry(registry: Arc<dyn RouteRegistry>) -> Self {
        Self {
            registry: Some(registry),
            ..Self::new()
        }
    }

    /// 注册（或合并）一个以点分隔命名的状态
    ///
    /// 缺失的中间节点会自动创建；重复注册同一名称时合并字段，已有子节点保留。
    pub fn register(
        &mut self,
        name: &str,
        definition: StateDefinition,
    ) -> Result<NodeId, StateError> {
        let name = match name.strip_prefix("root.") {
            Some(rest) => rest,
            None => name,
        };
        self.register_path(NodeId::ROOT, name, definition)
    }

    fn register_path(
        &mut self,
        from: NodeId,
        name: &str,
        definition: StateDefinition,
    ) -> Result<NodeId, StateError> {
        if !NAME_RE.is_match(name) || name == ROOT_NAME {
            return Err(StateError::InvalidName(name.to_string()));
        }

        let (parents, leaf) = match name.rsplit_once('.') {
            Some((parents, leaf)) => (Some(parents), leaf),
            None => (None, name),
        };

        if definition.views.iter().any(|(slot, _)| slot.trim().is_empty()) {
            return Err(StateError::EmptyViewName {
                state: name.to_string(),
            });
        }

        let mut at = from;
        if let Some(parents) = parents {
            for segment in parents.split('.') {
                at = self.ensure_child(at, segment);
            }
        }

        self.register_at(at, leaf, definition)
    }

    fn register_at(
        &mut self,
        parent: NodeId,
        name: &str,
        definition: StateDefinition,
    ) -> Result<NodeId, StateError> {
        let id = self.ensure_child(parent, name);
        let StateDefinition {
            route,
            reload_on_search,
            on_enter,
            on_exit,
            children,
            views,
        } = definition;

        let node = &mut self.nodes[id.0];
        node.reload_on_search = reload_on_search.unwrap_or(true);
        if on_enter.is_some() {
            node.on_enter = on_enter;
        }
        if on_exit.is_some() {
            node.on_exit = on_exit;
        }
        if !views.is_empty() {
            node.views = views;
        }
        let fullname = node.fullname.clone();

        if let Some(fragment) = route {
            node.fragment = Some(fragment);
            if self.apply_route(id) {
                self.rebase_subtree(id);
            }
        }

        tracing::debug!(
            state = %fullname,
            route = ?self.nodes[id.0].route,
            "state registered"
        );

        match children {
            Children::Unspecified => {}
            Children::Discard => self.discard_children(id),
            Children::Nested(children) => {
                for (child_name, child) in children {
                    self.register_path(id, &child_name, child)?;
                }
            }
        }

        Ok(id)
    }

    /// 按自身片段与祖先路由重新组合；返回组合结果是否变化
    fn apply_route(&mut self, id: NodeId) -> bool {
        let Some(fragment) = self.nodes[id.0].fragment.clone() else {
            return false;
        };
        let parent_route = match self.nodes[id.0].parent {
            Some(parent) => self.ancestor_route(parent),
            None => String::new(),
        };
        let pattern = compose_route(&parent_route, &fragment);

        let node = &mut self.nodes[id.0];
        let changed = node.route.as_deref() != Some(pattern.as_str());
        node.route = Some(pattern.clone());
        node.param_names = param_names(&fragment);
        let (fullname, reload_on_search) = (node.fullname.clone(), node.reload_on_search);
        self.bind_route(pattern, &fullname, reload_on_search);
        changed
    }

    /// 祖先路由变化后，子树中所有声明了片段的节点都要重新组合
    fn rebase_subtree(&mut self, id: NodeId) {
        let children: Vec<NodeId> = self.nodes[id.0].children.iter().map(|(_, c)| *c).collect();
        for child in children {
            self.apply_route(child);
            self.rebase_subtree(child);
        }
    }

    fn bind_route(&mut self, pattern: String, state: &str, reload_on_search: bool) {
        let meta = RouteMeta {
            state: state.to_string(),
            reload_on_search,
        };
        if let Some(registry) = &self.registry {
            registry.register(&pattern, meta.clone());
        }
        self.routes.retain(|r| r.meta.state != state);
        self.routes.push(RouteBinding { pattern, meta });
    }

    fn ensure_child(&mut self, parent: NodeId, name: &str) -> NodeId {
        if let Some(id) = self.nodes[parent.0].child(name) {
            return id;
        }

        let fullname = if parent == NodeId::ROOT {
            name.to_string()
        } else {
            format!("{}.{}", self.nodes[parent.0].fullname, name)
        };

        let id = NodeId(self.nodes.len());
        self.nodes
            .push(StateNode::new(id, name, fullname.clone(), Some(parent)));
        self.nodes[parent.0].children.push((name.to_string(), id));
        self.index.insert(fullname, id);
        id
    }

    /// 向上查找最近一个定义了路由的节点
    fn ancestor_route(&self, mut at: NodeId) -> String {
        loop {
            let node = &self.nodes[at.0];
            if let Some(route) = &node.route {
                return route.clone();
            }
            match node.parent {
                Some(parent) => at = parent,
                None => return String::new(),
            }
        }
    }

    fn discard_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for (_, child) in children {
            self.unindex(child);
        }
    }

    fn unindex(&mut self, id: NodeId) {
        let fullname = self.nodes[id.0].fullname.clone();
        self.index.remove(&fullname);
        if self.nodes[id.0].route.is_some() {
            if let Some(registry) = &self.registry {
                registry.unregister(&fullname);
            }
            self.routes.retain(|r| r.meta.state != fullname);
        }

        let children: Vec<NodeId> = self.nodes[id.0].children.iter().map(|(_, c)| *c).collect();
        for child in children {
            self.unindex(child);
        }
    }

    /// 解析点分隔名称；可带前缀 `root`
    pub fn resolve(&self, dotted: &str) -> Result<&StateNode, StateError> {
        self.resolve_id(dotted).map(|id| &self.nodes[id.0])
    }

    pub fn resolve_id(&self, dotted: &str) -> Result<NodeId, StateError> {
        let mut segments = dotted.split('.').peekable();
        if segments.peek() == Some(&ROOT_NAME) {
            segments.next();
        }

        let mut current = &self.nodes[NodeId::ROOT.0];
        for segment in segments {
            match current.child(segment) {
                Some(id) => current = &self.nodes[id.0],
                None => {
                    return Err(StateError::NotFound {
                        segment: segment.to_string(),
                        parent: current.fullname.clone(),
                    })
                }
            }
        }
        Ok(current.id)
    }

    /// 通过完整名称索引查找（不做逐段解析）
    pub fn find(&self, fullname: &str) -> Option<NodeId> {
        self.index.get(fullname).copied()
    }

    pub fn root(&self) -> &StateNode {
        &self.nodes[NodeId::ROOT.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&StateNode> {
        self.nodes.get(id.0)
    }

    /// 按 id 取节点；id 只能来自本树
    pub fn node(&self, id: NodeId) -> &StateNode {
        &self.nodes[id.0]
    }

    /// 从根（不含）到 `id`（含）的路径，浅层在前
    pub fn path_to(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(at) = current {
            let node = &self.nodes[at.0];
            if node.is_root() {
                break;
            }
            path.push(at);
            current = node.parent;
        }
        path.reverse();
        path
    }

    /// 深度优先遍历所有可达节点（含根），返回 (深度, id)
    pub fn walk(&self) -> Vec<(usize, NodeId)> {
        let mut out = Vec::new();
        let mut stack = vec![(0usize, NodeId::ROOT)];
        while let Some((depth, id)) = stack.pop() {
            out.push((depth, id));
            for (_, child) in self.nodes[id.0].children.iter().rev() {
                stack.push((depth + 1, *child));
            }
        }
        out
    }

    /// 已注册的路由（按注册顺序）
    pub fn routes(&self) -> &[RouteBinding] {
        &self.routes
    }

    /// 可达状态数（不含根）
    pub fn len(&self) -> usize {
        self.index.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for StateTree {
    fn default() -> Self {
        Self::new()
    }
}
