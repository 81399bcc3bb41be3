//! 状态定义（注册输入）

use std::fmt;
use std::sync::Arc;

use crate::transition::bus::{TransitionControl, TransitionHook};
use crate::transition::types::TransitionEvent;
use crate::view::ViewArgs;

/// 子状态声明
#[derive(Clone, Default)]
pub enum Children {
    /// 未声明：保留已有（包括自动创建的）子状态
    #[default]
    Unspecified,
    /// 显式声明“没有子状态”：丢弃已有子状态
    Discard,
    /// 嵌套定义，按顺序注册到当前状态之下
    Nested(Vec<(String, StateDefinition)>),
}

/// 状态定义
#[derive(Clone, Default)]
pub struct StateDefinition {
    pub route: Option<String>,
    /// 未设置时为 true
    pub reload_on_search: Option<bool>,
    pub on_enter: Option<TransitionHook>,
    pub on_exit: Option<TransitionHook>,
    pub children: Children,
    /// 视图槽绑定，按声明顺序应用
    pub views: Vec<(String, ViewArgs)>,
}

impl StateDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    pub fn reload_on_search(mut self, reload: bool) -> Self {
        self.reload_on_search = Some(reload);
        self
    }

    pub fn on_enter<F>(mut self, hook: F) -> Self
    where
        F: Fn(&TransitionEvent, &mut TransitionControl<'_>) + Send + Sync + 'static,
    {
        self.on_enter = Some(Arc::new(hook));
        self
    }

    pub fn on_exit<F>(mut self, hook: F) -> Self
    where
        F: Fn(&TransitionEvent, &mut TransitionControl<'_>) + Send + Sync + 'static,
    {
        self.on_exit = Some(Arc::new(hook));
        self
    }

    pub fn view(mut self, slot: impl Into<String>, args: impl Into<ViewArgs>) -> Self {
        self.views.push((slot.into(), args.into()));
        self
    }

    pub fn child(mut self, name: impl Into<String>, definition: StateDefinition) -> Self {
        match &mut self.children {
            Children::Nested(children) => children.push((name.into(), definition)),
            _ => self.children = Children::Nested(vec![(name.into(), definition)]),
        }
        self
    }

    pub fn no_children(mut self) -> Self {
        self.children = Children::Discard;
        self
    }
}

impl fmt::Debug for StateDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let children = match &self.children {
            Children::Unspecified => "unspecified".to_string(),
            Children::Discard => "none".to_string(),
            Children::Nested(c) => format!("{} nested", c.len()),
        };
        f.debug_struct("StateDefinition")
            .field("route", &self.route)
            .field("reload_on_search", &self.reload_on_search)
            .field("on_enter", &self.on_enter.is_some())
            .field("on_exit", &self.on_exit.is_some())
            .field("children", &children)
            .field("views", &self.views)
            .finish()
    }
}
