//! 路由组合与参数提取

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    // `/:name`, `/{name}` 或 `/{conv(arg):name}`；参数名在第 3 或第 9 组
    static ref PARAM_RE: Regex =
        Regex::new(r"/((:(\w+))|(\{((\w+)(\((.*?)\))?:)?(\w+)\}))").unwrap();
}

/// 将状态自身的路由片段接到最近祖先的路由之后
///
/// 祖先路由末尾的 `/` 会被去掉，片段缺少前导 `/` 时会补上。空片段沿用祖先路由。
pub fn compose_route(parent_route: &str, fragment: &str) -> String {
    if fragment.is_empty() {
        return parent_route.to_string();
    }

    let mut route = parent_route
        .strip_suffix('/')
        .unwrap_or(parent_route)
        .to_string();
    if !fragment.starts_with('/') {
        route.push('/');
    }
    route.push_str(fragment);
    route
}

/// 按从左到右的顺序提取路由模式中的参数名
pub fn param_names(pattern: &str) -> Vec<String> {
    PARAM_RE
        .captures_iter(pattern)
        .filter_map(|c| c.get(3).or_else(|| c.get(9)))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// 路由注册时附带的元数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteMeta {
    /// 目标状态的完整名称
    pub state: String,
    pub reload_on_search: bool,
}

/// 已注册的路由
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteBinding {
    pub pattern: String,
    pub meta: RouteMeta,
}

/// 路由匹配器的输出
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteMatch {
    pub state: Option<String>,
    pub path_params: BTreeMap<String, String>,
    pub search_params: BTreeMap<String, String>,
}

/// 外部路由匹配器的注册接口
pub trait RouteRegistry: Send + Sync {
    fn register(&self, pattern: &str, meta: RouteMeta);

    /// 移除绑定到 `state` 的路由（若存在）
    fn unregister(&self, state: &str);
}
