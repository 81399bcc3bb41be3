//! # 状态树模块
//!
//! 负责登记分层命名的状态，解析点分隔名称，并计算组合路由与参数列表。
//!
//! ## 设计原则
//!
//! 1. **arena 存储**：节点按下标存放，父子关系用 id 表示，避免循环所有权
//! 2. **配置期构建**：注册只发生在启动阶段，运行期只读
//! 3. **合并注册**：重复注册同名状态只合并字段，不丢弃已有子状态

pub mod definition;
pub mod node;
pub mod route;
pub mod tree;

pub use definition::{Children, StateDefinition};
pub use node::{NodeId, StateNode};
pub use route::{compose_route, param_names, RouteBinding, RouteMatch, RouteMeta, RouteRegistry};
pub use tree::StateTree;
