//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `staterail_core::api` instead of reaching into internal modules.

pub use crate::config::{
    get_staterail_data_dir, load_default, load_from_path, load_states, AppConfig, LoggingConfig,
    StateConfig, StatesConfig, TemplatesConfig, TransitionsConfig, ViewConfig, ViewsConfig,
};
pub use crate::context::{AppContext, Services, ServicesFactory};
pub use crate::error::{ErrorCode, StateError, TemplateError, TransitionError, ViewError};
pub use crate::state::{
    compose_route, param_names, Children, NodeId, RouteBinding, RouteMatch, RouteMeta,
    RouteRegistry, StateDefinition, StateNode, StateTree,
};
pub use crate::transition::{
    AlwaysReady, EventFilter, Readiness, StateTarget, SubscriptionId, TransitionControl,
    TransitionCoordinator, TransitionEvent, TransitionKind, TransitionOutcome, TransitionParams,
    TransitionPhase,
};
pub use crate::view::{
    InlineTemplateResolver, RefreshPayload, TemplateFuture, TemplateResolver, TemplateSource,
    ViewArgs, ViewEvent, ViewSlot, ViewStore, ViewTransaction,
};
pub use crate::view::template::{failed, ready};
