//! ServicesFactory 实现：从配置构建模板解析器与路由表，供 CLI 复用。
use std::sync::Arc;

use async_trait::async_trait;
use staterail_core::api::{AppConfig, Services, ServicesFactory};

use crate::factory;
use crate::route::RouteTable;

/// Builds file-backed templates and a shared [`RouteTable`].
///
/// The table is kept so callers can match URLs against the routes the state
/// tree registers into it.
pub struct PluginServicesFactory {
    routes: Arc<RouteTable>,
}

impl Default for PluginServicesFactory {
    fn default() -> Self {
        Self {
            routes: factory::build_route_table(),
        }
    }
}

impl PluginServicesFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route_table(&self) -> Arc<RouteTable> {
        self.routes.clone()
    }
}

#[async_trait]
impl ServicesFactory for PluginServicesFactory {
    async fn build_services(&self, cfg: &AppConfig) -> anyhow::Result<Services> {
        Ok(Services {
            template_resolver: factory::build_template_resolver(cfg),
            route_registry: Some(self.routes.clone()),
            readiness: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use staterail_core::api::{AppContext, StatesConfig};

    #[tokio::test]
    async fn test_context_routes_flow_into_table() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("post.html"), "<post/>").unwrap();

        let mut cfg = AppConfig::default();
        cfg.templates.base_dir = dir.path().to_string_lossy().to_string();
        let states: StatesConfig = blog_states();

        let services = Arc::new(PluginServicesFactory::new());
        let table = services.route_table();
        let ctx = AppContext::new(cfg, &states, Some(services)).await.unwrap();

        let m = table.match_path("/blog/7").unwrap();
        assert_eq!(m.state.as_deref(), Some("blog.post"));

        let outcome = ctx.coordinator().on_route_change(Some(m)).await.unwrap();
        assert!(outcome.unwrap().is_completed());
        let slot = ctx.views().get("main").unwrap();
        assert_eq!(slot.template.await.unwrap().as_ref(), "<post/>");
    }

    fn blog_states() -> StatesConfig {
        let mut states = StatesConfig::default();
        let mut blog = staterail_core::api::StateConfig {
            route: Some("/blog".to_string()),
            ..Default::default()
        };
        blog.children.insert(
            "post".to_string(),
            staterail_core::api::StateConfig {
                route: Some("/:post".to_string()),
                views: [(
                    "main".to_string(),
                    staterail_core::api::ViewConfig {
                        template: Some("post.html".to_string()),
                        ..Default::default()
                    },
                )]
                .into(),
                ..Default::default()
            },
        );
        states.states.insert("blog".to_string(), blog);
        states
    }
}
