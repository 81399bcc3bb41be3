use std::sync::Arc;

use crate::config::{AppConfig, StatesConfig};
use crate::state::{RouteRegistry, StateTree};
use crate::transition::{Readiness, TransitionCoordinator};
use crate::view::{InlineTemplateResolver, TemplateResolver, ViewStore};

/// Pluggable collaborators of the router.
#[derive(Clone)]
pub struct Services {
    pub template_resolver: Arc<dyn TemplateResolver>,
    pub route_registry: Option<Arc<dyn RouteRegistry>>,
    pub readiness: Option<Arc<dyn Readiness>>,
}

impl Default for Services {
    fn default() -> Self {
        Self {
            template_resolver: Arc::new(InlineTemplateResolver),
            route_registry: None,
            readiness: None,
        }
    }
}

#[async_trait::async_trait]
pub trait ServicesFactory: Send + Sync {
    async fn build_services(&self, cfg: &AppConfig) -> anyhow::Result<Services>;
}

/// A fully wired router: state tree, view store and coordinator.
#[derive(Clone)]
pub struct AppContext {
    cfg: AppConfig,
    services: Services,
    coordinator: Arc<TransitionCoordinator>,
}

impl AppContext {
    pub async fn new(
        cfg: AppConfig,
        states: &StatesConfig,
        services_factory: Option<Arc<dyn ServicesFactory>>,
    ) -> anyhow::Result<Self> {
        let services = match services_factory {
            Some(factory) => factory.build_services(&cfg).await?,
            None => Services::default(),
        };
        let tree = states.build_tree(services.route_registry.clone())?;
        Ok(Self::from_parts(cfg, services, tree))
    }

    pub fn from_parts(cfg: AppConfig, services: Services, tree: StateTree) -> Self {
        let views = ViewStore::with_capacity(
            services.template_resolver.clone(),
            cfg.views.event_capacity,
        );
        let mut coordinator =
            TransitionCoordinator::with_config(Arc::new(tree), views, cfg.transitions.clone());
        if let Some(readiness) = services.readiness.clone() {
            coordinator = coordinator.with_readiness(readiness);
        }
        tracing::debug!(states = coordinator.tree().len(), "router context ready");

        Self {
            cfg,
            services,
            coordinator: Arc::new(coordinator),
        }
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.cfg
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn coordinator(&self) -> Arc<TransitionCoordinator> {
        self.coordinator.clone()
    }

    pub fn tree(&self) -> &StateTree {
        self.coordinator.tree()
    }

    pub fn views(&self) -> &ViewStore {
        self.coordinator.views()
    }
}
