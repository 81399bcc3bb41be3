use std::num::NonZeroUsize;
use std::sync::Arc;

use staterail_core::api::{AppConfig, TemplateResolver};

use crate::route::RouteTable;
use crate::template::{CachingTemplateResolver, FileTemplateResolver};

pub fn build_template_resolver(cfg: &AppConfig) -> Arc<dyn TemplateResolver> {
    let file: Arc<dyn TemplateResolver> =
        Arc::new(FileTemplateResolver::new(cfg.templates.base_dir.clone()));

    match NonZeroUsize::new(cfg.templates.cache_capacity) {
        Some(capacity) => Arc::new(CachingTemplateResolver::new(file, capacity)),
        // A zero capacity disables caching.
        None => file,
    }
}

pub fn build_route_table() -> Arc<RouteTable> {
    Arc::new(RouteTable::new())
}
