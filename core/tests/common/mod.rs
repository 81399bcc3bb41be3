#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use staterail_core::api::{
    EventFilter, InlineTemplateResolver, Readiness, StateDefinition, StateTree, TemplateSource,
    TransitionCoordinator, TransitionError, TransitionEvent, TransitionKind, TransitionParams,
    ViewArgs, ViewEvent, ViewStore,
};
use tokio::sync::{broadcast, Notify};

pub fn store() -> ViewStore {
    ViewStore::new(Arc::new(InlineTemplateResolver))
}

pub fn inline(html: &str) -> ViewArgs {
    ViewArgs::new(TemplateSource::inline(html))
}

pub async fn template_of(views: &ViewStore, slot: &str) -> Option<String> {
    let slot = views.get(slot)?;
    slot.template.await.ok().map(|html| html.to_string())
}

/// Everything currently buffered in the receiver.
pub fn drain<T: Clone>(rx: &mut broadcast::Receiver<T>) -> Vec<T> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}

pub fn names(events: &[ViewEvent]) -> Vec<String> {
    events.iter().map(|e| e.name().to_string()).collect()
}

/// blog (main, sidebar) > blog.post (/:post, main) ; about (main)
pub fn blog_tree() -> StateTree {
    let mut tree = StateTree::new();
    tree.register(
        "blog",
        StateDefinition::new()
            .route("/blog")
            .view("main", inline("<blog/>"))
            .view("sidebar", inline("<categories/>")),
    )
    .unwrap();
    tree.register(
        "blog.post",
        StateDefinition::new()
            .route("/:post")
            .view("main", inline("<post/>")),
    )
    .unwrap();
    tree.register(
        "about",
        StateDefinition::new()
            .route("/about")
            .view("main", inline("<about/>")),
    )
    .unwrap();
    tree
}

pub fn coordinator(tree: StateTree) -> TransitionCoordinator {
    TransitionCoordinator::new(Arc::new(tree), store())
}

/// Records `(kind, to)` of every lifecycle notification.
pub fn record_events(
    coordinator: &TransitionCoordinator,
) -> Arc<Mutex<Vec<(TransitionKind, String)>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    coordinator.on(EventFilter::all(), move |event: &TransitionEvent, _| {
        sink.lock().unwrap().push((event.kind, event.to.clone()));
    });
    seen
}

pub fn kinds(seen: &Mutex<Vec<(TransitionKind, String)>>) -> Vec<TransitionKind> {
    seen.lock().unwrap().iter().map(|(k, _)| *k).collect()
}

/// Fails every state.
pub struct NeverReady;

#[async_trait]
impl Readiness for NeverReady {
    async fn ready(&self, state: &str, _params: &TransitionParams) -> Result<(), TransitionError> {
        Err(TransitionError::NotReady {
            state: state.to_string(),
            reason: "dependency failed".to_string(),
        })
    }
}

/// Blocks readiness of one state until released.
pub struct GatedReadiness {
    pub state: String,
    pub entered: Notify,
    pub release: Notify,
}

impl GatedReadiness {
    pub fn new(state: &str) -> Arc<Self> {
        Arc::new(Self {
            state: state.to_string(),
            entered: Notify::new(),
            release: Notify::new(),
        })
    }
}

#[async_trait]
impl Readiness for GatedReadiness {
    async fn ready(&self, state: &str, _params: &TransitionParams) -> Result<(), TransitionError> {
        if state == self.state {
            self.entered.notify_one();
            self.release.notified().await;
        }
        Ok(())
    }
}
