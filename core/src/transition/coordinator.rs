//! Transition coordinator: drives a navigation from `start` to `after`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::bus::{EventFilter, SubscriptionId, TransitionBus, TransitionControl};
use super::chain::TransitionChain;
use super::phase::{PhaseRules, TransitionPhase};
use super::readiness::{AlwaysReady, Readiness};
use super::types::{
    StateTarget, TransitionEvent, TransitionKind, TransitionOutcome, TransitionParams,
};
use crate::config::TransitionsConfig;
use crate::error::{StateError, TransitionError};
use crate::state::{NodeId, RouteMatch, StateTree};
use crate::view::ViewStore;

/// Single owner of the current state.
///
/// Each `goto` gets a sequence number; only the latest attempt may commit,
/// so an older attempt still awaiting readiness is dropped silently.
pub struct TransitionCoordinator {
    tree: Arc<StateTree>,
    views: ViewStore,
    bus: TransitionBus,
    readiness: Arc<dyn Readiness>,
    config: TransitionsConfig,
    state: Mutex<CoordinatorState>,
    attempts: AtomicU64,
}

struct CoordinatorState {
    current: NodeId,
    params: TransitionParams,
    latest: u64,
    phase: TransitionPhase,
}

/// Result of one attempt inside a redirect chain.
enum Step {
    Finished(TransitionOutcome),
    Redirect(StateTarget, TransitionParams),
}

impl TransitionCoordinator {
    pub fn new(tree: Arc<StateTree>, views: ViewStore) -> Self {
        Self::with_config(tree, views, TransitionsConfig::default())
    }

    pub fn with_config(tree: Arc<StateTree>, views: ViewStore, config: TransitionsConfig) -> Self {
        Self {
            tree,
            views,
            bus: TransitionBus::with_capacity(config.event_capacity),
            readiness: Arc::new(AlwaysReady),
            config,
            state: Mutex::new(CoordinatorState {
                current: NodeId::ROOT,
                params: TransitionParams::default(),
                latest: 0,
                phase: TransitionPhase::Idle,
            }),
            attempts: AtomicU64::new(0),
        }
    }

    pub fn with_readiness(mut self, readiness: Arc<dyn Readiness>) -> Self {
        self.readiness = readiness;
        self
    }

    pub fn tree(&self) -> &StateTree {
        &self.tree
    }

    pub fn views(&self) -> &ViewStore {
        &self.views
    }

    pub fn bus(&self) -> &TransitionBus {
        &self.bus
    }

    /// Registers a transition observer.
    pub fn on<F>(&self, filter: EventFilter, hook: F) -> SubscriptionId
    where
        F: Fn(&TransitionEvent, &mut TransitionControl<'_>) + Send + Sync + 'static,
    {
        self.bus.on(filter, hook)
    }

    pub fn off(&self, id: SubscriptionId) -> bool {
        self.bus.off(id)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TransitionEvent> {
        self.bus.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fullname of the current state; `root` before the first commit.
    pub fn current(&self) -> String {
        let current = self.lock().current;
        self.tree.node(current).fullname().to_string()
    }

    pub fn current_id(&self) -> NodeId {
        self.lock().current
    }

    pub fn current_params(&self) -> TransitionParams {
        self.lock().params.clone()
    }

    /// Phase of the most recent attempt.
    pub fn phase(&self) -> TransitionPhase {
        self.lock().phase
    }

    pub async fn goto(
        &self,
        target: impl Into<StateTarget>,
    ) -> Result<TransitionOutcome, StateError> {
        self.run(target.into(), TransitionParams::default(), false)
            .await
    }

    /// Navigates to `target`.
    ///
    /// Only an unknown target is an `Err`; every other way an attempt ends is
    /// reported as a [`TransitionOutcome`].
    pub async fn goto_with_params(
        &self,
        target: impl Into<StateTarget>,
        params: TransitionParams,
    ) -> Result<TransitionOutcome, StateError> {
        self.run(target.into(), params, false).await
    }

    /// Re-enters the current state with its current parameters, running every
    /// exit and enter hook on its path.
    pub async fn reload(&self) -> Result<TransitionOutcome, StateError> {
        let (current, params) = {
            let state = self.lock();
            (state.current, state.params.clone())
        };
        self.run(StateTarget::Node(current), params, true).await
    }

    /// Applies a route match produced by an external router.
    ///
    /// `None` navigates to the root. Returns `Ok(None)` when the match only
    /// changed search parameters of a state that does not reload on search.
    pub async fn on_route_change(
        &self,
        route: Option<RouteMatch>,
    ) -> Result<Option<TransitionOutcome>, StateError> {
        let Some(route) = route else {
            return self.goto(NodeId::ROOT).await.map(Some);
        };
        let Some(state_name) = route.state.clone() else {
            return self.goto(NodeId::ROOT).await.map(Some);
        };

        let target = self.tree.resolve_id(&state_name)?;
        let params = TransitionParams::from(route);
        {
            let mut state = self.lock();
            if state.current == target
                && state.params.path == params.path
                && !self.tree.node(target).reload_on_search()
            {
                debug!(state = %state_name, "search change absorbed without transition");
                state.params.search = params.search;
                return Ok(None);
            }
        }

        self.run(StateTarget::Node(target), params, false)
            .await
            .map(Some)
    }

    async fn run(
        &self,
        target: StateTarget,
        params: TransitionParams,
        force: bool,
    ) -> Result<TransitionOutcome, StateError> {
        let mut step = self.attempt(target, params, force).await?;
        let mut redirects = 0usize;

        loop {
            match step {
                Step::Finished(outcome) => return Ok(outcome),
                Step::Redirect(target, params) => {
                    redirects += 1;
                    if redirects > self.config.max_redirects {
                        let err = TransitionError::RedirectLimit {
                            limit: self.config.max_redirects,
                        };
                        return Ok(self.fail_redirect(&target, params, err));
                    }
                    step = match self.attempt(target.clone(), params.clone(), false).await {
                        Ok(step) => step,
                        // `start` already fired for this chain
                        Err(err) => return Ok(self.fail_redirect(&target, params, err.into())),
                    };
                }
            }
        }
    }

    fn resolve(&self, target: &StateTarget) -> Result<NodeId, StateError> {
        match target {
            StateTarget::Name(name) => self.tree.resolve_id(name),
            StateTarget::Node(id) => match self.tree.get(*id) {
                Some(node) => Ok(node.id()),
                None => Err(StateError::NotFound {
                    segment: target.to_string(),
                    parent: self.tree.root().fullname().to_string(),
                }),
            },
        }
    }

    /// Claims a new sequence number and makes it the latest attempt.
    fn begin_attempt(&self) -> (u64, NodeId, TransitionParams) {
        let seq = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.lock();
        state.latest = seq;
        state.phase = TransitionPhase::Idle;
        (seq, state.current, state.params.clone())
    }

    fn is_latest(&self, seq: u64) -> bool {
        self.lock().latest == seq
    }

    fn advance(&self, seq: u64, phase: &mut TransitionPhase, next: TransitionPhase) {
        if let Err(err) = PhaseRules::validate(*phase, next) {
            warn!(attempt = seq, error = %err, "unexpected phase change");
        }
        *phase = next;

        let mut state = self.lock();
        if state.latest == seq {
            state.phase = next;
        }
    }

    fn emit(&self, event: &TransitionEvent) {
        let mut control = TransitionControl::new(event.kind, &self.views);
        self.bus.dispatch(event, &mut control);
    }

    async fn attempt(
        &self,
        target: StateTarget,
        params: TransitionParams,
        force: bool,
    ) -> Result<Step, StateError> {
        let to = self.resolve(&target)?;
        let (seq, from, from_params) = self.begin_attempt();
        let mut phase = TransitionPhase::Idle;
        self.advance(seq, &mut phase, TransitionPhase::Resolving);

        let to_name = self.tree.node(to).fullname().to_string();
        let from_name = self.tree.node(from).fullname().to_string();
        let chain = TransitionChain::compute(&self.tree, from, &from_params, to, &params, force);
        let event = TransitionEvent::start(seq, &to_name, &from_name, params.clone());
        debug!(attempt = seq, from = %from_name, to = %to_name, "transition start");

        let (cancelled, redirect) = {
            let mut control = TransitionControl::new(TransitionKind::Start, &self.views);
            self.bus.dispatch(&event, &mut control);
            (control.is_cancelled(), control.take_redirect())
        };
        if let Some((next, next_params)) = redirect {
            self.advance(seq, &mut phase, TransitionPhase::Redirected);
            info!(attempt = seq, from = %to_name, to = %next, "transition redirected");
            return Ok(Step::Redirect(next, next_params));
        }
        if cancelled {
            self.advance(seq, &mut phase, TransitionPhase::Cancelled);
            info!(attempt = seq, to = %to_name, "transition cancelled");
            return Ok(Step::Finished(TransitionOutcome::Cancelled));
        }

        self.advance(seq, &mut phase, TransitionPhase::Awaiting);
        let ready = self.readiness.ready(&to_name, &params).await;
        if !self.is_latest(seq) {
            debug!(attempt = seq, to = %to_name, "transition superseded");
            return Ok(Step::Finished(TransitionOutcome::Superseded));
        }

        let committed = match ready {
            Ok(()) => {
                self.advance(seq, &mut phase, TransitionPhase::Committing);
                self.commit(to, params, &chain, &event)
            }
            Err(err) => Err(err),
        };

        let outcome = match committed {
            Ok(()) => {
                self.advance(seq, &mut phase, TransitionPhase::Done);
                info!(attempt = seq, state = %to_name, "transition completed");
                self.emit(&event.with_kind(TransitionKind::Success));
                TransitionOutcome::Completed { state: to_name }
            }
            Err(err) => {
                self.advance(seq, &mut phase, TransitionPhase::Aborting);
                warn!(attempt = seq, to = %to_name, error = %err, "transition failed");
                self.emit(&event.with_error(err.clone()));
                self.advance(seq, &mut phase, TransitionPhase::Errored);
                TransitionOutcome::Failed(err)
            }
        };

        self.emit(&event.with_kind(TransitionKind::After));
        Ok(Step::Finished(outcome))
    }

    /// Makes `to` current and applies its views in one view transaction.
    ///
    /// Exit hooks run deepest first, then `between` observers, then enter
    /// hooks shallowest first. Their view writes join the same transaction.
    fn commit(
        &self,
        to: NodeId,
        params: TransitionParams,
        chain: &TransitionChain,
        event: &TransitionEvent,
    ) -> Result<(), TransitionError> {
        let transaction = self
            .views
            .begin_update()
            .map_err(|e| TransitionError::ViewStore(e.to_string()))?;

        {
            let mut state = self.lock();
            state.current = to;
            state.params = params;
        }

        if self.config.clear_unbound_views {
            self.views.clear_all();
        }
        let node = self.tree.node(to);
        for (slot, args) in node.views() {
            if let Err(err) = self.views.set_or_update(slot, args.clone()) {
                warn!(state = %node.fullname(), slot = %slot, error = %err, "view binding skipped");
            }
        }

        let between = event.with_kind(TransitionKind::Between);
        let mut control = TransitionControl::new(TransitionKind::Between, &self.views);
        for id in &chain.exits {
            if let Some(hook) = self.tree.node(*id).on_exit() {
                hook(&between, &mut control);
            }
        }
        self.bus.dispatch(&between, &mut control);
        for id in &chain.enters {
            if let Some(hook) = self.tree.node(*id).on_enter() {
                hook(&between, &mut control);
            }
        }

        transaction.commit();
        Ok(())
    }

    /// Ends a redirect chain that cannot continue with `error` and `after`.
    fn fail_redirect(
        &self,
        target: &StateTarget,
        params: TransitionParams,
        err: TransitionError,
    ) -> TransitionOutcome {
        let (seq, from, _) = self.begin_attempt();
        let from_name = self.tree.node(from).fullname().to_string();
        let event = TransitionEvent::start(seq, &target.to_string(), &from_name, params);
        warn!(attempt = seq, to = %target, error = %err, "redirect chain failed");

        self.lock().phase = TransitionPhase::Errored;
        self.emit(&event.with_error(err.clone()));
        self.emit(&event.with_kind(TransitionKind::After));
        TransitionOutcome::Failed(err)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use super::*;
    use crate::state::StateDefinition;
    use crate::view::{InlineTemplateResolver, TemplateSource, ViewArgs};

    fn coordinator() -> TransitionCoordinator {
        let mut tree = StateTree::new();
        tree.register(
            "home",
            StateDefinition::new()
                .route("/")
                .view("main", ViewArgs::new(TemplateSource::inline("<home/>"))),
        )
        .unwrap();
        tree.register(
            "about",
            StateDefinition::new()
                .route("/about")
                .view("main", ViewArgs::new(TemplateSource::inline("<about/>"))),
        )
        .unwrap();
        let views = ViewStore::new(Arc::new(InlineTemplateResolver));
        TransitionCoordinator::new(Arc::new(tree), views)
    }

    #[tokio::test]
    async fn test_goto_commits_views_and_current() {
        let coordinator = coordinator();
        assert_eq!(coordinator.current(), "root");

        let outcome = coordinator.goto("home").await.unwrap();
        assert_eq!(
            outcome,
            TransitionOutcome::Completed {
                state: "home".to_string()
            }
        );
        assert_eq!(coordinator.current(), "home");
        assert_eq!(coordinator.phase(), TransitionPhase::Done);

        let main = coordinator.views().get("main").unwrap();
        assert_eq!(main.template.clone().await.unwrap().as_ref(), "<home/>");
    }

    #[tokio::test]
    async fn test_unknown_target_is_err_and_emits_nothing() {
        let coordinator = coordinator();
        let mut rx = coordinator.subscribe();
        let err = coordinator.goto("missing").await.unwrap_err();
        assert!(matches!(err, StateError::NotFound { .. }));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_redirect_loop_hits_limit() {
        let coordinator = coordinator();
        coordinator.on(EventFilter::kind(TransitionKind::Start), |event, control| {
            let next = if event.to == "home" { "about" } else { "home" };
            control.redirect(next, TransitionParams::new());
        });

        let outcome = coordinator.goto("home").await.unwrap();
        assert_eq!(
            outcome,
            TransitionOutcome::Failed(TransitionError::RedirectLimit { limit: 16 })
        );
        assert_eq!(coordinator.current(), "root");
        assert_eq!(coordinator.phase(), TransitionPhase::Errored);
    }

    #[tokio::test]
    async fn test_events_in_lifecycle_order() {
        let coordinator = coordinator();
        let kinds = Arc::new(StdMutex::new(Vec::new()));
        let sink = kinds.clone();
        coordinator.on(EventFilter::all(), move |event, _| {
            sink.lock().unwrap().push(event.kind);
        });

        coordinator.goto("about").await.unwrap();
        assert_eq!(
            *kinds.lock().unwrap(),
            vec![
                TransitionKind::Start,
                TransitionKind::Between,
                TransitionKind::Success,
                TransitionKind::After
            ]
        );
    }
}
