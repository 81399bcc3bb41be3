//! Observer registration and dispatch of transition notifications.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::broadcast;

use super::types::{StateTarget, TransitionEvent, TransitionKind, TransitionParams};
use crate::view::ViewStore;

pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Synchronous observer of transition notifications.
///
/// Also the type of per-state `on_enter`/`on_exit` hooks.
pub type TransitionHook = Arc<dyn Fn(&TransitionEvent, &mut TransitionControl<'_>) + Send + Sync>;

/// What an observer may do while handling a notification.
///
/// `cancel` and `redirect` only take effect during `start`.
pub struct TransitionControl<'a> {
    kind: TransitionKind,
    views: &'a ViewStore,
    cancelled: bool,
    redirect: Option<(StateTarget, TransitionParams)>,
}

impl<'a> TransitionControl<'a> {
    pub(crate) fn new(kind: TransitionKind, views: &'a ViewStore) -> Self {
        Self {
            kind,
            views,
            cancelled: false,
            redirect: None,
        }
    }

    pub fn kind(&self) -> TransitionKind {
        self.kind
    }

    /// The view store. During `between` its writes join the open transaction.
    pub fn views(&self) -> &ViewStore {
        self.views
    }

    pub fn cancel(&mut self) {
        if self.kind != TransitionKind::Start {
            tracing::warn!(kind = ?self.kind, "cancel ignored outside of start");
            return;
        }
        self.cancelled = true;
    }

    /// Abandons the current attempt and navigates to `target` instead.
    pub fn redirect(&mut self, target: impl Into<StateTarget>, params: TransitionParams) {
        let target = target.into();
        if self.kind != TransitionKind::Start {
            tracing::warn!(kind = ?self.kind, %target, "redirect ignored outside of start");
            return;
        }
        self.redirect = Some((target, params));
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn is_redirected(&self) -> bool {
        self.redirect.is_some()
    }

    pub(crate) fn take_redirect(&mut self) -> Option<(StateTarget, TransitionParams)> {
        self.redirect.take()
    }
}

/// Selects which notifications a handler receives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Empty means every kind.
    kinds: Vec<TransitionKind>,
    state_prefix: Option<String>,
}

impl EventFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn kind(kind: TransitionKind) -> Self {
        Self {
            kinds: vec![kind],
            state_prefix: None,
        }
    }

    pub fn with_kind(mut self, kind: TransitionKind) -> Self {
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
        self
    }

    /// Only targets equal to `prefix` or below it.
    pub fn under(mut self, prefix: impl Into<String>) -> Self {
        self.state_prefix = Some(prefix.into());
        self
    }

    pub fn matches(&self, event: &TransitionEvent) -> bool {
        if !self.kinds.is_empty() && !self.kinds.contains(&event.kind) {
            return false;
        }
        match &self.state_prefix {
            None => true,
            Some(prefix) => {
                event.to == *prefix
                    || (event.to.starts_with(prefix.as_str())
                        && event.to[prefix.len()..].starts_with('.'))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Handler {
    id: SubscriptionId,
    filter: EventFilter,
    hook: TransitionHook,
}

/// Ordered list of handlers plus a broadcast mirror for passive listeners.
pub struct TransitionBus {
    handlers: RwLock<Vec<Handler>>,
    next_id: AtomicU64,
    event_tx: broadcast::Sender<TransitionEvent>,
}

impl TransitionBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity.max(1));
        Self {
            handlers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            event_tx,
        }
    }

    /// Handlers run in registration order.
    pub fn on<F>(&self, filter: EventFilter, hook: F) -> SubscriptionId
    where
        F: Fn(&TransitionEvent, &mut TransitionControl<'_>) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Handler {
                id,
                filter,
                hook: Arc::new(hook),
            });
        id
    }

    pub fn off(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        let before = handlers.len();
        handlers.retain(|h| h.id != id);
        handlers.len() != before
    }

    /// Passive listener; cannot cancel or redirect. Lagging receivers lose
    /// the oldest notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<TransitionEvent> {
        self.event_tx.subscribe()
    }

    pub fn handler_count(&self) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Runs matching handlers without holding the lock, so a handler may
    /// register or remove handlers.
    pub(crate) fn dispatch(&self, event: &TransitionEvent, control: &mut TransitionControl<'_>) {
        let matching: Vec<TransitionHook> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|h| h.filter.matches(event))
            .map(|h| h.hook.clone())
            .collect();

        for hook in matching {
            hook(event, control);
        }

        // Fails only when nobody listens.
        let _ = self.event_tx.send(event.clone());
    }
}

impl Default for TransitionBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::view::InlineTemplateResolver;

    fn event(kind: TransitionKind, to: &str) -> TransitionEvent {
        TransitionEvent {
            kind,
            ..TransitionEvent::start(1, to, "root", TransitionParams::new())
        }
    }

    fn store() -> ViewStore {
        ViewStore::new(Arc::new(InlineTemplateResolver))
    }

    #[test]
    fn test_filter_prefix_respects_segments() {
        let filter = EventFilter::all().under("blog");
        assert!(filter.matches(&event(TransitionKind::Start, "blog")));
        assert!(filter.matches(&event(TransitionKind::Start, "blog.recent")));
        assert!(!filter.matches(&event(TransitionKind::Start, "blogroll")));
        assert!(!filter.matches(&event(TransitionKind::Start, "about")));
    }

    #[test]
    fn test_filter_kinds() {
        let filter = EventFilter::kind(TransitionKind::Success).with_kind(TransitionKind::Error);
        assert!(filter.matches(&event(TransitionKind::Success, "a")));
        assert!(filter.matches(&event(TransitionKind::Error, "a")));
        assert!(!filter.matches(&event(TransitionKind::Start, "a")));
    }

    #[test]
    fn test_dispatch_order_and_off() {
        let bus = TransitionBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s1 = seen.clone();
        let first = bus.on(EventFilter::all(), move |_, _| s1.lock().unwrap().push(1));
        let s2 = seen.clone();
        bus.on(EventFilter::all(), move |_, _| s2.lock().unwrap().push(2));

        let views = store();
        let mut control = TransitionControl::new(TransitionKind::Start, &views);
        bus.dispatch(&event(TransitionKind::Start, "a"), &mut control);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);

        assert!(bus.off(first));
        assert!(!bus.off(first));
        bus.dispatch(&event(TransitionKind::Start, "a"), &mut control);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 2]);
    }

    #[test]
    fn test_cancel_only_honored_in_start() {
        let views = store();
        let mut control = TransitionControl::new(TransitionKind::Between, &views);
        control.cancel();
        control.redirect("elsewhere", TransitionParams::new());
        assert!(!control.is_cancelled());
        assert!(!control.is_redirected());

        let mut control = TransitionControl::new(TransitionKind::Start, &views);
        control.cancel();
        assert!(control.is_cancelled());
    }

    #[tokio::test]
    async fn test_dispatch_mirrors_to_subscribers() {
        let bus = TransitionBus::new();
        let mut rx = bus.subscribe();
        let views = store();
        let mut control = TransitionControl::new(TransitionKind::After, &views);
        bus.dispatch(&event(TransitionKind::After, "a"), &mut control);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.kind, TransitionKind::After);
        assert_eq!(received.to, "a");
    }
}
