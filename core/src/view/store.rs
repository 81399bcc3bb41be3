//! Named slot store with transactional buffering.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::broadcast;

use super::events::{RefreshPayload, ViewEvent};
use super::slot::{ViewArgs, ViewSlot};
use super::template::TemplateResolver;
use super::transaction::{SlotOp, TransactionLog, ViewTransaction};
use crate::error::ViewError;

pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Store of named view slots.
///
/// Cheap to clone; clones share the same slots, transaction and channel.
/// While a transaction is open every write from any clone is buffered and
/// nothing is broadcast until commit.
#[derive(Clone)]
pub struct ViewStore {
    inner: Arc<ViewStoreInner>,
}

struct ViewStoreInner {
    resolver: Arc<dyn TemplateResolver>,
    state: Mutex<StoreState>,
    event_tx: broadcast::Sender<ViewEvent>,
    next_transaction: AtomicU64,
}

#[derive(Default)]
struct StoreState {
    /// Committed slots in insertion order.
    slots: Vec<ViewSlot>,
    transaction: Option<TransactionLog>,
}

impl StoreState {
    fn position(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.name == name)
    }
}

fn ensure_name(name: &str) -> Result<(), ViewError> {
    if name.trim().is_empty() {
        return Err(ViewError::MissingName);
    }
    Ok(())
}

impl ViewStore {
    pub fn new(resolver: Arc<dyn TemplateResolver>) -> Self {
        Self::with_capacity(resolver, DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_capacity(resolver: Arc<dyn TemplateResolver>, capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity.max(1));

        let inner = ViewStoreInner {
            resolver,
            state: Mutex::new(StoreState::default()),
            event_tx,
            next_transaction: AtomicU64::new(0),
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Subscribes to update and refresh notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.inner.event_tx.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: ViewEvent) {
        tracing::trace!(slot = event.name(), refresh = event.is_refresh(), "view event");
        let _ = self.inner.event_tx.send(event);
    }

    /// Records `op` into the open transaction, or hands it back for immediate
    /// application when none is open.
    fn divert(&self, name: &str, op: SlotOp) -> Option<SlotOp> {
        let mut state = self.lock();
        match state.transaction.as_mut() {
            Some(log) => {
                tracing::trace!(transaction = log.id, slot = name, op = ?op, "buffered view op");
                log.record(name, op);
                None
            }
            None => Some(op),
        }
    }

    fn submit(&self, name: &str, op: SlotOp) -> Result<(), ViewError> {
        ensure_name(name)?;
        if let Some(op) = self.divert(name, op) {
            self.apply(name, op);
        }
        Ok(())
    }

    /// Sets the slot, or updates it and bumps its version. A write carrying the
    /// slot's current sticky tag is absorbed into a refresh instead.
    pub fn set_or_update(&self, name: &str, args: impl Into<ViewArgs>) -> Result<(), ViewError> {
        self.submit(name, SlotOp::SetOrUpdate(args.into()))
    }

    /// Sets the slot only if it does not exist (never set, or cleared).
    pub fn set_if_absent(&self, name: &str, args: impl Into<ViewArgs>) -> Result<(), ViewError> {
        self.submit(name, SlotOp::SetIfAbsent(args.into()))
    }

    /// Removes the slot and notifies, whether or not it existed.
    pub fn clear(&self, name: &str) -> Result<(), ViewError> {
        self.submit(name, SlotOp::Clear)
    }

    /// Clears every committed slot, one notification each, in store order.
    pub fn clear_all(&self) {
        for name in self.names() {
            if let Some(op) = self.divert(&name, SlotOp::Clear) {
                self.apply(&name, op);
            }
        }
    }

    /// Fires a refresh carrying the slot's locals merged with `data`. Nothing
    /// stored changes. A missing slot still gets the notification.
    pub fn refresh(&self, name: &str, data: Option<Value>) -> Result<(), ViewError> {
        self.submit(name, SlotOp::Refresh(data.map(Arc::new)))
    }

    /// Refreshes every committed slot with one shared `data` value.
    pub fn refresh_all(&self, data: Option<Value>) {
        let data = data.map(Arc::new);
        for name in self.names() {
            if let Some(op) = self.divert(&name, SlotOp::Refresh(data.clone())) {
                self.apply(&name, op);
            }
        }
    }

    /// Committed state of a slot. Buffered writes are not visible.
    pub fn get(&self, name: &str) -> Option<ViewSlot> {
        let state = self.lock();
        state.position(name).map(|i| state.slots[i].clone())
    }

    /// Every committed slot in store order.
    pub fn all(&self) -> Vec<ViewSlot> {
        self.lock().slots.clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.lock().slots.iter().map(|s| s.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().slots.is_empty()
    }

    pub fn in_transaction(&self) -> bool {
        self.lock().transaction.is_some()
    }

    /// Opens the single store-wide transaction.
    pub fn begin_update(&self) -> Result<ViewTransaction, ViewError> {
        let mut state = self.lock();
        if state.transaction.is_some() {
            return Err(ViewError::TransactionInProgress);
        }

        let id = self.inner.next_transaction.fetch_add(1, Ordering::SeqCst) + 1;
        state.transaction = Some(TransactionLog::new(id));
        tracing::debug!(transaction = id, "view transaction opened");

        Ok(ViewTransaction::new(self.clone(), id))
    }

    pub(crate) fn commit_transaction(&self, id: u64) {
        let log = {
            let mut state = self.lock();
            match state.transaction.take() {
                Some(log) if log.id == id => log,
                other => {
                    state.transaction = other;
                    tracing::warn!(transaction = id, "commit of a transaction that is not open");
                    return;
                }
            }
        };

        tracing::debug!(transaction = id, records = log.len(), "view transaction committed");
        for (name, op) in log.into_records() {
            self.apply(&name, op);
        }
    }

    pub(crate) fn cancel_transaction(&self, id: u64) {
        let mut state = self.lock();
        match state.transaction.take() {
            Some(log) if log.id == id => {
                tracing::debug!(transaction = id, discarded = log.len(), "view transaction cancelled");
            }
            other => state.transaction = other,
        }
    }

    fn apply(&self, name: &str, op: SlotOp) {
        match op {
            SlotOp::Clear => self.apply_clear(name),
            SlotOp::SetOrUpdate(args) => self.apply_set_or_update(name, args),
            SlotOp::SetIfAbsent(args) => self.apply_set_if_absent(name, args),
            SlotOp::Refresh(data) => self.apply_refresh(name, data),
        }
    }

    fn apply_set_or_update(&self, name: &str, args: ViewArgs) {
        let template = self.inner.resolver.resolve(&args.template);
        let event = {
            let mut state = self.lock();
            match state.position(name) {
                Some(i) if state.slots[i].is_sticky_match(args.sticky.as_deref()) => {
                    ViewEvent::Refreshed {
                        name: name.to_string(),
                        payload: RefreshPayload {
                            resolved_locals: args.locals,
                            sticky: args.sticky,
                            data: None,
                        },
                    }
                }
                Some(i) => {
                    state.slots[i].replace(args, template);
                    ViewEvent::Updated {
                        name: name.to_string(),
                    }
                }
                None => {
                    state.slots.push(ViewSlot::create(name, args, template));
                    ViewEvent::Updated {
                        name: name.to_string(),
                    }
                }
            }
        };
        self.emit(event);
    }

    fn apply_set_if_absent(&self, name: &str, args: ViewArgs) {
        if self.lock().position(name).is_some() {
            return;
        }
        let template = self.inner.resolver.resolve(&args.template);
        {
            let mut state = self.lock();
            if state.position(name).is_some() {
                return;
            }
            let args = ViewArgs { sticky: None, ..args };
            state.slots.push(ViewSlot::create(name, args, template));
        }
        self.emit(ViewEvent::Updated {
            name: name.to_string(),
        });
    }

    fn apply_clear(&self, name: &str) {
        {
            let mut state = self.lock();
            if let Some(i) = state.position(name) {
                state.slots.remove(i);
            }
        }
        self.emit(ViewEvent::Updated {
            name: name.to_string(),
        });
    }

    fn apply_refresh(&self, name: &str, data: Option<Arc<Value>>) {
        let resolved_locals = {
            let state = self.lock();
            state.position(name).and_then(|i| state.slots[i].locals.clone())
        };
        self.emit(ViewEvent::Refreshed {
            name: name.to_string(),
            payload: RefreshPayload {
                resolved_locals,
                sticky: None,
                data,
            },
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::template::{InlineTemplateResolver, TemplateSource};

    fn store() -> ViewStore {
        ViewStore::new(Arc::new(InlineTemplateResolver))
    }

    fn inline(html: &str) -> ViewArgs {
        ViewArgs::new(TemplateSource::inline(html))
    }

    #[test]
    fn test_empty_name_rejected() {
        let views = store();
        assert_eq!(views.set_or_update("", inline("x")), Err(ViewError::MissingName));
        assert_eq!(views.set_if_absent("  ", inline("x")), Err(ViewError::MissingName));
        assert_eq!(views.clear(""), Err(ViewError::MissingName));
        assert_eq!(views.refresh("", None), Err(ViewError::MissingName));
    }

    #[test]
    fn test_second_transaction_fails_fast() {
        let views = store();
        let trx = views.begin_update().unwrap();
        assert!(matches!(views.begin_update(), Err(ViewError::TransactionInProgress)));
        trx.cancel();
        assert!(views.begin_update().is_ok());
    }

    #[test]
    fn test_dropped_transaction_is_cancelled() {
        let views = store();
        {
            let _trx = views.begin_update().unwrap();
            views.set_or_update("main", inline("x")).unwrap();
        }
        assert!(!views.in_transaction());
        assert!(views.get("main").is_none());
    }

    #[test]
    fn test_cleared_slot_restarts_at_version_zero() {
        let views = store();
        views.set_or_update("name", inline("fubar")).unwrap();
        views.set_or_update("name", inline("fubar")).unwrap();
        views.clear("name").unwrap();
        views.set_or_update("name", inline("template")).unwrap();

        let slot = views.get("name").unwrap();
        assert_eq!(slot.version, 0);
        assert_eq!(slot.source, TemplateSource::inline("template"));
    }
}
