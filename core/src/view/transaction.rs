//! Buffered slot operations.

use std::sync::Arc;

use serde_json::Value;

use super::slot::ViewArgs;
use super::store::ViewStore;

/// One buffered call, replayed through the live code path on commit.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SlotOp {
    Clear,
    SetOrUpdate(ViewArgs),
    SetIfAbsent(ViewArgs),
    Refresh(Option<Arc<Value>>),
}

/// Records of the open transaction, one per slot, kept in first-touched order.
#[derive(Debug)]
pub(crate) struct TransactionLog {
    pub(crate) id: u64,
    records: Vec<(String, SlotOp)>,
}

impl TransactionLog {
    pub(crate) fn new(id: u64) -> Self {
        Self {
            id,
            records: Vec::new(),
        }
    }

    /// A new record replaces the previous one for the slot in place. A
    /// `SetIfAbsent` only lands on an empty or `Clear` record.
    pub(crate) fn record(&mut self, name: &str, op: SlotOp) {
        match self.records.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => {
                if matches!(op, SlotOp::SetIfAbsent(_)) && !matches!(existing, SlotOp::Clear) {
                    return;
                }
                *existing = op;
            }
            None => self.records.push((name.to_string(), op)),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn into_records(self) -> Vec<(String, SlotOp)> {
        self.records
    }
}

/// Handle of an open transaction. Dropping it without `commit` cancels.
#[must_use = "an open transaction diverts every slot write until committed or cancelled"]
pub struct ViewTransaction {
    store: ViewStore,
    id: u64,
    finished: bool,
}

impl ViewTransaction {
    pub(crate) fn new(store: ViewStore, id: u64) -> Self {
        Self {
            store,
            id,
            finished: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Closes the transaction and replays every record against the live store.
    pub fn commit(mut self) {
        self.finished = true;
        self.store.commit_transaction(self.id);
    }

    /// Closes the transaction and discards every record.
    pub fn cancel(mut self) {
        self.finished = true;
        self.store.cancel_transaction(self.id);
    }
}

impl Drop for ViewTransaction {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!(transaction = self.id, "view transaction dropped without commit");
            self.store.cancel_transaction(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::template::TemplateSource;

    fn args(html: &str) -> ViewArgs {
        ViewArgs::new(TemplateSource::inline(html))
    }

    #[test]
    fn test_later_record_overwrites_in_place() {
        let mut log = TransactionLog::new(1);
        log.record("a", SlotOp::SetOrUpdate(args("1")));
        log.record("b", SlotOp::Clear);
        log.record("a", SlotOp::Clear);

        let records = log.into_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], ("a".to_string(), SlotOp::Clear));
        assert_eq!(records[1], ("b".to_string(), SlotOp::Clear));
    }

    #[test]
    fn test_set_if_absent_dropped_over_existing_record() {
        let mut log = TransactionLog::new(1);
        log.record("a", SlotOp::SetIfAbsent(args("first")));
        log.record("a", SlotOp::SetIfAbsent(args("second")));
        log.record("b", SlotOp::Refresh(None));
        log.record("b", SlotOp::SetIfAbsent(args("ignored")));

        let records = log.into_records();
        assert_eq!(records[0].1, SlotOp::SetIfAbsent(args("first")));
        assert_eq!(records[1].1, SlotOp::Refresh(None));
    }

    #[test]
    fn test_set_if_absent_replaces_clear() {
        let mut log = TransactionLog::new(1);
        log.record("a", SlotOp::Clear);
        log.record("a", SlotOp::SetIfAbsent(args("x")));
        assert_eq!(log.len(), 1);
        assert_eq!(log.into_records()[0].1, SlotOp::SetIfAbsent(args("x")));
    }
}
