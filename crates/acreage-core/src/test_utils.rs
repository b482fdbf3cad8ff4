//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use crate::event::{EventPriority, GridEvent, Notifier};
use crate::id::EntityId;
use slotmap::SlotMap;
use std::cell::RefCell;
use std::rc::Rc;

/// Mint `count` entity ids. Keep the returned map alive for as long as the
/// ids are in use so they stay distinct.
pub fn make_entities(count: usize) -> (SlotMap<EntityId, ()>, Vec<EntityId>) {
    let mut sm: SlotMap<EntityId, ()> = SlotMap::with_key();
    let ids = (0..count).map(|_| sm.insert(())).collect();
    (sm, ids)
}

/// A notifier that records everything it is handed. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    log: Rc<RefCell<Vec<(GridEvent, EventPriority)>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far, oldest first.
    pub fn events(&self) -> Vec<(GridEvent, EventPriority)> {
        self.log.borrow().clone()
    }

    /// Published topics, oldest first.
    pub fn topics(&self) -> Vec<&'static str> {
        self.log.borrow().iter().map(|(e, _)| e.topic()).collect()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn publish(&mut self, event: GridEvent, priority: EventPriority) {
        self.log.borrow_mut().push((event, priority));
    }
}
