//! Grid notifications and the default in-process event bus.
//!
//! The grid never talks to a global bus. It publishes through an injected
//! [`Notifier`], so the spatial core can run without any messaging
//! infrastructure (see [`NullNotifier`]). [`EventBus`] is the stock
//! implementation: it buffers events per kind in fixed-capacity ring
//! buffers and hands them to passive listeners on [`EventBus::deliver`].
//!
//! # Suppression
//!
//! Event kinds can be suppressed via [`EventBus::suppress`], which prevents
//! any allocation or recording for that kind.

use crate::id::{EntityId, TileCoord};
use crate::layer::LayerKind;
use crate::position::WorldPos;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Outbound events
// ---------------------------------------------------------------------------

/// A notification published by the grid after a mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GridEvent {
    TileCreated {
        coord: TileCoord,
    },
    EntityPlaced {
        entity: EntityId,
        pos: WorldPos,
        tile: TileCoord,
        layer: LayerKind,
    },
    EntityRemoved {
        entity: EntityId,
        tile: TileCoord,
        layer: LayerKind,
    },
    ActiveRegionChanged {
        active_count: usize,
    },
    GridExpanded {
        width: u32,
        height: u32,
    },
}

/// Discriminant tag for grid events, used for suppression and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    TileCreated,
    EntityPlaced,
    EntityRemoved,
    ActiveRegionChanged,
    GridExpanded,
}

const EVENT_KIND_COUNT: usize = 5;

impl GridEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GridEvent::TileCreated { .. } => EventKind::TileCreated,
            GridEvent::EntityPlaced { .. } => EventKind::EntityPlaced,
            GridEvent::EntityRemoved { .. } => EventKind::EntityRemoved,
            GridEvent::ActiveRegionChanged { .. } => EventKind::ActiveRegionChanged,
            GridEvent::GridExpanded { .. } => EventKind::GridExpanded,
        }
    }

    /// The bus topic this event is published under.
    pub fn topic(&self) -> &'static str {
        self.kind().topic()
    }
}

impl EventKind {
    fn index(self) -> usize {
        self as usize
    }

    pub fn topic(self) -> &'static str {
        match self {
            EventKind::TileCreated => "tile_created",
            EventKind::EntityPlaced => "entity_placed_on_grid",
            EventKind::EntityRemoved => "entity_removed_from_grid",
            EventKind::ActiveRegionChanged => "active_region_changed",
            EventKind::GridExpanded => "grid_expanded",
        }
    }
}

/// Delivery priority attached to a published event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventPriority {
    Low,
    Normal,
    High,
}

// ---------------------------------------------------------------------------
// Inbound events
// ---------------------------------------------------------------------------

/// Notifications from the entity store that the grid reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// A new entity exists. If it has a position, it is placed on the
    /// default layer.
    EntityCreated {
        entity: EntityId,
        position: Option<WorldPos>,
    },
    /// An entity was destroyed; it is removed from every layer.
    EntityDestroyed { entity: EntityId },
    /// An entity's position component changed.
    PositionUpdated { entity: EntityId, x: f64, y: f64 },
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// Fire-and-forget sink for grid notifications.
pub trait Notifier: std::fmt::Debug {
    fn publish(&mut self, event: GridEvent, priority: EventPriority);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn publish(&mut self, _event: GridEvent, _priority: EventPriority) {}
}

// ---------------------------------------------------------------------------
// EventBuffer
// ---------------------------------------------------------------------------

/// A pre-allocated ring buffer for events. Fixed capacity; when full, the
/// oldest events are dropped.
#[derive(Debug)]
pub struct EventBuffer {
    events: Vec<Option<(GridEvent, EventPriority)>>,
    /// Next write position.
    head: usize,
    len: usize,
    /// Total events ever written (including dropped).
    total_written: u64,
}

impl EventBuffer {
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            total_written: 0,
        }
    }

    pub fn push(&mut self, event: GridEvent, priority: EventPriority) {
        self.events[self.head] = Some((event, priority));
        self.head = (self.head + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        }
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Number of events that were dropped because the buffer was full.
    pub fn dropped_count(&self) -> u64 {
        self.total_written.saturating_sub(self.capacity() as u64)
    }

    /// Iterate over events from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &(GridEvent, EventPriority)> + '_ {
        let start = if self.len < self.capacity() { 0 } else { self.head };
        let capacity = self.capacity();
        (0..self.len).filter_map(move |i| self.events[(start + i) % capacity].as_ref())
    }

    pub fn clear(&mut self) {
        for slot in &mut self.events {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }
}

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

/// A passive listener receives events read-only.
pub type Listener = Box<dyn FnMut(&GridEvent, EventPriority)>;

/// Optional predicate that filters events for a listener.
pub type EventFilter = Box<dyn Fn(&GridEvent) -> bool>;

/// Ordering of listeners during delivery. Lower runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ListenerOrder {
    Pre = 0,
    Normal = 1,
    Post = 2,
}

struct ListenerEntry {
    listener: Listener,
    order: ListenerOrder,
    filter: Option<EventFilter>,
    insertion_order: u64,
}

impl std::fmt::Debug for ListenerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerEntry")
            .field("order", &self.order)
            .field("filtered", &self.filter.is_some())
            .field("insertion_order", &self.insertion_order)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Buffered, subscription-based notifier. Holds one ring buffer per event
/// kind, listener lists and suppression flags.
pub struct EventBus {
    buffers: [Option<EventBuffer>; EVENT_KIND_COUNT],
    suppressed: [bool; EVENT_KIND_COUNT],
    listeners: [Vec<ListenerEntry>; EVENT_KIND_COUNT],
    default_capacity: usize,
    next_insertion_order: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("buffers", &self.buffers)
            .field("suppressed", &self.suppressed)
            .field("default_capacity", &self.default_capacity)
            .finish_non_exhaustive()
    }
}

impl EventBus {
    /// Create a bus with the given ring buffer capacity per event kind.
    pub fn new(default_capacity: usize) -> Self {
        Self {
            buffers: Default::default(),
            suppressed: [false; EVENT_KIND_COUNT],
            listeners: Default::default(),
            default_capacity,
            next_insertion_order: 0,
        }
    }

    /// Suppress an event kind. Suppressed events are never buffered.
    pub fn suppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = true;
        self.buffers[kind.index()] = None;
    }

    pub fn is_suppressed(&self, kind: EventKind) -> bool {
        self.suppressed[kind.index()]
    }

    /// Buffer an event. No-op if its kind is suppressed.
    pub fn emit(&mut self, event: GridEvent, priority: EventPriority) {
        let idx = event.kind().index();
        if self.suppressed[idx] {
            return;
        }
        let capacity = self.default_capacity;
        self.buffers[idx]
            .get_or_insert_with(|| EventBuffer::new(capacity))
            .push(event, priority);
    }

    /// Register a listener for an event kind with normal ordering.
    pub fn on(&mut self, kind: EventKind, listener: Listener) {
        self.on_filtered(kind, ListenerOrder::Normal, None, listener);
    }

    /// Register a listener with explicit ordering and optional filter.
    pub fn on_filtered(
        &mut self,
        kind: EventKind,
        order: ListenerOrder,
        filter: Option<EventFilter>,
        listener: Listener,
    ) {
        let insertion_order = self.next_insertion_order;
        self.next_insertion_order += 1;
        self.listeners[kind.index()].push(ListenerEntry {
            listener,
            order,
            filter,
            insertion_order,
        });
    }

    /// Hand every buffered event to its listeners, oldest first, then clear
    /// the buffers. Listeners run in `(order, registration)` order.
    pub fn deliver(&mut self) {
        for idx in 0..EVENT_KIND_COUNT {
            if self.suppressed[idx] {
                continue;
            }
            let Some(buffer) = self.buffers[idx].as_mut() else {
                continue;
            };
            if buffer.is_empty() {
                continue;
            }

            let events: Vec<(GridEvent, EventPriority)> = buffer.iter().cloned().collect();
            buffer.clear();
            tracing::trace!(count = events.len(), kind = idx, "delivering grid events");

            self.listeners[idx].sort_by_key(|entry| (entry.order, entry.insertion_order));
            for entry in &mut self.listeners[idx] {
                for (event, priority) in &events {
                    if let Some(ref filter) = entry.filter
                        && !filter(event)
                    {
                        continue;
                    }
                    (entry.listener)(event, *priority);
                }
            }
        }
    }

    pub fn buffer(&self, kind: EventKind) -> Option<&EventBuffer> {
        self.buffers[kind.index()].as_ref()
    }

    /// Count of events currently buffered for a kind.
    pub fn buffered_count(&self, kind: EventKind) -> usize {
        self.buffers[kind.index()]
            .as_ref()
            .map(|b| b.len())
            .unwrap_or(0)
    }

    /// Total events ever emitted for a kind (including dropped).
    pub fn total_emitted(&self, kind: EventKind) -> u64 {
        self.buffers[kind.index()]
            .as_ref()
            .map(|b| b.total_written())
            .unwrap_or(0)
    }

    /// Clear all buffers. Listeners and suppression are kept.
    pub fn clear_all(&mut self) {
        for buffer in self.buffers.iter_mut().flatten() {
            buffer.clear();
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl Notifier for EventBus {
    fn publish(&mut self, event: GridEvent, priority: EventPriority) {
        self.emit(event, priority);
    }
}

// ===========================================================================
// Tests
// ===========================================================================
