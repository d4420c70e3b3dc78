//! Queued event dispatch across the widget tree.
//!
//! Events are never delivered synchronously: senders enqueue, and the root
//! drains the queue once per update tick via [`EventBus::pump`]. Handlers
//! therefore never run while the tree is being traversed or mutated; any
//! mutations they want are queued on a [`UiOps`] and applied afterwards.

use std::collections::VecDeque;

use serde_json::Value;

use crate::tree::{NodeId, Tree};

/// An application event travelling through the tree.
#[derive(Debug, Clone)]
pub struct UiEvent {
    pub kind: String,
    pub source: NodeId,
    pub payload: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    /// Bubble from the origin towards the root.
    Up,
    /// Broadcast depth-first below the origin.
    Down,
}

#[derive(Debug, Clone)]
pub(crate) struct QueuedEvent {
    pub event: UiEvent,
    pub direction: Direction,
}

/// Handler registration key: event kind, optionally narrowed to events from
/// a specific source node name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerKey {
    pub kind: String,
    pub source: Option<String>,
}

impl HandlerKey {
    pub fn new(kind: impl Into<String>, source: Option<String>) -> Self {
        Self {
            kind: kind.into(),
            source,
        }
    }
}

/// An event handler attached to a node. Returning `true` accepts the event
/// and stops further propagation.
pub type EventHandler = Box<dyn FnMut(&UiEvent, &mut UiOps) -> bool>;

/// Mutations queued by handlers and behaviours, applied by the root at the
/// next fixed point in the frame.
#[derive(Default)]
pub struct UiOps {
    pub(crate) events: Vec<QueuedEvent>,
    pub(crate) destroys: Vec<NodeId>,
    pub(crate) attaches: Vec<(NodeId, NodeId)>,
    /// `Some(None)` clears focus, `Some(Some(id))` requests it.
    pub(crate) focus: Option<Option<NodeId>>,
    pub(crate) relayout: Vec<NodeId>,
}

impl UiOps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a bubbling event from `origin`.
    pub fn send_event(&mut self, origin: NodeId, kind: impl Into<String>, payload: Value) {
        self.events.push(QueuedEvent {
            event: UiEvent {
                kind: kind.into(),
                source: origin,
                payload,
            },
            direction: Direction::Up,
        });
    }

    /// Queue a downward broadcast from `origin`.
    pub fn send_event_down(&mut self, origin: NodeId, kind: impl Into<String>, payload: Value) {
        self.events.push(QueuedEvent {
            event: UiEvent {
                kind: kind.into(),
                source: origin,
                payload,
            },
            direction: Direction::Down,
        });
    }

    /// Request a vetoable destroy of `node`.
    pub fn request_destroy(&mut self, node: NodeId) {
        self.destroys.push(node);
    }

    /// Queue an attachment, applied after the current update tick so child
    /// lists never mutate mid-iteration.
    pub fn set_parent(&mut self, child: NodeId, parent: NodeId) {
        self.attaches.push((child, parent));
    }

    /// Request focus transfer; `None` blurs.
    pub fn request_focus(&mut self, node: Option<NodeId>) {
        self.focus = Some(node);
    }

    /// Mark a node as needing layout at the end of the frame.
    pub fn mark_needing_layout(&mut self, node: NodeId) {
        self.relayout.push(node);
    }

    pub(crate) fn take_events(&mut self) -> Vec<QueuedEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
            && self.destroys.is_empty()
            && self.attaches.is_empty()
            && self.focus.is_none()
            && self.relayout.is_empty()
    }
}

/// Per-root event queue.
#[derive(Default)]
pub struct EventBus {
    queue: VecDeque<QueuedEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a bubbling event.
    pub fn send_event(&mut self, origin: NodeId, kind: impl Into<String>, payload: Value) {
        self.queue.push_back(QueuedEvent {
            event: UiEvent {
                kind: kind.into(),
                source: origin,
                payload,
            },
            direction: Direction::Up,
        });
    }

    /// Queue a downward broadcast.
    pub fn send_event_down(&mut self, origin: NodeId, kind: impl Into<String>, payload: Value) {
        self.queue.push_back(QueuedEvent {
            event: UiEvent {
                kind: kind.into(),
                source: origin,
                payload,
            },
            direction: Direction::Down,
        });
    }

    pub(crate) fn enqueue_all(&mut self, events: impl IntoIterator<Item = QueuedEvent>) {
        self.queue.extend(events);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Drain the queue once, delivering each event.
    ///
    /// Events queued by handlers during the drain land in `ops` and are
    /// delivered on the next tick. Returns the number of deliveries that
    /// found an accepting handler.
    pub fn pump(&mut self, tree: &mut Tree, ops: &mut UiOps) -> usize {
        let batch: Vec<QueuedEvent> = self.queue.drain(..).collect();
        let mut accepted = 0;
        for queued in batch {
            let delivered = match queued.direction {
                Direction::Up => Self::deliver_up(tree, &queued.event, ops),
                Direction::Down => Self::deliver_down(tree, &queued.event, ops),
            };
            if delivered {
                accepted += 1;
            }
        }
        accepted
    }

    /// Walk from the origin towards the root until a handler accepts.
    /// Events nobody accepts are dropped silently.
    fn deliver_up(tree: &mut Tree, event: &UiEvent, ops: &mut UiOps) -> bool {
        let source_name = tree.node(event.source).map(|n| n.name.clone());
        let mut current = Some(event.source);
        while let Some(id) = current {
            if Self::try_handle(tree, id, event, source_name.as_deref(), ops) {
                return true;
            }
            current = tree.parent(id);
        }
        false
    }

    /// Depth-first descent: the first interior node with a matching handler
    /// intercepts; otherwise every matching leaf receives the event.
    fn deliver_down(tree: &mut Tree, event: &UiEvent, ops: &mut UiOps) -> bool {
        let source_name = tree.node(event.source).map(|n| n.name.clone());
        let order = tree.descendants(event.source);

        for &id in &order {
            if tree.children(id).is_empty() {
                continue;
            }
            if Self::try_handle(tree, id, event, source_name.as_deref(), ops) {
                return true;
            }
        }

        let mut any = false;
        for &id in &order {
            if !tree.children(id).is_empty() {
                continue;
            }
            if Self::try_handle(tree, id, event, source_name.as_deref(), ops) {
                any = true;
            }
        }
        any
    }

    /// Run the node's handler for this event, if one matches. The handler is
    /// taken out of the node for the duration of the call so it can never
    /// alias the tree.
    fn try_handle(
        tree: &mut Tree,
        id: NodeId,
        event: &UiEvent,
        source_name: Option<&str>,
        ops: &mut UiOps,
    ) -> bool {
        let keys = [
            source_name.map(|name| HandlerKey {
                kind: event.kind.clone(),
                source: Some(name.to_string()),
            }),
            Some(HandlerKey {
                kind: event.kind.clone(),
                source: None,
            }),
        ];
        for key in keys.into_iter().flatten() {
            let Some(mut handler) = tree.take_event_handler(id, &key) else {
                continue;
            };
            let accepted = handler(event, ops);
            tree.restore_event_handler(id, key, handler);
            if accepted {
                return true;
            }
        }
        false
    }
}
