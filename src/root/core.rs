use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::error::Result;
use crate::events::{EventBus, UiOps};
use crate::geometry::{Rect, Vec2};
use crate::input::{KeyEvent, VirtualFrame};
use crate::logging::{event_with_fields, json_kv, LogLevel, Logger};
use crate::metrics::FrameMetrics;
use crate::render::RenderList;
use crate::style::StyleSheet;
use crate::tree::{NodeId, Tree};

use super::focus;

const LOG_TARGET: &str = "ui::root";

/// Construction-time wiring for a [`Root`]: observability hooks and the
/// style collaborator, all explicit, never global.
pub struct RootConfig {
    pub logger: Logger,
    pub metrics: Option<Arc<Mutex<FrameMetrics>>>,
    /// Emit a metrics snapshot every N frames. `None` disables emission.
    pub metrics_interval: Option<u64>,
    pub metrics_target: String,
    pub styles: StyleSheet,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            logger: Logger::noop(),
            metrics: None,
            metrics_interval: None,
            metrics_target: "ui::metrics".to_string(),
            styles: StyleSheet::new(),
        }
    }
}

/// Everything the platform backend captured for one frame.
#[derive(Default, Clone)]
pub struct FrameInput {
    /// Pointer position in screen coordinates, `None` while outside the
    /// window.
    pub mouse_position: Option<Vec2>,
    pub key_events: Vec<KeyEvent>,
    /// Snapshot of the virtual gamepad slots.
    pub gamepad: VirtualFrame,
}

/// Handle for unregistering a key listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyListenerId(u64);

pub type KeyListenerFn = Box<dyn FnMut(&KeyEvent, &mut UiOps) -> bool>;

struct KeyListener {
    id: KeyListenerId,
    priority: i32,
    handler: KeyListenerFn,
}

/// Owns the widget tree and runs the fixed per-frame sequence: input
/// routing, behaviour updates, event pump, lifecycle flushes, re-layout.
pub struct Root {
    tree: Tree,
    bus: EventBus,
    root_node: NodeId,
    screen: Rect,
    focused: Option<NodeId>,
    hovered: Option<NodeId>,
    key_listeners: Vec<KeyListener>,
    next_listener: u64,
    unhandled_key: Option<Box<dyn FnMut(&KeyEvent)>>,
    frames: u64,
    started: Instant,
    config: RootConfig,
}

impl Root {
    pub fn new(screen_size: Vec2) -> Self {
        Self::with_config(screen_size, RootConfig::default())
    }

    pub fn with_config(screen_size: Vec2, config: RootConfig) -> Self {
        let mut tree = Tree::new();
        let root_node = tree.create("root");
        Self {
            tree,
            bus: EventBus::new(),
            root_node,
            screen: Rect::from_pos_size(Vec2::ZERO, screen_size),
            focused: None,
            hovered: None,
            key_listeners: Vec::new(),
            next_listener: 0,
            unhandled_key: None,
            frames: 0,
            started: Instant::now(),
            config,
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn root_node(&self) -> NodeId {
        self.root_node
    }

    pub fn styles(&self) -> &StyleSheet {
        &self.config.styles
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    /// Node the pointer resolved to on the last frame.
    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub fn set_screen_size(&mut self, size: Vec2) {
        self.screen = Rect::from_pos_size(Vec2::ZERO, size);
        self.tree.mark_needing_layout(self.root_node);
    }

    // ---- frame loop ----------------------------------------------------

    /// Advance the UI by one tick.
    ///
    /// Order is fixed: route input, update behaviours, pump queued events,
    /// apply queued mutations, resolve destroys and flush attach/prune,
    /// then re-layout when anything marked itself dirty.
    pub fn update(&mut self, input: &FrameInput) -> Result<()> {
        let mut ops = UiOps::new();

        match input.mouse_position {
            Some(position) => self.route_mouse(position, &mut ops),
            None => self.hovered = None,
        }
        for key in &input.key_events {
            self.route_key(key, &mut ops);
        }
        self.route_gamepad(&input.gamepad, &mut ops);

        self.tree.update_all(&mut ops);

        self.bus.enqueue_all(ops.take_events());
        let routed = self.bus.pump(&mut self.tree, &mut ops);
        self.with_metrics(|m| m.record_events_routed(routed));

        self.apply_ops(ops);

        let resolved = self.tree.resolve_destroys();
        for id in &resolved {
            let name = self
                .tree
                .node(*id)
                .map(|n| n.name.clone())
                .unwrap_or_default();
            self.log_debug("node_destroyed", [json_kv("node", name)]);
        }
        if let Some(focused) = self.focused {
            if !self
                .tree
                .node(focused)
                .map(|n| n.is_alive())
                .unwrap_or(false)
            {
                self.focused = None;
            }
        }
        self.tree.flush_attach();
        let pruned = self.tree.prune_dead();
        if pruned > 0 {
            self.with_metrics(|m| m.record_pruned(pruned));
        }

        if self
            .tree
            .node(self.root_node)
            .map(|n| n.needs_layout)
            .unwrap_or(false)
        {
            self.tree.layout_min_size(self.root_node, false)?;
            self.tree.assign_rect(self.root_node, self.screen)?;
            self.with_metrics(FrameMetrics::record_layout_pass);
        }

        self.frames += 1;
        self.with_metrics(FrameMetrics::record_frame);
        self.log_debug(
            "frame_completed",
            [
                json_kv("frame", self.frames),
                json_kv("events_routed", routed as u64),
                json_kv("nodes_pruned", pruned as u64),
            ],
        );
        self.maybe_emit_metrics();
        Ok(())
    }

    /// Paint-ordered snapshot for the render collaborator.
    pub fn render_list(&self) -> RenderList {
        RenderList::snapshot(&self.tree, self.root_node, self.screen)
    }

    /// Drain queued mutations into the tree. Focus hooks may request focus
    /// again; the loop is bounded so two behaviours fighting over focus
    /// cannot wedge the frame.
    fn apply_ops(&mut self, mut ops: UiOps) {
        for _ in 0..8 {
            for id in ops.destroys.drain(..) {
                self.tree.request_destroy(id);
            }
            for (child, parent) in ops.attaches.drain(..) {
                self.tree.queue_attach(child, parent);
            }
            for id in ops.relayout.drain(..) {
                self.tree.mark_needing_layout(id);
            }
            self.bus.enqueue_all(ops.take_events());

            let Some(target) = ops.focus.take() else {
                return;
            };
            let mut scratch = UiOps::new();
            match focus::transfer(
                &mut self.tree,
                &mut self.focused,
                target,
                self.root_node,
                &mut scratch,
            ) {
                Ok(true) => self.note_focus_change(),
                Ok(false) => {}
                Err(err) => {
                    self.log_warn("focus_request_failed", [json_kv("error", err.to_string())]);
                }
            }
            ops = scratch;
        }
        // Only the pending focus request is dropped; the last hooks' other
        // mutations still land.
        for id in ops.destroys.drain(..) {
            self.tree.request_destroy(id);
        }
        for (child, parent) in ops.attaches.drain(..) {
            self.tree.queue_attach(child, parent);
        }
        for id in ops.relayout.drain(..) {
            self.tree.mark_needing_layout(id);
        }
        self.bus.enqueue_all(ops.take_events());
        self.log_warn(
            "focus_request_loop_abandoned",
            [json_kv("frame", self.frames)],
        );
    }

    // ---- focus ----------------------------------------------------------

    /// Move focus explicitly. `None` blurs. Focusing a node that cannot
    /// receive focus is a no-op; focusing a detached node is an error.
    pub fn set_focus(&mut self, target: Option<NodeId>) -> Result<()> {
        let mut ops = UiOps::new();
        let moved = focus::transfer(
            &mut self.tree,
            &mut self.focused,
            target,
            self.root_node,
            &mut ops,
        )?;
        if moved {
            self.note_focus_change();
        }
        self.apply_ops(ops);
        Ok(())
    }

    /// Cycle focus forward through the focusable nodes of the current
    /// scope, wrapping at the end.
    pub fn focus_next(&mut self) -> Result<()> {
        let scope = self.modal_scope();
        match focus::cycle(&self.tree, self.focused, scope, true) {
            Some(target) => self.set_focus(Some(target)),
            None => Ok(()),
        }
    }

    pub fn focus_previous(&mut self) -> Result<()> {
        let scope = self.modal_scope();
        match focus::cycle(&self.tree, self.focused, scope, false) {
            Some(target) => self.set_focus(Some(target)),
            None => Ok(()),
        }
    }

    fn note_focus_change(&mut self) {
        self.with_metrics(FrameMetrics::record_focus_change);
        let name = self
            .focused
            .and_then(|id| self.tree.node(id))
            .map(|n| n.name.clone())
            .unwrap_or_default();
        self.log_debug("focus_changed", [json_kv("node", name)]);
    }

    /// Subtree that currently confines hit testing and focus cycling: the
    /// last active modal node in tree order, else the whole tree.
    fn modal_scope(&self) -> NodeId {
        self.tree
            .descendants(self.root_node)
            .into_iter()
            .rev()
            .find(|id| {
                self.tree
                    .node(*id)
                    .map(|n| n.modal && n.is_active())
                    .unwrap_or(false)
            })
            .unwrap_or(self.root_node)
    }

    // ---- pointer ----------------------------------------------------------

    /// Topmost active, mouse-interactive node containing the point.
    /// `include_disabled` lets tooltip code resolve disabled widgets.
    pub fn widget_under_point(&self, point: Vec2, include_disabled: bool) -> Option<NodeId> {
        let scope = self.modal_scope();
        match self.hit_test(scope, point, self.screen, include_disabled) {
            HitOutcome::Hit(id) => Some(id),
            _ => None,
        }
    }

    fn hit_test(
        &self,
        id: NodeId,
        point: Vec2,
        clip: Rect,
        include_disabled: bool,
    ) -> HitOutcome {
        let Some(node) = self.tree.node(id) else {
            return HitOutcome::Miss;
        };
        if !node.is_active() {
            return HitOutcome::Miss;
        }
        let child_clip = if node.clips_children {
            let clipped = clip.intersect(&node.rect());
            if clipped.is_empty() {
                return HitOutcome::Miss;
            }
            clipped
        } else {
            clip
        };

        // Children are painted after their parent, so test them first,
        // highest effective layer first; later siblings win layer ties.
        let mut order: Vec<(i32, usize, NodeId)> = node
            .children
            .iter()
            .enumerate()
            .map(|(index, child)| {
                let layer = self
                    .tree
                    .node(*child)
                    .map(|n| n.child_layer_adjustment)
                    .unwrap_or(0);
                (layer, index, *child)
            })
            .collect();
        order.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));
        for (_, _, child) in order {
            match self.hit_test(child, point, child_clip, include_disabled) {
                HitOutcome::Miss => continue,
                outcome => return outcome,
            }
        }

        let visible = clip.intersect(&node.rect());
        if visible.contains(point) {
            if node.mouse_interactive && (node.enabled || include_disabled) {
                return HitOutcome::Hit(id);
            }
            if node.mouse_blocker {
                return HitOutcome::Blocked;
            }
        }
        HitOutcome::Miss
    }

    fn route_mouse(&mut self, position: Vec2, ops: &mut UiOps) {
        self.hovered = self.widget_under_point(position, false);
        if let Some(id) = self.hovered {
            let mut behaviours = self.tree.take_behaviours(id);
            for behaviour in behaviours.iter_mut() {
                behaviour.on_mouse_over(position, id, ops);
            }
            self.tree.restore_behaviours(id, behaviours);
        }
    }

    // ---- keyboard ----------------------------------------------------------

    /// Register an interception listener tried before focus routing.
    /// Higher priority runs first; equal priorities run in registration
    /// order.
    pub fn add_key_listener(&mut self, priority: i32, handler: KeyListenerFn) -> KeyListenerId {
        let id = KeyListenerId(self.next_listener);
        self.next_listener += 1;
        self.key_listeners.push(KeyListener {
            id,
            priority,
            handler,
        });
        // Stable sort keeps registration order within a priority band.
        self.key_listeners
            .sort_by(|a, b| b.priority.cmp(&a.priority));
        id
    }

    pub fn remove_key_listener(&mut self, id: KeyListenerId) {
        self.key_listeners.retain(|l| l.id != id);
    }

    /// Callback for keys nothing consumed (global shortcuts layer).
    pub fn set_unhandled_key_listener(&mut self, listener: impl FnMut(&KeyEvent) + 'static) {
        self.unhandled_key = Some(Box::new(listener));
    }

    fn route_key(&mut self, key: &KeyEvent, ops: &mut UiOps) {
        let mut listeners = std::mem::take(&mut self.key_listeners);
        let consumed = listeners
            .iter_mut()
            .any(|listener| (listener.handler)(key, ops));
        self.key_listeners = listeners;
        if consumed {
            return;
        }

        // Focused node first, then bubble up its parent chain.
        let mut current = self.focused;
        while let Some(id) = current {
            let active = self.tree.node(id).map(|n| n.is_active()).unwrap_or(false);
            if active {
                let mut behaviours = self.tree.take_behaviours(id);
                let handled = behaviours.iter_mut().any(|b| b.on_key(key, id, ops));
                self.tree.restore_behaviours(id, behaviours);
                if handled {
                    return;
                }
            }
            current = self.tree.parent(id);
        }

        if let Some(listener) = self.unhandled_key.as_mut() {
            listener(key);
        }
    }

    // ---- gamepad ----------------------------------------------------------

    /// Deliver the virtual gamepad frame to the highest-priority consumers.
    /// Focused nodes always outrank unfocused ones; every node tied at the
    /// winning level receives the frame.
    fn route_gamepad(&mut self, frame: &VirtualFrame, ops: &mut UiOps) {
        let mut best: Option<(bool, i32)> = None;
        let mut winners: Vec<NodeId> = Vec::new();
        for id in self.tree.descendants(self.root_node) {
            let Some(node) = self.tree.node(id) else {
                continue;
            };
            if !node.is_active() {
                continue;
            }
            let Some(priority) = node.gamepad_priority else {
                continue;
            };
            let level = (node.is_focused(), priority);
            match best {
                None => {
                    best = Some(level);
                    winners.push(id);
                }
                Some(current) if level > current => {
                    best = Some(level);
                    winners.clear();
                    winners.push(id);
                }
                Some(current) if level == current => winners.push(id),
                Some(_) => {}
            }
        }
        for id in winners {
            let mut behaviours = self.tree.take_behaviours(id);
            for behaviour in behaviours.iter_mut() {
                behaviour.on_gamepad(frame, id, ops);
            }
            self.tree.restore_behaviours(id, behaviours);
        }
    }

    // ---- observability ------------------------------------------------------

    fn with_metrics(&self, record: impl FnOnce(&mut FrameMetrics)) {
        if let Some(metrics) = &self.config.metrics {
            let mut guard = metrics.lock().unwrap_or_else(|e| e.into_inner());
            record(&mut guard);
        }
    }

    fn maybe_emit_metrics(&self) {
        let Some(interval) = self.config.metrics_interval else {
            return;
        };
        if interval == 0 || self.frames % interval != 0 {
            return;
        }
        let Some(metrics) = &self.config.metrics else {
            return;
        };
        let snapshot = {
            let guard = metrics.lock().unwrap_or_else(|e| e.into_inner());
            guard.snapshot(self.started.elapsed())
        };
        let _ = self
            .config
            .logger
            .log_event(snapshot.to_log_event(&self.config.metrics_target));
    }

    fn log_debug(
        &self,
        message: &str,
        fields: impl IntoIterator<Item = (String, serde_json::Value)>,
    ) {
        let _ = self
            .config
            .logger
            .log_event(event_with_fields(LogLevel::Debug, LOG_TARGET, message, fields));
    }

    fn log_warn(
        &self,
        message: &str,
        fields: impl IntoIterator<Item = (String, serde_json::Value)>,
    ) {
        let _ = self
            .config
            .logger
            .log_event(event_with_fields(LogLevel::Warn, LOG_TARGET, message, fields));
    }
}

enum HitOutcome {
    Hit(NodeId),
    /// A blocker swallowed the point; nothing underneath may claim it.
    Blocked,
    Miss,
}
