use std::collections::HashMap;

use crate::error::{Result, UiError};
use crate::events::{EventHandler, HandlerKey, UiEvent, UiOps};
use crate::geometry::{Insets, Rect, Vec2};
use crate::input::{KeyEvent, VirtualFrame};
use crate::layout::Sizer;

/// Generational handle into the node arena. A pruned slot bumps its
/// generation, so stale ids held by client code simply fail lookup instead
/// of aliasing whatever reused the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

/// Per-node logic attached by client code. All hooks default to inert so a
/// behaviour only implements what it cares about.
pub trait Behaviour {
    fn name(&self) -> &str;

    /// Called once per frame while the node is alive and active. A node
    /// whose destruction resolved this frame still receives this call once
    /// more before it is pruned.
    fn update(&mut self, node: NodeId, ops: &mut UiOps) {
        let _ = (node, ops);
    }

    /// Vote on a pending destroy. Returning `false` postpones removal; the
    /// question is re-asked every tick until all behaviours agree.
    fn can_destroy(&mut self, node: NodeId) -> bool {
        let _ = node;
        true
    }

    fn on_focus(&mut self, node: NodeId, ops: &mut UiOps) {
        let _ = (node, ops);
    }

    fn on_focus_lost(&mut self, node: NodeId, ops: &mut UiOps) {
        let _ = (node, ops);
    }

    /// Handle a key delivered by focus routing. Return `true` to consume
    /// it; unconsumed keys bubble to the parent chain.
    fn on_key(&mut self, event: &KeyEvent, node: NodeId, ops: &mut UiOps) -> bool {
        let _ = (event, node, ops);
        false
    }

    /// Receive the virtual gamepad frame when this node wins (or ties) the
    /// gamepad-priority pass.
    fn on_gamepad(&mut self, frame: &VirtualFrame, node: NodeId, ops: &mut UiOps) {
        let _ = (frame, node, ops);
    }

    /// Called while the pointer is over this node's rect and hit testing
    /// resolved to it.
    fn on_mouse_over(&mut self, position: Vec2, node: NodeId, ops: &mut UiOps) {
        let _ = (position, node, ops);
    }
}

/// Relative-positioning rule for nodes not managed by a parent sizer
/// (tooltips, floating panels).
#[derive(Debug, Clone, Copy)]
pub struct Anchor {
    /// Fraction of the parent rect picking the anchor point.
    pub relative_pos: Vec2,
    /// Fraction of the node's own size subtracted from the anchor point,
    /// so (0.5, 0.5) centres the node on it.
    pub relative_align: Vec2,
    /// Absolute nudge applied after alignment.
    pub offset: Vec2,
    /// Clamp region; defaults to the parent rect when `None`.
    pub bounds: Option<Rect>,
}

impl Anchor {
    pub fn new(relative_pos: Vec2, relative_align: Vec2) -> Self {
        Self {
            relative_pos,
            relative_align,
            offset: Vec2::ZERO,
            bounds: None,
        }
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub(crate) fn place(&self, parent: Rect, size: Vec2) -> Vec2 {
        let target = Vec2::new(
            parent.x + self.relative_pos.x * parent.width - size.x * self.relative_align.x,
            parent.y + self.relative_pos.y * parent.height - size.y * self.relative_align.y,
        );
        // Whole pixels keep anchored text crisp.
        let mut pos = target.floor() + self.offset;
        let clamp = self.bounds.unwrap_or(parent);
        pos.x = pos.x.min(clamp.right() - size.x).max(clamp.x);
        pos.y = pos.y.min(clamp.bottom() - size.y).max(clamp.y);
        pos
    }
}

/// One widget in the tree: geometry, activation and lifecycle flags, an
/// optional owned sizer, and attached behaviours.
pub struct Node {
    pub name: String,
    pub position: Vec2,
    pub size: Vec2,
    /// Client-requested floor; the effective minimum also honors the sizer.
    pub min_size: Vec2,
    /// Inset between this node's rect and the region handed to its sizer.
    pub inner_border: Insets,
    pub anchor: Option<Anchor>,
    /// Client-controlled visibility toggle.
    pub active_by_user: bool,
    /// Framework-controlled suppression, kept separate so routing layers
    /// never clobber the client's setting.
    pub active_by_input: bool,
    pub enabled: bool,
    pub focusable: bool,
    pub mouse_interactive: bool,
    /// Confines hit testing and focus cycling to this subtree.
    pub modal: bool,
    /// Swallows pointer misses inside this rect instead of letting them
    /// fall through to nodes underneath.
    pub mouse_blocker: bool,
    pub clips_children: bool,
    /// Shifts this node's children relative to sibling subtrees in paint
    /// and hit-test order.
    pub child_layer_adjustment: i32,
    /// Participates in the gamepad-priority pass when `Some`.
    pub gamepad_priority: Option<i32>,
    pub(crate) focused: bool,
    pub(crate) alive: bool,
    pub(crate) destroy_requested: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) needs_layout: bool,
    cached_min: Vec2,
    sizer: Option<Sizer>,
    behaviours: Vec<Box<dyn Behaviour>>,
    handlers: HashMap<HandlerKey, EventHandler>,
}

impl Node {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: Vec2::ZERO,
            size: Vec2::ZERO,
            min_size: Vec2::ZERO,
            inner_border: Insets::default(),
            anchor: None,
            active_by_user: true,
            active_by_input: true,
            enabled: true,
            focusable: false,
            mouse_interactive: false,
            modal: false,
            mouse_blocker: false,
            clips_children: false,
            child_layer_adjustment: 0,
            gamepad_priority: None,
            focused: false,
            alive: true,
            destroy_requested: false,
            parent: None,
            children: Vec::new(),
            needs_layout: true,
            cached_min: Vec2::ZERO,
            sizer: None,
            behaviours: Vec::new(),
            handlers: HashMap::new(),
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_pos_size(self.position, self.size)
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn is_active(&self) -> bool {
        self.alive && self.active_by_user && self.active_by_input
    }

    pub fn can_receive_focus(&self) -> bool {
        self.is_active() && self.enabled && self.focusable
    }

    pub fn set_sizer(&mut self, sizer: Sizer) {
        self.sizer = Some(sizer);
        self.needs_layout = true;
    }

    pub fn has_sizer(&self) -> bool {
        self.sizer.is_some()
    }

    /// Structural misuse to ask for a sizer that was never installed.
    pub fn sizer(&self) -> Result<&Sizer> {
        self.sizer
            .as_ref()
            .ok_or_else(|| UiError::MissingSizer(self.name.clone()))
    }

    pub fn sizer_mut(&mut self) -> Result<&mut Sizer> {
        self.needs_layout = true;
        self.sizer
            .as_mut()
            .ok_or_else(|| UiError::MissingSizer(self.name.clone()))
    }

    pub fn add_behaviour(&mut self, behaviour: Box<dyn Behaviour>) {
        self.behaviours.push(behaviour);
    }
}

struct SlotEntry {
    generation: u32,
    node: Option<Node>,
}

/// Arena of widget nodes plus the deferred-mutation queues flushed at fixed
/// points in the frame.
pub struct Tree {
    slots: Vec<SlotEntry>,
    free: Vec<u32>,
    pending_attach: Vec<(NodeId, NodeId)>,
    pending_prune: Vec<NodeId>,
}

impl Tree {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            pending_attach: Vec::new(),
            pending_prune: Vec::new(),
        }
    }

    /// Allocate a detached node.
    pub fn create(&mut self, name: impl Into<String>) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.node = Some(Node::new(name));
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(SlotEntry {
                    generation: 0,
                    node: Some(Node::new(name)),
                });
                NodeId {
                    index,
                    generation: 0,
                }
            }
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Live node count.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of all live nodes in allocation order.
    pub fn ids(&self) -> Vec<NodeId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.node.is_some())
            .map(|(index, slot)| NodeId {
                index: index as u32,
                generation: slot.generation,
            })
            .collect()
    }

    /// Attach `child` under `parent`, detaching it from any previous
    /// parent. Behaviours and handlers cannot call this mid-tick; they
    /// queue the attachment on their [`UiOps`] instead and it lands here
    /// through `flush_attach`.
    pub fn set_parent(&mut self, child: NodeId, parent: NodeId) -> Result<()> {
        if !self.contains(child) || !self.contains(parent) {
            return Err(UiError::NodeNotFound);
        }
        // Reject attachments that would close a loop.
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return Err(UiError::AttachCycle);
            }
            cursor = self.parent(id);
        }
        self.attach_now(child, parent);
        Ok(())
    }

    fn attach_now(&mut self, child: NodeId, parent: NodeId) {
        self.detach(child);
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
        self.mark_needing_layout(parent);
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.node(child).and_then(|n| n.parent) else {
            return;
        };
        if let Some(node) = self.node_mut(parent) {
            node.children.retain(|c| *c != child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = None;
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Topmost ancestor, or the node itself when detached.
    pub fn root_of(&self, id: NodeId) -> Option<NodeId> {
        if !self.contains(id) {
            return None;
        }
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        Some(current)
    }

    /// Depth-first preorder over the live subtree, origin included.
    pub fn descendants(&self, origin: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![origin];
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else { continue };
            if !node.alive {
                continue;
            }
            order.push(id);
            for child in node.children.iter().rev() {
                stack.push(*child);
            }
        }
        order
    }

    // ---- layout ------------------------------------------------------

    /// Bottom-up minimum size, memoized behind the dirty flag.
    pub fn layout_min_size(&mut self, id: NodeId, force: bool) -> Result<Vec2> {
        let node = self.node(id).ok_or(UiError::NodeNotFound)?;
        if !force && !node.needs_layout {
            return Ok(node.cached_min);
        }
        let user_min = node.min_size;
        let border = node.inner_border;
        let sizer = match self.node_mut(id) {
            Some(node) => node.sizer.take(),
            None => None,
        };
        let computed = match sizer {
            Some(mut sizer) => {
                let inner = sizer.min_size(self, force);
                if let Some(node) = self.node_mut(id) {
                    node.sizer = Some(sizer);
                }
                inner + Vec2::new(border.horizontal(), border.vertical())
            }
            None => Vec2::ZERO,
        };
        let min = user_min.max(computed);
        if let Some(node) = self.node_mut(id) {
            node.cached_min = min;
            node.needs_layout = false;
        }
        Ok(min)
    }

    /// Top-down placement. The assigned size never drops below the
    /// computed minimum. Recurses through the owned sizer, then places any
    /// anchored children at their minimum size.
    pub fn assign_rect(&mut self, id: NodeId, rect: Rect) -> Result<()> {
        let min = self.layout_min_size(id, false)?;
        let size = rect.size().max(min);
        let border;
        {
            let node = self.node_mut(id).ok_or(UiError::NodeNotFound)?;
            node.position = rect.pos();
            node.size = size;
            border = node.inner_border;
        }
        let own_rect = Rect::from_pos_size(rect.pos(), size);
        let inner = own_rect.deflate(&border);

        let sizer = self.node_mut(id).and_then(|node| node.sizer.take());
        if let Some(mut sizer) = sizer {
            sizer.assign(self, inner);
            if let Some(node) = self.node_mut(id) {
                node.sizer = Some(sizer);
            }
        }

        let children: Vec<NodeId> = self.children(id).to_vec();
        for child in children {
            let Some(anchor) = self.node(child).and_then(|n| n.anchor) else {
                continue;
            };
            let child_min = self.layout_min_size(child, false)?;
            let pos = anchor.place(own_rect, child_min);
            self.assign_rect(child, Rect::from_pos_size(pos, child_min))?;
        }
        Ok(())
    }

    /// Mark `id` and its ancestor chain dirty. Already-dirty ancestors end
    /// the walk, which keeps repeated calls O(1).
    pub fn mark_needing_layout(&mut self, id: NodeId) {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            match self.node_mut(current) {
                Some(node) if !node.needs_layout => {
                    node.needs_layout = true;
                    cursor = node.parent;
                }
                _ => break,
            }
        }
    }

    // ---- events ------------------------------------------------------

    pub fn on_event<F>(&mut self, id: NodeId, kind: impl Into<String>, handler: F)
    where
        F: FnMut(&UiEvent, &mut UiOps) -> bool + 'static,
    {
        self.install_handler(id, HandlerKey::new(kind, None), handler);
    }

    pub fn on_event_from<F>(
        &mut self,
        id: NodeId,
        kind: impl Into<String>,
        source: impl Into<String>,
        handler: F,
    ) where
        F: FnMut(&UiEvent, &mut UiOps) -> bool + 'static,
    {
        self.install_handler(id, HandlerKey::new(kind, Some(source.into())), handler);
    }

    fn install_handler<F>(&mut self, id: NodeId, key: HandlerKey, handler: F)
    where
        F: FnMut(&UiEvent, &mut UiOps) -> bool + 'static,
    {
        if let Some(node) = self.node_mut(id) {
            node.handlers.insert(key, Box::new(handler));
        }
    }

    pub(crate) fn take_event_handler(
        &mut self,
        id: NodeId,
        key: &HandlerKey,
    ) -> Option<EventHandler> {
        self.node_mut(id).and_then(|node| node.handlers.remove(key))
    }

    pub(crate) fn restore_event_handler(
        &mut self,
        id: NodeId,
        key: HandlerKey,
        handler: EventHandler,
    ) {
        if let Some(node) = self.node_mut(id) {
            node.handlers.insert(key, handler);
        }
    }

    // ---- behaviours and lifecycle -------------------------------------

    pub fn add_behaviour(&mut self, id: NodeId, behaviour: Box<dyn Behaviour>) -> Result<()> {
        self.node_mut(id)
            .ok_or(UiError::NodeNotFound)?
            .add_behaviour(behaviour);
        Ok(())
    }

    /// Behaviours are taken out while they run so they can receive the
    /// tree-wide mutation context without aliasing their own node.
    pub(crate) fn take_behaviours(&mut self, id: NodeId) -> Vec<Box<dyn Behaviour>> {
        self.node_mut(id)
            .map(|node| std::mem::take(&mut node.behaviours))
            .unwrap_or_default()
    }

    pub(crate) fn restore_behaviours(&mut self, id: NodeId, behaviours: Vec<Box<dyn Behaviour>>) {
        if let Some(node) = self.node_mut(id) {
            node.behaviours = behaviours;
        }
    }

    /// Run the per-frame update hook on every live, active node.
    pub(crate) fn update_all(&mut self, ops: &mut UiOps) {
        for id in self.ids() {
            if !self.node(id).map(Node::is_active).unwrap_or(false) {
                continue;
            }
            let mut behaviours = self.take_behaviours(id);
            for behaviour in behaviours.iter_mut() {
                behaviour.update(id, ops);
            }
            self.restore_behaviours(id, behaviours);
        }
    }

    /// Request removal. Vetoable by behaviours; retried every tick until
    /// they all agree. Calling it again while pending is a no-op.
    pub fn request_destroy(&mut self, id: NodeId) {
        if let Some(node) = self.node_mut(id) {
            if node.alive {
                node.destroy_requested = true;
            }
        }
    }

    /// Immediate, non-vetoable removal of the subtree. Used for whole-tree
    /// teardown where exit transitions are irrelevant.
    pub fn force_destroy(&mut self, id: NodeId) {
        if self.contains(id) {
            self.mark_subtree_dead(id);
            self.pending_prune.push(id);
        }
    }

    /// Ask behaviours about every pending destroy. Returns the nodes whose
    /// removal resolved this tick; their subtrees are now dead and queued
    /// for pruning.
    pub(crate) fn resolve_destroys(&mut self) -> Vec<NodeId> {
        let mut resolved = Vec::new();
        for id in self.ids() {
            let requested = self
                .node(id)
                .map(|n| n.alive && n.destroy_requested)
                .unwrap_or(false);
            if !requested {
                continue;
            }
            let mut behaviours = self.take_behaviours(id);
            let agreed = behaviours.iter_mut().all(|b| b.can_destroy(id));
            self.restore_behaviours(id, behaviours);
            if agreed {
                self.mark_subtree_dead(id);
                self.pending_prune.push(id);
                resolved.push(id);
            }
        }
        resolved
    }

    fn mark_subtree_dead(&mut self, id: NodeId) {
        for member in self.descendants(id) {
            if let Some(node) = self.node_mut(member) {
                node.alive = false;
                node.focused = false;
                node.destroy_requested = false;
            }
        }
    }

    /// Free every subtree queued for pruning. Returns the number of slots
    /// released.
    pub(crate) fn prune_dead(&mut self) -> usize {
        let queued: Vec<NodeId> = self.pending_prune.drain(..).collect();
        let mut freed = 0;
        for top in queued {
            if !self.contains(top) {
                continue;
            }
            self.detach(top);
            // Collect before freeing; descendants skips dead nodes.
            let mut members = Vec::new();
            let mut stack = vec![top];
            while let Some(id) = stack.pop() {
                let Some(node) = self.node(id) else { continue };
                members.push(id);
                stack.extend(node.children.iter().copied());
            }
            for id in members {
                let slot = &mut self.slots[id.index as usize];
                if slot.generation == id.generation && slot.node.is_some() {
                    slot.node = None;
                    slot.generation += 1;
                    self.free.push(id.index);
                    freed += 1;
                }
            }
        }
        freed
    }

    /// Queue an attachment for the next `flush_attach`.
    pub(crate) fn queue_attach(&mut self, child: NodeId, parent: NodeId) {
        self.pending_attach.push((child, parent));
    }

    /// Apply parent attachments queued during the update phase. Requests
    /// whose endpoints died in the meantime, or that would now close a
    /// loop, are dropped.
    pub(crate) fn flush_attach(&mut self) {
        let queued: Vec<(NodeId, NodeId)> = self.pending_attach.drain(..).collect();
        for (child, parent) in queued {
            let _ = self.set_parent(child, parent);
        }
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{FillFlags, Sizer};

    struct Veto {
        votes_left: u32,
    }

    impl Behaviour for Veto {
        fn name(&self) -> &str {
            "veto"
        }

        fn can_destroy(&mut self, _node: NodeId) -> bool {
            if self.votes_left > 0 {
                self.votes_left -= 1;
                false
            } else {
                true
            }
        }
    }

    #[test]
    fn stale_id_fails_lookup_after_prune() {
        let mut tree = Tree::new();
        let id = tree.create("panel");
        tree.force_destroy(id);
        tree.prune_dead();
        assert!(!tree.contains(id));
        assert!(tree.node(id).is_none());
    }

    #[test]
    fn reused_slot_gets_a_fresh_generation() {
        let mut tree = Tree::new();
        let first = tree.create("first");
        tree.force_destroy(first);
        tree.prune_dead();
        let second = tree.create("second");
        assert_ne!(first, second);
        assert!(tree.node(second).is_some());
        assert!(tree.node(first).is_none());
    }

    #[test]
    fn attach_cycle_is_rejected() {
        let mut tree = Tree::new();
        let a = tree.create("a");
        let b = tree.create("b");
        tree.set_parent(b, a).unwrap();
        let err = tree.set_parent(a, b).unwrap_err();
        assert!(matches!(err, UiError::AttachCycle));
        let err = tree.set_parent(a, a).unwrap_err();
        assert!(matches!(err, UiError::AttachCycle));
    }

    #[test]
    fn min_size_is_memoized_until_marked_dirty() {
        let mut tree = Tree::new();
        let id = tree.create("label");
        tree.node_mut(id).unwrap().min_size = Vec2::new(10.0, 4.0);
        assert_eq!(tree.layout_min_size(id, false).unwrap().x, 10.0);

        tree.node_mut(id).unwrap().min_size = Vec2::new(20.0, 4.0);
        assert_eq!(tree.layout_min_size(id, false).unwrap().x, 10.0);

        tree.mark_needing_layout(id);
        assert_eq!(tree.layout_min_size(id, false).unwrap().x, 20.0);
    }

    #[test]
    fn sizer_minimum_includes_inner_border() {
        let mut tree = Tree::new();
        let panel = tree.create("panel");
        let leaf = tree.create("leaf");
        tree.node_mut(leaf).unwrap().min_size = Vec2::new(30.0, 10.0);
        tree.set_parent(leaf, panel).unwrap();

        let mut sizer = Sizer::horizontal();
        sizer.add(leaf, 1.0, Insets::default(), FillFlags::FILL);
        let node = tree.node_mut(panel).unwrap();
        node.inner_border = Insets::uniform(2.0);
        node.set_sizer(sizer);

        let min = tree.layout_min_size(panel, false).unwrap();
        assert_eq!(min, Vec2::new(34.0, 14.0));
    }

    #[test]
    fn destroy_veto_postpones_removal() {
        let mut tree = Tree::new();
        let id = tree.create("dialog");
        tree.add_behaviour(id, Box::new(Veto { votes_left: 1 })).unwrap();

        tree.request_destroy(id);
        assert!(tree.resolve_destroys().is_empty());
        assert!(tree.node(id).unwrap().is_alive());

        let resolved = tree.resolve_destroys();
        assert_eq!(resolved, vec![id]);
        assert!(!tree.node(id).unwrap().is_alive());
        assert_eq!(tree.prune_dead(), 1);
        assert!(!tree.contains(id));
    }

    #[test]
    fn destroy_twice_is_idempotent() {
        let mut tree = Tree::new();
        let id = tree.create("panel");
        tree.request_destroy(id);
        tree.request_destroy(id);
        assert_eq!(tree.resolve_destroys(), vec![id]);
        tree.request_destroy(id);
        assert!(tree.resolve_destroys().is_empty());
        tree.prune_dead();
        tree.prune_dead();
        assert!(!tree.contains(id));
    }

    #[test]
    fn pruning_frees_the_whole_subtree() {
        let mut tree = Tree::new();
        let root = tree.create("root");
        let child = tree.create("child");
        let grandchild = tree.create("grandchild");
        tree.set_parent(child, root).unwrap();
        tree.set_parent(grandchild, child).unwrap();

        tree.request_destroy(child);
        tree.resolve_destroys();
        assert_eq!(tree.prune_dead(), 2);
        assert!(tree.contains(root));
        assert!(!tree.contains(child));
        assert!(!tree.contains(grandchild));
        assert!(tree.children(root).is_empty());
    }

    #[test]
    fn anchor_centres_and_clamps() {
        let mut tree = Tree::new();
        let parent = tree.create("hud");
        let tooltip = tree.create("tooltip");
        tree.set_parent(tooltip, parent).unwrap();
        tree.node_mut(tooltip).unwrap().min_size = Vec2::new(20.0, 10.0);
        tree.node_mut(tooltip).unwrap().anchor =
            Some(Anchor::new(Vec2::new(0.5, 0.5), Vec2::new(0.5, 0.5)));

        tree.assign_rect(parent, Rect::new(0.0, 0.0, 100.0, 100.0))
            .unwrap();
        assert_eq!(tree.node(tooltip).unwrap().position, Vec2::new(40.0, 45.0));

        tree.node_mut(tooltip).unwrap().anchor =
            Some(Anchor::new(Vec2::new(1.0, 1.0), Vec2::ZERO));
        tree.mark_needing_layout(parent);
        tree.assign_rect(parent, Rect::new(0.0, 0.0, 100.0, 100.0))
            .unwrap();
        assert_eq!(tree.node(tooltip).unwrap().position, Vec2::new(80.0, 90.0));
    }

    #[test]
    fn queued_attach_applies_on_flush() {
        let mut tree = Tree::new();
        let root = tree.create("root");
        let late = tree.create("late");
        tree.queue_attach(late, root);
        assert!(tree.children(root).is_empty());
        tree.flush_attach();
        assert_eq!(tree.children(root), &[late]);
        assert_eq!(tree.parent(late), Some(root));
    }
}
