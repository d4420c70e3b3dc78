//! Focus transitions and tab-order cycling.

use crate::error::{Result, UiError};
use crate::events::UiOps;
use crate::tree::{NodeId, Tree};

/// Move focus to `target` (`None` blurs). Fires `on_focus_lost` on the old
/// holder before `on_focus` on the new one, so at most one node reports
/// focused at any point. Returns whether focus actually moved.
///
/// Unattached targets are structural misuse; non-focusable ones are a
/// silent no-op (the caller often cannot know a node was disabled this
/// frame).
pub(crate) fn transfer(
    tree: &mut Tree,
    current: &mut Option<NodeId>,
    target: Option<NodeId>,
    root: NodeId,
    ops: &mut UiOps,
) -> Result<bool> {
    if let Some(id) = target {
        let node = tree.node(id).ok_or(UiError::NodeNotFound)?;
        if tree.root_of(id) != Some(root) {
            return Err(UiError::NotAttached(node.name.clone()));
        }
        if !node.can_receive_focus() {
            return Ok(false);
        }
    }
    if *current == target {
        return Ok(false);
    }

    if let Some(old) = current.take() {
        if let Some(node) = tree.node_mut(old) {
            node.focused = false;
        }
        let mut behaviours = tree.take_behaviours(old);
        for behaviour in behaviours.iter_mut() {
            behaviour.on_focus_lost(old, ops);
        }
        tree.restore_behaviours(old, behaviours);
    }

    if let Some(id) = target {
        if let Some(node) = tree.node_mut(id) {
            node.focused = true;
        }
        let mut behaviours = tree.take_behaviours(id);
        for behaviour in behaviours.iter_mut() {
            behaviour.on_focus(id, ops);
        }
        tree.restore_behaviours(id, behaviours);
    }

    *current = target;
    Ok(true)
}

/// Focusable nodes of the scope subtree in tree order.
pub(crate) fn ring(tree: &Tree, scope: NodeId) -> Vec<NodeId> {
    tree.descendants(scope)
        .into_iter()
        .filter(|id| {
            tree.node(*id)
                .map(|node| node.can_receive_focus())
                .unwrap_or(false)
        })
        .collect()
}

/// Next (or previous) focus target in the ring, wrapping. A current holder
/// outside the ring restarts from the edge.
pub(crate) fn cycle(
    tree: &Tree,
    current: Option<NodeId>,
    scope: NodeId,
    forward: bool,
) -> Option<NodeId> {
    let ring = ring(tree, scope);
    if ring.is_empty() {
        return None;
    }
    let position = current.and_then(|id| ring.iter().position(|r| *r == id));
    let index = match (position, forward) {
        (Some(i), true) => (i + 1) % ring.len(),
        (Some(i), false) => (i + ring.len() - 1) % ring.len(),
        (None, true) => 0,
        (None, false) => ring.len() - 1,
    };
    Some(ring[index])
}
