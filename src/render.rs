//! Paint-order snapshot for the render collaborator.
//!
//! The core never rasterizes anything. After layout, [`RenderList::snapshot`]
//! flattens the active tree into draw items the backend consumes: a rect, a
//! z key (children after parents, shifted by the subtree's layer
//! adjustment), and the clip in force at that node.

use crate::geometry::Rect;
use crate::tree::{NodeId, Tree};

#[derive(Debug, Clone)]
pub struct DrawItem {
    pub node: NodeId,
    pub rect: Rect,
    pub z: i32,
    /// Clip rect inherited from ancestors with `clips_children`, `None`
    /// when unclipped.
    pub clip: Option<Rect>,
}

/// Back-to-front draw items for one frame.
#[derive(Debug, Clone, Default)]
pub struct RenderList {
    items: Vec<DrawItem>,
}

impl RenderList {
    pub fn items(&self) -> &[DrawItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn snapshot(tree: &Tree, root: NodeId, screen: Rect) -> Self {
        let mut list = RenderList::default();
        list.visit(tree, root, 0, screen, None);
        list
    }

    fn visit(&mut self, tree: &Tree, id: NodeId, z: i32, screen: Rect, clip: Option<Rect>) {
        let Some(node) = tree.node(id) else { return };
        if !node.is_active() {
            return;
        }
        let rect = node.rect();
        // Fully clipped-out subtrees produce nothing.
        if clip.unwrap_or(screen).intersect(&rect).is_empty() {
            return;
        }
        self.items.push(DrawItem {
            node: id,
            rect,
            z,
            clip,
        });

        let child_clip = if node.clips_children {
            Some(clip.map_or(rect, |c| c.intersect(&rect)))
        } else {
            clip
        };

        // Lowest layer first so higher layers paint on top; later siblings
        // on top within a layer.
        let mut order: Vec<(i32, usize, NodeId)> = node
            .children
            .iter()
            .enumerate()
            .map(|(index, child)| {
                let layer = tree
                    .node(*child)
                    .map(|n| n.child_layer_adjustment)
                    .unwrap_or(0);
                (layer, index, *child)
            })
            .collect();
        order.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
        for (layer, _, child) in order {
            self.visit(tree, child, z + 1 + layer, screen, child_clip);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sized(tree: &mut Tree, name: &str, rect: Rect) -> NodeId {
        let id = tree.create(name);
        let node = tree.node_mut(id).unwrap();
        node.position = rect.pos();
        node.size = rect.size();
        id
    }

    #[test]
    fn parents_precede_children_and_layers_reorder_siblings() {
        let mut tree = Tree::new();
        let screen = Rect::new(0.0, 0.0, 100.0, 100.0);
        let root = sized(&mut tree, "root", screen);
        let low = sized(&mut tree, "low", Rect::new(0.0, 0.0, 10.0, 10.0));
        let high = sized(&mut tree, "high", Rect::new(0.0, 0.0, 10.0, 10.0));
        tree.set_parent(high, root).unwrap();
        tree.set_parent(low, root).unwrap();
        tree.node_mut(high).unwrap().child_layer_adjustment = 1;

        let list = RenderList::snapshot(&tree, root, screen);
        let order: Vec<NodeId> = list.items().iter().map(|i| i.node).collect();
        assert_eq!(order, vec![root, low, high]);
        assert_eq!(list.items()[2].z, 2);
    }

    #[test]
    fn inactive_and_offscreen_nodes_are_skipped() {
        let mut tree = Tree::new();
        let screen = Rect::new(0.0, 0.0, 100.0, 100.0);
        let root = sized(&mut tree, "root", screen);
        let hidden = sized(&mut tree, "hidden", Rect::new(0.0, 0.0, 10.0, 10.0));
        let offscreen = sized(&mut tree, "offscreen", Rect::new(500.0, 0.0, 10.0, 10.0));
        tree.set_parent(hidden, root).unwrap();
        tree.set_parent(offscreen, root).unwrap();
        tree.node_mut(hidden).unwrap().active_by_user = false;

        let list = RenderList::snapshot(&tree, root, screen);
        assert_eq!(list.len(), 1);
        assert_eq!(list.items()[0].node, root);
    }

    #[test]
    fn clip_propagates_from_clipping_ancestors() {
        let mut tree = Tree::new();
        let screen = Rect::new(0.0, 0.0, 100.0, 100.0);
        let root = sized(&mut tree, "root", screen);
        let pane = sized(&mut tree, "pane", Rect::new(10.0, 10.0, 30.0, 30.0));
        let inner = sized(&mut tree, "inner", Rect::new(20.0, 20.0, 50.0, 50.0));
        tree.set_parent(pane, root).unwrap();
        tree.set_parent(inner, pane).unwrap();
        tree.node_mut(pane).unwrap().clips_children = true;

        let list = RenderList::snapshot(&tree, root, screen);
        let inner_item = list.items().iter().find(|i| i.node == inner).unwrap();
        assert_eq!(inner_item.clip, Some(Rect::new(10.0, 10.0, 30.0, 30.0)));
    }
}
