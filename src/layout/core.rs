use bitflags::bitflags;

use crate::error::{Result, UiError};
use crate::geometry::{Insets, Rect, Vec2};
use crate::tree::{NodeId, Tree};

bitflags! {
    /// Per-entry placement flags inside an allocated slot.
    ///
    /// Fill flags stretch the entry across the slot axis; alignment flags
    /// position the entry's minimum-size box inside the slot. Left/top
    /// alignment is the default when neither fill nor alignment is set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FillFlags: u8 {
        const FILL_H = 1 << 0;
        const FILL_V = 1 << 1;
        const ALIGN_LEFT = 1 << 2;
        const ALIGN_RIGHT = 1 << 3;
        const ALIGN_TOP = 1 << 4;
        const ALIGN_BOTTOM = 1 << 5;
        const CENTER_H = 1 << 6;
        const CENTER_V = 1 << 7;
    }
}

impl FillFlags {
    pub const FILL: Self = Self::FILL_H.union(Self::FILL_V);
    pub const CENTER: Self = Self::CENTER_H.union(Self::CENTER_V);
}

/// Main-axis direction of a box sizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// What a sizer entry manages: a tree node or a nested sizer.
pub enum SizerItem {
    Node(NodeId),
    Nested(Box<Sizer>),
}

/// One managed element plus its layout parameters.
pub struct SizerEntry {
    pub item: SizerItem,
    /// Weight for leftover-space distribution. Zero never grows.
    pub proportion: f32,
    pub border: Insets,
    pub flags: FillFlags,
    /// Grid cell, meaningful only inside a grid sizer.
    pub cell: (usize, usize),
    /// Declared rect, meaningful only inside a free sizer.
    pub placed: Rect,
}

impl SizerEntry {
    fn new(item: SizerItem, proportion: f32, border: Insets, flags: FillFlags) -> Self {
        Self {
            item,
            proportion,
            border,
            flags,
            cell: (0, 0),
            placed: Rect::ZERO,
        }
    }

    fn min_size(&mut self, tree: &mut Tree, force: bool) -> Vec2 {
        item_min_size(&mut self.item, tree, force)
    }
}

fn item_min_size(item: &mut SizerItem, tree: &mut Tree, force: bool) -> Vec2 {
    match item {
        SizerItem::Node(id) => tree.layout_min_size(*id, force).unwrap_or(Vec2::ZERO),
        SizerItem::Nested(sizer) => sizer.min_size(tree, force),
    }
}

/// Place an entry's content inside its slot per fill/alignment flags.
///
/// The content never shrinks below `min`; a slot smaller than the minimum
/// overflows rather than violating the minimum-size invariant.
pub(crate) fn place_in_slot(slot: Rect, min: Vec2, flags: FillFlags) -> Rect {
    let width = if flags.contains(FillFlags::FILL_H) {
        slot.width.max(min.x)
    } else {
        min.x
    };
    let height = if flags.contains(FillFlags::FILL_V) {
        slot.height.max(min.y)
    } else {
        min.y
    };

    let x = if flags.contains(FillFlags::CENTER_H) {
        slot.x + ((slot.width - width) / 2.0).max(0.0)
    } else if flags.contains(FillFlags::ALIGN_RIGHT) {
        slot.x + (slot.width - width).max(0.0)
    } else {
        slot.x
    };
    let y = if flags.contains(FillFlags::CENTER_V) {
        slot.y + ((slot.height - height) / 2.0).max(0.0)
    } else if flags.contains(FillFlags::ALIGN_BOTTOM) {
        slot.y + (slot.height - height).max(0.0)
    } else {
        slot.y
    };

    Rect::new(x, y, width, height)
}

fn assign_item(item: &mut SizerItem, tree: &mut Tree, rect: Rect) {
    match item {
        SizerItem::Node(id) => {
            // Stale ids are skipped; the entry is cleaned up on the next remove.
            let _ = tree.assign_rect(*id, rect);
        }
        SizerItem::Nested(sizer) => sizer.assign(tree, rect),
    }
}

fn assign_entry(entry: &mut SizerEntry, tree: &mut Tree, slot: Rect) {
    let slot = slot.deflate(&entry.border);
    let min = item_min_size(&mut entry.item, tree, false);
    let rect = place_in_slot(slot, min, entry.flags);
    assign_item(&mut entry.item, tree, rect);
}

/// Split `total` across entries: each gets its minimum, then slack is
/// distributed proportionally to the weights. Zero-weight entries never grow.
pub(crate) fn distribute_slack(mins: &[f32], weights: &[f32], total: f32) -> Vec<f32> {
    debug_assert_eq!(mins.len(), weights.len());
    let min_sum: f32 = mins.iter().sum();
    let slack = (total - min_sum).max(0.0);
    let weight_sum: f32 = weights.iter().filter(|w| **w > 0.0).sum();
    if slack <= 0.0 || weight_sum <= 0.0 {
        return mins.to_vec();
    }
    mins.iter()
        .zip(weights)
        .map(|(min, weight)| {
            if *weight > 0.0 {
                min + slack * weight / weight_sum
            } else {
                *min
            }
        })
        .collect()
}

/// Box sizer: stacks entries along one axis, growing them by proportion.
pub struct BoxSizer {
    pub orientation: Orientation,
    pub gap: f32,
    pub(crate) entries: Vec<SizerEntry>,
}

impl BoxSizer {
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            gap: 0.0,
            entries: Vec::new(),
        }
    }

    pub fn with_gap(mut self, gap: f32) -> Self {
        self.gap = gap;
        self
    }

    pub fn add(&mut self, item: SizerItem, proportion: f32, border: Insets, flags: FillFlags) {
        self.entries
            .push(SizerEntry::new(item, proportion, border, flags));
    }

    fn gap_total(&self) -> f32 {
        self.gap * self.entries.len().saturating_sub(1) as f32
    }

    fn min_size(&mut self, tree: &mut Tree, force: bool) -> Vec2 {
        let mut main = 0.0_f32;
        let mut cross = 0.0_f32;
        let horizontal = self.orientation == Orientation::Horizontal;
        for entry in &mut self.entries {
            let min = entry.min_size(tree, force);
            let (entry_main, entry_cross) = if horizontal {
                (min.x + entry.border.horizontal(), min.y + entry.border.vertical())
            } else {
                (min.y + entry.border.vertical(), min.x + entry.border.horizontal())
            };
            main += entry_main;
            cross = cross.max(entry_cross);
        }
        main += self.gap_total();
        if horizontal {
            Vec2::new(main, cross)
        } else {
            Vec2::new(cross, main)
        }
    }

    fn assign(&mut self, tree: &mut Tree, rect: Rect) {
        if self.entries.is_empty() {
            return;
        }
        let horizontal = self.orientation == Orientation::Horizontal;
        let total = if horizontal { rect.width } else { rect.height } - self.gap_total();

        let mut mins = Vec::with_capacity(self.entries.len());
        let mut weights = Vec::with_capacity(self.entries.len());
        for entry in &mut self.entries {
            let min = entry.min_size(tree, false);
            mins.push(if horizontal {
                min.x + entry.border.horizontal()
            } else {
                min.y + entry.border.vertical()
            });
            weights.push(entry.proportion);
        }

        let spans = distribute_slack(&mins, &weights, total);
        let mut cursor = if horizontal { rect.x } else { rect.y };
        for (entry, span) in self.entries.iter_mut().zip(spans) {
            let slot = if horizontal {
                Rect::new(cursor, rect.y, span, rect.height)
            } else {
                Rect::new(rect.x, cursor, rect.width, span)
            };
            assign_entry(entry, tree, slot);
            cursor += span + self.gap;
        }
    }
}

/// Free sizer: entries sit at explicit rects declared at add-time.
#[derive(Default)]
pub struct FreeSizer {
    pub(crate) entries: Vec<SizerEntry>,
}

impl FreeSizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_at(&mut self, item: SizerItem, placed: Rect, flags: FillFlags) {
        let mut entry = SizerEntry::new(item, 0.0, Insets::ZERO, flags);
        entry.placed = placed;
        self.entries.push(entry);
    }

    fn min_size(&mut self, tree: &mut Tree, force: bool) -> Vec2 {
        let mut bounds = Rect::ZERO;
        for entry in &mut self.entries {
            // Keep the declared size honest against the entry's own minimum.
            let min = entry.min_size(tree, force);
            let rect = Rect::new(
                entry.placed.x,
                entry.placed.y,
                entry.placed.width.max(min.x),
                entry.placed.height.max(min.y),
            );
            bounds = bounds.union(&rect);
        }
        Vec2::new(bounds.right().max(0.0), bounds.bottom().max(0.0))
    }

    fn assign(&mut self, tree: &mut Tree, rect: Rect) {
        for entry in &mut self.entries {
            let slot = Rect::new(
                rect.x + entry.placed.x,
                rect.y + entry.placed.y,
                entry.placed.width,
                entry.placed.height,
            );
            assign_entry(entry, tree, slot);
        }
    }
}

/// A layout algorithm owned by a node.
pub enum Sizer {
    Box(BoxSizer),
    Grid(super::grid::GridSizer),
    Free(FreeSizer),
}

impl Sizer {
    pub fn horizontal() -> Self {
        Sizer::Box(BoxSizer::new(Orientation::Horizontal))
    }

    pub fn vertical() -> Self {
        Sizer::Box(BoxSizer::new(Orientation::Vertical))
    }

    /// Append a node-backed entry. Grid sizers require [`Sizer::place`].
    pub fn add(&mut self, node: NodeId, proportion: f32, border: Insets, flags: FillFlags) {
        match self {
            Sizer::Box(sizer) => sizer.add(SizerItem::Node(node), proportion, border, flags),
            Sizer::Grid(sizer) => sizer.push(SizerItem::Node(node), proportion, border, flags),
            Sizer::Free(sizer) => sizer.add_at(SizerItem::Node(node), Rect::ZERO, flags),
        }
    }

    /// Append a nested sizer entry.
    pub fn add_nested(
        &mut self,
        nested: Sizer,
        proportion: f32,
        border: Insets,
        flags: FillFlags,
    ) {
        let item = SizerItem::Nested(Box::new(nested));
        match self {
            Sizer::Box(sizer) => sizer.add(item, proportion, border, flags),
            Sizer::Grid(sizer) => sizer.push(item, proportion, border, flags),
            Sizer::Free(sizer) => sizer.add_at(item, Rect::ZERO, flags),
        }
    }

    /// Place a node at an explicit grid cell.
    pub fn place(
        &mut self,
        node: NodeId,
        row: usize,
        col: usize,
        border: Insets,
        flags: FillFlags,
    ) -> Result<()> {
        match self {
            Sizer::Grid(sizer) => sizer.place(SizerItem::Node(node), row, col, border, flags),
            _ => Err(UiError::SizerMismatch { expected: "grid" }),
        }
    }

    /// Place a node at an explicit rect inside a free sizer.
    pub fn add_at(&mut self, node: NodeId, rect: Rect, flags: FillFlags) {
        match self {
            Sizer::Free(sizer) => sizer.add_at(SizerItem::Node(node), rect, flags),
            Sizer::Box(sizer) => sizer.add(SizerItem::Node(node), 0.0, Insets::ZERO, flags),
            Sizer::Grid(sizer) => sizer.push(SizerItem::Node(node), 0.0, Insets::ZERO, flags),
        }
    }

    /// Drop every entry managing `node`. Idempotent; returns whether anything
    /// was removed. Recurses into nested sizers.
    pub fn remove(&mut self, node: NodeId) -> bool {
        let entries = match self {
            Sizer::Box(sizer) => &mut sizer.entries,
            Sizer::Grid(sizer) => &mut sizer.entries,
            Sizer::Free(sizer) => &mut sizer.entries,
        };
        let before = entries.len();
        entries.retain_mut(|entry| match &mut entry.item {
            SizerItem::Node(id) => *id != node,
            SizerItem::Nested(nested) => {
                nested.remove(node);
                true
            }
        });
        before != entries.len()
    }

    pub fn min_size(&mut self, tree: &mut Tree, force: bool) -> Vec2 {
        match self {
            Sizer::Box(sizer) => sizer.min_size(tree, force),
            Sizer::Grid(sizer) => sizer.min_size(tree, force),
            Sizer::Free(sizer) => sizer.min_size(tree, force),
        }
    }

    pub fn assign(&mut self, tree: &mut Tree, rect: Rect) {
        match self {
            Sizer::Box(sizer) => sizer.assign(tree, rect),
            Sizer::Grid(sizer) => sizer.assign(tree, rect),
            Sizer::Free(sizer) => sizer.assign(tree, rect),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Sizer::Box(sizer) => sizer.entries.len(),
            Sizer::Grid(sizer) => sizer.entries.len(),
            Sizer::Free(sizer) => sizer.entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
