//! Grid sizer: fixed row/column tracks with per-cell placement.
//!
//! Track minimums come from the largest entry in each track; leftover space
//! is split across tracks by explicit weights, or uniformly when no weights
//! were declared. Each cell then behaves like a box-sizer slot for
//! fill/alignment purposes.

use crate::error::{Result, UiError};
use crate::geometry::{Insets, Rect, Vec2};
use crate::tree::Tree;

use super::core::{FillFlags, SizerEntry, SizerItem, distribute_slack};

pub struct GridSizer {
    rows: usize,
    cols: usize,
    pub row_gap: f32,
    pub col_gap: f32,
    row_weights: Vec<f32>,
    col_weights: Vec<f32>,
    pub(crate) entries: Vec<SizerEntry>,
    cursor: usize,
}

impl GridSizer {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows: rows.max(1),
            cols: cols.max(1),
            row_gap: 0.0,
            col_gap: 0.0,
            row_weights: Vec::new(),
            col_weights: Vec::new(),
            entries: Vec::new(),
            cursor: 0,
        }
    }

    pub fn with_gaps(mut self, row_gap: f32, col_gap: f32) -> Self {
        self.row_gap = row_gap;
        self.col_gap = col_gap;
        self
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Explicit slack weight for one row. Unset rows share uniformly.
    pub fn set_row_weight(&mut self, row: usize, weight: f32) -> Result<()> {
        if row >= self.rows {
            return Err(self.placement_error(row, 0));
        }
        if self.row_weights.is_empty() {
            self.row_weights = vec![1.0; self.rows];
        }
        self.row_weights[row] = weight.max(0.0);
        Ok(())
    }

    /// Explicit slack weight for one column. Unset columns share uniformly.
    pub fn set_col_weight(&mut self, col: usize, weight: f32) -> Result<()> {
        if col >= self.cols {
            return Err(self.placement_error(0, col));
        }
        if self.col_weights.is_empty() {
            self.col_weights = vec![1.0; self.cols];
        }
        self.col_weights[col] = weight.max(0.0);
        Ok(())
    }

    /// Place an entry at an explicit cell.
    pub fn place(
        &mut self,
        item: SizerItem,
        row: usize,
        col: usize,
        border: Insets,
        flags: FillFlags,
    ) -> Result<()> {
        if row >= self.rows || col >= self.cols {
            return Err(self.placement_error(row, col));
        }
        self.entries.push(SizerEntry {
            item,
            proportion: 0.0,
            border,
            flags,
            cell: (row, col),
            placed: Rect::ZERO,
        });
        self.cursor = (row * self.cols + col + 1).min(self.rows * self.cols);
        Ok(())
    }

    /// Append at the next free cell in row-major order. Used by the generic
    /// `Sizer::add` path; overflow wraps onto the last cell.
    pub(crate) fn push(
        &mut self,
        item: SizerItem,
        _proportion: f32,
        border: Insets,
        flags: FillFlags,
    ) {
        let index = self.cursor.min(self.rows * self.cols - 1);
        let (row, col) = (index / self.cols, index % self.cols);
        // Placement is in-bounds by construction.
        let _ = self.place(item, row, col, border, flags);
    }

    fn placement_error(&self, row: usize, col: usize) -> UiError {
        UiError::GridPlacement {
            row,
            col,
            rows: self.rows,
            cols: self.cols,
        }
    }

    fn track_minimums(&mut self, tree: &mut Tree, force: bool) -> (Vec<f32>, Vec<f32>) {
        let mut col_mins = vec![0.0_f32; self.cols];
        let mut row_mins = vec![0.0_f32; self.rows];
        for entry in &mut self.entries {
            let (row, col) = entry.cell;
            let min = match &mut entry.item {
                SizerItem::Node(id) => tree.layout_min_size(*id, force).unwrap_or(Vec2::ZERO),
                SizerItem::Nested(sizer) => sizer.min_size(tree, force),
            };
            col_mins[col] = col_mins[col].max(min.x + entry.border.horizontal());
            row_mins[row] = row_mins[row].max(min.y + entry.border.vertical());
        }
        (row_mins, col_mins)
    }

    pub(crate) fn min_size(&mut self, tree: &mut Tree, force: bool) -> Vec2 {
        let (row_mins, col_mins) = self.track_minimums(tree, force);
        let width: f32 = col_mins.iter().sum::<f32>() + self.col_gap * (self.cols - 1) as f32;
        let height: f32 = row_mins.iter().sum::<f32>() + self.row_gap * (self.rows - 1) as f32;
        Vec2::new(width, height)
    }

    pub(crate) fn assign(&mut self, tree: &mut Tree, rect: Rect) {
        if self.entries.is_empty() {
            return;
        }
        let (row_mins, col_mins) = self.track_minimums(tree, false);

        let uniform_cols = vec![1.0; self.cols];
        let uniform_rows = vec![1.0; self.rows];
        let col_weights = if self.col_weights.is_empty() {
            &uniform_cols
        } else {
            &self.col_weights
        };
        let row_weights = if self.row_weights.is_empty() {
            &uniform_rows
        } else {
            &self.row_weights
        };

        let usable_w = rect.width - self.col_gap * (self.cols - 1) as f32;
        let usable_h = rect.height - self.row_gap * (self.rows - 1) as f32;
        let col_spans = distribute_slack(&col_mins, col_weights, usable_w);
        let row_spans = distribute_slack(&row_mins, row_weights, usable_h);

        let mut col_offsets = Vec::with_capacity(self.cols);
        let mut x = rect.x;
        for span in &col_spans {
            col_offsets.push(x);
            x += span + self.col_gap;
        }
        let mut row_offsets = Vec::with_capacity(self.rows);
        let mut y = rect.y;
        for span in &row_spans {
            row_offsets.push(y);
            y += span + self.row_gap;
        }

        for entry in &mut self.entries {
            let (row, col) = entry.cell;
            let cell = Rect::new(
                col_offsets[col],
                row_offsets[row],
                col_spans[col],
                row_spans[row],
            );
            let slot = cell.deflate(&entry.border);
            let min = match &mut entry.item {
                SizerItem::Node(id) => tree.layout_min_size(*id, false).unwrap_or(Vec2::ZERO),
                SizerItem::Nested(sizer) => sizer.min_size(tree, false),
            };
            let placed = super::core::place_in_slot(slot, min, entry.flags);
            match &mut entry.item {
                SizerItem::Node(id) => {
                    let _ = tree.assign_rect(*id, placed);
                }
                SizerItem::Nested(sizer) => sizer.assign(tree, placed),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{NodeId, Tree};

    fn leaf(tree: &mut Tree, min: Vec2) -> NodeId {
        let id = tree.create("cell");
        tree.node_mut(id).unwrap().min_size = min;
        id
    }

    #[test]
    fn column_minimum_is_max_of_entries() {
        let mut tree = Tree::new();
        let narrow = leaf(&mut tree, Vec2::new(5.0, 4.0));
        let wide = leaf(&mut tree, Vec2::new(15.0, 4.0));
        let mut grid = GridSizer::new(2, 1);
        grid.place(SizerItem::Node(narrow), 0, 0, Insets::ZERO, FillFlags::empty())
            .unwrap();
        grid.place(SizerItem::Node(wide), 1, 0, Insets::ZERO, FillFlags::empty())
            .unwrap();
        let min = grid.min_size(&mut tree, false);
        assert_eq!(min, Vec2::new(15.0, 8.0));
    }

    #[test]
    fn min_size_includes_gaps() {
        let mut tree = Tree::new();
        let a = leaf(&mut tree, Vec2::new(10.0, 10.0));
        let b = leaf(&mut tree, Vec2::new(10.0, 10.0));
        let mut grid = GridSizer::new(1, 2).with_gaps(0.0, 4.0);
        grid.place(SizerItem::Node(a), 0, 0, Insets::ZERO, FillFlags::empty())
            .unwrap();
        grid.place(SizerItem::Node(b), 0, 1, Insets::ZERO, FillFlags::empty())
            .unwrap();
        assert_eq!(grid.min_size(&mut tree, false), Vec2::new(24.0, 10.0));
    }

    #[test]
    fn adding_an_entry_never_shrinks_minimum() {
        let mut tree = Tree::new();
        let mut grid = GridSizer::new(2, 2);
        let mut previous = Vec2::ZERO;
        for (row, col) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
            let id = leaf(&mut tree, Vec2::new(7.0, 3.0));
            grid.place(SizerItem::Node(id), row, col, Insets::ZERO, FillFlags::empty())
                .unwrap();
            let min = grid.min_size(&mut tree, true);
            assert!(min.x >= previous.x && min.y >= previous.y);
            previous = min;
        }
    }

    #[test]
    fn slack_uses_explicit_column_weights() {
        let mut tree = Tree::new();
        let a = leaf(&mut tree, Vec2::new(10.0, 10.0));
        let b = leaf(&mut tree, Vec2::new(10.0, 10.0));
        let mut grid = GridSizer::new(1, 2);
        grid.place(SizerItem::Node(a), 0, 0, Insets::ZERO, FillFlags::FILL)
            .unwrap();
        grid.place(SizerItem::Node(b), 0, 1, Insets::ZERO, FillFlags::FILL)
            .unwrap();
        grid.set_col_weight(0, 3.0).unwrap();
        grid.set_col_weight(1, 1.0).unwrap();

        grid.assign(&mut tree, Rect::new(0.0, 0.0, 60.0, 10.0));
        // 40 units of slack split 3:1.
        assert_eq!(tree.node(a).unwrap().size.x, 40.0);
        assert_eq!(tree.node(b).unwrap().size.x, 20.0);
        assert_eq!(tree.node(b).unwrap().position.x, 40.0);
    }

    #[test]
    fn out_of_bounds_placement_is_rejected() {
        let mut tree = Tree::new();
        let id = leaf(&mut tree, Vec2::ZERO);
        let mut grid = GridSizer::new(2, 2);
        let err = grid
            .place(SizerItem::Node(id), 2, 0, Insets::ZERO, FillFlags::empty())
            .unwrap_err();
        assert!(matches!(err, UiError::GridPlacement { row: 2, .. }));
    }
}
