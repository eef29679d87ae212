use bevy::prelude::*;
use crate::game::math::Vector2D;
use super::SpatialGrid;

impl<H: Copy + PartialEq> SpatialGrid<H> {
    /// Column of an x coordinate, clamped onto the grid.
    pub(crate) fn col_of(&self, x: f64) -> usize {
        let col = (self.cells_x as f64 * x / self.width).floor();
        if col <= 0.0 {
            0
        } else {
            (col as usize).min(self.cells_x - 1)
        }
    }

    /// Row of a y coordinate, clamped onto the grid.
    pub(crate) fn row_of(&self, y: f64) -> usize {
        let row = (self.cells_y as f64 * y / self.height).floor();
        if row <= 0.0 {
            0
        } else {
            (row as usize).min(self.cells_y - 1)
        }
    }

    /// Cell index of a position. Points on an interior boundary belong to the
    /// cell on their right/below (floor semantics); points on the outer edge
    /// `x == width` or `y == height` resolve to the last column/row.
    pub fn index_of(&self, pos: Vector2D) -> usize {
        self.row_of(pos.y) * self.cells_x + self.col_of(pos.x)
    }

    pub fn insert(&mut self, handle: H, pos: Vector2D) {
        let idx = self.index_of(pos);
        self.cells[idx].members.push((handle, pos));
    }

    /// Moves `handle` from the cell of `old_pos` to the cell of `new_pos` and
    /// refreshes its cached position.
    ///
    /// Falls back to a full scan when the handle is not where `old_pos` says
    /// it should be. Handles that are not indexed at all are left alone.
    pub fn relocate(&mut self, handle: H, old_pos: Vector2D, new_pos: Vector2D) {
        let old_idx = self.index_of(old_pos);
        let new_idx = self.index_of(new_pos);

        let found = self.cells[old_idx]
            .members
            .iter()
            .position(|(h, _)| *h == handle)
            .map(|slot| (old_idx, slot))
            .or_else(|| {
                self.cells.iter().enumerate().find_map(|(idx, cell)| {
                    cell.members.iter().position(|(h, _)| *h == handle).map(|slot| (idx, slot))
                })
            });

        let Some((idx, slot)) = found else {
            debug!("[SPATIAL_GRID] relocate of an unindexed handle ignored");
            return;
        };

        if idx == new_idx {
            self.cells[idx].members[slot].1 = new_pos;
        } else {
            self.cells[idx].members.swap_remove(slot);
            self.cells[new_idx].members.push((handle, new_pos));
        }
    }

    /// Removes `handle` wherever it is indexed. Returns whether it was found.
    pub fn remove(&mut self, handle: H) -> bool {
        for cell in &mut self.cells {
            if let Some(slot) = cell.members.iter().position(|(h, _)| *h == handle) {
                cell.members.swap_remove(slot);
                return true;
            }
        }
        false
    }
}
