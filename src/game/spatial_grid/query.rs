use crate::game::math::{Aabb, Vector2D};
use super::SpatialGrid;

impl<H: Copy + PartialEq> SpatialGrid<H> {
    /// Collects every handle strictly within `radius` of `target` into the
    /// grid's scratch buffer and returns a view of it.
    ///
    /// Only cells overlapping the query box `target ± radius` are visited.
    /// The buffer is overwritten by the next query, so callers copy out what
    /// they need before querying again (the borrow checker enforces this).
    pub fn calculate_neighbors(&mut self, target: Vector2D, radius: f64) -> &[H] {
        self.neighbors.clear();
        let radius_sq = radius * radius;

        let query = Aabb::around(target, radius);
        let col_min = self.col_of(query.left());
        let col_max = self.col_of(query.right());
        let row_min = self.row_of(query.top());
        let row_max = self.row_of(query.bottom());

        for row in row_min..=row_max {
            for col in col_min..=col_max {
                let cell = &self.cells[row * self.cells_x + col];
                for &(handle, pos) in &cell.members {
                    if pos.distance_squared(target) < radius_sq {
                        self.neighbors.push(handle);
                    }
                }
            }
        }

        &self.neighbors
    }

    /// Result of the most recent [`SpatialGrid::calculate_neighbors`] call.
    pub fn neighbors(&self) -> &[H] {
        &self.neighbors
    }

    /// Indices of the cells a query box touches, for debug drawing.
    pub fn cells_in_box(&self, query: &Aabb) -> Vec<usize> {
        let mut out = Vec::new();
        for row in self.row_of(query.top())..=self.row_of(query.bottom()) {
            for col in self.col_of(query.left())..=self.col_of(query.right()) {
                out.push(row * self.cells_x + col);
            }
        }
        out
    }
}
