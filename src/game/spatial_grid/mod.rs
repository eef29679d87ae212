use crate::game::math::{Aabb, Vector2D};

mod grid;
mod query;

/// Uniform cell-space partition for radius-bounded neighbour queries.
///
/// The plane `[0, width] x [0, height]` is split into `cells_x * cells_y`
/// equal rectangles stored row-major (`index = row * cells_x + col`). Each
/// cell keeps `(handle, position)` pairs; the grid never owns the entities it
/// indexes, callers hand it copyable handles and keep it in sync through
/// [`SpatialGrid::relocate`].
///
/// # Example
///
/// ```rust
/// use steering::game::math::Vector2D;
/// use steering::game::spatial_grid::SpatialGrid;
///
/// let mut grid: SpatialGrid<u32> = SpatialGrid::new(100.0, 100.0, 5, 5, 16);
/// grid.insert(1, Vector2D::new(10.0, 10.0));
/// grid.insert(2, Vector2D::new(13.0, 10.0));
/// grid.insert(3, Vector2D::new(90.0, 90.0));
///
/// let near = grid.calculate_neighbors(Vector2D::new(10.0, 10.0), 5.0);
/// assert_eq!(near.len(), 2);
/// ```
///
/// # Performance
///
/// - **Insert:** O(1) amortized
/// - **Relocate:** O(k) where k = members of the old cell
/// - **Query:** O(cells overlapping the query box + their members)
/// - **Clear:** O(cells), keeps every allocation
///
/// # Limitations
///
/// Positions outside the plane are clamped per axis before the cell index is
/// built, so they land in the border cell nearest to them rather than
/// spilling into the next row. A query around such a position still scans
/// the cell holding it. Agents are expected to stay inside the plane (the
/// world wraps them around).
#[derive(Clone, Debug)]
pub struct SpatialGrid<H> {
    cells: Vec<Cell<H>>,
    neighbors: Vec<H>,
    width: f64,
    height: f64,
    cells_x: usize,
    cells_y: usize,
    cell_width: f64,
    cell_height: f64,
}

/// One rectangle of the partition.
#[derive(Clone, Debug)]
pub struct Cell<H> {
    pub members: Vec<(H, Vector2D)>,
    pub bbox: Aabb,
}

impl<H: Copy + PartialEq> SpatialGrid<H> {
    /// `cells_x` and `cells_y` must be non-zero; `Params::validate` rejects
    /// configurations that break this before a grid is ever built.
    pub fn new(width: f64, height: f64, cells_x: usize, cells_y: usize, max_entities: usize) -> Self {
        let cells_x = cells_x.max(1);
        let cells_y = cells_y.max(1);
        let cell_width = width / cells_x as f64;
        let cell_height = height / cells_y as f64;

        let mut cells = Vec::with_capacity(cells_x * cells_y);
        for row in 0..cells_y {
            for col in 0..cells_x {
                let left = col as f64 * cell_width;
                let top = row as f64 * cell_height;
                cells.push(Cell {
                    members: Vec::new(),
                    bbox: Aabb::new(
                        Vector2D::new(left, top),
                        Vector2D::new(left + cell_width, top + cell_height),
                    ),
                });
            }
        }

        Self {
            cells,
            neighbors: Vec::with_capacity(max_entities),
            width,
            height,
            cells_x,
            cells_y,
            cell_width,
            cell_height,
        }
    }

    /// Empties every cell without giving their storage back.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.members.clear();
        }
        self.neighbors.clear();
    }

    /// Total number of indexed handles across all cells.
    pub fn len(&self) -> usize {
        self.cells.iter().map(|cell| cell.members.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|cell| cell.members.is_empty())
    }

    pub fn non_empty_cells(&self) -> usize {
        self.cells.iter().filter(|cell| !cell.members.is_empty()).count()
    }

    // Getters for grid parameters
    pub fn width(&self) -> f64 { self.width }
    pub fn height(&self) -> f64 { self.height }
    pub fn cells_x(&self) -> usize { self.cells_x }
    pub fn cells_y(&self) -> usize { self.cells_y }
    pub fn cell_width(&self) -> f64 { self.cell_width }
    pub fn cell_height(&self) -> f64 { self.cell_height }

    pub fn cells(&self) -> &[Cell<H>] {
        &self.cells
    }
}
