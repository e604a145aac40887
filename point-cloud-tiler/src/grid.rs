//! Uniform grid bucketing of points into tile cells
use crate::constants::NAME_JOINER;
use crate::point::Point;
use std::collections::BTreeMap;
use std::collections::btree_map::IntoValues;
use std::fmt;

/// Integer grid cell coordinates, `floor(coordinate / grid_size)` per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellKey {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl CellKey {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Cell containing a position for the given grid size.
    pub fn from_position(x: f32, y: f32, z: f32, grid_size: f32) -> Self {
        Self {
            x: (x / grid_size).floor() as i32,
            y: (y / grid_size).floor() as i32,
            z: (z / grid_size).floor() as i32,
        }
    }

    /// World space corner of this cell, subtracted to make positions cell-local.
    pub fn origin(&self, grid_size: f32) -> (f32, f32, f32) {
        (
            self.x as f32 * grid_size,
            self.y as f32 * grid_size,
            self.z as f32 * grid_size,
        )
    }
}

/// Formats as `x_y_z`, the cell part of a tile file name.
impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{j}{}{j}{}",
            self.x,
            self.y,
            self.z,
            j = NAME_JOINER
        )
    }
}

/// Points collected for one grid cell during a batch.
///
/// A single vector of point records keeps position and colour of every
/// point together, so shuffling and decimation can never desynchronise them.
/// The vector length is bounded only by addressable memory; a grid size
/// that crams billions of points into one cell is a configuration mistake.
#[derive(Debug, Clone)]
pub struct Cell {
    pub key: CellKey,
    pub points: Vec<Point>,
}

impl Cell {
    fn new(key: CellKey) -> Self {
        Self {
            key,
            points: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Assigns points to grid cells and owns the per-cell buffers of one batch.
pub struct GridBucketer {
    grid_size: f32,
    cells: BTreeMap<CellKey, Cell>,
}

impl GridBucketer {
    pub fn new(grid_size: f32) -> Self {
        Self {
            grid_size,
            cells: BTreeMap::new(),
        }
    }

    pub fn assign(&self, point: &Point) -> CellKey {
        CellKey::from_position(point.x, point.y, point.z, self.grid_size)
    }

    /// Append a point to its cell, creating the cell on first use.
    pub fn insert(&mut self, point: Point) -> CellKey {
        let key = self.assign(&point);
        self.cells
            .entry(key)
            .or_insert_with(|| Cell::new(key))
            .points
            .push(point);
        key
    }

    /// Drop all cell buffers, called at the start of each batch.
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn point_count(&self) -> usize {
        self.cells.values().map(Cell::len).sum()
    }

    pub fn get(&self, key: &CellKey) -> Option<&Cell> {
        self.cells.get(key)
    }

    /// Take ownership of all cells, leaving the bucketer empty.
    pub fn drain(&mut self) -> IntoValues<CellKey, Cell> {
        std::mem::take(&mut self.cells).into_values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_key_uses_floor_division() {
        assert_eq!(
            CellKey::from_position(0.1, 0.1, 0.1, 1.0),
            CellKey::new(0, 0, 0)
        );
        assert_eq!(
            CellKey::from_position(50.0, 50.0, 50.0, 1.0),
            CellKey::new(50, 50, 50)
        );
        assert_eq!(
            CellKey::from_position(-0.5, -10.0, 9.99, 10.0),
            CellKey::new(-1, -1, 0)
        );
    }

    #[test]
    fn cell_origin_and_display() {
        let key = CellKey::new(-2, 0, 3);
        assert_eq!(key.origin(5.0), (-10.0, 0.0, 15.0));
        assert_eq!(key.to_string(), "-2_0_3");
    }

    #[test]
    fn insert_groups_points_by_cell() {
        let mut grid = GridBucketer::new(1.0);
        grid.insert(Point::at(0.1, 0.1, 0.1));
        grid.insert(Point::at(0.9, 0.2, 0.3));
        grid.insert(Point::at(50.0, 50.0, 50.0));

        assert_eq!(grid.cell_count(), 2);
        assert_eq!(grid.point_count(), 3);
        assert_eq!(grid.get(&CellKey::new(0, 0, 0)).map(Cell::len), Some(2));
        assert_eq!(grid.get(&CellKey::new(50, 50, 50)).map(Cell::len), Some(1));
    }

    #[test]
    fn assignment_is_independent_of_insertion_order() {
        let points = [
            Point::at(3.5, -1.2, 7.0),
            Point::at(-3.5, 1.2, 0.0),
            Point::at(3.9, -1.9, 7.9),
        ];

        let mut forward = GridBucketer::new(2.0);
        let mut reverse = GridBucketer::new(2.0);
        let forward_keys: Vec<_> = points.iter().map(|p| forward.insert(*p)).collect();
        let mut reverse_keys: Vec<_> = points.iter().rev().map(|p| reverse.insert(*p)).collect();
        reverse_keys.reverse();

        assert_eq!(forward_keys, reverse_keys);
        let forward_cells: Vec<_> = forward.drain().map(|c| (c.key, c.len())).collect();
        let reverse_cells: Vec<_> = reverse.drain().map(|c| (c.key, c.len())).collect();
        assert_eq!(forward_cells, reverse_cells);
    }

    #[test]
    fn clear_and_drain_empty_the_grid() {
        let mut grid = GridBucketer::new(1.0);
        grid.insert(Point::at(0.0, 0.0, 0.0));
        grid.clear();
        assert_eq!(grid.cell_count(), 0);

        grid.insert(Point::at(2.0, 0.0, 0.0));
        let drained: Vec<_> = grid.drain().collect();
        assert_eq!(drained.len(), 1);
        assert_eq!(grid.cell_count(), 0);
    }
}
