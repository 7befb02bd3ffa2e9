//! Static city tile classification shared by both views.

use std::collections::HashMap;

use shared::{
    domain::{Cell, CellType, GridBounds},
    error::DashboardError,
};
use tracing::debug;

use crate::backend::DispatchBackend;

/// Read-only after construction. Any coordinate without a loaded cell is a road,
/// which is also what an unloaded or failed cache reports everywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct GridTerrainCache {
    bounds: GridBounds,
    cells: HashMap<(i32, i32), CellType>,
    loaded: bool,
}

impl GridTerrainCache {
    pub fn empty(bounds: GridBounds) -> Self {
        Self {
            bounds,
            cells: HashMap::new(),
            loaded: false,
        }
    }

    pub fn from_cells(bounds: GridBounds, cells: impl IntoIterator<Item = Cell>) -> Self {
        let mut map = HashMap::new();
        let mut outside = 0usize;
        for cell in cells {
            if !bounds.contains(i64::from(cell.x), i64::from(cell.y)) {
                outside += 1;
                continue;
            }
            map.insert((cell.x, cell.y), cell.cell_type);
        }
        if outside > 0 {
            debug!(outside, "terrain: ignored cells outside grid bounds");
        }

        Self {
            bounds,
            cells: map,
            loaded: true,
        }
    }

    pub async fn load(
        backend: &dyn DispatchBackend,
        bounds: GridBounds,
    ) -> Result<Self, DashboardError> {
        let cells = backend.city_layout().await?;
        Ok(Self::from_cells(bounds, cells))
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn type_at(&self, x: i32, y: i32) -> CellType {
        self.cells.get(&(x, y)).copied().unwrap_or_default()
    }

    /// Non-road cells in row-major order.
    pub fn obstacles(&self) -> Vec<Cell> {
        let mut cells: Vec<Cell> = self
            .cells
            .iter()
            .filter(|(_, cell_type)| **cell_type != CellType::Road)
            .map(|(&(x, y), &cell_type)| Cell { x, y, cell_type })
            .collect();
        cells.sort_by_key(|cell| (cell.y, cell.x));
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(x: i32, y: i32, cell_type: CellType) -> Cell {
        Cell { x, y, cell_type }
    }

    #[test]
    fn unloaded_terrain_is_all_road() {
        let terrain = GridTerrainCache::empty(GridBounds::new(5, 5));
        assert!(!terrain.is_loaded());
        assert_eq!(terrain.type_at(2, 2), CellType::Road);
    }

    #[test]
    fn unspecified_and_out_of_bounds_cells_default_to_road() {
        let terrain = GridTerrainCache::from_cells(
            GridBounds::new(4, 4),
            [
                cell(1, 1, CellType::Building),
                cell(9, 9, CellType::River),
            ],
        );

        assert!(terrain.is_loaded());
        assert_eq!(terrain.type_at(1, 1), CellType::Building);
        assert_eq!(terrain.type_at(0, 1), CellType::Road);
        assert_eq!(terrain.type_at(9, 9), CellType::Road);
    }

    #[test]
    fn obstacles_skip_roads_and_are_row_major() {
        let terrain = GridTerrainCache::from_cells(
            GridBounds::new(4, 4),
            [
                cell(3, 2, CellType::Park),
                cell(0, 0, CellType::Road),
                cell(2, 0, CellType::River),
                cell(1, 2, CellType::Building),
            ],
        );

        assert_eq!(
            terrain.obstacles(),
            vec![
                cell(2, 0, CellType::River),
                cell(1, 2, CellType::Building),
                cell(3, 2, CellType::Park),
            ]
        );
    }
}
