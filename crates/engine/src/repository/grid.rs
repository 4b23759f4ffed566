use std::collections::HashMap;

use crate::land::Land;
use crate::world::position::{ChunkPos, DimensionId};

/// Uniform grid over chunk columns: `(dimension, chunk) -> land names`.
///
/// A land is listed in every column its cuboid overlaps, so a point lookup
/// only has to test the handful of lands registered in the point's column.
#[derive(Debug, Default)]
pub(crate) struct SpatialGrid {
    cells: HashMap<(DimensionId, ChunkPos), Vec<String>>,
}

impl SpatialGrid {
    pub(crate) fn insert(&mut self, land: &Land) {
        for chunk in land.cuboid().chunks() {
            self.cells
                .entry((land.dimension.clone(), chunk))
                .or_default()
                .push(land.name.clone());
        }
    }

    pub(crate) fn remove(&mut self, land: &Land) {
        for chunk in land.cuboid().chunks() {
            let key = (land.dimension.clone(), chunk);
            if let Some(names) = self.cells.get_mut(&key) {
                names.retain(|name| *name != land.name);
                if names.is_empty() {
                    self.cells.remove(&key);
                }
            }
        }
    }

    pub(crate) fn candidates(&self, dimension: &DimensionId, chunk: ChunkPos) -> &[String] {
        self.cells
            .get(&(dimension.clone(), chunk))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn cell_count(&self) -> usize {
        self.cells.len()
    }
}
