/*
 * Spatial Grid Module
 *
 * This module defines the SpatialGrid struct for faster neighbor lookups.
 * It buckets boid indices into cubic cells so a neighbor query only has to look
 * at the block of cells that can contain boids within the perception radius,
 * instead of the whole flock.
 *
 * The world is unbounded (the inward-force boundary lets boids roam), so cells
 * are keyed by integer coordinates in a hash map rather than a dense array.
 * Candidates are returned sorted by index, which keeps the neighbor sums in the
 * same order as the all-pairs scan.
 */

use glam::Vec3;
use rustc_hash::FxHashMap;

type CellKey = (i32, i32, i32);

// Cell coordinates stay inside ±2^29 so neighbor offsets never overflow i32
const MAX_CELL: f32 = 536_870_912.0;

pub struct SpatialGrid {
    pub cell_size: f32,
    cells: FxHashMap<CellKey, Vec<usize>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: FxHashMap::default(),
        }
    }

    pub fn set_cell_size(&mut self, cell_size: f32) {
        if (cell_size - self.cell_size).abs() > f32::EPSILON {
            self.cell_size = cell_size;
            self.cells.clear();
        }
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    // Convert world coordinates to integer cell coordinates
    #[inline]
    pub fn cell_of(&self, position: Vec3) -> CellKey {
        let scaled = (position / self.cell_size)
            .floor()
            .clamp(Vec3::splat(-MAX_CELL), Vec3::splat(MAX_CELL));
        (scaled.x as i32, scaled.y as i32, scaled.z as i32)
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    #[inline]
    pub fn insert(&mut self, boid_index: usize, position: Vec3) {
        let key = self.cell_of(position);
        self.cells.entry(key).or_default().push(boid_index);
    }

    // Clear and insert every position, using its slot as the boid index
    pub fn rebuild<I>(&mut self, positions: I)
    where
        I: IntoIterator<Item = Vec3>,
    {
        self.clear();
        for (index, position) in positions.into_iter().enumerate() {
            self.insert(index, position);
        }
    }

    // Collect into `result` every index whose cell could hold a boid within `radius`
    // of `position`. The caller still applies the exact distance test.
    pub fn get_nearby_indices(&self, position: Vec3, radius: f32, result: &mut Vec<usize>) {
        result.clear();

        let (cx, cy, cz) = self.cell_of(position);
        let reach = ((radius / self.cell_size).ceil() as i32).clamp(1, 1024);
        let span = (2 * reach + 1) as usize;

        if span.saturating_pow(3) > self.cells.len() {
            // Sparse grid: cheaper to walk the occupied cells than the whole block
            for (&(x, y, z), indices) in &self.cells {
                if (x - cx).abs() <= reach && (y - cy).abs() <= reach && (z - cz).abs() <= reach {
                    result.extend_from_slice(indices);
                }
            }
        } else {
            for z in (cz - reach)..=(cz + reach) {
                for y in (cy - reach)..=(cy + reach) {
                    for x in (cx - reach)..=(cx + reach) {
                        if let Some(indices) = self.cells.get(&(x, y, z)) {
                            result.extend_from_slice(indices);
                        }
                    }
                }
            }
        }

        result.sort_unstable();
    }
}
