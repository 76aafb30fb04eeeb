//! Spatial partitioning for neighbor queries.
//!
//! A uniform grid keyed by integer cell coordinates. Each cell holds the units
//! and projectiles whose position falls inside it for the current tick. The
//! grid is cleared and rebuilt from scratch every tick; nothing is patched
//! incrementally since nearly every unit moves each tick anyway.
//!
//! Neighbor queries return the 3×3 block of cells around a cell. With the
//! cell size at least the largest interaction radius this catches every
//! neighbor within one ring; a vision range larger than the cell size can miss
//! units further out, which is accepted rather than compensated for.

use crate::components::UnitId;
use crate::projectile::{ProjectileId, ProjectilePool};
use crate::store::UnitStore;
use bevy_ecs::prelude::*;
use glam::Vec2;
use std::collections::HashMap;

/// Integer grid coordinates of a cell.
pub type CellKey = (i32, i32);

/// Contents of one grid cell.
#[derive(Debug, Default, Clone)]
struct Cell {
    units: Vec<UnitId>,
    projectiles: Vec<ProjectileId>,
}

/// Grid-based spatial partitioning structure.
#[derive(Resource, Debug)]
pub struct SpatialGrid {
    /// Cell size in world units.
    pub cell_size: f32,
    cells: HashMap<CellKey, Cell>,
    unit_count: usize,
    projectile_count: usize,
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(200.0)
    }
}

impl SpatialGrid {
    /// Create a new spatial grid with the given cell size.
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
            unit_count: 0,
            projectile_count: 0,
        }
    }

    /// Convert world coordinates to cell coordinates.
    #[inline]
    pub fn world_to_cell(&self, position: Vec2) -> CellKey {
        (
            (position.x / self.cell_size).floor() as i32,
            (position.y / self.cell_size).floor() as i32,
        )
    }

    /// Clear all buckets.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.unit_count = 0;
        self.projectile_count = 0;
    }

    /// Drop only the projectile entries, keeping unit buckets.
    pub fn clear_projectiles(&mut self) {
        self.cells.retain(|_, cell| {
            cell.projectiles.clear();
            !cell.units.is_empty()
        });
        self.projectile_count = 0;
    }

    /// Insert a unit reference at a position.
    pub fn insert(&mut self, id: UnitId, position: Vec2) {
        let key = self.world_to_cell(position);
        self.cells.entry(key).or_default().units.push(id);
        self.unit_count += 1;
    }

    /// Insert a live projectile reference at a position.
    pub fn insert_projectile(&mut self, id: ProjectileId, position: Vec2) {
        let key = self.world_to_cell(position);
        self.cells.entry(key).or_default().projectiles.push(id);
        self.projectile_count += 1;
    }

    /// Units in a single cell.
    pub fn units_in(&self, key: CellKey) -> &[UnitId] {
        self.cells.get(&key).map(|c| c.units.as_slice()).unwrap_or(&[])
    }

    /// Projectiles in a single cell.
    pub fn projectiles_in(&self, key: CellKey) -> &[ProjectileId] {
        self.cells
            .get(&key)
            .map(|c| c.projectiles.as_slice())
            .unwrap_or(&[])
    }

    /// Units in the cell and its eight neighbors (Chebyshev distance 1).
    pub fn neighbors_of(&self, key: CellKey) -> Vec<UnitId> {
        let mut out = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                out.extend_from_slice(self.units_in((key.0 + dx, key.1 + dy)));
            }
        }
        out
    }

    /// Neighborhood of the cell containing a position.
    pub fn neighbors_at(&self, position: Vec2) -> Vec<UnitId> {
        self.neighbors_of(self.world_to_cell(position))
    }

    /// Keys of cells holding at least one unit.
    pub fn unit_cells(&self) -> Vec<CellKey> {
        self.cells
            .iter()
            .filter(|(_, c)| !c.units.is_empty())
            .map(|(k, _)| *k)
            .collect()
    }

    /// Cells holding at least one projectile.
    pub fn projectile_cells(&self) -> impl Iterator<Item = (CellKey, &[ProjectileId])> {
        self.cells
            .iter()
            .filter(|(_, c)| !c.projectiles.is_empty())
            .map(|(k, c)| (*k, c.projectiles.as_slice()))
    }

    /// Total units indexed this tick.
    pub fn total_count(&self) -> usize {
        self.unit_count
    }

    /// Total projectiles indexed this tick.
    pub fn projectile_count(&self) -> usize {
        self.projectile_count
    }
}

/// System that rebuilds the spatial grid from current positions.
pub fn spatial_grid_update_system(
    mut grid: ResMut<SpatialGrid>,
    store: Res<UnitStore>,
    pool: Res<ProjectilePool>,
) {
    grid.clear();

    for id in store.active_ids() {
        grid.insert(id, store.position[id.index()]);
    }

    for (id, projectile) in pool.iter_active() {
        grid.insert_projectile(id, projectile.position);
    }
}
