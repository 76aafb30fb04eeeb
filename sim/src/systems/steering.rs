//! Steering system - computes per-unit flocking, pursuit and goal forces.
//!
//! ## Neighborhoods
//!
//! Forces are computed cell by cell. Every unit in a cell shares the same
//! neighborhood: the units of that cell and its eight neighbors. The 3×3 union
//! is built once per occupied cell rather than once per unit.
//!
//! ## Behaviors
//!
//! - **Separation**: unit vectors away from same-team neighbors closer than
//!   `separation_distance`. Coincident units contribute nothing.
//! - **Alignment**: mean velocity of same-team neighbors minus own velocity.
//! - **Cohesion**: toward the same-team centroid at max speed, minus own velocity.
//! - **Pursuit**: toward the closest visible enemy at max speed, minus own velocity.
//! - **Goal**: toward the team destination at max speed, minus own velocity.
//!
//! A visible enemy suppresses every other behavior: the unit only pursues.
//!
//! ## Parallel Feature
//!
//! Cells are independent (read-only grid and store, output per unit), so with
//! `--features parallel` they are processed with rayon and merged afterwards.

use crate::components::*;
use crate::config::{SimConfig, SteeringWeights};
use crate::spatial::{CellKey, SpatialGrid};
use crate::store::UnitStore;
use bevy_ecs::prelude::*;
use glam::Vec2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Unweighted steering contributions of one unit for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SteeringForces {
    pub separation: Vec2,
    pub alignment: Vec2,
    pub cohesion: Vec2,
    pub pursuit: Vec2,
    pub goal: Vec2,
}

impl SteeringForces {
    /// Weighted sum divided by the total weight.
    pub fn blended(&self, weights: &SteeringWeights) -> Vec2 {
        let total = weights.total();
        if total <= 0.0 {
            return Vec2::ZERO;
        }
        (self.separation * weights.separation
            + self.alignment * weights.alignment
            + self.cohesion * weights.cohesion
            + self.pursuit * weights.pursuit
            + self.goal * weights.goal)
            / total
    }
}

/// Closest visible enemy chosen by the pursuit behavior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PursuitTarget {
    pub id: UnitId,
    pub distance: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SteeringOutput {
    pub forces: SteeringForces,
    pub target: Option<PursuitTarget>,
}

/// Per-slot steering results of the current tick.
///
/// Rebuilt by [`steering_system`] every tick; entries refer to unit slots and
/// are meaningless once the tick ends.
#[derive(Resource, Debug, Default)]
pub struct SteeringBuffer {
    outputs: Vec<Option<SteeringOutput>>,
}

impl SteeringBuffer {
    pub fn reset(&mut self, capacity: usize) {
        self.outputs.clear();
        self.outputs.resize(capacity, None);
    }

    pub fn set(&mut self, id: UnitId, output: SteeringOutput) {
        if let Some(slot) = self.outputs.get_mut(id.index()) {
            *slot = Some(output);
        }
    }

    pub fn get(&self, id: UnitId) -> Option<&SteeringOutput> {
        self.outputs.get(id.index()).and_then(|o| o.as_ref())
    }

    pub fn target(&self, id: UnitId) -> Option<PursuitTarget> {
        self.get(id).and_then(|o| o.target)
    }

    pub fn forces(&self, id: UnitId) -> Option<SteeringForces> {
        self.get(id).map(|o| o.forces)
    }
}

/// System that computes steering for every indexed unit.
///
/// ## Data Access
/// - Reads: SimConfig, SpatialGrid, UnitStore
/// - Writes: SteeringBuffer
pub fn steering_system(
    config: Res<SimConfig>,
    grid: Res<SpatialGrid>,
    store: Res<UnitStore>,
    mut buffer: ResMut<SteeringBuffer>,
) {
    buffer.reset(store.capacity());
    let config: &SimConfig = &config;
    let grid: &SpatialGrid = &grid;
    let store: &UnitStore = &store;
    let cells = grid.unit_cells();

    #[cfg(feature = "parallel")]
    let batches: Vec<Vec<(UnitId, SteeringOutput)>> = cells
        .par_iter()
        .map(|&cell| compute_cell_steering(cell, grid, store, config))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let batches: Vec<Vec<(UnitId, SteeringOutput)>> = cells
        .iter()
        .map(|&cell| compute_cell_steering(cell, grid, store, config))
        .collect();

    for batch in batches {
        for (id, output) in batch {
            buffer.set(id, output);
        }
    }
}

/// Steering for every unit of one cell. Pure; safe to call in parallel.
pub fn compute_cell_steering(
    cell: CellKey,
    grid: &SpatialGrid,
    store: &UnitStore,
    config: &SimConfig,
) -> Vec<(UnitId, SteeringOutput)> {
    let neighborhood = grid.neighbors_of(cell);
    grid.units_in(cell)
        .iter()
        .filter(|id| store.is_active(**id))
        .map(|&id| (id, compute_unit_steering(id, &neighborhood, store, config)))
        .collect()
}

/// Steering for a single unit against a precomputed neighborhood.
pub fn compute_unit_steering(
    id: UnitId,
    neighborhood: &[UnitId],
    store: &UnitStore,
    config: &SimConfig,
) -> SteeringOutput {
    let i = id.index();
    let pos = store.position[i];
    let vel = store.velocity[i];
    let team = store.team[i];
    let max_speed = store.max_speed[i];
    let vision = store.vision_range[i];

    let mut separation = Vec2::ZERO;
    let mut velocity_sum = Vec2::ZERO;
    let mut position_sum = Vec2::ZERO;
    let mut flock_count = 0u32;
    let mut target: Option<PursuitTarget> = None;

    for &other in neighborhood {
        if other == id || !store.is_active(other) {
            continue;
        }
        let j = other.index();
        let other_pos = store.position[j];
        let offset = pos - other_pos;
        let dist = offset.length();

        if store.team[j] == team {
            if dist < config.separation_distance {
                separation += offset.normalize_or_zero();
            }
            velocity_sum += store.velocity[j];
            position_sum += other_pos;
            flock_count += 1;
        } else if dist <= vision && store.health[j] > 0.0 {
            // Strict comparison keeps the first-found enemy on ties.
            if target.map_or(true, |t| dist < t.distance) {
                target = Some(PursuitTarget { id: other, distance: dist });
            }
        }
    }

    let mut forces = SteeringForces::default();

    if let Some(t) = target {
        let toward = store.position[t.id.index()] - pos;
        forces.pursuit = seek(toward, max_speed, vel);
        return SteeringOutput {
            forces,
            target,
        };
    }

    forces.separation = separation;
    if flock_count > 0 {
        let n = flock_count as f32;
        forces.alignment = velocity_sum / n - vel;
        forces.cohesion = seek(position_sum / n - pos, max_speed, vel);
    }
    forces.goal = seek(config.destination(team) - pos, max_speed, vel);

    SteeringOutput {
        forces,
        target: None,
    }
}

/// Desired velocity along `direction` at `max_speed`, minus current velocity.
/// A zero-length direction desires zero velocity.
#[inline]
fn seek(direction: Vec2, max_speed: f32, velocity: Vec2) -> Vec2 {
    direction.normalize_or_zero() * max_speed - velocity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::spatial_grid_update_system;
    use crate::projectile::ProjectilePool;

    fn run_steering(store: UnitStore, config: SimConfig) -> World {
        let mut world = World::new();
        world.insert_resource(SpatialGrid::new(config.cell_size));
        world.insert_resource(config);
        world.insert_resource(store);
        world.insert_resource(ProjectilePool::default());
        world.insert_resource(SteeringBuffer::default());

        let mut schedule = Schedule::default();
        schedule.add_systems((spatial_grid_update_system, steering_system).chain());
        schedule.run(&mut world);
        world
    }

    fn melee() -> UnitStats {
        UnitStats::melee(5.0, 1.0, 2.0).with_ranges(10.0, 50.0)
    }

    #[test]
    fn test_separation_points_away_from_close_teammate() {
        let mut store = UnitStore::new(4);
        let a = store.create(Team::One, Vec2::new(100.0, 100.0), melee()).unwrap();
        let b = store.create(Team::One, Vec2::new(110.0, 104.0), melee()).unwrap();

        let world = run_steering(store, SimConfig::default());
        let buffer = world.resource::<SteeringBuffer>();

        let sep_a = buffer.forces(a).unwrap().separation;
        let sep_b = buffer.forces(b).unwrap().separation;
        let a_to_b = Vec2::new(10.0, 4.0);
        assert!(sep_a.dot(a_to_b) < 0.0, "a should be pushed away from b");
        assert!(sep_b.dot(-a_to_b) < 0.0, "b should be pushed away from a");
        assert!((sep_a.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_coincident_teammates_contribute_zero_separation() {
        let mut store = UnitStore::new(2);
        let a = store.create(Team::One, Vec2::new(50.0, 50.0), melee()).unwrap();
        store.create(Team::One, Vec2::new(50.0, 50.0), melee()).unwrap();

        let world = run_steering(store, SimConfig::default());
        let forces = world.resource::<SteeringBuffer>().forces(a).unwrap();
        assert_eq!(forces.separation, Vec2::ZERO);
        assert!(forces.separation.is_finite());
    }

    #[test]
    fn test_enemies_do_not_separate() {
        let mut store = UnitStore::new(2);
        let a = store
            .create(Team::One, Vec2::new(50.0, 50.0), melee().with_ranges(1.0, 1.0))
            .unwrap();
        store
            .create(Team::Two, Vec2::new(55.0, 50.0), melee().with_ranges(1.0, 1.0))
            .unwrap();

        let world = run_steering(store, SimConfig::default());
        let forces = world.resource::<SteeringBuffer>().forces(a).unwrap();
        assert_eq!(forces.separation, Vec2::ZERO);
    }

    #[test]
    fn test_pursuit_picks_closest_enemy_and_suppresses_goal() {
        let mut store = UnitStore::new(4);
        let hunter = store.create(Team::One, Vec2::new(100.0, 100.0), melee()).unwrap();
        store.create(Team::One, Vec2::new(105.0, 100.0), melee()).unwrap();
        store.create(Team::Two, Vec2::new(140.0, 100.0), melee()).unwrap();
        let near = store.create(Team::Two, Vec2::new(100.0, 130.0), melee()).unwrap();

        let world = run_steering(store, SimConfig::default());
        let out = *world.resource::<SteeringBuffer>().get(hunter).unwrap();

        let target = out.target.unwrap();
        assert_eq!(target.id, near);
        assert!((target.distance - 30.0).abs() < 1e-4);
        assert_eq!(out.forces.goal, Vec2::ZERO);
        assert_eq!(out.forces.separation, Vec2::ZERO);
        assert_eq!(out.forces.alignment, Vec2::ZERO);
        assert_eq!(out.forces.cohesion, Vec2::ZERO);
        assert!(out.forces.pursuit.y > 0.0);
    }

    #[test]
    fn test_enemy_outside_vision_is_ignored() {
        let mut store = UnitStore::new(2);
        let a = store
            .create(Team::One, Vec2::new(100.0, 100.0), melee().with_ranges(10.0, 20.0))
            .unwrap();
        store.create(Team::Two, Vec2::new(150.0, 100.0), melee()).unwrap();

        let world = run_steering(store, SimConfig::default());
        let out = *world.resource::<SteeringBuffer>().get(a).unwrap();
        assert!(out.target.is_none());
        assert_ne!(out.forces.goal, Vec2::ZERO);
    }

    #[test]
    fn test_goal_points_to_team_destination() {
        let mut store = UnitStore::new(2);
        let one = store.create(Team::One, Vec2::new(450.0, 450.0), melee()).unwrap();
        let two = store.create(Team::Two, Vec2::new(450.0, 850.0), melee()).unwrap();

        let world = run_steering(store, SimConfig::default());
        let buffer = world.resource::<SteeringBuffer>();
        assert!(buffer.forces(one).unwrap().goal.y < 0.0);
        assert!(buffer.forces(two).unwrap().goal.y > 0.0);
    }

    #[test]
    fn test_alignment_and_cohesion_follow_flock() {
        let mut store = UnitStore::new(3);
        let a = store.create(Team::One, Vec2::new(100.0, 100.0), melee()).unwrap();
        let b = store.create(Team::One, Vec2::new(160.0, 100.0), melee()).unwrap();
        store.set_velocity(b, Vec2::new(0.0, 4.0));

        let world = run_steering(store, SimConfig::default());
        let forces = world.resource::<SteeringBuffer>().forces(a).unwrap();
        assert_eq!(forces.alignment, Vec2::new(0.0, 4.0));
        assert!(forces.cohesion.x > 0.0);
    }

    #[test]
    fn test_blended_divides_by_total_weight() {
        let forces = SteeringForces {
            pursuit: Vec2::new(8.0, 0.0),
            ..Default::default()
        };
        let weights = SteeringWeights::default();
        assert_eq!(forces.blended(&weights), Vec2::new(2.0, 0.0));
    }
}
