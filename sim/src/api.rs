//! Public API for the simulation.
//!
//! This module provides the main interface for a game layer (renderer, input,
//! scoring) to drive the battle simulation.
//!
//! ## Fixed Timestep
//!
//! `tick(dt)` runs exactly one pipeline step with the given `dt`. `step(dt)`
//! accumulates frame time and runs as many `fixed_timestep` ticks as fit, so
//! results do not depend on frame rate.
//!
//! ## Pipeline
//!
//! Grid rebuild, steering, integration, combat, projectiles, purge. See
//! [`crate::systems`] for what each stage reads and writes.

use crate::components::*;
use crate::config::SimConfig;
use crate::error::SimError;
use crate::projectile::{FireEvents, ProjectilePool};
use crate::quadtree::QuadTree;
use crate::spatial::{spatial_grid_update_system, SpatialGrid};
use crate::store::{UnitStore, UnitView};
use crate::systems::*;
use crate::world::Snapshot;
use bevy_ecs::prelude::*;
use glam::Vec2;
use std::path::Path;
use tracing::{debug, info, warn};

/// The main simulation world container.
///
/// Holds the ECS world and schedule, providing a clean API for:
/// - Initializing the simulation
/// - Spawning and removing units
/// - Stepping the simulation forward
/// - Extracting state snapshots
pub struct SimWorld {
    world: World,
    schedule: Schedule,
    tick: u64,
    time: f32,
    /// Accumulated time for fixed timestep.
    time_accumulator: f32,
}

impl SimWorld {
    /// Create an empty simulation with the default configuration.
    pub fn new() -> Self {
        Self::build(SimConfig::default())
    }

    /// Create an empty simulation with a custom configuration.
    pub fn with_config(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Load the configuration from a JSON file.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let config = SimConfig::from_json_file(path)?;
        Ok(Self::build(config))
    }

    /// Simulation with thin walls along the four playfield edges.
    pub fn new_battlefield(config: SimConfig) -> Result<Self, SimError> {
        let mut sim = Self::with_config(config)?;
        let size = sim.config().playfield;
        sim.add_obstacle(Aabb::from_origin_size(0.0, 0.0, size.x, 1.0));
        sim.add_obstacle(Aabb::from_origin_size(0.0, size.y - 1.0, size.x, 1.0));
        sim.add_obstacle(Aabb::from_origin_size(0.0, 0.0, 1.0, size.y));
        sim.add_obstacle(Aabb::from_origin_size(size.x - 1.0, 0.0, 1.0, size.y));
        Ok(sim)
    }

    fn build(config: SimConfig) -> Self {
        let mut world = World::new();

        world.insert_resource(DeltaTime(config.fixed_timestep));
        world.insert_resource(SpatialGrid::new(config.cell_size));
        world.insert_resource(UnitStore::new(config.max_units));
        world.insert_resource(ProjectilePool::new(config.projectile_radius));
        world.insert_resource(SteeringBuffer::default());
        world.insert_resource(FireEvents::default());
        world.insert_resource(Obstacles::default());
        world.insert_resource(TickStats::default());

        info!(
            max_units = config.max_units,
            cell_size = config.cell_size,
            "simulation initialized"
        );
        world.insert_resource(config);

        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                spatial_grid_update_system,
                steering_system,
                integration_system,
                combat_system,
                projectile_system,
                purge_system,
            )
                .chain(),
        );

        Self {
            world,
            schedule,
            tick: 0,
            time: 0.0,
            time_accumulator: 0.0,
        }
    }

    // ------------------------------------------------------------------------
    // Spawning
    // ------------------------------------------------------------------------

    /// Spawn a single unit.
    pub fn spawn(&mut self, team: Team, position: Vec2, stats: UnitStats) -> Result<UnitId, SimError> {
        let cell_size = self.config().cell_size;
        let reach = stats.vision_range.max(stats.attack_range);
        if reach > cell_size {
            warn!(
                vision_range = reach,
                cell_size, "vision range exceeds cell size; far neighbors may be missed"
            );
        }

        let result = self
            .world
            .resource_mut::<UnitStore>()
            .create(team, position, stats);
        if let Err(err) = &result {
            warn!(team = team.number(), %err, "spawn rejected");
        }
        result
    }

    /// Spawn a unit plus its escorts.
    ///
    /// Units cheaper than [`SQUAD_COST_TARGET`] bring `escort_count()` copies,
    /// placed evenly on a ring of three radii and kept at least one radius
    /// inside the playfield edges.
    /// Either the whole squad is spawned or nothing is.
    pub fn spawn_squad(
        &mut self,
        team: Team,
        position: Vec2,
        stats: UnitStats,
    ) -> Result<Vec<UnitId>, SimError> {
        let escorts = stats.escort_count();
        let (available, capacity) = {
            let store = self.world.resource::<UnitStore>();
            (store.available(), store.capacity())
        };
        if available < escorts + 1 {
            warn!(
                team = team.number(),
                needed = escorts + 1,
                available,
                "squad spawn rejected"
            );
            return Err(SimError::CapacityExceeded { capacity });
        }

        let playfield = self.config().playfield;
        let margin = Vec2::splat(stats.radius.max(0.0));
        let ring = stats.radius * 3.0;
        let mut ids = Vec::with_capacity(escorts + 1);
        ids.push(self.spawn(team, position, stats)?);
        for k in 0..escorts {
            let angle = k as f32 / escorts as f32 * std::f32::consts::TAU;
            let offset = Vec2::new(angle.cos(), angle.sin()) * ring;
            let escort_pos = (position + offset).max(margin).min(playfield - margin);
            ids.push(self.spawn(team, escort_pos, stats)?);
        }
        debug!(team = team.number(), escorts, "squad spawned");
        Ok(ids)
    }

    /// Spawn units in a square block formation centered on `center`.
    /// Returns the number spawned; stops early at capacity.
    pub fn spawn_block(
        &mut self,
        team: Team,
        center: Vec2,
        count: usize,
        spacing: f32,
        stats: UnitStats,
    ) -> usize {
        if count == 0 {
            return 0;
        }
        let cols = (count as f32).sqrt().ceil() as usize;
        let rows = count.div_ceil(cols);
        let origin = center - Vec2::new((cols - 1) as f32, (rows - 1) as f32) * spacing * 0.5;

        for i in 0..count {
            let row = i / cols;
            let col = i % cols;
            let pos = origin + Vec2::new(col as f32, row as f32) * spacing;
            if self.spawn(team, pos, stats).is_err() {
                return i;
            }
        }
        count
    }

    // ------------------------------------------------------------------------
    // Stepping
    // ------------------------------------------------------------------------

    /// Run one full pipeline step of `dt` seconds.
    ///
    /// A negative or non-finite `dt` is rejected and leaves the state untouched.
    pub fn tick(&mut self, dt: f32) {
        if !dt.is_finite() || dt < 0.0 {
            warn!(dt, "ignoring tick with invalid dt");
            return;
        }

        self.world.resource_mut::<TickStats>().reset();
        self.world.resource_mut::<DeltaTime>().0 = dt;

        self.schedule.run(&mut self.world);

        self.tick += 1;
        self.time += dt;

        let stats = *self.world.resource::<TickStats>();
        debug!(
            tick = self.tick,
            units = self.unit_count(),
            projectiles = self.projectile_count(),
            melee_hits = stats.melee_hits,
            shots = stats.shots_fired,
            projectile_hits = stats.projectile_hits,
            purged = stats.units_purged,
            "tick complete"
        );
    }

    /// Advance by frame time, running whole fixed-timestep ticks.
    /// Returns the number of ticks run.
    pub fn step(&mut self, dt: f32) -> u32 {
        if !dt.is_finite() || dt < 0.0 {
            warn!(dt, "ignoring step with invalid dt");
            return 0;
        }
        let fixed_dt = self.config().fixed_timestep;

        self.time_accumulator += dt;

        let mut ticks = 0;
        while self.time_accumulator >= fixed_dt {
            self.tick(fixed_dt);
            self.time_accumulator -= fixed_dt;
            ticks += 1;
        }
        ticks
    }

    // ------------------------------------------------------------------------
    // Game layer hooks
    // ------------------------------------------------------------------------

    /// Remove every unit matching `predicate` and return what was removed.
    pub fn remove_at_boundary<F>(&mut self, mut predicate: F) -> Vec<UnitView>
    where
        F: FnMut(&UnitView) -> bool,
    {
        let mut store = self.world.resource_mut::<UnitStore>();
        let removed: Vec<UnitView> = store
            .active_ids()
            .filter_map(|id| store.view(id))
            .filter(|view| predicate(view))
            .collect();
        for view in &removed {
            store.destroy(view.id);
        }
        if !removed.is_empty() {
            debug!(count = removed.len(), "removed units at boundary");
        }
        removed
    }

    /// Add a static obstacle that stops projectiles.
    pub fn add_obstacle(&mut self, bounds: Aabb) {
        self.world
            .resource_mut::<Obstacles>()
            .push(Obstacle::new(bounds));
    }

    /// Ids of active units whose position lies inside `rect`.
    pub fn units_in_rect(&self, rect: &Aabb) -> Vec<UnitId> {
        let store = self.store();
        let mut bounds = self.config().bounds();
        for id in store.active_ids() {
            let p = store.positions()[id.index()];
            bounds = Aabb::new(bounds.min.min(p), bounds.max.max(p));
        }

        let mut tree = QuadTree::new(bounds);
        for id in store.active_ids() {
            tree.insert(id, store.positions()[id.index()]);
        }
        tree.query_range(rect)
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Get a snapshot of the current simulation state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_world(&self.world, self.tick, self.time)
    }

    /// Get the snapshot as a JSON string.
    pub fn snapshot_json(&self) -> String {
        snapshot_to_json_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn unit(&self, id: UnitId) -> Option<UnitView> {
        self.store().view(id)
    }

    pub fn combat_state(&self, id: UnitId) -> Option<CombatState> {
        self.store().combat_state(id)
    }

    pub fn attacked_last_tick(&self, id: UnitId) -> bool {
        self.store().attacked_last_tick(id)
    }

    pub fn unit_count(&self) -> usize {
        self.store().len()
    }

    pub fn team_count(&self, team: Team) -> usize {
        let store = self.store();
        store
            .active_ids()
            .filter(|id| store.view(*id).is_some_and(|v| v.team == team))
            .count()
    }

    pub fn projectile_count(&self) -> usize {
        self.world.resource::<ProjectilePool>().len()
    }

    /// Counters of the last completed tick.
    pub fn last_tick_stats(&self) -> TickStats {
        *self.world.resource::<TickStats>()
    }

    pub fn config(&self) -> &SimConfig {
        self.world.resource::<SimConfig>()
    }

    pub fn store(&self) -> &UnitStore {
        self.world.resource::<UnitStore>()
    }

    /// Get the spatial grid reference (for debugging/visualization).
    pub fn spatial_grid(&self) -> Option<&SpatialGrid> {
        self.world.get_resource::<SpatialGrid>()
    }

    /// Get the current tick number.
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Get the current simulation time in seconds.
    pub fn current_time(&self) -> f32 {
        self.time
    }

    /// Get direct access to the ECS world (for advanced usage).
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get mutable access to the ECS world (for advanced usage).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}
