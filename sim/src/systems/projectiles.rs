//! Projectile system - spawns, moves, expires and resolves projectiles.
//!
//! ## Phases
//!
//! 1. **Spawn**: drain this tick's fire events. Events whose target is no
//!    longer alive are dropped; the rest acquire a pooled projectile aimed at
//!    the target's position when the shot was taken.
//! 2. **Advance**: move every live projectile by `velocity * dt`.
//! 3. **Expire**: projectiles outside the playfield or touching an obstacle
//!    are marked for release.
//! 4. **Hit**: surviving projectiles are re-indexed in the grid, then tested
//!    in id order against the units in their 3×3 neighborhood. The first live
//!    enemy whose radius contains the projectile takes the damage.
//! 5. **Release**: expired and spent projectiles go back to the pool.

use crate::components::*;
use crate::config::SimConfig;
use crate::projectile::{FireEvents, ProjectileId, ProjectilePool};
use crate::spatial::SpatialGrid;
use crate::store::UnitStore;
use crate::systems::movement::DeltaTime;
use crate::systems::stats::TickStats;
use bevy_ecs::prelude::*;
use glam::Vec2;
use tracing::trace;

/// Static obstacles. Projectiles touching one are destroyed.
#[derive(Resource, Debug, Default, Clone)]
pub struct Obstacles {
    pub items: Vec<Obstacle>,
}

impl Obstacles {
    pub fn push(&mut self, obstacle: Obstacle) {
        self.items.push(obstacle);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether a circle touches any obstacle.
    pub fn blocks(&self, center: Vec2, radius: f32) -> bool {
        self.items.iter().any(|o| o.bounds.touches_circle(center, radius))
    }
}

/// System that runs the full projectile lifecycle for one tick.
///
/// ## Data Access
/// - Reads: DeltaTime, SimConfig, Obstacles
/// - Writes: FireEvents, ProjectilePool, SpatialGrid (projectile buckets),
///   UnitStore (health), TickStats
#[allow(clippy::too_many_arguments)]
pub fn projectile_system(
    dt: Res<DeltaTime>,
    config: Res<SimConfig>,
    obstacles: Res<Obstacles>,
    mut fire: ResMut<FireEvents>,
    mut pool: ResMut<ProjectilePool>,
    mut grid: ResMut<SpatialGrid>,
    mut store: ResMut<UnitStore>,
    mut stats: ResMut<TickStats>,
) {
    // Spawn
    for event in fire.drain() {
        if !store.is_alive(event.target) {
            trace!(shooter = event.shooter.0, target = event.target.0, "dropping fire event for dead target");
            stats.dropped_fire_events += 1;
            continue;
        }
        pool.acquire(
            event.origin,
            event.target_position - event.origin,
            event.damage,
            event.team,
            config.projectile_speed,
        );
    }

    // Advance and expire
    let delta = dt.0;
    let bounds = config.bounds();
    let mut spent: Vec<ProjectileId> = Vec::new();
    let mut survivors: Vec<(ProjectileId, Vec2)> = Vec::with_capacity(pool.len());
    let ids: Vec<ProjectileId> = pool.active_ids().to_vec();
    for id in ids {
        let Some(projectile) = pool.get_mut(id) else {
            continue;
        };
        projectile.advance(delta);
        if !bounds.contains(projectile.position)
            || obstacles.blocks(projectile.position, projectile.radius)
        {
            spent.push(id);
            stats.projectiles_expired += 1;
        } else {
            survivors.push((id, projectile.position));
        }
    }

    // Re-index survivors
    grid.clear_projectiles();
    for &(id, position) in &survivors {
        grid.insert_projectile(id, position);
    }

    // Hit, lowest projectile id first
    survivors.sort_unstable_by_key(|(id, _)| *id);
    for (id, position) in survivors {
        let Some(projectile) = pool.get(id).copied() else {
            continue;
        };
        let enemy = projectile.team.opponent();
        let hit = grid.neighbors_at(position).into_iter().find(|&unit| {
            store.is_alive(unit)
                && store.team[unit.index()] == enemy
                && store.position[unit.index()].distance(position) <= store.radius[unit.index()]
        });
        if let Some(unit) = hit {
            store.apply_damage(unit, projectile.damage);
            spent.push(id);
            stats.projectile_hits += 1;
        }
    }

    // Release
    for id in spent {
        pool.release(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projectile::FireEvent;

    fn world_with(store: UnitStore) -> World {
        let mut world = World::new();
        world.insert_resource(DeltaTime(0.1));
        world.insert_resource(SimConfig::default());
        world.insert_resource(Obstacles::default());
        world.insert_resource(FireEvents::default());
        world.insert_resource(ProjectilePool::default());
        world.insert_resource(SpatialGrid::new(200.0));
        world.insert_resource(store);
        world.insert_resource(TickStats::default());
        world
    }

    fn run(world: &mut World) {
        let mut schedule = Schedule::default();
        schedule.add_systems(projectile_system);
        schedule.run(world);
    }

    fn shot(shooter: UnitId, target: UnitId, origin: Vec2, target_position: Vec2) -> FireEvent {
        FireEvent {
            shooter,
            target,
            origin,
            target_position,
            damage: 2.0,
            team: Team::One,
        }
    }

    #[test]
    fn test_fire_event_spawns_projectile_toward_target() {
        let mut store = UnitStore::new(2);
        let a = store.create(Team::One, Vec2::new(100.0, 100.0), UnitStats::default()).unwrap();
        let b = store.create(Team::Two, Vec2::new(300.0, 100.0), UnitStats::default()).unwrap();

        let mut world = world_with(store);
        world
            .resource_mut::<FireEvents>()
            .push(shot(a, b, Vec2::new(100.0, 100.0), Vec2::new(300.0, 100.0)));
        run(&mut world);

        let pool = world.resource::<ProjectilePool>();
        assert_eq!(pool.len(), 1);
        let (_, p) = pool.iter_active().next().unwrap();
        assert!((p.position - Vec2::new(110.0, 100.0)).length() < 1e-3);
        assert!(world.resource::<FireEvents>().is_empty());
    }

    #[test]
    fn test_fire_event_for_dead_target_is_dropped() {
        let mut store = UnitStore::new(2);
        let a = store.create(Team::One, Vec2::new(100.0, 100.0), UnitStats::default()).unwrap();
        let b = store.create(Team::Two, Vec2::new(300.0, 100.0), UnitStats::default()).unwrap();
        store.apply_damage(b, 100.0);

        let mut world = world_with(store);
        world
            .resource_mut::<FireEvents>()
            .push(shot(a, b, Vec2::new(100.0, 100.0), Vec2::new(300.0, 100.0)));
        run(&mut world);

        assert!(world.resource::<ProjectilePool>().is_empty());
        assert_eq!(world.resource::<TickStats>().dropped_fire_events, 1);
    }

    #[test]
    fn test_projectile_hits_enemy_and_is_released() {
        let mut store = UnitStore::new(3);
        let a = store.create(Team::One, Vec2::new(100.0, 100.0), UnitStats::default()).unwrap();
        let friend = store.create(Team::One, Vec2::new(111.0, 100.0), UnitStats::default()).unwrap();
        let b = store.create(Team::Two, Vec2::new(115.0, 100.0), UnitStats::default()).unwrap();

        let mut world = world_with(store);
        world
            .resource_mut::<FireEvents>()
            .push(shot(a, b, Vec2::new(100.0, 100.0), Vec2::new(115.0, 100.0)));
        run(&mut world);

        let store = world.resource::<UnitStore>();
        assert_eq!(store.view(b).unwrap().health, 1.0);
        assert_eq!(store.view(friend).unwrap().health, 3.0, "no friendly fire");
        assert!(world.resource::<ProjectilePool>().is_empty());
        assert_eq!(world.resource::<TickStats>().projectile_hits, 1);
    }

    #[test]
    fn test_projectile_leaving_playfield_is_released() {
        let mut world = world_with(UnitStore::new(1));
        world
            .resource_mut::<ProjectilePool>()
            .acquire(Vec2::new(895.0, 450.0), Vec2::X, 1.0, Team::One, 100.0);
        run(&mut world);

        let pool = world.resource::<ProjectilePool>();
        assert!(pool.is_empty());
        assert_eq!(pool.pooled(), 1);
        assert_eq!(world.resource::<TickStats>().projectiles_expired, 1);
    }

    #[test]
    fn test_obstacle_stops_projectile() {
        let mut world = world_with(UnitStore::new(1));
        world
            .resource_mut::<Obstacles>()
            .push(Obstacle::new(Aabb::from_origin_size(112.0, 0.0, 1.0, 900.0)));
        world
            .resource_mut::<ProjectilePool>()
            .acquire(Vec2::new(100.0, 450.0), Vec2::X, 1.0, Team::One, 100.0);
        run(&mut world);

        assert!(world.resource::<ProjectilePool>().is_empty());
    }

    #[test]
    fn test_projectile_in_flight_survives() {
        let mut world = world_with(UnitStore::new(1));
        world
            .resource_mut::<ProjectilePool>()
            .acquire(Vec2::new(100.0, 450.0), Vec2::Y, 1.0, Team::Two, 100.0);
        run(&mut world);

        let pool = world.resource::<ProjectilePool>();
        assert_eq!(pool.len(), 1);
        assert_eq!(world.resource::<SpatialGrid>().projectile_count(), 1);
    }

    #[test]
    fn test_hit_order_is_stable_across_cell_boundary() {
        for _ in 0..50 {
            let mut store = UnitStore::new(1);
            let target = store
                .create(Team::Two, Vec2::new(200.0, 100.0), UnitStats::melee(2.0, 1.0, 1.0))
                .unwrap();

            let mut world = world_with(store);
            world.resource_mut::<DeltaTime>().0 = 0.0;
            let (left, right) = {
                let mut pool = world.resource_mut::<ProjectilePool>();
                (
                    pool.acquire(Vec2::new(195.0, 100.0), Vec2::ZERO, 2.0, Team::One, 100.0),
                    pool.acquire(Vec2::new(205.0, 100.0), Vec2::ZERO, 2.0, Team::One, 100.0),
                )
            };
            run(&mut world);

            let pool = world.resource::<ProjectilePool>();
            assert!(!pool.is_live(left), "lower id resolves first");
            assert!(pool.is_live(right));
            assert_eq!(world.resource::<UnitStore>().view(target).unwrap().health, 0.0);
            assert_eq!(world.resource::<TickStats>().projectile_hits, 1);
        }
    }

    #[test]
    fn test_projectile_hits_at_most_one_unit() {
        let mut store = UnitStore::new(2);
        let a = store.create(Team::Two, Vec2::new(300.0, 300.0), UnitStats::default()).unwrap();
        let b = store.create(Team::Two, Vec2::new(304.0, 300.0), UnitStats::default()).unwrap();

        let mut world = world_with(store);
        world.resource_mut::<DeltaTime>().0 = 0.0;
        world
            .resource_mut::<ProjectilePool>()
            .acquire(Vec2::new(302.0, 300.0), Vec2::ZERO, 1.0, Team::One, 100.0);
        run(&mut world);

        let store = world.resource::<UnitStore>();
        let damaged = [a, b]
            .iter()
            .filter(|id| store.view(**id).unwrap().health < 3.0)
            .count();
        assert_eq!(damaged, 1);
        assert_eq!(world.resource::<TickStats>().projectile_hits, 1);
        assert!(world.resource::<ProjectilePool>().is_empty());
    }
}
