//! Movement system - integrates steering into velocity and position.

use crate::components::UnitId;
use crate::config::SimConfig;
use crate::store::UnitStore;
use crate::systems::steering::SteeringBuffer;
use bevy_ecs::prelude::*;

/// Resource containing the delta time for the current tick.
#[derive(Resource, Default)]
pub struct DeltaTime(pub f32);

/// System that applies the blended steering force, clamps speed, moves units
/// and decays attack cooldowns.
///
/// ## Data Access
/// - Reads: DeltaTime, SimConfig, SteeringBuffer
/// - Writes: UnitStore (velocity, position, cooldown)
pub fn integration_system(
    dt: Res<DeltaTime>,
    config: Res<SimConfig>,
    steering: Res<SteeringBuffer>,
    mut store: ResMut<UnitStore>,
) {
    let delta = dt.0;
    let gain = config.rate_of_gain;

    for i in 0..store.capacity() {
        if !store.active[i] {
            continue;
        }

        if let Some(forces) = steering.forces(UnitId(i as u32)) {
            let accel = forces.blended(&config.weights);
            store.velocity[i] += accel * delta * gain;
        }

        let max_speed = store.max_speed[i];
        let vel = store.velocity[i].clamp_length_max(max_speed);
        store.velocity[i] = vel;
        store.position[i] += vel * delta;
        store.cooldown[i] = (store.cooldown[i] - delta).max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Team, UnitStats};
    use crate::systems::steering::{SteeringForces, SteeringOutput};
    use glam::Vec2;

    fn world_with(store: UnitStore, buffer: SteeringBuffer, dt: f32) -> World {
        let mut world = World::new();
        world.insert_resource(DeltaTime(dt));
        world.insert_resource(SimConfig::default());
        world.insert_resource(buffer);
        world.insert_resource(store);
        world
    }

    fn run(world: &mut World) {
        let mut schedule = Schedule::default();
        schedule.add_systems(integration_system);
        schedule.run(world);
    }

    #[test]
    fn test_integration_applies_velocity() {
        let mut store = UnitStore::new(1);
        let id = store
            .create(Team::One, Vec2::ZERO, UnitStats::melee(1.0, 1.0, 2.0))
            .unwrap();
        store.set_velocity(id, Vec2::new(5.0, 3.0));

        let mut world = world_with(store, SteeringBuffer::default(), 1.0);
        run(&mut world);

        let view = world.resource::<UnitStore>().view(id).unwrap();
        assert!((view.position - Vec2::new(5.0, 3.0)).length() < 0.001);
    }

    #[test]
    fn test_integration_clamps_to_max_speed() {
        let mut store = UnitStore::new(1);
        let id = store
            .create(Team::One, Vec2::ZERO, UnitStats::melee(1.0, 1.0, 1.0))
            .unwrap();

        let mut buffer = SteeringBuffer::default();
        buffer.reset(1);
        buffer.set(
            id,
            SteeringOutput {
                forces: SteeringForces {
                    pursuit: Vec2::new(4000.0, 0.0),
                    ..Default::default()
                },
                target: None,
            },
        );

        let mut world = world_with(store, buffer, 0.1);
        run(&mut world);

        let view = world.resource::<UnitStore>().view(id).unwrap();
        assert!(view.velocity.length() <= view.max_speed + 1e-4);
        assert!((view.velocity.x - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_cooldown_decays_to_zero() {
        let mut store = UnitStore::new(1);
        let id = store
            .create(
                Team::Two,
                Vec2::ZERO,
                UnitStats::melee(1.0, 1.0, 1.0).with_cooldown(0.05),
            )
            .unwrap();

        let mut world = world_with(store, SteeringBuffer::default(), 0.1);
        run(&mut world);

        assert_eq!(world.resource::<UnitStore>().view(id).unwrap().cooldown, 0.0);
    }
}
