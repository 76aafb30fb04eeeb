//! Snapshot types.
//!
//! The `Snapshot` struct provides a serializable view of the simulation state
//! that a renderer or replay tool can consume after each tick. JSON encoding
//! lives in [`crate::systems::serialization`].

use crate::components::*;
use crate::projectile::ProjectilePool;
use crate::store::UnitStore;
use crate::systems::projectiles::Obstacles;
use crate::systems::stats::TickStats;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Snapshot of a single unit's state for serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub id: u32,
    pub team: u8,
    pub kind: UnitKind,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub health: f32,
    pub radius: f32,
    pub color: [u8; 3],
    pub engaging: bool,
    pub attacked: bool,
}

/// Snapshot of a live projectile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub team: u8,
    pub radius: f32,
}

/// Complete simulation state snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Current simulation tick.
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub time: f32,
    /// All active units, in slot order.
    pub units: Vec<UnitSnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
    pub obstacles: Vec<Aabb>,
    /// Counters of the last tick.
    pub stats: TickStats,
}

impl Snapshot {
    /// Create a snapshot from the ECS world.
    pub fn from_world(world: &World, tick: u64, time: f32) -> Self {
        let mut units = Vec::new();
        if let Some(store) = world.get_resource::<UnitStore>() {
            for id in store.active_ids() {
                let i = id.index();
                units.push(UnitSnapshot {
                    id: id.0,
                    team: store.team[i].number(),
                    kind: store.kind[i],
                    x: store.position[i].x,
                    y: store.position[i].y,
                    vx: store.velocity[i].x,
                    vy: store.velocity[i].y,
                    health: store.health[i],
                    radius: store.radius[i],
                    color: store.color[i],
                    engaging: store.engagement[i] == EngagementState::Engaging,
                    attacked: store.attacked[i],
                });
            }
        }

        let projectiles = world
            .get_resource::<ProjectilePool>()
            .map(|pool| {
                pool.iter_active()
                    .map(|(id, p)| ProjectileSnapshot {
                        id: id.0,
                        x: p.position.x,
                        y: p.position.y,
                        vx: p.velocity.x,
                        vy: p.velocity.y,
                        team: p.team.number(),
                        radius: p.radius,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let obstacles = world
            .get_resource::<Obstacles>()
            .map(|o| o.items.iter().map(|item| item.bounds).collect())
            .unwrap_or_default();

        let stats = world.get_resource::<TickStats>().copied().unwrap_or_default();

        Self {
            tick,
            time,
            units,
            projectiles,
            obstacles,
            stats,
        }
    }

    /// Units of one team.
    pub fn team_units(&self, team: Team) -> impl Iterator<Item = &UnitSnapshot> {
        let number = team.number();
        self.units.iter().filter(move |u| u.team == number)
    }
}
