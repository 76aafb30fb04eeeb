//! Per-tick counters.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Event counters for the current tick. Reset at the start of every tick.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickStats {
    /// Melee attacks that landed.
    pub melee_hits: u32,
    /// Fire events emitted by ranged units.
    pub shots_fired: u32,
    /// Attacks skipped because the target died earlier in the tick.
    pub invalid_targets: u32,
    /// Fire events dropped because the target was gone by the time they were consumed.
    pub dropped_fire_events: u32,
    pub projectile_hits: u32,
    /// Projectiles released after leaving the playfield or touching an obstacle.
    pub projectiles_expired: u32,
    pub units_purged: u32,
}

impl TickStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
