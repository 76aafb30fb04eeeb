//! Cleanup system - removes units whose health reached zero.

use crate::store::UnitStore;
use crate::systems::stats::TickStats;
use bevy_ecs::prelude::*;

/// System that destroys dead units at the end of the tick, returning their
/// slots to the free list.
pub fn purge_system(mut store: ResMut<UnitStore>, mut stats: ResMut<TickStats>) {
    let purged = store.purge_dead();
    stats.units_purged += purged.len() as u32;
}
