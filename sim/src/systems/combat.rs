//! Combat system - resolves attacks against pursuit targets.
//!
//! Runs after integration, so distances are measured with this tick's
//! positions. Attackers are processed sequentially in slot order: a melee hit
//! lowers the target's health immediately and later attackers see it.
//!
//! An attack is legal when the attacker is alive, its cooldown has expired,
//! its target is still alive and the target is within attack range.
//!
//! - **Melee** subtracts damage from the target.
//! - **Ranged** emits a [`FireEvent`] and roots the shooter for the tick.
//!
//! Either way the cooldown restarts at `1 / attack_speed`.

use crate::components::*;
use crate::error::SimError;
use crate::projectile::{FireEvent, FireEvents};
use crate::store::UnitStore;
use crate::systems::stats::TickStats;
use crate::systems::steering::SteeringBuffer;
use bevy_ecs::prelude::*;
use glam::Vec2;
use tracing::trace;

/// System that resolves attacks for every active unit.
///
/// ## Data Access
/// - Reads: SteeringBuffer
/// - Writes: UnitStore, FireEvents, TickStats
pub fn combat_system(
    steering: Res<SteeringBuffer>,
    mut store: ResMut<UnitStore>,
    mut fire: ResMut<FireEvents>,
    mut stats: ResMut<TickStats>,
) {
    for i in 0..store.capacity() {
        if !store.active[i] {
            continue;
        }
        let id = UnitId(i as u32);
        let target = steering.target(id);

        store.attacked[i] = false;
        store.engagement[i] = if target.is_some() {
            EngagementState::Engaging
        } else {
            EngagementState::Idle
        };

        let Some(target) = target else {
            continue;
        };
        if store.health[i] <= 0.0 {
            continue;
        }

        match resolve_attack(&mut store, &mut fire, id, target.id) {
            Ok(Some(UnitKind::Melee)) => stats.melee_hits += 1,
            Ok(Some(UnitKind::Ranged)) => stats.shots_fired += 1,
            Ok(None) => {}
            Err(err) => {
                trace!(attacker = id.0, %err, "attack skipped");
                stats.invalid_targets += 1;
            }
        }
    }
}

/// Resolve one attack attempt.
///
/// Returns the kind of attack performed, `None` when the attack is not legal
/// this tick, or [`SimError::InvalidTarget`] when the target is gone.
pub fn resolve_attack(
    store: &mut UnitStore,
    fire: &mut FireEvents,
    attacker: UnitId,
    target: UnitId,
) -> Result<Option<UnitKind>, SimError> {
    if !store.is_alive(target) {
        return Err(SimError::InvalidTarget(target));
    }
    let a = attacker.index();
    let t = target.index();

    if store.cooldown[a] > 0.0 {
        return Ok(None);
    }
    if store.position[a].distance(store.position[t]) > store.attack_range[a] {
        return Ok(None);
    }

    let kind = store.kind[a];
    match kind {
        UnitKind::Melee => {
            store.health[t] -= store.damage[a];
        }
        UnitKind::Ranged => {
            fire.push(FireEvent {
                shooter: attacker,
                target,
                origin: store.position[a],
                target_position: store.position[t],
                damage: store.damage[a],
                team: store.team[a],
            });
            store.velocity[a] = Vec2::ZERO;
        }
    }

    store.cooldown[a] = 1.0 / store.attack_speed[a];
    store.attacked[a] = true;
    Ok(Some(kind))
}
