//! Struct-of-arrays unit storage with slot recycling.
//!
//! Every attribute is a parallel `Vec` indexed by [`UnitId`]; slot `i` of each
//! array belongs to the same unit. Slots are never freed, only marked inactive
//! and pushed onto the free list, so `destroy` is O(1) and capacity is fixed.

use crate::components::*;
use crate::error::SimError;
use bevy_ecs::prelude::*;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Read-only copy of one unit's attributes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitView {
    pub id: UnitId,
    pub team: Team,
    pub kind: UnitKind,
    pub position: Vec2,
    pub velocity: Vec2,
    pub health: f32,
    pub damage: f32,
    pub max_speed: f32,
    pub attack_range: f32,
    pub vision_range: f32,
    pub cooldown: f32,
    pub color: [u8; 3],
    pub radius: f32,
}

/// The entity store. Owns every per-unit array.
#[derive(Resource, Debug)]
pub struct UnitStore {
    capacity: usize,
    pub(crate) active: Vec<bool>,
    pub(crate) team: Vec<Team>,
    pub(crate) kind: Vec<UnitKind>,
    pub(crate) position: Vec<Vec2>,
    pub(crate) velocity: Vec<Vec2>,
    pub(crate) health: Vec<f32>,
    pub(crate) damage: Vec<f32>,
    pub(crate) speed: Vec<f32>,
    pub(crate) max_speed: Vec<f32>,
    pub(crate) attack_range: Vec<f32>,
    pub(crate) vision_range: Vec<f32>,
    pub(crate) attack_speed: Vec<f32>,
    pub(crate) cooldown: Vec<f32>,
    pub(crate) engagement: Vec<EngagementState>,
    /// Set when the unit attacked during the current tick.
    pub(crate) attacked: Vec<bool>,
    pub(crate) color: Vec<[u8; 3]>,
    pub(crate) radius: Vec<f32>,
    /// Free slots; popped from the back so low indices are handed out first.
    free: Vec<u32>,
    live: usize,
}

impl UnitStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            active: vec![false; capacity],
            team: vec![Team::One; capacity],
            kind: vec![UnitKind::Melee; capacity],
            position: vec![Vec2::ZERO; capacity],
            velocity: vec![Vec2::ZERO; capacity],
            health: vec![0.0; capacity],
            damage: vec![0.0; capacity],
            speed: vec![0.0; capacity],
            max_speed: vec![0.0; capacity],
            attack_range: vec![0.0; capacity],
            vision_range: vec![0.0; capacity],
            attack_speed: vec![0.0; capacity],
            cooldown: vec![0.0; capacity],
            engagement: vec![EngagementState::Idle; capacity],
            attacked: vec![false; capacity],
            color: vec![[0, 0, 0]; capacity],
            radius: vec![0.0; capacity],
            free: (0..capacity as u32).rev().collect(),
            live: 0,
        }
    }

    /// Place a new unit in a free slot.
    ///
    /// Fails with [`SimError::CapacityExceeded`] when every slot is in use;
    /// the store is left untouched in that case.
    pub fn create(&mut self, team: Team, position: Vec2, stats: UnitStats) -> Result<UnitId, SimError> {
        let Some(slot) = self.free.pop() else {
            return Err(SimError::CapacityExceeded {
                capacity: self.capacity,
            });
        };
        let stats = stats.sanitized();
        let i = slot as usize;

        self.active[i] = true;
        self.team[i] = team;
        self.kind[i] = stats.kind;
        self.position[i] = position;
        self.velocity[i] = Vec2::ZERO;
        self.health[i] = stats.health;
        self.damage[i] = stats.damage;
        self.speed[i] = stats.speed;
        self.max_speed[i] = stats.max_speed();
        self.attack_range[i] = stats.attack_range;
        self.vision_range[i] = stats.vision_range;
        self.attack_speed[i] = stats.attack_speed;
        self.cooldown[i] = stats.cooldown;
        self.engagement[i] = EngagementState::Idle;
        self.attacked[i] = false;
        self.color[i] = stats.color;
        self.radius[i] = stats.radius;
        self.live += 1;

        Ok(UnitId(slot))
    }

    /// Deactivate a unit and return its slot to the free pool.
    /// Returns `false` if the slot was not active.
    pub fn destroy(&mut self, id: UnitId) -> bool {
        let i = id.index();
        if i >= self.capacity || !self.active[i] {
            return false;
        }
        self.active[i] = false;
        self.velocity[i] = Vec2::ZERO;
        self.engagement[i] = EngagementState::Idle;
        self.attacked[i] = false;
        self.free.push(id.0);
        self.live -= 1;
        true
    }

    /// Destroy every active unit whose health is at or below zero.
    pub fn purge_dead(&mut self) -> Vec<UnitId> {
        let dead: Vec<UnitId> = self
            .active_ids()
            .filter(|id| self.health[id.index()] <= 0.0)
            .collect();
        for &id in &dead {
            self.destroy(id);
        }
        if !dead.is_empty() {
            debug!(count = dead.len(), remaining = self.live, "purged dead units");
        }
        dead
    }

    /// Number of free slots.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of active units.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    #[inline]
    pub fn is_active(&self, id: UnitId) -> bool {
        self.active.get(id.index()).copied().unwrap_or(false)
    }

    /// Active and above zero health.
    #[inline]
    pub fn is_alive(&self, id: UnitId) -> bool {
        self.is_active(id) && self.health[id.index()] > 0.0
    }

    /// Iterate the ids of all active units in slot order.
    pub fn active_ids(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.active
            .iter()
            .enumerate()
            .filter(|(_, &a)| a)
            .map(|(i, _)| UnitId(i as u32))
    }

    pub fn view(&self, id: UnitId) -> Option<UnitView> {
        if !self.is_active(id) {
            return None;
        }
        let i = id.index();
        Some(UnitView {
            id,
            team: self.team[i],
            kind: self.kind[i],
            position: self.position[i],
            velocity: self.velocity[i],
            health: self.health[i],
            damage: self.damage[i],
            max_speed: self.max_speed[i],
            attack_range: self.attack_range[i],
            vision_range: self.vision_range[i],
            cooldown: self.cooldown[i],
            color: self.color[i],
            radius: self.radius[i],
        })
    }

    pub fn combat_state(&self, id: UnitId) -> Option<CombatState> {
        if !self.is_active(id) {
            return None;
        }
        let i = id.index();
        Some(CombatState {
            engagement: self.engagement[i],
            on_cooldown: self.cooldown[i] > 0.0,
        })
    }

    /// Whether the unit attacked during the last tick.
    pub fn attacked_last_tick(&self, id: UnitId) -> bool {
        self.is_active(id) && self.attacked[id.index()]
    }

    pub fn positions(&self) -> &[Vec2] {
        &self.position
    }

    /// Apply damage to a unit. Health may go below zero; the unit is removed
    /// by the next [`UnitStore::purge_dead`].
    pub fn apply_damage(&mut self, id: UnitId, amount: f32) {
        if self.is_active(id) {
            self.health[id.index()] -= amount;
        }
    }

    pub fn set_velocity(&mut self, id: UnitId, velocity: Vec2) {
        if self.is_active(id) {
            self.velocity[id.index()] = velocity;
        }
    }
}
