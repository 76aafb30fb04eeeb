//! Pooled projectile storage.
//!
//! Projectiles live in a slot arena. Released slots go onto a free list and
//! are overwritten in full on the next `acquire`, so steady fire does not
//! allocate once the pool has grown to its working size.

use crate::components::{Team, UnitId};
use bevy_ecs::prelude::*;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Slot index of a projectile in the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(pub u32);

impl ProjectileId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Projectile {
    pub position: Vec2,
    pub velocity: Vec2,
    pub damage: f32,
    pub team: Team,
    pub radius: f32,
}

impl Projectile {
    /// Build a projectile heading along `velocity_seed` at `speed`.
    /// A zero-length seed yields a stationary projectile.
    pub fn new(position: Vec2, velocity_seed: Vec2, damage: f32, team: Team, speed: f32, radius: f32) -> Self {
        Self {
            position,
            velocity: velocity_seed.normalize_or_zero() * speed,
            damage,
            team,
            radius,
        }
    }

    #[inline]
    pub fn advance(&mut self, dt: f32) {
        self.position += self.velocity * dt;
    }
}

/// Fire request emitted by a ranged unit, consumed by the projectile system
/// in the same tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FireEvent {
    pub shooter: UnitId,
    pub target: UnitId,
    pub origin: Vec2,
    pub target_position: Vec2,
    pub damage: f32,
    pub team: Team,
}

/// Fire events queued during the current tick.
#[derive(Resource, Debug, Default)]
pub struct FireEvents {
    pub events: Vec<FireEvent>,
}

impl FireEvents {
    pub fn push(&mut self, event: FireEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, FireEvent> {
        self.events.drain(..)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Arena of projectiles with O(1) acquire and release.
#[derive(Resource, Debug)]
pub struct ProjectilePool {
    slots: Vec<Projectile>,
    /// Position of each slot inside `active`, `None` while pooled.
    active_pos: Vec<Option<usize>>,
    active: Vec<ProjectileId>,
    free: Vec<ProjectileId>,
    radius: f32,
}

impl Default for ProjectilePool {
    fn default() -> Self {
        Self::new(5.0)
    }
}

impl ProjectilePool {
    /// Empty pool; every projectile it hands out has the given radius.
    pub fn new(radius: f32) -> Self {
        Self {
            slots: Vec::new(),
            active_pos: Vec::new(),
            active: Vec::new(),
            free: Vec::new(),
            radius,
        }
    }

    /// Take a projectile from the pool, reusing a released slot if one exists.
    pub fn acquire(&mut self, position: Vec2, velocity_seed: Vec2, damage: f32, team: Team, speed: f32) -> ProjectileId {
        let projectile = Projectile::new(position, velocity_seed, damage, team, speed, self.radius);
        let id = match self.free.pop() {
            Some(id) => {
                self.slots[id.index()] = projectile;
                id
            }
            None => {
                let id = ProjectileId(self.slots.len() as u32);
                self.slots.push(projectile);
                self.active_pos.push(None);
                id
            }
        };
        self.active_pos[id.index()] = Some(self.active.len());
        self.active.push(id);
        id
    }

    /// Return a projectile to the pool. Returns `false` if it was not live.
    pub fn release(&mut self, id: ProjectileId) -> bool {
        let Some(pos) = self.active_pos.get(id.index()).copied().flatten() else {
            return false;
        };
        self.active.swap_remove(pos);
        if let Some(&moved) = self.active.get(pos) {
            self.active_pos[moved.index()] = Some(pos);
        }
        self.active_pos[id.index()] = None;
        self.slots[id.index()] = Projectile::default();
        self.free.push(id);
        true
    }

    pub fn get(&self, id: ProjectileId) -> Option<&Projectile> {
        if self.is_live(id) {
            self.slots.get(id.index())
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, id: ProjectileId) -> Option<&mut Projectile> {
        if self.is_live(id) {
            self.slots.get_mut(id.index())
        } else {
            None
        }
    }

    #[inline]
    pub fn is_live(&self, id: ProjectileId) -> bool {
        matches!(self.active_pos.get(id.index()), Some(Some(_)))
    }

    /// Ids of live projectiles, in no particular order.
    pub fn active_ids(&self) -> &[ProjectileId] {
        &self.active
    }

    pub fn iter_active(&self) -> impl Iterator<Item = (ProjectileId, &Projectile)> {
        self.active.iter().map(|&id| (id, &self.slots[id.index()]))
    }

    /// Number of live projectiles.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Number of released slots waiting for reuse.
    pub fn pooled(&self) -> usize {
        self.free.len()
    }
}
