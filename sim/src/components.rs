//! Plain data types shared by the simulation systems.
//!
//! Unit attributes live in the struct-of-arrays [`crate::store::UnitStore`];
//! the types here describe what goes into a slot and how callers refer to it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

// ============================================================================
// IDENTITY
// ============================================================================

/// Slot index of a unit in the entity store.
///
/// Stable for the unit's lifetime, recycled after the unit is removed, so
/// never hold one past the tick in which it was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl UnitId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Owning side of a unit or projectile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Team {
    #[default]
    One,
    Two,
}

impl Team {
    pub fn opponent(self) -> Self {
        match self {
            Team::One => Team::Two,
            Team::Two => Team::One,
        }
    }

    /// Numeric team id (1 or 2), as used by the game layer.
    pub fn number(self) -> u8 {
        match self {
            Team::One => 1,
            Team::Two => 2,
        }
    }

    /// Index into per-team tables such as destinations.
    #[inline]
    pub fn slot(self) -> usize {
        match self {
            Team::One => 0,
            Team::Two => 1,
        }
    }
}

// ============================================================================
// UNIT STATS
// ============================================================================

/// How a unit resolves a legal attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnitKind {
    /// Damage is applied directly to the target.
    #[default]
    Melee,
    /// A fire event is emitted and a projectile carries the damage.
    Ranged,
}

/// Default collision/render radius of a unit.
pub const UNIT_RADIUS: f32 = 10.0;
/// Multiplier from base speed to maximum speed.
pub const MAX_SPEED_FACTOR: f32 = 5.0;
/// Lower bound on attacks per second so cooldowns stay finite.
pub const MIN_ATTACK_SPEED: f32 = 0.1;
/// Units whose cost falls below this get escorts when spawned as a squad.
pub const SQUAD_COST_TARGET: f32 = 10.0;

const MELEE_VISION_RANGE: f32 = 100.0;
const RANGED_ATTACK_RANGE: f32 = 200.0;
const RANGED_VISION_RANGE: f32 = 250.0;

/// Attributes of a unit at creation time.
///
/// Kind-specific values (attack speed scaling, default ranges) are resolved
/// by the [`UnitStats::melee`] and [`UnitStats::ranged`] presets so the hot
/// loop never branches on unit type to find them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitStats {
    pub kind: UnitKind,
    pub health: f32,
    pub damage: f32,
    /// Base speed; maximum speed is `speed * MAX_SPEED_FACTOR`.
    pub speed: f32,
    pub attack_range: f32,
    pub vision_range: f32,
    /// Attacks per second.
    pub attack_speed: f32,
    /// Seconds before the first attack is allowed.
    pub cooldown: f32,
    pub color: [u8; 3],
    pub radius: f32,
}

impl UnitStats {
    /// Melee preset: attack speed follows base speed, reach is two radii.
    pub fn melee(health: f32, damage: f32, speed: f32) -> Self {
        let attack_speed = if speed > 0.0 { speed } else { MIN_ATTACK_SPEED };
        Self {
            kind: UnitKind::Melee,
            health,
            damage,
            speed,
            attack_range: UNIT_RADIUS * 2.0,
            vision_range: MELEE_VISION_RANGE,
            attack_speed,
            cooldown: 1.0 / attack_speed,
            color: stat_color(damage, speed, health),
            radius: UNIT_RADIUS,
        }
    }

    /// Ranged preset: long reach, attack speed scaled down from base speed.
    pub fn ranged(health: f32, damage: f32, speed: f32) -> Self {
        let attack_speed = (speed / 4.0).max(MIN_ATTACK_SPEED);
        Self {
            kind: UnitKind::Ranged,
            health,
            damage,
            speed,
            attack_range: RANGED_ATTACK_RANGE,
            vision_range: RANGED_VISION_RANGE,
            attack_speed,
            cooldown: 1.0 / attack_speed,
            color: stat_color(damage, speed, health),
            radius: UNIT_RADIUS,
        }
    }

    pub fn with_ranges(mut self, attack_range: f32, vision_range: f32) -> Self {
        self.attack_range = attack_range;
        self.vision_range = vision_range;
        self
    }

    pub fn with_cooldown(mut self, cooldown: f32) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    #[inline]
    pub fn max_speed(&self) -> f32 {
        self.speed * MAX_SPEED_FACTOR
    }

    /// Point cost of the unit (damage + health + speed).
    pub fn cost(&self) -> f32 {
        self.damage + self.health + self.speed
    }

    /// Number of escort copies spawned alongside a cheap unit.
    pub fn escort_count(&self) -> usize {
        let deficit = SQUAD_COST_TARGET - self.cost();
        if deficit <= 0.0 {
            0
        } else {
            deficit as usize
        }
    }

    /// Normalize values that would break store invariants: speed never
    /// negative, vision never below attack range, attack speed never zero.
    pub(crate) fn sanitized(mut self) -> Self {
        self.speed = self.speed.max(0.0);
        self.attack_speed = self.attack_speed.max(MIN_ATTACK_SPEED);
        self.attack_range = self.attack_range.max(0.0);
        self.vision_range = self.vision_range.max(self.attack_range);
        self.cooldown = self.cooldown.max(0.0);
        self.radius = self.radius.max(0.0);
        self
    }
}

impl Default for UnitStats {
    fn default() -> Self {
        Self::melee(3.0, 2.0, 3.0)
    }
}

/// Color encoding the stat mix: red for damage, green for speed, blue for health.
pub fn stat_color(damage: f32, speed: f32, health: f32) -> [u8; 3] {
    let total = damage + speed + health;
    if total <= 0.0 {
        return [128, 128, 128];
    }
    let channel = |v: f32| ((v / total).clamp(0.0, 1.0) * 255.0) as u8;
    [channel(damage), channel(speed), channel(health)]
}

// ============================================================================
// COMBAT STATE
// ============================================================================

/// Engagement state of a unit. Cooldown is tracked separately and overlays
/// either state (see [`CombatState`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EngagementState {
    #[default]
    Idle,
    /// An enemy is inside vision range.
    Engaging,
}

/// Full combat state of a unit: engagement plus cooldown overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatState {
    pub engagement: EngagementState,
    pub on_cooldown: bool,
}

// ============================================================================
// GEOMETRY
// ============================================================================

/// Axis-aligned rectangle in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Rectangle from a top-left corner and a size, the way walls are laid out.
    pub fn from_origin_size(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(Vec2::new(x, y), Vec2::new(x + width, y + height))
    }

    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Whether a circle touches the rectangle.
    #[inline]
    pub fn touches_circle(&self, center: Vec2, radius: f32) -> bool {
        let closest = center.clamp(self.min, self.max);
        closest.distance_squared(center) <= radius * radius
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

/// Static obstacle that stops projectiles on contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub bounds: Aabb,
}

impl Obstacle {
    pub fn new(bounds: Aabb) -> Self {
        Self { bounds }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranged_preset_scales_attack_speed() {
        let stats = UnitStats::ranged(1.0, 3.0, 1.0);
        assert!((stats.attack_speed - 0.25).abs() < 1e-6);
        assert!((stats.cooldown - 4.0).abs() < 1e-5);
        assert!(stats.vision_range >= stats.attack_range);
    }

    #[test]
    fn test_sanitized_keeps_vision_at_least_attack_range() {
        let stats = UnitStats::melee(1.0, 1.0, 1.0)
            .with_ranges(50.0, 10.0)
            .sanitized();
        assert_eq!(stats.vision_range, 50.0);
    }

    #[test]
    fn test_escort_count() {
        assert_eq!(UnitStats::melee(1.0, 2.0, 5.0).escort_count(), 2);
        assert_eq!(UnitStats::melee(10.0, 2.0, 5.0).escort_count(), 0);
    }

    #[test]
    fn test_circle_touches_rect() {
        let wall = Aabb::from_origin_size(0.0, 0.0, 10.0, 1.0);
        assert!(wall.touches_circle(Vec2::new(5.0, 3.0), 2.5));
        assert!(!wall.touches_circle(Vec2::new(5.0, 5.0), 2.5));
    }
}
