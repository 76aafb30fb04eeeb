//! Skirmish - Simulation Core
//!
//! A deterministic, fixed-timestep swarm battle simulation: two teams of
//! flocking units steer toward their destinations, pursue visible enemies and
//! fight in melee or with pooled projectiles.
//! Uses `bevy_ecs` resources and a chained schedule for the tick pipeline.

pub mod api;
pub mod components;
pub mod config;
pub mod error;
pub mod projectile;
pub mod quadtree;
pub mod spatial;
pub mod store;
pub mod systems;
pub mod world;

pub use api::SimWorld;
pub use components::*;
pub use config::{SimConfig, SteeringWeights};
pub use error::{ConfigError, SimError};
pub use projectile::{FireEvent, Projectile, ProjectileId, ProjectilePool};
pub use quadtree::QuadTree;
pub use spatial::SpatialGrid;
pub use store::{UnitStore, UnitView};
pub use systems::*;
pub use world::{ProjectileSnapshot, Snapshot, UnitSnapshot};
