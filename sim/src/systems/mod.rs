//! Simulation systems.
//!
//! Systems contain the per-tick logic that operates on the resources held by
//! [`crate::SimWorld`]. They run chained, in this order:
//!
//! 1. `spatial_grid_update_system` - rebuilds the grid from current positions
//! 2. `steering_system` - flocking, pursuit and goal forces plus targets
//! 3. `integration_system` - velocity, speed clamp, position, cooldown decay
//! 4. `combat_system` - melee damage and ranged fire events
//! 5. `projectile_system` - spawn, advance, expire and hit
//! 6. `purge_system` - removes dead units
//!
//! Steering reads only start-of-tick positions. Everything after integration
//! sees this tick's positions.

pub mod cleanup;
pub mod combat;
pub mod movement;
pub mod projectiles;
pub mod serialization;
pub mod stats;
pub mod steering;

pub use cleanup::*;
pub use combat::*;
pub use movement::*;
pub use projectiles::*;
pub use serialization::*;
pub use stats::*;
pub use steering::*;
