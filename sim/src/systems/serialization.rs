//! Serialization utilities for simulation state.

use crate::world::Snapshot;

/// Serialize a snapshot to JSON bytes.
pub fn snapshot_to_json(snapshot: &Snapshot) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(snapshot)
}

/// Serialize a snapshot to a JSON string.
pub fn snapshot_to_json_string(snapshot: &Snapshot) -> Result<String, serde_json::Error> {
    serde_json::to_string(snapshot)
}

/// Deserialize a snapshot from JSON bytes.
pub fn snapshot_from_json(data: &[u8]) -> Result<Snapshot, serde_json::Error> {
    serde_json::from_slice(data)
}

/// Deserialize a snapshot from a JSON string.
pub fn snapshot_from_json_string(data: &str) -> Result<Snapshot, serde_json::Error> {
    serde_json::from_str(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Aabb, UnitKind};
    use crate::world::{ProjectileSnapshot, UnitSnapshot};
    use glam::Vec2;

    #[test]
    fn test_snapshot_roundtrip() {
        let snapshot = Snapshot {
            tick: 42,
            time: 0.7,
            units: vec![UnitSnapshot {
                id: 3,
                team: 2,
                kind: UnitKind::Ranged,
                x: 10.0,
                y: 20.0,
                vx: 1.0,
                vy: 0.0,
                health: 4.0,
                radius: 10.0,
                color: [10, 20, 30],
                engaging: true,
                attacked: false,
            }],
            projectiles: vec![ProjectileSnapshot {
                id: 0,
                x: 1.0,
                y: 2.0,
                vx: 100.0,
                vy: 0.0,
                team: 1,
                radius: 5.0,
            }],
            obstacles: vec![Aabb::new(Vec2::ZERO, Vec2::new(900.0, 1.0))],
            stats: Default::default(),
        };

        let bytes = snapshot_to_json(&snapshot).unwrap();
        let restored = snapshot_from_json(&bytes).unwrap();

        assert_eq!(restored.tick, 42);
        assert_eq!(restored.units.len(), 1);
        assert_eq!(restored.units[0].id, 3);
        assert_eq!(restored.units[0].kind, UnitKind::Ranged);
        assert_eq!(restored.projectiles.len(), 1);
        assert_eq!(restored.obstacles[0].max, Vec2::new(900.0, 1.0));
    }

    #[test]
    fn test_snapshot_string_contains_sections() {
        let json = snapshot_to_json_string(&Snapshot::default()).unwrap();
        assert!(json.contains("\"units\""));
        assert!(json.contains("\"projectiles\""));
        assert!(snapshot_from_json_string(&json).is_ok());
    }
}
