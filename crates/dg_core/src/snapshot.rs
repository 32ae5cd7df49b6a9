//! Per-pass snapshots: an opt-in, memory-heavy copy of the grid and counts
//! taken after each pass, for visual step-through debugging. Distinct from
//! [`crate::metrics`], which is cheap enough to leave on by default.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub pass_id: String,
    pub pass_index: usize,
    pub timestamp_ms: u64,
    pub room_count: usize,
    pub connection_count: usize,
    /// An independent copy of the terrain at this point, if the artifact
    /// had terrain to copy.
    pub terrain: Option<Vec<u8>>,
}

#[derive(Default)]
pub struct SnapshotCollector {
    enabled: bool,
    snapshots: Vec<Snapshot>,
}

impl SnapshotCollector {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            snapshots: Vec::new(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn capture(&mut self, pass_id: &str, pass_index: usize, timestamp_ms: u64, room_count: usize, connection_count: usize, terrain: Option<Vec<u8>>) {
        if !self.enabled {
            return;
        }
        self.snapshots.push(Snapshot {
            pass_id: pass_id.to_string(),
            pass_index,
            timestamp_ms,
            room_count,
            connection_count,
            terrain,
        });
    }

    pub fn into_vec(self) -> Vec<Snapshot> {
        self.snapshots
    }

    pub fn as_slice(&self) -> &[Snapshot] {
        &self.snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_collector_captures_nothing() {
        let mut c = SnapshotCollector::new(false);
        c.capture("p", 0, 0, 1, 1, Some(vec![1, 2, 3]));
        assert!(c.as_slice().is_empty());
    }

    #[test]
    fn enabled_collector_copies_terrain_independently() {
        let mut c = SnapshotCollector::new(true);
        let mut terrain = vec![1, 2, 3];
        c.capture("p", 0, 0, 1, 1, Some(terrain.clone()));
        terrain[0] = 99;
        assert_eq!(c.as_slice()[0].terrain.as_ref().unwrap()[0], 1);
    }
}
