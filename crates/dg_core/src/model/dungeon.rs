//! `Dungeon`: the terminal artifact of the generation pipeline. Everything
//! downstream (the ECS bridge, the HTTP/API layer, visual renderers) reads
//! this and nothing earlier in the pipeline.

use serde::{Deserialize, Serialize};

use crate::model::connection::Connection;
use crate::model::room::Room;
use crate::model::spawn::SpawnDescriptor;
use crate::seed::SeedBundle;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dungeon {
    pub width: u32,
    pub height: u32,
    /// Row-major flat tile array, length `width * height`. Values are
    /// `TileKind::to_byte()`.
    pub terrain: Vec<u8>,
    pub rooms: Vec<Room>,
    pub connections: Vec<Connection>,
    pub spawns: Vec<SpawnDescriptor>,
    pub seed: SeedBundle,
    /// Hex-encoded 128-bit hash of the canonical serialization (see
    /// [`compute_checksum`]). Recomputed by `finalize`, not authored by
    /// earlier passes.
    pub checksum: String,
}

impl Dungeon {
    pub fn tile_at(&self, x: i32, y: i32) -> u8 {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return 0; // wall
        }
        self.terrain[y as usize * self.width as usize + x as usize]
    }

    pub fn room(&self, id: u32) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == id)
    }
}

/// A pure function of the final terrain, rooms, connections, and spawns -
/// ordered canonically (rooms/connections/spawns are already stored in
/// generation order, which is itself deterministic per seed) - into a
/// stable hex string. Uses a 128-bit FNV-1a variant: simple, dependency-free,
/// and adequate since this is a content fingerprint, not a security hash.
pub fn compute_checksum(terrain: &[u8], rooms: &[Room], connections: &[Connection], spawns: &[SpawnDescriptor]) -> String {
    let mut hash: u128 = 0x6c62272e07bb014262b821756295c58d;
    const PRIME: u128 = 0x0000000001000000000000000000013B;

    let mut feed = |bytes: &[u8]| {
        for &b in bytes {
            hash ^= b as u128;
            hash = hash.wrapping_mul(PRIME);
        }
    };

    feed(terrain);
    for room in rooms {
        feed(&room.id.to_le_bytes());
        feed(&room.rect.x.to_le_bytes());
        feed(&room.rect.y.to_le_bytes());
        feed(&room.rect.width.to_le_bytes());
        feed(&room.rect.height.to_le_bytes());
    }
    for conn in connections {
        feed(&conn.from.to_le_bytes());
        feed(&conn.to.to_le_bytes());
        for p in &conn.path {
            feed(&p.x.to_le_bytes());
            feed(&p.y.to_le_bytes());
        }
    }
    for spawn in spawns {
        feed(&spawn.position.x.to_le_bytes());
        feed(&spawn.position.y.to_le_bytes());
        feed(&spawn.room.to_le_bytes());
    }

    format!("{hash:032x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_is_pure_and_deterministic() {
        let terrain = vec![1u8, 0, 1, 1];
        let a = compute_checksum(&terrain, &[], &[], &[]);
        let b = compute_checksum(&terrain, &[], &[], &[]);
        assert_eq!(a, b);
    }

    #[test]
    fn checksum_changes_with_terrain() {
        let a = compute_checksum(&[1, 0], &[], &[], &[]);
        let b = compute_checksum(&[0, 1], &[], &[], &[]);
        assert_ne!(a, b);
    }
}
