//! `SpawnDescriptor`: a position plus tags telling the ECS bridge what to
//! instantiate there. Procgen guarantees positions are on floor tiles;
//! the game layer owns the meaning of `tags`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use dg_grid::Point;

use crate::model::room::RoomId;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnKind {
    Entrance,
    Exit,
    Spawn,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnDescriptor {
    pub position: Point,
    pub room: RoomId,
    pub kind: SpawnKind,
    pub tags: BTreeSet<String>,
    pub weight: f32,
    /// Room-graph hop distance from the entrance room, filled in by
    /// `calculate_spawns` and consumed by semantic enrichment for
    /// difficulty scaling.
    pub hop_distance: u32,
}

impl SpawnDescriptor {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// The value of a `key:value` style tag, e.g. `role:guardian` -> `Some("guardian")`.
    pub fn tag_value(&self, key: &str) -> Option<&str> {
        let prefix = format!("{key}:");
        self.tags
            .iter()
            .find_map(|t| t.strip_prefix(prefix.as_str()))
    }
}
