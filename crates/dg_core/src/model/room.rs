//! `Room`: a placed area of the dungeon, with a semantic type that later
//! drives enrichment (which enemy/loot templates apply) and an optional
//! trait vector used to nudge per-room difficulty/flavor scoring.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use dg_grid::{Point, Rect};

pub type RoomId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomType {
    Entrance,
    Exit,
    Normal,
    Treasure,
    Boss,
    Cavern,
    Library,
    Armory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub rect: Rect,
    pub room_type: RoomType,
    /// Sub-seed for this room's own local decisions (derived from the
    /// `rooms` stream, not the primary seed), so re-running just the
    /// enrichment stage on a cached dungeon stays deterministic per room.
    pub seed: u64,
    /// Non-rectangular layout reference (a named template from a shape
    /// library); `None` means a plain rectangle.
    pub template: Option<String>,
    /// Named scalar modifiers in [0,1], e.g. `{"danger": 0.7}`.
    pub traits: BTreeMap<String, f32>,
}

impl Room {
    pub fn centroid(&self) -> Point {
        self.rect.centroid()
    }
}
