//! Tile kinds: the byte alphabet a `dg_grid::Grid` carries during generation
//! and the `Dungeon`'s terminal terrain array.

use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TileKind {
    Wall = 0,
    Floor = 1,
    Door = 2,
    Water = 3,
    Lava = 4,
}

impl TileKind {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            1 => TileKind::Floor,
            2 => TileKind::Door,
            3 => TileKind::Water,
            4 => TileKind::Lava,
            _ => TileKind::Wall,
        }
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }

    pub fn is_walkable(self) -> bool {
        matches!(self, TileKind::Floor | TileKind::Door)
    }
}

impl Default for TileKind {
    fn default() -> Self {
        TileKind::Wall
    }
}
