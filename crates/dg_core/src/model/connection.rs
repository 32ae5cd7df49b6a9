//! `Connection`: an edge between two rooms, lazily carrying its carved
//! corridor path. Connections are symmetric in meaning (either endpoint can
//! be read as "the other room is reachable from here") but stored as an
//! ordered pair, matching the order the connectivity pass discovered them.

use serde::{Deserialize, Serialize};

use dg_grid::Point;

use crate::model::room::RoomId;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorridorStyle {
    LShaped,
    Straight,
    AStar,
    Branching,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub from: RoomId,
    pub to: RoomId,
    /// Carved path cells, in order from `from`'s edge to `to`'s edge.
    /// Empty until the carve-corridors pass runs.
    pub path: Vec<Point>,
    pub style: CorridorStyle,
}

impl Connection {
    pub fn new(from: RoomId, to: RoomId, style: CorridorStyle) -> Self {
        Self {
            from,
            to,
            path: Vec::new(),
            style,
        }
    }

    /// Whether this connection links the same unordered pair of rooms as
    /// `other`, regardless of direction.
    pub fn same_pair(&self, other: &Connection) -> bool {
        (self.from == other.from && self.to == other.to) || (self.from == other.to && self.to == other.from)
    }
}
