//! `DungeonState`: the mutable-looking (but value-typed, pass-owned)
//! artifact that flows between every pass except the first and last. It
//! wraps the working terrain grid plus the rooms/connections/spawns
//! accumulated so far.

use dg_core::{Room, RoomId, SeedBundle, TileKind};
use dg_grid::{Grid, Rect};

use dg_core::{Connection, SpawnDescriptor};

/// The artifact type before `initialize_state` has run - a placeholder so
/// the pipeline's first stage has something to consume.
#[derive(Debug, Clone, Copy, Default)]
pub struct Empty;

#[derive(Debug, Clone)]
pub struct DungeonState {
    pub grid: Grid,
    pub rooms: Vec<Room>,
    pub connections: Vec<Connection>,
    pub spawns: Vec<SpawnDescriptor>,
    pub seed: SeedBundle,
    next_room_id: RoomId,
    /// Leaf rectangles produced by `partition_bsp`, consumed and cleared by
    /// `place_rooms`. Empty for any generator that doesn't partition (e.g.
    /// pure cellular), and empty again once rooms are placed.
    pub bsp_leaves: Vec<Rect>,
}

impl DungeonState {
    pub fn new(width: u32, height: u32, seed: SeedBundle) -> Self {
        Self {
            grid: Grid::new(width, height, TileKind::Wall.to_byte()),
            rooms: Vec::new(),
            connections: Vec::new(),
            spawns: Vec::new(),
            seed,
            next_room_id: 0,
            bsp_leaves: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.grid.width()
    }

    pub fn height(&self) -> u32 {
        self.grid.height()
    }

    pub fn alloc_room_id(&mut self) -> RoomId {
        let id = self.next_room_id;
        self.next_room_id += 1;
        id
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == id)
    }

    pub fn floor_ratio(&self) -> f32 {
        let total = (self.grid.width() as u64 * self.grid.height() as u64).max(1);
        let floor = self.grid.cells().iter().filter(|&&c| c == TileKind::Floor.to_byte() || c == TileKind::Door.to_byte()).count() as u64;
        floor as f32 / total as f32
    }
}
