//! `carve-rooms`: stamps each room's rectangle into the terrain grid as
//! floor. Runs after room types are assigned so overrides (e.g. a future
//! door-lined vault) could key off `room_type`, though none do yet.

use dg_core::{Context, Pass, PassCounts, ProcgenError, TileKind};

use crate::state::DungeonState;

pub struct CarveRooms;

impl Pass<DungeonState, DungeonState> for CarveRooms {
    fn id(&self) -> &'static str {
        "carve-rooms"
    }

    fn run(&self, mut state: DungeonState, _ctx: &mut Context) -> Result<DungeonState, ProcgenError> {
        for room in &state.rooms {
            state.grid.fill_rect(room.rect, TileKind::Floor.to_byte());
        }
        Ok(state)
    }

    fn metrics(&self, output: &DungeonState) -> PassCounts {
        PassCounts {
            rooms: output.rooms.len(),
            floor_ratio: output.floor_ratio(),
            ..Default::default()
        }
    }

    fn snapshot_terrain(&self, output: &DungeonState) -> Option<Vec<u8>> {
        Some(output.grid.cells().to_vec())
    }
}
