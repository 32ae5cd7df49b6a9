//! `assign-room-types`: picks the entrance (the first placed room) and the
//! exit (the room farthest from it by room-graph hops), then assigns the
//! remaining rooms a semantic type from a weighted distribution.

use dg_core::{Context, Pass, PassCounts, ProcgenError, RoomType};

use crate::room_graph::RoomGraph;
use crate::state::DungeonState;

/// Weighted pool of non-terminal room types. Treasure/boss/library/armory
/// are rarer flavors layered over a majority of plain `Normal` rooms.
const TYPE_WEIGHTS: &[(RoomType, u32)] = &[
    (RoomType::Normal, 60),
    (RoomType::Treasure, 15),
    (RoomType::Library, 8),
    (RoomType::Armory, 8),
    (RoomType::Boss, 9),
];

fn weighted_pick(rng: &mut impl rand::Rng) -> RoomType {
    let total: u32 = TYPE_WEIGHTS.iter().map(|&(_, w)| w).sum();
    let mut roll = rng.gen_range(0..total);
    for &(ty, w) in TYPE_WEIGHTS {
        if roll < w {
            return ty;
        }
        roll -= w;
    }
    RoomType::Normal
}

pub struct AssignRoomTypes;

impl Pass<DungeonState, DungeonState> for AssignRoomTypes {
    fn id(&self) -> &'static str {
        "assign-room-types"
    }

    fn run(&self, mut state: DungeonState, ctx: &mut Context) -> Result<DungeonState, ProcgenError> {
        if state.rooms.is_empty() {
            return Ok(state);
        }

        let entrance_id = state.rooms[0].id;
        let graph = RoomGraph::from_connections(state.rooms.iter().map(|r| r.id), &state.connections);
        let exit_id = graph.farthest_from(entrance_id).map(|(id, _)| id).unwrap_or(entrance_id);

        for room in &mut state.rooms {
            room.room_type = if room.id == entrance_id {
                RoomType::Entrance
            } else if room.id == exit_id {
                RoomType::Exit
            } else {
                weighted_pick(ctx.rng.rooms())
            };
        }

        // Only one boss room makes sense; demote extras back to normal,
        // keeping the first (by room id, i.e. placement order) as the boss.
        let mut seen_boss = false;
        for room in &mut state.rooms {
            if room.room_type == RoomType::Boss {
                if seen_boss {
                    room.room_type = RoomType::Normal;
                } else {
                    seen_boss = true;
                }
            }
        }

        Ok(state)
    }

    fn metrics(&self, output: &DungeonState) -> PassCounts {
        PassCounts {
            rooms: output.rooms.len(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dg_core::{GenerationConfig, NoopCollector, Room};
    use dg_grid::Rect;

    fn room(id: u32) -> Room {
        Room {
            id,
            rect: Rect::new(0, 0, 4, 4),
            room_type: RoomType::Normal,
            seed: 0,
            template: None,
            traits: Default::default(),
        }
    }

    #[test]
    fn first_room_is_entrance_farthest_is_exit() {
        let cfg = GenerationConfig::default();
        let mut trace = NoopCollector;
        let mut ctx = Context::new(&cfg, &mut trace);
        let mut state = DungeonState::new(cfg.width, cfg.height, cfg.seed);
        state.rooms = vec![room(0), room(1), room(2)];
        state.connections = vec![
            dg_core::Connection::new(0, 1, dg_core::CorridorStyle::LShaped),
            dg_core::Connection::new(1, 2, dg_core::CorridorStyle::LShaped),
        ];
        let state = AssignRoomTypes.run(state, &mut ctx).unwrap();
        assert_eq!(state.rooms[0].room_type, RoomType::Entrance);
        assert_eq!(state.rooms[2].room_type, RoomType::Exit);
    }

    #[test]
    fn at_most_one_boss_room() {
        let cfg = GenerationConfig::default();
        let mut trace = NoopCollector;
        let mut ctx = Context::new(&cfg, &mut trace);
        let mut state = DungeonState::new(cfg.width, cfg.height, cfg.seed);
        state.rooms = (0..20).map(room).collect();
        let mut conns = Vec::new();
        for i in 1..20 {
            conns.push(dg_core::Connection::new(i - 1, i, dg_core::CorridorStyle::LShaped));
        }
        state.connections = conns;
        let state = AssignRoomTypes.run(state, &mut ctx).unwrap();
        assert!(state.rooms.iter().filter(|r| r.room_type == RoomType::Boss).count() <= 1);
    }
}
