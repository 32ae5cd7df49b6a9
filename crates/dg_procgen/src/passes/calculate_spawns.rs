//! `calculate-spawns`: turns rooms into concrete spawn descriptors the ECS
//! bridge can instantiate from - entrance/exit markers plus density-driven
//! content spawns, each tagged with its room-graph hop distance from the
//! entrance for downstream difficulty scaling.

use rand::Rng;

use dg_core::{bernoulli, Context, Pass, PassCounts, ProcgenError, RoomType, SpawnDescriptor, SpawnKind};

use crate::room_graph::RoomGraph;
use crate::state::DungeonState;

pub struct CalculateSpawns;

impl Pass<DungeonState, DungeonState> for CalculateSpawns {
    fn id(&self) -> &'static str {
        "calculate-spawns"
    }

    fn run(&self, mut state: DungeonState, ctx: &mut Context) -> Result<DungeonState, ProcgenError> {
        let entrance = state.rooms.iter().find(|r| r.room_type == RoomType::Entrance).map(|r| r.id);

        let graph = RoomGraph::from_connections(state.rooms.iter().map(|r| r.id), &state.connections);
        let distances = entrance.map(|e| graph.bfs_distances(e)).unwrap_or_default();

        let content = ctx.config.content;
        let mut spawns = Vec::new();

        for room in &state.rooms {
            let hop_distance = distances.get(&room.id).copied().unwrap_or(0);

            match room.room_type {
                RoomType::Entrance => {
                    spawns.push(SpawnDescriptor {
                        position: room.centroid(),
                        room: room.id,
                        kind: SpawnKind::Entrance,
                        tags: Default::default(),
                        weight: 1.0,
                        hop_distance,
                    });
                    continue;
                }
                RoomType::Exit => {
                    spawns.push(SpawnDescriptor {
                        position: room.centroid(),
                        room: room.id,
                        kind: SpawnKind::Exit,
                        tags: Default::default(),
                        weight: 1.0,
                        hop_distance,
                    });
                    continue;
                }
                _ => {}
            }

            if bernoulli(ctx.rng.details(), content.enemy_density as f64) {
                let mut tags = std::collections::BTreeSet::new();
                tags.insert("enemy".to_string());
                if room.room_type == RoomType::Boss {
                    tags.insert("role:boss".to_string());
                }
                spawns.push(SpawnDescriptor {
                    position: room.centroid(),
                    room: room.id,
                    kind: SpawnKind::Spawn,
                    tags,
                    weight: ctx.rng.details().gen_range(0.5..1.5),
                    hop_distance,
                });
            }

            if matches!(room.room_type, RoomType::Treasure | RoomType::Boss) || bernoulli(ctx.rng.details(), content.treasure_ratio as f64) {
                let mut tags = std::collections::BTreeSet::new();
                tags.insert("treasure".to_string());
                spawns.push(SpawnDescriptor {
                    position: room.centroid(),
                    room: room.id,
                    kind: SpawnKind::Spawn,
                    tags,
                    weight: 1.0,
                    hop_distance,
                });
            }

            if bernoulli(ctx.rng.details(), content.decoration_density as f64) {
                let mut tags = std::collections::BTreeSet::new();
                tags.insert("decoration".to_string());
                spawns.push(SpawnDescriptor {
                    position: room.centroid(),
                    room: room.id,
                    kind: SpawnKind::Spawn,
                    tags,
                    weight: 1.0,
                    hop_distance,
                });
            }
        }

        state.spawns = spawns;
        Ok(state)
    }

    fn metrics(&self, output: &DungeonState) -> PassCounts {
        PassCounts {
            rooms: output.rooms.len(),
            connections: output.connections.len(),
            spawns: output.spawns.len(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dg_core::{GenerationConfig, NoopCollector, Room};
    use dg_grid::Rect;

    fn room(id: u32, room_type: RoomType) -> Room {
        Room {
            id,
            rect: Rect::new(0, 0, 4, 4),
            room_type,
            seed: 0,
            template: None,
            traits: Default::default(),
        }
    }

    #[test]
    fn entrance_and_exit_always_get_a_spawn_marker() {
        let cfg = GenerationConfig::default();
        let mut trace = NoopCollector;
        let mut ctx = Context::new(&cfg, &mut trace);
        let mut state = DungeonState::new(cfg.width, cfg.height, cfg.seed);
        state.rooms = vec![room(0, RoomType::Entrance), room(1, RoomType::Exit)];
        let state = CalculateSpawns.run(state, &mut ctx).unwrap();
        assert!(state.spawns.iter().any(|s| s.kind == SpawnKind::Entrance));
        assert!(state.spawns.iter().any(|s| s.kind == SpawnKind::Exit));
    }

    #[test]
    fn treasure_rooms_always_spawn_treasure() {
        let mut cfg = GenerationConfig::default();
        cfg.content.treasure_ratio = 0.0;
        let mut trace = NoopCollector;
        let mut ctx = Context::new(&cfg, &mut trace);
        let mut state = DungeonState::new(cfg.width, cfg.height, cfg.seed);
        state.rooms = vec![room(0, RoomType::Treasure)];
        let state = CalculateSpawns.run(state, &mut ctx).unwrap();
        assert!(state.spawns.iter().any(|s| s.has_tag("treasure")));
    }
}
