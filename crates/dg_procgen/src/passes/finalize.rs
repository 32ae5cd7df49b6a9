//! `finalize`: the boundary pass from the working `DungeonState` artifact
//! to the terminal, serializable `Dungeon`. Revalidates every spawn against
//! the final terrain (a BSP/hybrid room's carved rect is always floor at its
//! centroid, but a cellular region's bounding-box centroid frequently isn't)
//! and computes the content checksum over the repaired result.

use dg_core::{compute_checksum, Context, Dungeon, Pass, PassCounts, ProcgenError};

use crate::spawn_validation::{revalidate_spawns, DEFAULT_SPAWN_REVALIDATION_RADIUS};
use crate::state::DungeonState;

pub struct Finalize;

impl Pass<DungeonState, Dungeon> for Finalize {
    fn id(&self) -> &'static str {
        "finalize"
    }

    fn run(&self, state: DungeonState, ctx: &mut Context) -> Result<Dungeon, ProcgenError> {
        let terrain = state.grid.cells().to_vec();
        let mut dungeon = Dungeon {
            width: state.width(),
            height: state.height(),
            terrain,
            rooms: state.rooms,
            connections: state.connections,
            spawns: state.spawns,
            seed: state.seed,
            checksum: String::new(),
        };

        let report = revalidate_spawns(&mut dungeon, DEFAULT_SPAWN_REVALIDATION_RADIUS);
        if report.relocated > 0 || report.dropped > 0 {
            ctx.trace.warning(
                self.id(),
                ctx.now_ms(),
                &format!("spawn revalidation relocated {} and dropped {}", report.relocated, report.dropped),
            );
        }

        dungeon.checksum = compute_checksum(&dungeon.terrain, &dungeon.rooms, &dungeon.connections, &dungeon.spawns);
        Ok(dungeon)
    }

    fn metrics(&self, output: &Dungeon) -> PassCounts {
        let total = (output.width as u64 * output.height as u64).max(1);
        let floor = output.terrain.iter().filter(|&&c| c == dg_core::TileKind::Floor.to_byte() || c == dg_core::TileKind::Door.to_byte()).count() as u64;
        PassCounts {
            rooms: output.rooms.len(),
            connections: output.connections.len(),
            spawns: output.spawns.len(),
            floor_ratio: floor as f32 / total as f32,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dg_core::{GenerationConfig, NoopCollector};

    #[test]
    fn finalize_produces_a_stable_checksum() {
        let cfg = GenerationConfig::default();
        let mut trace = NoopCollector;
        let mut ctx = Context::new(&cfg, &mut trace);
        let state = DungeonState::new(cfg.width, cfg.height, cfg.seed);
        let a = Finalize.run(state.clone(), &mut ctx).unwrap();
        let b = Finalize.run(state, &mut ctx).unwrap();
        assert_eq!(a.checksum, b.checksum);
    }
}
