//! The cellular-automata generator: noise-fill, iterated birth/death
//! smoothing, then region extraction into induced rooms.

use rand::Rng;

use dg_core::{Context, Pass, PassCounts, ProcgenError, Room, RoomType, TileKind};
use dg_grid::{find_regions, Connectivity};

use crate::state::DungeonState;

pub struct CellularFill;

impl Pass<DungeonState, DungeonState> for CellularFill {
    fn id(&self) -> &'static str {
        "cellular-fill"
    }

    fn run(&self, mut state: DungeonState, ctx: &mut Context) -> Result<DungeonState, ProcgenError> {
        let ratio = ctx.config.cellular.initial_fill_ratio;
        let (w, h) = (state.width() as i32, state.height() as i32);
        for y in 0..h {
            for x in 0..w {
                let roll: f32 = ctx.rng.layout().gen();
                let value = if roll < ratio { TileKind::Wall } else { TileKind::Floor };
                state.grid.set_unsafe(x, y, value.to_byte());
            }
        }
        Ok(state)
    }

    fn metrics(&self, output: &DungeonState) -> PassCounts {
        PassCounts {
            floor_ratio: output.floor_ratio(),
            ..Default::default()
        }
    }
}

pub struct CellularSmooth;

impl Pass<DungeonState, DungeonState> for CellularSmooth {
    fn id(&self) -> &'static str {
        "cellular-smooth"
    }

    fn run(&self, mut state: DungeonState, ctx: &mut Context) -> Result<DungeonState, ProcgenError> {
        let cfg = ctx.config.cellular;
        for _ in 0..cfg.iterations {
            state.grid = state.grid.cellular_step(
                TileKind::Wall.to_byte(),
                TileKind::Floor.to_byte(),
                cfg.birth_limit,
                cfg.death_limit,
            );
        }
        Ok(state)
    }

    fn metrics(&self, output: &DungeonState) -> PassCounts {
        PassCounts {
            floor_ratio: output.floor_ratio(),
            ..Default::default()
        }
    }

    fn snapshot_terrain(&self, output: &DungeonState) -> Option<Vec<u8>> {
        Some(output.grid.cells().to_vec())
    }
}

/// Extracts connected floor regions as induced rooms (bounding box +
/// centroid). When `connect_all_regions` is false and more than one region
/// survives, only the largest is kept as floor - the rest revert to wall -
/// per the redesign note that the entrance-reachability invariant always
/// wins over the source's "leave isolated pockets" behavior.
pub struct CellularExtractRegions;

impl Pass<DungeonState, DungeonState> for CellularExtractRegions {
    fn id(&self) -> &'static str {
        "cellular-extract-regions"
    }

    fn run(&self, mut state: DungeonState, ctx: &mut Context) -> Result<DungeonState, ProcgenError> {
        let cfg = ctx.config.cellular;
        let mut regions = find_regions(&state.grid, TileKind::Floor.to_byte(), Connectivity::Four, usize::MAX);
        regions.retain(|r| r.cells.len() as u32 >= cfg.min_region_size);
        regions.sort_by_key(|r| std::cmp::Reverse(r.cells.len()));

        if regions.is_empty() {
            ctx.trace.warning(self.id(), ctx.now_ms(), "cellular fill produced no region above min_region_size");
            return Ok(state);
        }

        if !cfg.connect_all_regions {
            // Keep only the largest region as floor; wall off the rest so
            // the connectivity pass never has to reach them.
            for region in regions.iter().skip(1) {
                for cell in &region.cells {
                    state.grid.set_unsafe(cell.x, cell.y, TileKind::Wall.to_byte());
                }
            }
            regions.truncate(1);
        }

        for region in &regions {
            let id = state.alloc_room_id();
            let room_seed = ctx.rng.rooms().gen();
            state.rooms.push(Room {
                id,
                rect: region.bounding_box,
                room_type: RoomType::Cavern,
                seed: room_seed,
                template: None,
                traits: Default::default(),
            });
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use dg_core::{GenerationConfig, NoopCollector};

    #[test]
    fn fill_smooth_extract_pipeline_produces_at_least_one_room() {
        let mut cfg = GenerationConfig::default();
        cfg.algorithm = dg_core::Algorithm::Cellular;
        cfg.cellular.min_region_size = 4;
        let mut trace = NoopCollector;
        let mut ctx = Context::new(&cfg, &mut trace);
        let state = DungeonState::new(cfg.width, cfg.height, cfg.seed);
        let state = CellularFill.run(state, &mut ctx).unwrap();
        let state = CellularSmooth.run(state, &mut ctx).unwrap();
        let state = CellularExtractRegions.run(state, &mut ctx).unwrap();
        assert!(!state.rooms.is_empty());
    }

    #[test]
    fn connect_all_regions_false_walls_off_all_but_the_largest() {
        let mut cfg = GenerationConfig::default();
        cfg.cellular.connect_all_regions = false;
        cfg.cellular.min_region_size = 1;
        let mut trace = NoopCollector;
        let mut ctx = Context::new(&cfg, &mut trace);
        let mut state = DungeonState::new(20, 20, cfg.seed);
        // Two disjoint floor blobs.
        state.grid.fill_rect(dg_grid::Rect::new(1, 1, 3, 3), TileKind::Floor.to_byte());
        state.grid.fill_rect(dg_grid::Rect::new(10, 10, 5, 5), TileKind::Floor.to_byte());
        let state = CellularExtractRegions.run(state, &mut ctx).unwrap();
        assert_eq!(state.rooms.len(), 1);
        assert_eq!(state.rooms[0].room_type, RoomType::Cavern);
    }
}
