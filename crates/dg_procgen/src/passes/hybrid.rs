//! The hybrid generator: splits the map into a handful of zones, dispatches
//! each zone to BSP or cellular generation independently, then stitches
//! adjacent zones together with a corridor between their nearest rooms.

use rand::Rng;

use dg_core::{Context, Pass, PassCounts, ProcgenError, Room, RoomType, TileKind};
use dg_grid::{find_regions, Connectivity, Rect};

use crate::state::DungeonState;

use super::bsp::split as bsp_split;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZoneKind {
    Bsp,
    Cellular,
}

/// Splits the full grid into a 2x2 arrangement of zones. Odd dimensions
/// give the extra row/column to the second half.
fn split_zones(width: u32, height: u32) -> Vec<Rect> {
    let half_w = width / 2;
    let half_h = height / 2;
    vec![
        Rect::new(0, 0, half_w, half_h),
        Rect::new(half_w as i32, 0, width - half_w, half_h),
        Rect::new(0, half_h as i32, half_w, height - half_h),
        Rect::new(half_w as i32, half_h as i32, width - half_w, height - half_h),
    ]
}

pub struct HybridGenerate;

impl Pass<DungeonState, DungeonState> for HybridGenerate {
    fn id(&self) -> &'static str {
        "hybrid-zones"
    }

    fn run(&self, mut state: DungeonState, ctx: &mut Context) -> Result<DungeonState, ProcgenError> {
        let zones = split_zones(state.width(), state.height());

        for zone in &zones {
            if zone.width == 0 || zone.height == 0 {
                continue;
            }
            let kind = if ctx.rng.layout().gen::<f32>() < 0.5 { ZoneKind::Bsp } else { ZoneKind::Cellular };
            match kind {
                ZoneKind::Bsp => generate_bsp_zone(&mut state, *zone, ctx),
                ZoneKind::Cellular => generate_cellular_zone(&mut state, *zone, ctx),
            }
        }

        stitch_zones(&mut state, &zones, ctx);

        Ok(state)
    }

    fn metrics(&self, output: &DungeonState) -> PassCounts {
        PassCounts {
            rooms: output.rooms.len(),
            connections: output.connections.len(),
            floor_ratio: output.floor_ratio(),
            ..Default::default()
        }
    }
}

fn generate_bsp_zone(state: &mut DungeonState, zone: Rect, ctx: &mut Context) {
    let mut leaves = Vec::new();
    bsp_split(zone, 0, ctx, &mut leaves);

    let bsp = ctx.config.bsp;
    for leaf in leaves {
        let roll: f32 = ctx.rng.rooms().gen();
        if roll > bsp.room_placement_chance {
            continue;
        }
        let max_w = (leaf.width.saturating_sub(2 * bsp.room_padding)).min(bsp.max_room_size);
        let max_h = (leaf.height.saturating_sub(2 * bsp.room_padding)).min(bsp.max_room_size);
        if max_w < bsp.min_room_size || max_h < bsp.min_room_size {
            continue;
        }
        let room_w = ctx.rng.rooms().gen_range(bsp.min_room_size..=max_w);
        let room_h = ctx.rng.rooms().gen_range(bsp.min_room_size..=max_h);
        let slack_x = leaf.width - 2 * bsp.room_padding - room_w;
        let slack_y = leaf.height - 2 * bsp.room_padding - room_h;
        let offset_x = if slack_x > 0 { ctx.rng.rooms().gen_range(0..=slack_x) } else { 0 };
        let offset_y = if slack_y > 0 { ctx.rng.rooms().gen_range(0..=slack_y) } else { 0 };
        let rect = Rect::new(
            leaf.x + bsp.room_padding as i32 + offset_x as i32,
            leaf.y + bsp.room_padding as i32 + offset_y as i32,
            room_w,
            room_h,
        );
        state.grid.fill_rect(rect, TileKind::Floor.to_byte());
        let id = state.alloc_room_id();
        let room_seed = ctx.rng.rooms().gen();
        state.rooms.push(Room {
            id,
            rect,
            room_type: RoomType::Normal,
            seed: room_seed,
            template: None,
            traits: Default::default(),
        });
    }
}

fn generate_cellular_zone(state: &mut DungeonState, zone: Rect, ctx: &mut Context) {
    let cfg = ctx.config.cellular;

    for y in zone.top()..zone.bottom() {
        for x in zone.left()..zone.right() {
            let roll: f32 = ctx.rng.layout().gen();
            let value = if roll < cfg.initial_fill_ratio { TileKind::Wall } else { TileKind::Floor };
            state.grid.set_unsafe(x, y, value.to_byte());
        }
    }

    for _ in 0..cfg.iterations {
        let snapshot = state.grid.clone();
        for y in zone.top()..zone.bottom() {
            for x in zone.left()..zone.right() {
                let alive = snapshot.count_neighbors8(x, y, TileKind::Wall.to_byte());
                let was_wall = snapshot.get(x, y) == TileKind::Wall.to_byte();
                let next_wall = if was_wall { alive >= cfg.death_limit } else { alive > cfg.birth_limit };
                state.grid.set_unsafe(x, y, if next_wall { TileKind::Wall.to_byte() } else { TileKind::Floor.to_byte() });
            }
        }
    }

    let zone_grid = extract_zone_grid(&state.grid, zone);
    let mut regions = find_regions(&zone_grid, TileKind::Floor.to_byte(), Connectivity::Four, usize::MAX);
    regions.retain(|r| r.cells.len() as u32 >= cfg.min_region_size);
    regions.sort_by_key(|r| std::cmp::Reverse(r.cells.len()));

    for region in regions {
        let bbox = Rect::new(region.bounding_box.x + zone.x, region.bounding_box.y + zone.y, region.bounding_box.width, region.bounding_box.height);
        let id = state.alloc_room_id();
        let room_seed = ctx.rng.rooms().gen();
        state.rooms.push(Room {
            id,
            rect: bbox,
            room_type: RoomType::Cavern,
            seed: room_seed,
            template: None,
            traits: Default::default(),
        });
    }
}

/// Copies a zone's cells out into a zero-origin grid so region extraction
/// (which reports bounding boxes relative to its input) can run on it in
/// isolation from the rest of the map.
fn extract_zone_grid(grid: &dg_grid::Grid, zone: Rect) -> dg_grid::Grid {
    let mut out = dg_grid::Grid::new(zone.width, zone.height, TileKind::Wall.to_byte());
    for y in 0..zone.height as i32 {
        for x in 0..zone.width as i32 {
            out.set_unsafe(x, y, grid.get(zone.x + x, zone.y + y));
        }
    }
    out
}

/// Connects each zone to its right and bottom neighbor (if any) by an
/// L-shaped corridor between the nearest pair of rooms straddling the
/// shared edge, so the four independently generated zones form one
/// connected dungeon.
fn stitch_zones(state: &mut DungeonState, zones: &[Rect], ctx: &mut Context) {
    let pairs: &[(usize, usize)] = &[(0, 1), (0, 2), (1, 3), (2, 3)];
    for &(a, b) in pairs {
        if a >= zones.len() || b >= zones.len() {
            continue;
        }
        let rooms_a: Vec<_> = state.rooms.iter().filter(|r| zones[a].contains(r.centroid())).cloned().collect();
        let rooms_b: Vec<_> = state.rooms.iter().filter(|r| zones[b].contains(r.centroid())).cloned().collect();
        let Some((room_a, room_b)) = nearest_pair(&rooms_a, &rooms_b) else { continue };

        let style_roll: f32 = ctx.rng.connections().gen();
        let style = crate::connectivity::choose_style(style_roll);
        let conn = dg_core::Connection::new(room_a.id, room_b.id, style);
        state.connections.push(conn);
    }
}

fn nearest_pair(a: &[Room], b: &[Room]) -> Option<(Room, Room)> {
    let mut best: Option<(Room, Room, u32)> = None;
    for ra in a {
        for rb in b {
            let d = ra.centroid().manhattan_distance(rb.centroid());
            if best.as_ref().map(|(_, _, bd)| d < *bd).unwrap_or(true) {
                best = Some((ra.clone(), rb.clone(), d));
            }
        }
    }
    best.map(|(ra, rb, _)| (ra, rb))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dg_core::{GenerationConfig, NoopCollector};

    #[test]
    fn hybrid_zones_produce_rooms_in_every_quadrant_on_average() {
        let mut cfg = GenerationConfig::default();
        cfg.algorithm = dg_core::Algorithm::Hybrid;
        cfg.bsp.room_placement_chance = 1.0;
        let mut trace = NoopCollector;
        let mut ctx = Context::new(&cfg, &mut trace);
        let state = DungeonState::new(cfg.width, cfg.height, cfg.seed);
        let state = HybridGenerate.run(state, &mut ctx).unwrap();
        assert!(!state.rooms.is_empty());
    }

    #[test]
    fn zone_split_covers_the_full_grid_without_gaps() {
        let zones = split_zones(61, 41);
        let total: u32 = zones.iter().map(|z| z.width * z.height).sum();
        assert_eq!(total, 61 * 41);
    }
}
