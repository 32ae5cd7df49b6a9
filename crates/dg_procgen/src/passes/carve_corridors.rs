//! `carve-corridors`: turns each `Connection`'s abstract room pair into an
//! actual path of floor tiles, in one of four styles, and records the path
//! back onto the connection for later crossing detection.

use std::collections::BinaryHeap;

use rand::Rng;

use dg_core::{Context, CorridorStyle, Pass, PassCounts, ProcgenError, TileKind};
use dg_grid::Point;

use crate::state::DungeonState;

pub struct CarveCorridors;

impl Pass<DungeonState, DungeonState> for CarveCorridors {
    fn id(&self) -> &'static str {
        "carve-corridors"
    }

    fn run(&self, mut state: DungeonState, ctx: &mut Context) -> Result<DungeonState, ProcgenError> {
        let width = ctx.config.bsp.corridor_width;
        let (grid_w, grid_h) = (state.width() as i32, state.height() as i32);

        for i in 0..state.connections.len() {
            let (from, to, style) = {
                let conn = &state.connections[i];
                (conn.from, conn.to, conn.style)
            };
            let Some(from_room) = state.room(from) else { continue };
            let Some(to_room) = state.room(to) else { continue };
            let start = from_room.centroid();
            let end = to_room.centroid();

            let path = match style {
                CorridorStyle::LShaped => l_shaped_path(start, end, ctx.rng.connections()),
                CorridorStyle::Straight => bresenham_path(start, end),
                CorridorStyle::AStar => astar_path(&state, start, end).unwrap_or_else(|| l_shaped_path(start, end, ctx.rng.connections())),
                CorridorStyle::Branching => {
                    let mut path = l_shaped_path(start, end, ctx.rng.connections());
                    add_branches(&mut path, &state, ctx, grid_w, grid_h);
                    path
                }
            };

            for p in &path {
                stamp(&mut state.grid, *p, width, grid_w, grid_h);
            }

            state.connections[i].path = path;
        }

        Ok(state)
    }

    fn metrics(&self, output: &DungeonState) -> PassCounts {
        PassCounts {
            connections: output.connections.len(),
            floor_ratio: output.floor_ratio(),
            ..Default::default()
        }
    }

    fn snapshot_terrain(&self, output: &DungeonState) -> Option<Vec<u8>> {
        Some(output.grid.cells().to_vec())
    }
}

/// Stamps a `width`-wide floor blob centered on `p`, clipped to the grid.
fn stamp(grid: &mut dg_grid::Grid, p: Point, width: u32, grid_w: i32, grid_h: i32) {
    let half = (width as i32 - 1) / 2;
    for dy in -half..=half {
        for dx in -half..=half {
            let (x, y) = (p.x + dx, p.y + dy);
            if x >= 0 && y >= 0 && x < grid_w && y < grid_h {
                grid.set_unsafe(x, y, TileKind::Floor.to_byte());
            }
        }
    }
}

/// One turn: horizontal run then vertical run (or vice versa, chosen by a
/// coin flip so corridors don't all bend the same way).
fn l_shaped_path(start: Point, end: Point, rng: &mut impl rand::Rng) -> Vec<Point> {
    let mut path = Vec::new();
    let horizontal_first: bool = rng.gen();
    let corner = if horizontal_first { Point::new(end.x, start.y) } else { Point::new(start.x, end.y) };

    path.extend(straight_run(start, corner));
    path.extend(straight_run(corner, end));
    path
}

fn straight_run(a: Point, b: Point) -> Vec<Point> {
    let mut out = Vec::new();
    if a.x == b.x {
        let (lo, hi) = (a.y.min(b.y), a.y.max(b.y));
        for y in lo..=hi {
            out.push(Point::new(a.x, y));
        }
    } else if a.y == b.y {
        let (lo, hi) = (a.x.min(b.x), a.x.max(b.x));
        for x in lo..=hi {
            out.push(Point::new(x, a.y));
        }
    } else {
        out.push(a);
        out.push(b);
    }
    out
}

/// Bresenham's line, for the "straight" corridor style - cuts diagonally
/// through whatever stands in its way.
fn bresenham_path(start: Point, end: Point) -> Vec<Point> {
    let mut points = Vec::new();
    let (mut x0, mut y0) = (start.x, start.y);
    let (x1, y1) = (end.x, end.y);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        points.push(Point::new(x0, y0));
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
    points
}

const ASTAR_FLOOR_COST: u32 = 1;
const ASTAR_WALL_COST: u32 = 4;

/// Weighted A* over the 4-neighborhood: floor tiles are cheap to cross,
/// walls expensive but not forbidden, so the path prefers existing floor
/// but will still tunnel through rock when that's shorter overall.
fn astar_path(state: &DungeonState, start: Point, end: Point) -> Option<Vec<Point>> {
    use std::cmp::Ordering;

    #[derive(Eq, PartialEq)]
    struct Node {
        cost: u32,
        priority: u32,
        point: Point,
    }
    impl Ord for Node {
        fn cmp(&self, other: &Self) -> Ordering {
            other.priority.cmp(&self.priority)
        }
    }
    impl PartialOrd for Node {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }
    }

    let (w, h) = (state.width() as i32, state.height() as i32);
    let in_bounds = |p: Point| p.x >= 0 && p.y >= 0 && p.x < w && p.y < h;
    if !in_bounds(start) || !in_bounds(end) {
        return None;
    }

    let idx = |p: Point| (p.y * w + p.x) as usize;
    let mut best_cost = vec![u32::MAX; (w * h) as usize];
    let mut came_from = vec![None; (w * h) as usize];

    let mut open = BinaryHeap::new();
    best_cost[idx(start)] = 0;
    open.push(Node { cost: 0, priority: start.manhattan_distance(end) as u32, point: start });

    let max_expansions = (w * h) as usize * 2;
    let mut expansions = 0usize;

    while let Some(Node { cost, point, .. }) = open.pop() {
        expansions += 1;
        if expansions > max_expansions {
            return None;
        }
        if point == end {
            let mut path = vec![end];
            let mut cur = end;
            while let Some(prev) = came_from[idx(cur)] {
                path.push(prev);
                cur = prev;
            }
            path.reverse();
            return Some(path);
        }
        if cost > best_cost[idx(point)] {
            continue;
        }
        for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            let next = Point::new(point.x + dx, point.y + dy);
            if !in_bounds(next) {
                continue;
            }
            let step_cost = if state.grid.get(next.x, next.y) == TileKind::Floor.to_byte() {
                ASTAR_FLOOR_COST
            } else {
                ASTAR_WALL_COST
            };
            let next_cost = cost + step_cost;
            if next_cost < best_cost[idx(next)] {
                best_cost[idx(next)] = next_cost;
                came_from[idx(next)] = Some(point);
                let priority = next_cost + next.manhattan_distance(end) as u32;
                open.push(Node { cost: next_cost, priority, point: next });
            }
        }
    }
    None
}

/// For the branching style: walk the already-built L-shaped trunk and
/// occasionally spur a short perpendicular dead end off it.
fn add_branches(path: &mut Vec<Point>, state: &DungeonState, ctx: &mut Context, grid_w: i32, grid_h: i32) {
    let anchors: Vec<Point> = path.iter().step_by(4.max(path.len() / 6).max(1)).copied().collect();
    let _ = state;
    for anchor in anchors {
        if !dg_core::bernoulli(ctx.rng.connections(), 0.3) {
            continue;
        }
        let vertical: bool = ctx.rng.connections().gen();
        let length = ctx.rng.connections().gen_range(2..=5);
        for step in 1..=length {
            let p = if vertical { Point::new(anchor.x, anchor.y + step) } else { Point::new(anchor.x + step, anchor.y) };
            if p.x >= 0 && p.y >= 0 && p.x < grid_w && p.y < grid_h {
                path.push(p);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dg_core::{Connection, GenerationConfig, NoopCollector, Room, RoomType};
    use dg_grid::Rect;

    fn room(id: u32, x: i32, y: i32) -> Room {
        Room {
            id,
            rect: Rect::new(x, y, 4, 4),
            room_type: RoomType::Normal,
            seed: 0,
            template: None,
            traits: Default::default(),
        }
    }

    #[test]
    fn l_shaped_connects_room_centroids_with_floor() {
        let cfg = GenerationConfig::default();
        let mut trace = NoopCollector;
        let mut ctx = Context::new(&cfg, &mut trace);
        let mut state = DungeonState::new(cfg.width, cfg.height, cfg.seed);
        state.rooms = vec![room(0, 2, 2), room(1, 40, 20)];
        state.connections = vec![Connection::new(0, 1, CorridorStyle::LShaped)];
        let state = CarveCorridors.run(state, &mut ctx).unwrap();
        let path = &state.connections[0].path;
        assert!(!path.is_empty());
        for p in path {
            assert_eq!(state.grid.get(p.x, p.y), TileKind::Floor.to_byte());
        }
    }

    #[test]
    fn astar_prefers_existing_floor_when_available() {
        let cfg = GenerationConfig::default();
        let mut trace = NoopCollector;
        let mut ctx = Context::new(&cfg, &mut trace);
        let mut state = DungeonState::new(cfg.width, cfg.height, cfg.seed);
        state.rooms = vec![room(0, 2, 2), room(1, 30, 2)];
        // Pre-carve a straight floor corridor the A* path should follow.
        for x in 2..32 {
            state.grid.set_unsafe(x, 3, TileKind::Floor.to_byte());
        }
        state.connections = vec![Connection::new(0, 1, CorridorStyle::AStar)];
        let state = CarveCorridors.run(state, &mut ctx).unwrap();
        assert!(!state.connections[0].path.is_empty());
    }

    #[test]
    fn bresenham_path_reaches_endpoint() {
        let path = bresenham_path(Point::new(0, 0), Point::new(5, 3));
        assert_eq!(*path.last().unwrap(), Point::new(5, 3));
    }
}
