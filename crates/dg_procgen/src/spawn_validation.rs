//! Spawn revalidation: re-checks every spawn descriptor against the
//! dungeon's terrain after any post-processing step that might have moved
//! walls out from under a spawn (hand-edited dungeons, a future
//! post-processor that carves more walls), and repairs the invariant that
//! every spawn sits on a floor tile.
//!
//! A spawn on a non-floor cell is relocated to the nearest floor cell
//! within `radius` (breadth-first search in Chebyshev rings, so ties break
//! toward the original position's immediate neighbors), or dropped entirely
//! if no floor cell is found within the radius.

use std::collections::VecDeque;

use dg_core::{Dungeon, SpawnDescriptor, TileKind};
use dg_grid::Point;

/// Search radius `finalize` revalidates every generator's spawns with - wide
/// enough to recover from a cellular region's bounding-box centroid landing
/// several cells into a wall.
pub const DEFAULT_SPAWN_REVALIDATION_RADIUS: u32 = 10;

#[derive(Debug, Clone, Default)]
pub struct RevalidationReport {
    pub relocated: usize,
    pub dropped: usize,
}

/// Re-validate every spawn in `dungeon` in place, relocating or dropping
/// any that no longer sit on a floor tile.
pub fn revalidate_spawns(dungeon: &mut Dungeon, radius: u32) -> RevalidationReport {
    let mut report = RevalidationReport::default();
    let mut kept = Vec::with_capacity(dungeon.spawns.len());

    for spawn in std::mem::take(&mut dungeon.spawns) {
        if is_floor(dungeon, spawn.position) {
            kept.push(spawn);
            continue;
        }
        match nearest_floor(dungeon, spawn.position, radius) {
            Some(position) => {
                report.relocated += 1;
                kept.push(SpawnDescriptor { position, ..spawn });
            }
            None => {
                report.dropped += 1;
            }
        }
    }

    dungeon.spawns = kept;
    report
}

fn is_floor(dungeon: &Dungeon, p: Point) -> bool {
    if p.x < 0 || p.y < 0 || p.x as u32 >= dungeon.width || p.y as u32 >= dungeon.height {
        return false;
    }
    TileKind::from_byte(dungeon.tile_at(p.x, p.y)).is_walkable()
}

/// BFS outward from `start` over the 4-neighborhood, capped at `radius`
/// rings, returning the first floor cell found.
fn nearest_floor(dungeon: &Dungeon, start: Point, radius: u32) -> Option<Point> {
    let mut visited = std::collections::HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(start);
    queue.push_back((start, 0u32));

    while let Some((p, dist)) = queue.pop_front() {
        if dist > 0 && is_floor(dungeon, p) {
            return Some(p);
        }
        if dist >= radius {
            continue;
        }
        for (dx, dy) in [(0, -1), (0, 1), (-1, 0), (1, 0)] {
            let n = Point::new(p.x + dx, p.y + dy);
            if visited.insert(n) {
                queue.push_back((n, dist + 1));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use dg_core::{SeedBundle, SpawnKind};
    use std::collections::BTreeSet;

    fn dungeon_with_wall_island() -> Dungeon {
        let width = 10;
        let height = 10;
        let mut terrain = vec![TileKind::Floor.to_byte(); (width * height) as usize];
        // Punch a single wall cell in the middle; spawn will sit on it.
        terrain[5 * width as usize + 5] = TileKind::Wall.to_byte();
        Dungeon {
            width,
            height,
            terrain,
            rooms: vec![],
            connections: vec![],
            spawns: vec![SpawnDescriptor {
                position: Point::new(5, 5),
                room: 0,
                kind: SpawnKind::Spawn,
                tags: BTreeSet::new(),
                weight: 1.0,
                hop_distance: 0,
            }],
            seed: SeedBundle::from_primary(1),
            checksum: String::new(),
        }
    }

    #[test]
    fn spawn_on_wall_is_relocated_to_nearest_floor() {
        let mut dungeon = dungeon_with_wall_island();
        let report = revalidate_spawns(&mut dungeon, 10);
        assert_eq!(report.relocated, 1);
        assert_eq!(report.dropped, 0);
        assert_eq!(dungeon.spawns.len(), 1);
        assert!(is_floor(&dungeon, dungeon.spawns[0].position));
    }

    #[test]
    fn spawn_with_no_floor_in_radius_is_dropped() {
        let mut dungeon = dungeon_with_wall_island();
        // Wall out the whole grid so no floor exists anywhere.
        dungeon.terrain.iter_mut().for_each(|t| *t = TileKind::Wall.to_byte());
        let report = revalidate_spawns(&mut dungeon, 3);
        assert_eq!(report.relocated, 0);
        assert_eq!(report.dropped, 1);
        assert!(dungeon.spawns.is_empty());
    }

    #[test]
    fn spawn_already_on_floor_is_left_untouched() {
        let mut dungeon = dungeon_with_wall_island();
        dungeon.spawns[0].position = Point::new(0, 0);
        let report = revalidate_spawns(&mut dungeon, 10);
        assert_eq!(report.relocated, 0);
        assert_eq!(report.dropped, 0);
        assert_eq!(dungeon.spawns[0].position, Point::new(0, 0));
    }

    #[test]
    fn final_spawn_set_never_contains_non_floor_positions() {
        let mut dungeon = dungeon_with_wall_island();
        revalidate_spawns(&mut dungeon, 10);
        assert!(dungeon.spawns.iter().all(|s| is_floor(&dungeon, s.position)));
    }
}
