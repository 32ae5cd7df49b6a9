//! `Grid`: a dense byte matrix used as the terrain/working buffer for every
//! generator. Out-of-bounds reads behave as walls (tile value 0) rather than
//! panicking, since generator passes routinely probe one cell past an edge.

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Tile value treated as "wall" for any out-of-bounds access. Generators
/// that use a richer tile enum map their wall variant to this byte.
pub const OUT_OF_BOUNDS_VALUE: u8 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<u8>,
}

impl Grid {
    pub fn new(width: u32, height: u32, fill: u8) -> Self {
        Self {
            width,
            height,
            cells: vec![fill; (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Bounds-checked read; out-of-bounds returns [`OUT_OF_BOUNDS_VALUE`].
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> u8 {
        if self.in_bounds(x, y) {
            self.cells[self.index(x, y)]
        } else {
            OUT_OF_BOUNDS_VALUE
        }
    }

    /// Bounds-checked write; a no-op outside the grid.
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, value: u8) {
        if self.in_bounds(x, y) {
            let idx = self.index(x, y);
            self.cells[idx] = value;
        }
    }

    /// Write without a bounds check. Caller is responsible for validity;
    /// used on hot paths (corridor carving) where bounds are pre-clamped.
    #[inline]
    pub fn set_unsafe(&mut self, x: i32, y: i32, value: u8) {
        let idx = self.index(x, y);
        self.cells[idx] = value;
    }

    pub fn fill_rect(&mut self, rect: Rect, value: u8) {
        for y in rect.top()..rect.bottom() {
            for x in rect.left()..rect.right() {
                self.set(x, y, value);
            }
        }
    }

    /// Count cells within `rect` (clamped to the grid) matching `value`.
    pub fn count_rect(&self, rect: Rect, value: u8) -> usize {
        let mut count = 0;
        for y in rect.top().max(0)..rect.bottom().min(self.height as i32) {
            for x in rect.left().max(0)..rect.right().min(self.width as i32) {
                if self.get(x, y) == value {
                    count += 1;
                }
            }
        }
        count
    }

    /// Count of the 4-connected (orthogonal) neighbors equal to `value`.
    /// Out-of-bounds neighbors count as walls (`OUT_OF_BOUNDS_VALUE`).
    pub fn count_neighbors4(&self, x: i32, y: i32, value: u8) -> u32 {
        const OFFSETS: [(i32, i32); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];
        OFFSETS
            .iter()
            .filter(|&&(dx, dy)| self.get(x + dx, y + dy) == value)
            .count() as u32
    }

    /// Count of the 8-connected neighbors equal to `value`.
    pub fn count_neighbors8(&self, x: i32, y: i32, value: u8) -> u32 {
        let mut count = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                if self.get(x + dx, y + dy) == value {
                    count += 1;
                }
            }
        }
        count
    }

    /// One cellular-automata step: a cell with `alive_value` neighbor count
    /// (8-connected) `>= birth_limit` becomes `alive_value`; one with fewer
    /// than `death_limit` becomes `dead_value`; otherwise it is unchanged.
    /// Returns a new grid, leaving `self` untouched (passes are pure).
    pub fn cellular_step(
        &self,
        alive_value: u8,
        dead_value: u8,
        birth_limit: u32,
        death_limit: u32,
    ) -> Grid {
        let mut next = self.clone();
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                let alive_neighbors = self.count_neighbors8(x, y, alive_value);
                let was_alive = self.get(x, y) == alive_value;
                let becomes_alive = if was_alive {
                    alive_neighbors >= death_limit
                } else {
                    alive_neighbors >= birth_limit
                };
                next.set_unsafe(x, y, if becomes_alive { alive_value } else { dead_value });
            }
        }
        next
    }

    /// Returns a `BitGrid`-compatible boolean vector: `true` where the cell
    /// equals `value`, row-major, for round-tripping with bit-packed grids.
    pub fn to_boolean_grid(&self, value: u8) -> Vec<bool> {
        self.cells.iter().map(|&c| c == value).collect()
    }

    pub fn from_boolean_grid(width: u32, height: u32, bits: &[bool], true_value: u8, false_value: u8) -> Self {
        assert_eq!(bits.len(), (width as usize) * (height as usize));
        let cells = bits
            .iter()
            .map(|&b| if b { true_value } else { false_value })
            .collect();
        Self { width, height, cells }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_get_returns_wall() {
        let g = Grid::new(5, 5, 1);
        assert_eq!(g.get(-1, 0), OUT_OF_BOUNDS_VALUE);
        assert_eq!(g.get(0, -1), OUT_OF_BOUNDS_VALUE);
        assert_eq!(g.get(5, 0), OUT_OF_BOUNDS_VALUE);
    }

    #[test]
    fn out_of_bounds_set_is_noop() {
        let mut g = Grid::new(3, 3, 0);
        g.set(-1, 0, 9);
        g.set(3, 3, 9);
        assert!(g.cells().iter().all(|&c| c == 0));
    }

    #[test]
    fn fill_rect_and_count_rect_agree() {
        let mut g = Grid::new(10, 10, 0);
        let r = Rect::new(2, 2, 3, 3);
        g.fill_rect(r, 7);
        assert_eq!(g.count_rect(r, 7), 9);
        assert_eq!(g.count_rect(Rect::new(0, 0, 10, 10), 7), 9);
    }

    #[test]
    fn neighbor_counts_treat_out_of_bounds_as_walls() {
        let g = Grid::new(3, 3, 1);
        // Corner has only 3 in-bounds 8-neighbors, all walls(=0 value query).
        assert_eq!(g.count_neighbors8(0, 0, 0), 5);
        assert_eq!(g.count_neighbors4(0, 0, 0), 2);
    }

    #[test]
    fn boolean_round_trip() {
        let g = Grid::new(4, 4, 0);
        let mut g = g;
        g.set(1, 1, 1);
        g.set(2, 2, 1);
        let bits = g.to_boolean_grid(1);
        let back = Grid::from_boolean_grid(4, 4, &bits, 1, 0);
        assert_eq!(g, back);
    }

    #[test]
    fn cellular_step_is_pure_and_returns_new_grid() {
        let mut g = Grid::new(5, 5, 0);
        g.fill_rect(Rect::new(1, 1, 3, 3), 1);
        let before = g.clone();
        let next = g.cellular_step(1, 0, 5, 3);
        assert_eq!(g, before, "cellular_step must not mutate self");
        assert_ne!(next, before);
    }
}
