//! A small object pool for `BitGrid`s.
//!
//! Flood-fill and region-finding allocate a visited mask per call; under a
//! generator pass that runs many of these in a tight loop, reusing buffers
//! instead of reallocating measurably helps. The pool scans LIFO for a
//! pooled grid whose dimensions already match, growing by doubling up to a
//! hard cap and discarding releases once the cap is reached.

use crate::bitgrid::BitGrid;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub hits: u64,
    pub misses: u64,
    pub growths: u64,
    pub discards: u64,
}

pub struct BitGridPool {
    max_grids: usize,
    free: Vec<BitGrid>,
    stats: PoolStats,
}

impl BitGridPool {
    pub fn new(max_grids: usize) -> Self {
        Self {
            max_grids,
            free: Vec::new(),
            stats: PoolStats::default(),
        }
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Acquire a cleared grid of the requested dimensions. Scans the free
    /// list back-to-front (LIFO) for a dimension match first; failing that,
    /// reuses the most recently released grid by resizing it in place
    /// (counted as a growth), or allocates fresh if the pool is empty.
    pub fn acquire(&mut self, width: u32, height: u32) -> BitGrid {
        if let Some(pos) = self
            .free
            .iter()
            .rposition(|g| g.width() == width && g.height() == height)
        {
            self.stats.hits += 1;
            let mut grid = self.free.remove(pos);
            grid.clear();
            return grid;
        }

        if let Some(mut grid) = self.free.pop() {
            self.stats.misses += 1;
            self.stats.growths += 1;
            grid.reset_to(width, height);
            return grid;
        }

        self.stats.misses += 1;
        BitGrid::new(width, height)
    }

    /// Return a grid to the pool. Once `max_grids` are held, further
    /// releases are discarded (dropped) rather than growing unbounded.
    pub fn release(&mut self, grid: BitGrid) {
        if self.free.len() >= self.max_grids {
            self.stats.discards += 1;
            return;
        }
        self.free.push(grid);
    }

    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }
}

/// RAII guard returned by [`BitGridPool::acquire_scoped`]: releases the grid
/// back to its pool when dropped, even on an early return or panic unwind.
pub struct PooledBitGrid<'a> {
    pool: &'a mut BitGridPool,
    grid: Option<BitGrid>,
}

impl<'a> PooledBitGrid<'a> {
    pub fn grid(&self) -> &BitGrid {
        self.grid.as_ref().expect("grid taken before drop")
    }

    pub fn grid_mut(&mut self) -> &mut BitGrid {
        self.grid.as_mut().expect("grid taken before drop")
    }
}

impl Drop for PooledBitGrid<'_> {
    fn drop(&mut self) {
        if let Some(grid) = self.grid.take() {
            self.pool.release(grid);
        }
    }
}

impl BitGridPool {
    pub fn acquire_scoped(&mut self, width: u32, height: u32) -> PooledBitGrid<'_> {
        let grid = self.acquire(width, height);
        PooledBitGrid {
            pool: self,
            grid: Some(grid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_then_release_is_a_hit_on_reacquire() {
        let mut pool = BitGridPool::new(4);
        let g = pool.acquire(10, 10);
        assert_eq!(pool.stats().misses, 1);
        pool.release(g);
        let _g2 = pool.acquire(10, 10);
        assert_eq!(pool.stats().hits, 1);
    }

    #[test]
    fn dimension_mismatch_grows_instead_of_fresh_allocating_when_pool_nonempty() {
        let mut pool = BitGridPool::new(4);
        let g = pool.acquire(10, 10);
        pool.release(g);
        let g2 = pool.acquire(20, 5);
        assert_eq!(g2.width(), 20);
        assert_eq!(g2.height(), 5);
        assert_eq!(pool.stats().growths, 1);
    }

    #[test]
    fn releases_beyond_cap_are_discarded() {
        let mut pool = BitGridPool::new(1);
        let a = pool.acquire(4, 4);
        let b = pool.acquire(4, 4);
        pool.release(a);
        pool.release(b);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.stats().discards, 1);
    }

    #[test]
    fn scoped_guard_releases_on_drop() {
        let mut pool = BitGridPool::new(4);
        {
            let mut guard = pool.acquire_scoped(8, 8);
            guard.grid_mut().set(1, 1, true);
        }
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn acquired_grid_is_always_cleared() {
        let mut pool = BitGridPool::new(4);
        let mut g = pool.acquire(5, 5);
        g.set(0, 0, true);
        pool.release(g);
        let g2 = pool.acquire(5, 5);
        assert_eq!(g2.count(), 0);
    }
}
