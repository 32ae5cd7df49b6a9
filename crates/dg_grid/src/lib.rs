//! Dense and packed grid primitives for the dungeon generation pipeline:
//! byte grids, bit grids, a bit-grid pool, flood-fill/region extraction,
//! integer geometry, and the union-find/MST graph helpers the connectivity
//! pass builds on.

pub mod bitgrid;
pub mod flood_fill;
pub mod geometry;
pub mod graph;
pub mod grid;
pub mod pool;

pub use bitgrid::BitGrid;
pub use flood_fill::{flood_fill, flood_fill_scanline, find_regions, is_connected, Connectivity, Region};
pub use geometry::{Point, Rect};
pub use graph::{complete_graph_edges, kruskal_mst, Edge, UnionFind};
pub use grid::{Grid, OUT_OF_BOUNDS_VALUE};
pub use pool::{BitGridPool, PoolStats, PooledBitGrid};
