//! Shared room-adjacency BFS, used by `assign_room_types` (to find the
//! farthest room from the entrance), `calculate_spawns` (hop distances),
//! and semantic enrichment (difficulty scaling by distance).

use std::collections::{HashMap, VecDeque};

use dg_core::{Connection, RoomId};

pub struct RoomGraph {
    adjacency: HashMap<RoomId, Vec<RoomId>>,
}

impl RoomGraph {
    pub fn from_connections(room_ids: impl IntoIterator<Item = RoomId>, connections: &[Connection]) -> Self {
        let mut adjacency: HashMap<RoomId, Vec<RoomId>> = room_ids.into_iter().map(|id| (id, Vec::new())).collect();
        for conn in connections {
            adjacency.entry(conn.from).or_default().push(conn.to);
            adjacency.entry(conn.to).or_default().push(conn.from);
        }
        Self { adjacency }
    }

    /// BFS hop distances from `start`. Rooms unreachable from `start` are
    /// absent from the map.
    pub fn bfs_distances(&self, start: RoomId) -> HashMap<RoomId, u32> {
        let mut distances = HashMap::new();
        if !self.adjacency.contains_key(&start) {
            return distances;
        }
        let mut queue = VecDeque::new();
        distances.insert(start, 0);
        queue.push_back(start);
        while let Some(room) = queue.pop_front() {
            let d = distances[&room];
            if let Some(neighbors) = self.adjacency.get(&room) {
                for &n in neighbors {
                    if !distances.contains_key(&n) {
                        distances.insert(n, d + 1);
                        queue.push_back(n);
                    }
                }
            }
        }
        distances
    }

    /// Whether every room is reachable from `start` (the connectivity
    /// invariant procgen must uphold end to end).
    pub fn all_reachable_from(&self, start: RoomId) -> bool {
        self.bfs_distances(start).len() == self.adjacency.len()
    }

    pub fn farthest_from(&self, start: RoomId) -> Option<(RoomId, u32)> {
        self.bfs_distances(start).into_iter().max_by_key(|&(_, d)| d)
    }

    /// Shortest path length in rooms between `a` and `b`, ignoring
    /// crossing-derived implicit edges that aren't supplied here.
    pub fn shortest_path_len(&self, a: RoomId, b: RoomId) -> Option<u32> {
        self.bfs_distances(a).get(&b).copied()
    }

    /// Rooms directly adjacent to `room`, in the order their connections
    /// were added. Empty (not absent) for a room with no connections.
    pub fn neighbors(&self, room: RoomId) -> &[RoomId] {
        self.adjacency.get(&room).map(|v| v.as_slice()).unwrap_or(&[])
    }
}
