//! Crossing detection and progression-integrity checking: two
//! post-connectivity analyses that run over carved corridor paths rather
//! than the abstract room graph, since two corridors can physically cross
//! on the grid without their connections sharing a room.

use std::collections::{HashMap, HashSet};

use dg_core::{Connection, RoomId};
use dg_grid::Point;

use crate::room_graph::RoomGraph;

/// A cell shared by two corridors whose connections don't already share a
/// room - an unintentional shortcut between the rooms those corridors lead
/// to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossing {
    pub cell: Point,
    pub connection_a: usize,
    pub connection_b: usize,
}

/// Scans every pair of connections for shared path cells. Pairs that
/// already share an endpoint room are skipped - a T-junction feeding the
/// same room is not a crossing.
pub fn detect_crossings(connections: &[Connection]) -> Vec<Crossing> {
    let mut cell_owners: HashMap<Point, Vec<usize>> = HashMap::new();
    for (i, conn) in connections.iter().enumerate() {
        for &cell in &conn.path {
            cell_owners.entry(cell).or_default().push(i);
        }
    }

    let mut crossings = Vec::new();
    let mut seen_pairs = HashSet::new();
    for (cell, owners) in &cell_owners {
        for i in 0..owners.len() {
            for j in (i + 1)..owners.len() {
                let (a, b) = (owners[i], owners[j]);
                if a == b {
                    continue;
                }
                if connections[a].same_pair(&connections[b]) {
                    continue;
                }
                let key = (a.min(b), a.max(b));
                if seen_pairs.insert(key) {
                    crossings.push(Crossing {
                        cell: *cell,
                        connection_a: a,
                        connection_b: b,
                    });
                }
            }
        }
    }
    crossings
}

/// Implicit connections derived from crossings: each crossing means the two
/// rooms at either end of the crossing pair are reachable from one another
/// through the crossing cell, without an explicit `Connection` edge.
pub fn implicit_edges(connections: &[Connection], crossings: &[Crossing]) -> Vec<(RoomId, RoomId)> {
    crossings
        .iter()
        .flat_map(|c| {
            let a = &connections[c.connection_a];
            let b = &connections[c.connection_b];
            [(a.from, b.from), (a.from, b.to), (a.to, b.from), (a.to, b.to)]
        })
        .collect()
}

/// Progression integrity: with crossings unioned in as extra edges, the
/// shortest path from entrance to exit must not be shorter than the
/// explicit-graph shortest path by more than one hop. A bigger reduction
/// means a crossing opened an unintended shortcut past intended gating.
pub fn check_progression_integrity(
    room_ids: impl IntoIterator<Item = RoomId> + Clone,
    connections: &[Connection],
    entrance: RoomId,
    exit: RoomId,
) -> bool {
    let explicit_graph = RoomGraph::from_connections(room_ids.clone(), connections);
    let Some(explicit_len) = explicit_graph.shortest_path_len(entrance, exit) else {
        return false;
    };

    let crossings = detect_crossings(connections);
    let implicit = implicit_edges(connections, &crossings);
    let mut augmented = connections.to_vec();
    for (from, to) in implicit {
        augmented.push(Connection::new(from, to, dg_core::CorridorStyle::LShaped));
    }
    let augmented_graph = RoomGraph::from_connections(room_ids, &augmented);
    let Some(augmented_len) = augmented_graph.shortest_path_len(entrance, exit) else {
        return false;
    };

    explicit_len.saturating_sub(augmented_len) <= 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use dg_core::CorridorStyle;

    fn conn(from: RoomId, to: RoomId, path: Vec<Point>) -> Connection {
        let mut c = Connection::new(from, to, CorridorStyle::LShaped);
        c.path = path;
        c
    }

    #[test]
    fn crossing_detected_between_unrelated_corridors() {
        let connections = vec![
            conn(0, 1, vec![Point::new(0, 0), Point::new(1, 0), Point::new(2, 0)]),
            conn(2, 3, vec![Point::new(1, 0), Point::new(1, 1)]),
        ];
        let crossings = detect_crossings(&connections);
        assert_eq!(crossings.len(), 1);
        assert_eq!(crossings[0].cell, Point::new(1, 0));
    }

    #[test]
    fn shared_room_corridors_are_not_a_crossing() {
        let connections = vec![
            conn(0, 1, vec![Point::new(0, 0), Point::new(1, 0)]),
            conn(1, 0, vec![Point::new(1, 0), Point::new(2, 0)]),
        ];
        assert!(detect_crossings(&connections).is_empty());
    }

    #[test]
    fn progression_integrity_holds_with_no_crossings() {
        let connections = vec![conn(0, 1, vec![]), conn(1, 2, vec![])];
        assert!(check_progression_integrity([0, 1, 2], &connections, 0, 2));
    }
}
