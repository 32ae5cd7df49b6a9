//! `build-connectivity`: a complete weighted graph over room centroids
//! (Manhattan distance), reduced to a minimum spanning tree via Kruskal
//! with deterministic tie-breaking, then loosened with a handful of extra
//! loop edges chosen by independent Bernoulli draws on the non-MST edges.

use dg_core::{bernoulli, Connection, Context, CorridorStyle, Decision, DecisionSystem, Pass, PassCounts, ProcgenError};
use dg_grid::{complete_graph_edges, kruskal_mst};

use crate::state::DungeonState;

/// Chance that any given non-MST edge is also carved, producing a loop.
/// Kept as a module constant rather than a config field since the source
/// never exposed it as a tunable - see DESIGN.md.
const EXTRA_EDGE_PROBABILITY: f64 = 0.12;

pub(crate) fn choose_style(roll: f32) -> CorridorStyle {
    match roll {
        r if r < 0.55 => CorridorStyle::LShaped,
        r if r < 0.75 => CorridorStyle::Straight,
        r if r < 0.92 => CorridorStyle::AStar,
        _ => CorridorStyle::Branching,
    }
}

pub struct BuildConnectivity;

impl Pass<DungeonState, DungeonState> for BuildConnectivity {
    fn id(&self) -> &'static str {
        "build-connectivity"
    }

    fn run(&self, mut state: DungeonState, ctx: &mut Context) -> Result<DungeonState, ProcgenError> {
        use rand::Rng;

        let n = state.rooms.len();
        if n < 2 {
            return Ok(state);
        }

        let centroids: Vec<_> = state.rooms.iter().map(|r| r.centroid()).collect();
        let edges = complete_graph_edges(n, |a, b| centroids[a].manhattan_distance(centroids[b]));
        let (mst, rest) = kruskal_mst(n, &edges);

        let mut connections = Vec::with_capacity(mst.len());
        for edge in &mst {
            let style_roll: f32 = ctx.rng.connections().gen();
            let style = choose_style(style_roll);
            connections.push(Connection::new(state.rooms[edge.from].id, state.rooms[edge.to].id, style));
        }

        let mut extra = 0;
        for edge in &rest {
            if bernoulli(ctx.rng.connections(), EXTRA_EDGE_PROBABILITY) {
                let style_roll: f32 = ctx.rng.connections().gen();
                connections.push(Connection::new(
                    state.rooms[edge.from].id,
                    state.rooms[edge.to].id,
                    choose_style(style_roll),
                ));
                extra += 1;
            }
        }

        ctx.trace.decision(
            self.id(),
            ctx.now_ms(),
            Decision {
                system: DecisionSystem::Connectivity,
                question: "how many loop edges beyond the spanning tree".into(),
                options: vec![],
                chosen: extra.to_string(),
                reason: format!("{} non-MST edges, each independently sampled at p={EXTRA_EDGE_PROBABILITY}", rest.len()),
                confidence: 1.0,
                rng_consumed: rest.len() as u32,
                context: None,
            },
        );

        state.connections = connections;
        Ok(state)
    }

    fn metrics(&self, output: &DungeonState) -> PassCounts {
        PassCounts {
            rooms: output.rooms.len(),
            connections: output.connections.len(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dg_core::{GenerationConfig, NoopCollector, Room, RoomType};
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
    fn connects_at_least_n_minus_one_rooms() {
        let cfg = GenerationConfig::default();
        let mut trace = NoopCollector;
        let mut ctx = Context::new(&cfg, &mut trace);
        let mut state = DungeonState::new(cfg.width, cfg.height, cfg.seed);
        state.rooms = vec![room(0, 0, 0), room(1, 20, 0), room(2, 0, 20), room(3, 20, 20)];
        let state = BuildConnectivity.run(state, &mut ctx).unwrap();
        assert!(state.connections.len() >= 3);
    }

    #[test]
    fn single_room_produces_no_connections() {
        let cfg = GenerationConfig::default();
        let mut trace = NoopCollector;
        let mut ctx = Context::new(&cfg, &mut trace);
        let mut state = DungeonState::new(cfg.width, cfg.height, cfg.seed);
        state.rooms = vec![room(0, 0, 0)];
        let state = BuildConnectivity.run(state, &mut ctx).unwrap();
        assert!(state.connections.is_empty());
    }
}
