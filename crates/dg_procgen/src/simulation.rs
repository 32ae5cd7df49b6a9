//! Playthrough simulation: a deterministic surrogate player that walks the
//! room graph from the entrance and resolves encounters room by room, and
//! a pacing analyzer that turns the resulting trace into an engagement
//! curve and a list of difficulty-spike issues.
//!
//! Neither stage runs inside the generation pipeline proper - both consume
//! a finished `Dungeon` (and optionally its `EnrichmentResult`) as a
//! post-processing analysis step, the way a designer would dry-run a
//! generated level before shipping it.

use std::collections::{HashSet, VecDeque};

use dg_core::{Dungeon, RoomId, RoomType, SpawnKind};

use crate::room_graph::RoomGraph;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    /// Upper bound on rooms visited before the run is abandoned as
    /// incomplete, independent of health.
    pub max_steps: u32,
    /// Damage an enemy spawn inflicts, scaled by its spawn weight.
    pub enemy_damage: f32,
    pub starting_health: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_steps: 500,
            enemy_damage: 8.0,
            starting_health: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    ReachedExit,
    Died,
    StepBudgetExhausted,
    NoEntrance,
}

#[derive(Debug, Clone, Copy)]
pub struct RoomVisit {
    pub room: RoomId,
    pub step: u32,
    pub health_before: f32,
    pub health_after: f32,
    pub enemies_encountered: u32,
    pub treasures_found: u32,
}

#[derive(Debug, Clone)]
pub struct PlaythroughTrace {
    pub visits: Vec<RoomVisit>,
    pub halt_reason: HaltReason,
    pub treasure_count: u32,
    pub final_health: f32,
}

/// Run a deterministic breadth-first playthrough from the entrance room,
/// resolving encounters on each first visit to a room and halting on exit,
/// death, or step budget exhaustion.
pub fn simulate(dungeon: &Dungeon, config: &SimulationConfig) -> PlaythroughTrace {
    let Some(entrance) = dungeon.rooms.iter().find(|r| r.room_type == RoomType::Entrance) else {
        return PlaythroughTrace {
            visits: Vec::new(),
            halt_reason: HaltReason::NoEntrance,
            treasure_count: 0,
            final_health: config.starting_health,
        };
    };
    let exit = dungeon.rooms.iter().find(|r| r.room_type == RoomType::Exit).map(|r| r.id);

    let graph = RoomGraph::from_connections(dungeon.rooms.iter().map(|r| r.id), &dungeon.connections);

    let mut health = config.starting_health;
    let mut treasure_count = 0u32;
    let mut visits = Vec::new();
    let mut visited_rooms: HashSet<RoomId> = HashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(entrance.id);
    visited_rooms.insert(entrance.id);

    let mut halt_reason = HaltReason::StepBudgetExhausted;
    let mut step = 0u32;

    'walk: while let Some(room_id) = queue.pop_front() {
        if step >= config.max_steps {
            halt_reason = HaltReason::StepBudgetExhausted;
            break;
        }

        let health_before = health;
        let mut enemies_encountered = 0u32;
        let mut treasures_found = 0u32;

        for spawn in dungeon.spawns.iter().filter(|s| s.room == room_id && s.kind == SpawnKind::Spawn) {
            if spawn.has_tag("enemy") {
                health -= config.enemy_damage * spawn.weight;
                enemies_encountered += 1;
            } else if spawn.has_tag("treasure") {
                treasure_count += 1;
                treasures_found += 1;
            }
        }

        visits.push(RoomVisit {
            room: room_id,
            step,
            health_before,
            health_after: health,
            enemies_encountered,
            treasures_found,
        });
        step += 1;

        if health <= 0.0 {
            halt_reason = HaltReason::Died;
            break 'walk;
        }
        if Some(room_id) == exit {
            halt_reason = HaltReason::ReachedExit;
            break 'walk;
        }

        for &neighbor in graph.neighbors(room_id) {
            if visited_rooms.insert(neighbor) {
                queue.push_back(neighbor);
            }
        }
        if queue.is_empty() {
            halt_reason = if exit.is_none() { HaltReason::ReachedExit } else { HaltReason::StepBudgetExhausted };
        }
    }

    PlaythroughTrace {
        visits,
        halt_reason,
        treasure_count,
        final_health: health,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    DifficultySpike,
    DifficultyDrought,
}

#[derive(Debug, Clone)]
pub struct PacingIssue {
    pub kind: IssueKind,
    pub room: RoomId,
    pub step: u32,
    pub intensity_delta: f32,
    pub recommendation: String,
}

#[derive(Debug, Clone)]
pub struct PacingReport {
    /// Per-room intensity in visit order: damage taken plus a fixed credit
    /// per treasure found, normalized against starting health.
    pub engagement_curve: Vec<f32>,
    pub issues: Vec<PacingIssue>,
}

const TREASURE_INTENSITY_CREDIT: f32 = 0.05;

/// Analyze a playthrough trace for pacing problems: rooms whose intensity
/// jumps far above the trailing average are flagged as spikes; long
/// stretches with near-zero intensity are flagged as droughts.
pub fn analyze_pacing(trace: &PlaythroughTrace, config: &SimulationConfig, spike_threshold: f32) -> PacingReport {
    let engagement_curve: Vec<f32> = trace
        .visits
        .iter()
        .map(|v| {
            let damage_fraction = (v.health_before - v.health_after).max(0.0) / config.starting_health;
            damage_fraction + v.treasures_found as f32 * TREASURE_INTENSITY_CREDIT
        })
        .collect();

    let mut issues = Vec::new();
    if engagement_curve.len() < 2 {
        return PacingReport { engagement_curve, issues };
    }

    let mut running_avg = engagement_curve[0];
    for i in 1..engagement_curve.len() {
        let delta = engagement_curve[i] - running_avg;
        if running_avg > 0.0 && delta / running_avg.max(0.001) > spike_threshold {
            issues.push(PacingIssue {
                kind: IssueKind::DifficultySpike,
                room: trace.visits[i].room,
                step: trace.visits[i].step,
                intensity_delta: delta,
                recommendation: "reduce enemy density or weight in this room, or add a breather room beforehand".to_string(),
            });
        } else if engagement_curve[i] <= 0.0 && running_avg > spike_threshold {
            issues.push(PacingIssue {
                kind: IssueKind::DifficultyDrought,
                room: trace.visits[i].room,
                step: trace.visits[i].step,
                intensity_delta: delta,
                recommendation: "add a minor encounter or treasure to avoid a dead stretch".to_string(),
            });
        }
        // Exponential moving average keeps the baseline responsive without
        // letting one outlier room dominate every later comparison.
        running_avg = running_avg * 0.7 + engagement_curve[i] * 0.3;
    }

    PacingReport { engagement_curve, issues }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dg_core::{Connection, CorridorStyle, Room, SeedBundle, SpawnDescriptor};
    use dg_grid::{Point, Rect};
    use std::collections::BTreeSet;

    fn room(id: u32, room_type: RoomType) -> Room {
        Room { id, rect: Rect::new(0, 0, 6, 6), room_type, seed: 0, template: None, traits: Default::default() }
    }

    fn enemy_spawn(room: u32, weight: f32) -> SpawnDescriptor {
        let mut tags = BTreeSet::new();
        tags.insert("enemy".to_string());
        SpawnDescriptor { position: Point::new(1, 1), room, kind: SpawnKind::Spawn, tags, weight, hop_distance: 0 }
    }

    fn treasure_spawn(room: u32) -> SpawnDescriptor {
        let mut tags = BTreeSet::new();
        tags.insert("treasure".to_string());
        SpawnDescriptor { position: Point::new(2, 2), room, kind: SpawnKind::Spawn, tags, weight: 1.0, hop_distance: 0 }
    }

    fn linear_dungeon(enemy_weights: &[f32]) -> Dungeon {
        let mut rooms = vec![room(0, RoomType::Entrance)];
        let mut connections = Vec::new();
        let mut spawns = Vec::new();
        for (i, &w) in enemy_weights.iter().enumerate() {
            let id = (i + 1) as u32;
            rooms.push(room(id, RoomType::Normal));
            connections.push(Connection::new(id - 1, id, CorridorStyle::LShaped));
            spawns.push(enemy_spawn(id, w));
        }
        let exit_id = rooms.len() as u32;
        rooms.push(room(exit_id, RoomType::Exit));
        connections.push(Connection::new(exit_id - 1, exit_id, CorridorStyle::LShaped));

        Dungeon {
            width: 40,
            height: 40,
            terrain: vec![1; 1600],
            rooms,
            connections,
            spawns,
            seed: SeedBundle::from_primary(7),
            checksum: String::new(),
        }
    }

    #[test]
    fn playthrough_reaches_exit_when_health_survives() {
        let dungeon = linear_dungeon(&[0.2, 0.2]);
        let trace = simulate(&dungeon, &SimulationConfig::default());
        assert_eq!(trace.halt_reason, HaltReason::ReachedExit);
        assert!(trace.final_health > 0.0);
    }

    #[test]
    fn playthrough_halts_on_death_when_damage_exceeds_health() {
        let dungeon = linear_dungeon(&[20.0, 20.0, 20.0]);
        let trace = simulate(&dungeon, &SimulationConfig::default());
        assert_eq!(trace.halt_reason, HaltReason::Died);
        assert!(trace.final_health <= 0.0);
    }

    #[test]
    fn playthrough_counts_treasure_without_spending_health() {
        let mut dungeon = linear_dungeon(&[]);
        dungeon.spawns.push(treasure_spawn(0));
        let trace = simulate(&dungeon, &SimulationConfig::default());
        assert_eq!(trace.treasure_count, 1);
        assert_eq!(trace.final_health, SimulationConfig::default().starting_health);
    }

    #[test]
    fn dungeon_with_no_entrance_halts_immediately() {
        let mut dungeon = linear_dungeon(&[0.1]);
        dungeon.rooms.retain(|r| r.room_type != RoomType::Entrance);
        let trace = simulate(&dungeon, &SimulationConfig::default());
        assert_eq!(trace.halt_reason, HaltReason::NoEntrance);
        assert!(trace.visits.is_empty());
    }

    #[test]
    fn pacing_analyzer_flags_a_spike_after_calm_rooms() {
        let dungeon = linear_dungeon(&[0.05, 0.05, 0.05, 5.0]);
        let config = SimulationConfig::default();
        let trace = simulate(&dungeon, &config);
        let report = analyze_pacing(&trace, &config, 1.0);
        assert!(report.issues.iter().any(|i| i.kind == IssueKind::DifficultySpike));
    }
}
