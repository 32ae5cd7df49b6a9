//! Semantic enrichment: turns the raw `SpawnDescriptor`s a finished
//! `Dungeon` carries into semantic entities (one per enemy spawn) and
//! semantic items (one per non-enemy spawn), each with a chosen template,
//! an assigned role, a behavior profile, scaled loot, and relationship
//! edges to other entities in the same room.
//!
//! This runs over the terminal `Dungeon` artifact rather than as a pass in
//! the generation `DungeonState` pipeline - room/connection/spawn data is
//! already final by this point, and enrichment's own RNG draws (on the
//! `details` stream) are independent of anything `calculate_spawns` drew
//! during generation proper, since they run against a freshly seeded
//! `RngStreams` (see DESIGN.md).
//!
//! The template catalog here is illustrative, not a content catalog: real
//! deployments supply their own enemy/item template tables with the same
//! shape (`EnemyTemplate`/`ItemTemplate`), via [`enrich_with_catalog`].

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use dg_core::{bernoulli, Decision, DecisionSystem, Dungeon, GenerationConfig, ProcgenError, RoomType, SpawnDescriptor};
use dg_grid::Point;

use crate::room_graph::RoomGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    Normal,
    Elite,
    Boss,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyTemplate {
    pub name: String,
    pub required_tags: Vec<String>,
    pub difficulty: f32,
    pub tier: Tier,
    pub base_gold: f32,
    pub base_xp: f32,
    /// Role -> weight per room type the role is favored in.
    pub preferred_roles: Vec<(String, BTreeMap<RoomType, f32>)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemTemplate {
    pub name: String,
    pub required_tags: Vec<String>,
    pub difficulty: f32,
    pub base_gold: f32,
    pub base_xp: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementKind {
    Stationary,
    Patrol,
    Wander,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Behavior {
    pub detection_range: f32,
    pub movement: MovementKind,
    pub patrol_path: Vec<Point>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loot {
    pub gold: f32,
    pub experience: f32,
    pub guaranteed_drop: Option<String>,
    pub bonus_drop: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationshipKind {
    Guards,
    Commands,
    AlliesWith,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub from: u32,
    pub kind: RelationshipKind,
    pub to: u32,
    pub strength: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticEntity {
    pub id: u32,
    pub position: Point,
    pub room: dg_core::RoomId,
    pub hop_distance: u32,
    pub template: String,
    pub tier: Tier,
    pub role: String,
    pub behavior: Behavior,
    pub loot: Loot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticItem {
    pub id: u32,
    pub position: Point,
    pub room: dg_core::RoomId,
    pub hop_distance: u32,
    pub template: String,
    pub loot: Loot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentResult {
    pub entities: Vec<SemanticEntity>,
    pub items: Vec<SemanticItem>,
    pub relationships: Vec<Relationship>,
}

/// Default role -> (detection range, movement) table. Detection range is
/// clamped to 60% of the spawning room's minimum dimension before use.
fn default_behavior(role: &str) -> (f32, MovementKind) {
    match role {
        "guardian" => (6.0, MovementKind::Stationary),
        "patrol" => (5.0, MovementKind::Patrol),
        "merchant" => (3.0, MovementKind::Stationary),
        "boss" => (8.0, MovementKind::Stationary),
        _ => (4.0, MovementKind::Wander),
    }
}

fn default_enemy_templates() -> Vec<EnemyTemplate> {
    let mut patrol_weights = BTreeMap::new();
    patrol_weights.insert(RoomType::Normal, 1.0);
    patrol_weights.insert(RoomType::Cavern, 1.0);
    let mut guardian_weights = BTreeMap::new();
    guardian_weights.insert(RoomType::Treasure, 1.0);
    guardian_weights.insert(RoomType::Armory, 0.8);
    let mut boss_weights = BTreeMap::new();
    boss_weights.insert(RoomType::Boss, 1.0);

    vec![
        EnemyTemplate {
            name: "skulking_ghoul".into(),
            required_tags: vec!["enemy".into()],
            difficulty: 0.2,
            tier: Tier::Normal,
            base_gold: 5.0,
            base_xp: 10.0,
            preferred_roles: vec![("patrol".into(), patrol_weights.clone())],
        },
        EnemyTemplate {
            name: "vault_sentinel".into(),
            required_tags: vec!["enemy".into()],
            difficulty: 0.5,
            tier: Tier::Elite,
            base_gold: 15.0,
            base_xp: 30.0,
            preferred_roles: vec![("guardian".into(), guardian_weights.clone())],
        },
        EnemyTemplate {
            name: "dungeon_warlord".into(),
            required_tags: vec!["enemy".into(), "role:boss".into()],
            difficulty: 0.95,
            tier: Tier::Boss,
            base_gold: 80.0,
            base_xp: 200.0,
            preferred_roles: vec![("boss".into(), boss_weights)],
        },
    ]
}

fn default_item_templates() -> Vec<ItemTemplate> {
    vec![
        ItemTemplate {
            name: "scattered_coin_pile".into(),
            required_tags: vec!["treasure".into()],
            difficulty: 0.1,
            base_gold: 10.0,
            base_xp: 0.0,
        },
        ItemTemplate {
            name: "ornate_brazier".into(),
            required_tags: vec!["decoration".into()],
            difficulty: 0.0,
            base_gold: 0.0,
            base_xp: 0.0,
        },
    ]
}

/// Run enrichment with the default illustrative catalog.
pub fn enrich(dungeon: &Dungeon, config: &GenerationConfig) -> Result<EnrichmentResult, ProcgenError> {
    enrich_with_catalog(dungeon, config, &default_enemy_templates(), &default_item_templates())
}

pub fn enrich_with_catalog(
    dungeon: &Dungeon,
    config: &GenerationConfig,
    enemy_catalog: &[EnemyTemplate],
    item_catalog: &[ItemTemplate],
) -> Result<EnrichmentResult, ProcgenError> {
    let mut rng = dg_core::RngStreams::from_seed(&dungeon.seed);
    let mut trace = dg_core::NoopCollector;

    let graph = RoomGraph::from_connections(dungeon.rooms.iter().map(|r| r.id), &dungeon.connections);
    let max_hop = dungeon
        .rooms
        .iter()
        .find(|r| r.room_type == RoomType::Entrance)
        .and_then(|r| graph.farthest_from(r.id))
        .map(|(_, d)| d)
        .unwrap_or(1)
        .max(1);

    let mut entities = Vec::new();
    let mut items = Vec::new();
    let mut relationships = Vec::new();
    let mut next_id = 0u32;

    // Track (id, role, room) for enemies so relationship wiring can run
    // after every entity has been assigned an id and role.
    let mut enemies_by_room: BTreeMap<dg_core::RoomId, Vec<(u32, String, Tier)>> = BTreeMap::new();
    let mut items_by_room: BTreeMap<dg_core::RoomId, Vec<u32>> = BTreeMap::new();
    let mut guard_targets: Vec<(u32, String)> = Vec::new();

    for spawn in &dungeon.spawns {
        if matches!(spawn.kind, dg_core::SpawnKind::Entrance | dg_core::SpawnKind::Exit) {
            continue;
        }
        let room = dungeon.room(spawn.room);
        let target_difficulty = (spawn.hop_distance as f32 / max_hop as f32).clamp(0.0, 1.0) * config.difficulty;

        if spawn.has_tag("enemy") {
            let Some(template) = pick_enemy_template(enemy_catalog, spawn, target_difficulty, &mut rng, &mut trace) else {
                continue;
            };
            let role = assign_role(spawn, &template.preferred_roles, room.map(|r| r.room_type), &mut rng);
            if let Some(target) = spawn.tag_value("guards") {
                guard_targets.push((next_id, target.to_string()));
            }
            let min_room_dim = room.map(|r| r.rect.width.min(r.rect.height)).unwrap_or(4) as f32;
            let (base_range, movement) = default_behavior(&role);
            let detection_range = base_range.min(min_room_dim * 0.6);
            let patrol_path = if matches!(movement, MovementKind::Patrol) {
                patrol_path_for_room(room)
            } else {
                Vec::new()
            };
            let multiplier = 1.0 + target_difficulty * config.difficulty;
            let loot = Loot {
                gold: template.base_gold * multiplier,
                experience: template.base_xp * multiplier,
                guaranteed_drop: matches!(template.tier, Tier::Boss).then(|| "epic_drop".to_string()),
                bonus_drop: (matches!(template.tier, Tier::Elite) && bernoulli(rng.details(), 0.5))
                    .then(|| "rare_drop".to_string()),
            };

            enemies_by_room.entry(spawn.room).or_default().push((next_id, role.clone(), template.tier));
            entities.push(SemanticEntity {
                id: next_id,
                position: spawn.position,
                room: spawn.room,
                hop_distance: spawn.hop_distance,
                template: template.name.clone(),
                tier: template.tier,
                role,
                behavior: Behavior { detection_range, movement, patrol_path },
                loot,
            });
            next_id += 1;
        } else {
            let Some(template) = pick_item_template(item_catalog, spawn, target_difficulty, &mut rng, &mut trace) else {
                continue;
            };
            let multiplier = 1.0 + target_difficulty * config.difficulty;
            let loot = Loot {
                gold: template.base_gold * multiplier,
                experience: template.base_xp * multiplier,
                guaranteed_drop: None,
                bonus_drop: None,
            };
            items_by_room.entry(spawn.room).or_default().push(next_id);
            items.push(SemanticItem {
                id: next_id,
                position: spawn.position,
                room: spawn.room,
                hop_distance: spawn.hop_distance,
                template: template.name.clone(),
                loot,
            });
            next_id += 1;
        }
    }

    // Relationship wiring, once every entity/item in the room has an id.
    for (guardian_id, target_tag) in guard_targets {
        if let Some(target_id) = target_tag.parse::<u32>().ok().filter(|id| entities.iter().any(|e| e.id == *id) || items.iter().any(|i| i.id == *id)) {
            relationships.push(Relationship { from: guardian_id, kind: RelationshipKind::Guards, to: target_id, strength: 1.0 });
        }
    }

    for (room_id, occupants) in &enemies_by_room {
        let boss = occupants.iter().find(|(_, _, tier)| *tier == Tier::Boss);
        if let Some((boss_id, _, _)) = boss {
            for (minion_id, _, tier) in occupants {
                if *tier != Tier::Boss {
                    relationships.push(Relationship { from: *boss_id, kind: RelationshipKind::Commands, to: *minion_id, strength: 0.8 });
                }
            }
        }
        // A guardian with no explicit guards:Y tag guards the first item in
        // its room, if any.
        if let Some(item_ids) = items_by_room.get(room_id) {
            if let Some(first_item) = item_ids.first() {
                for (entity_id, role, _) in occupants {
                    if role == "guardian" && !relationships.iter().any(|r| r.from == *entity_id && r.kind == RelationshipKind::Guards) {
                        relationships.push(Relationship { from: *entity_id, kind: RelationshipKind::Guards, to: *first_item, strength: 1.0 });
                    }
                }
            }
        }
        for (a_id, a_role, _) in occupants {
            if a_role == "merchant" {
                continue;
            }
            for (b_id, b_role, _) in occupants {
                if a_id != b_id && b_role != "merchant" {
                    relationships.push(Relationship { from: *a_id, kind: RelationshipKind::AlliesWith, to: *b_id, strength: 0.5 });
                }
            }
        }
    }

    Ok(EnrichmentResult { entities, items, relationships })
}

fn pick_enemy_template<'a>(
    catalog: &'a [EnemyTemplate],
    spawn: &SpawnDescriptor,
    target_difficulty: f32,
    rng: &mut dg_core::RngStreams,
    trace: &mut dyn dg_core::TraceCollector,
) -> Option<&'a EnemyTemplate> {
    let candidates: Vec<&EnemyTemplate> = catalog
        .iter()
        .filter(|t| t.required_tags.iter().all(|tag| spawn.has_tag(tag)))
        .collect();
    weighted_template_pick(candidates, |t| t.difficulty, target_difficulty, rng, trace, "enemy")
}

fn pick_item_template<'a>(
    catalog: &'a [ItemTemplate],
    spawn: &SpawnDescriptor,
    target_difficulty: f32,
    rng: &mut dg_core::RngStreams,
    trace: &mut dyn dg_core::TraceCollector,
) -> Option<&'a ItemTemplate> {
    let candidates: Vec<&ItemTemplate> = catalog
        .iter()
        .filter(|t| t.required_tags.iter().all(|tag| spawn.has_tag(tag)))
        .collect();
    weighted_template_pick(candidates, |t| t.difficulty, target_difficulty, rng, trace, "item")
}

/// Score every candidate as `1 - |candidateDifficulty - target|`, keep the
/// top three, and sample from them weighted by score.
fn weighted_template_pick<'a, T>(
    mut candidates: Vec<&'a T>,
    difficulty_of: impl Fn(&T) -> f32,
    target: f32,
    rng: &mut dg_core::RngStreams,
    trace: &mut dyn dg_core::TraceCollector,
    what: &str,
) -> Option<&'a T> {
    if candidates.is_empty() {
        return None;
    }
    candidates.sort_by(|a, b| {
        let sa = 1.0 - (difficulty_of(a) - target).abs();
        let sb = 1.0 - (difficulty_of(b) - target).abs();
        sb.partial_cmp(&sa).unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates.truncate(3);

    let scores: Vec<f32> = candidates.iter().map(|t| (1.0 - (difficulty_of(t) - target).abs()).max(0.001)).collect();
    let total: f32 = scores.iter().sum();
    let mut roll = rng.details().gen_range(0.0..total);
    let mut chosen_index = candidates.len() - 1;
    for (i, score) in scores.iter().enumerate() {
        if roll < *score {
            chosen_index = i;
            break;
        }
        roll -= score;
    }

    trace.decision(
        "semantic-enrichment",
        0,
        Decision {
            system: DecisionSystem::Enrichment,
            question: format!("{what} template selection"),
            options: vec![],
            chosen: chosen_index.to_string(),
            reason: format!("score-weighted among top {} candidates, target difficulty {target:.2}", candidates.len()),
            confidence: scores[chosen_index] / total.max(0.001),
            rng_consumed: 1,
            context: None,
        },
    );

    Some(candidates[chosen_index])
}

fn assign_role(
    spawn: &SpawnDescriptor,
    preferred_roles: &[(String, BTreeMap<RoomType, f32>)],
    room_type: Option<RoomType>,
    rng: &mut dg_core::RngStreams,
) -> String {
    if let Some(role) = spawn.tag_value("role") {
        if preferred_roles.iter().any(|(r, _)| r == role) {
            return role.to_string();
        }
    }
    if spawn.tag_value("guards").is_some() {
        return "guardian".to_string();
    }
    if preferred_roles.is_empty() {
        return "wanderer".to_string();
    }
    let room_type = room_type.unwrap_or(RoomType::Normal);
    let weights: Vec<f32> = preferred_roles
        .iter()
        .map(|(_, w)| w.get(&room_type).copied().unwrap_or(0.1))
        .collect();
    let total: f32 = weights.iter().sum();
    if total <= 0.0 {
        return preferred_roles[0].0.clone();
    }
    let mut roll = rng.details().gen_range(0.0..total);
    for (i, w) in weights.iter().enumerate() {
        if roll < *w {
            return preferred_roles[i].0.clone();
        }
        roll -= w;
    }
    preferred_roles.last().unwrap().0.clone()
}

fn patrol_path_for_room(room: Option<&dg_core::Room>) -> Vec<Point> {
    let Some(room) = room else { return Vec::new() };
    let r = room.rect;
    vec![
        Point::new(r.left(), r.top()),
        Point::new(r.right() - 1, r.top()),
        Point::new(r.right() - 1, r.bottom() - 1),
        Point::new(r.left(), r.bottom() - 1),
    ]
}
