// components.rs - the illustrative component set the bridge and game
// systems (§4.16) operate over. Real deployments are expected to register
// their own components alongside these; this set exists to give the
// bridge and the sample systems something concrete to act on.

use serde::{Deserialize, Serialize};

use dg_ecs::component::{Component, ComponentSchema, FieldSchema, FieldType, FieldValue, StorageHint};
use dg_ecs::entity::Entity;

macro_rules! soa_component {
    ($ty:ident, $name:literal, { $($field:ident : $fty:ident = $default:expr),* $(,)? }) => {
        impl Component for $ty {
            const NAME: &'static str = $name;
            fn schema() -> ComponentSchema {
                ComponentSchema::new(
                    $name,
                    vec![$(FieldSchema {
                        name: stringify!($field).to_string(),
                        ty: FieldType::$fty,
                        default: FieldValue::$fty($default),
                    }),*],
                    StorageHint::Auto,
                )
            }
        }
    };
}

/// Marks the single entity the player controls. No fields: presence is the
/// signal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player;

impl Component for Player {
    const NAME: &'static str = "Player";
    fn schema() -> ComponentSchema {
        ComponentSchema::new(Player::NAME, vec![], StorageHint::Auto)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}
soa_component!(Position, "Position", { x: I32 = 0, y: I32 = 0 });

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}
soa_component!(Health, "Health", { current: F32 = 0.0, max: F32 = 0.0 });

impl Default for Health {
    fn default() -> Self {
        Health { current: 10.0, max: 10.0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombatStats {
    pub attack: f32,
    pub defense: f32,
    /// Probability in [0, 1] of a critical hit doubling damage.
    pub crit_chance: f32,
}
soa_component!(CombatStats, "CombatStats", { attack: F32 = 1.0, defense: F32 = 0.0, crit_chance: F32 = 0.1 });

impl Default for CombatStats {
    fn default() -> Self {
        CombatStats { attack: 1.0, defense: 0.0, crit_chance: 0.1 }
    }
}

/// Queued by whatever issued an attack (a player input handler, an AI
/// system); consumed and removed by the combat system on the next tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttackRequest {
    pub target: Entity,
}
soa_component!(AttackRequest, "AttackRequest", { target: EntityRef = u32::MAX });

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }
}

/// Queued by an interaction input handler. When `target` is set the request
/// is dispatched directly to that entity's interactable kind; otherwise the
/// interaction system inspects the adjacent cell in `direction`, checking
/// door > stairs > container > generic, in that order.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct InteractRequest {
    pub target: Option<Entity>,
    pub direction: Direction,
}

impl Component for InteractRequest {
    const NAME: &'static str = "InteractRequest";
    fn schema() -> ComponentSchema {
        ComponentSchema::new(
            "InteractRequest",
            vec![
                FieldSchema { name: "target".into(), ty: FieldType::EntityRef, default: FieldValue::EntityRef(u32::MAX) },
                FieldSchema { name: "direction".into(), ty: FieldType::Object, default: FieldValue::Object(Default::default()) },
            ],
            // `direction` is a small enum, not one of the primitive field
            // types - AoS storage, same as any schema with a non-primitive
            // field.
            StorageHint::ForceAos,
        )
    }
}

/// An entity occupying a grid cell that blocks movement through it (closed
/// doors, solid scenery). Marker-only; the interaction/movement systems
/// check for its presence rather than reading a field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blocking;

impl Component for Blocking {
    const NAME: &'static str = "Blocking";
    fn schema() -> ComponentSchema {
        ComponentSchema::new("Blocking", vec![], StorageHint::Auto)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Door {
    pub locked: bool,
    pub open: bool,
    /// Key id required to unlock; `None` when the door isn't locked or
    /// needs no specific key.
    pub key_id: Option<u32>,
}

impl Component for Door {
    const NAME: &'static str = "Door";
    fn schema() -> ComponentSchema {
        ComponentSchema::new(
            "Door",
            vec![
                FieldSchema { name: "locked".into(), ty: FieldType::Bool, default: FieldValue::Bool(false) },
                FieldSchema { name: "open".into(), ty: FieldType::Bool, default: FieldValue::Bool(false) },
                FieldSchema { name: "key_id".into(), ty: FieldType::Object, default: FieldValue::Object(Default::default()) },
            ],
            StorageHint::ForceAos,
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    pub id: u32,
    pub consume_on_use: bool,
}
soa_component!(Key, "Key", { id: U32 = 0, consume_on_use: Bool = true });

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StairsDirection {
    #[default]
    Down,
    Up,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stairs {
    pub direction: StairsDirection,
}

impl Component for Stairs {
    const NAME: &'static str = "Stairs";
    fn schema() -> ComponentSchema {
        ComponentSchema::new(
            "Stairs",
            vec![FieldSchema { name: "direction".into(), ty: FieldType::Object, default: FieldValue::Object(Default::default()) }],
            StorageHint::ForceAos,
        )
    }
}

/// A lootable container on the floor; looting transfers up to `capacity`
/// items into the looter's inventory, dropping the rest on the ground.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub items: Vec<String>,
    pub capacity: u32,
}

impl Component for Container {
    const NAME: &'static str = "Container";
    fn schema() -> ComponentSchema {
        ComponentSchema::new(
            "Container",
            vec![
                FieldSchema { name: "items".into(), ty: FieldType::Set, default: FieldValue::Set(vec![]) },
                FieldSchema { name: "capacity".into(), ty: FieldType::U32, default: FieldValue::U32(0) },
            ],
            StorageHint::ForceAos,
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub items: Vec<String>,
    pub capacity: u32,
}

impl Component for Inventory {
    const NAME: &'static str = "Inventory";
    fn schema() -> ComponentSchema {
        ComponentSchema::new(
            "Inventory",
            vec![
                FieldSchema { name: "items".into(), ty: FieldType::Set, default: FieldValue::Set(vec![]) },
                FieldSchema { name: "capacity".into(), ty: FieldType::U32, default: FieldValue::U32(10) },
            ],
            StorageHint::ForceAos,
        )
    }
}

impl Inventory {
    /// Add `item`, returning `false` (leaving the item un-added) if at
    /// capacity.
    pub fn try_add(&mut self, item: String) -> bool {
        if self.items.len() as u32 >= self.capacity {
            return false;
        }
        self.items.push(item);
        true
    }
}

/// A human-readable label, mostly useful for tracing and save inspection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Name(pub String);

impl Component for Name {
    const NAME: &'static str = "Name";
    fn schema() -> ComponentSchema {
        ComponentSchema::new(
            "Name",
            vec![FieldSchema { name: "value".into(), ty: FieldType::Object, default: FieldValue::Object(Default::default()) }],
            StorageHint::ForceAos,
        )
    }
}
