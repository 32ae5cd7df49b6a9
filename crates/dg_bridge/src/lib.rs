//! Dungeon-to-ECS bridge.
//!
//! Loads a generated [`dg_core::Dungeon`] into a [`dg_ecs::world::World`]
//! as one bulk operation (§4.15), plus the illustrative game systems
//! (§4.16) that share the same user-system contract as anything a real
//! deployment registers on top: combat resolution and interaction
//! handling (doors, stairs, containers).

pub mod components;
pub mod events;
pub mod load;
pub mod map;
pub mod systems;
pub mod templates;

pub use components::{
    AttackRequest, Blocking, CombatStats, Container, Direction, Door, Health, InteractRequest,
    Inventory, Key, Name, Player, Position, Stairs, StairsDirection,
};
pub use events::GameEvent;
pub use load::{load_dungeon, validate_load, BridgeError};
pub use map::GameMap;
pub use systems::{combat_system, interaction_system, GameRng, EVENTS_RESOURCE, RNG_RESOURCE};
pub use templates::{default_templates, Template, TemplateRegistry, PLAYER_TEMPLATE};
