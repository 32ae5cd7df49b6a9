// events.rs - the closed set of game event variants (§6), dispatched
// through a `dg_ecs::events::EventBus<GameEvent>`. Each variant carries its
// own typed payload; `tag()` is the string subscribers key handlers on
// (also the wildcard-independent name game systems use when they document
// "emits X").

use serde::{Deserialize, Serialize};

use dg_ecs::entity::Entity;
use dg_ecs::events::Event;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum GameEvent {
    EntitySpawned { entity: Entity },
    EntityDespawned { entity: Entity },

    ComponentAdded { entity: Entity, component: String },
    ComponentRemoved { entity: Entity, component: String },

    EntityMoved { entity: Entity, from_x: i32, from_y: i32, to_x: i32, to_y: i32 },

    CombatDamage { attacker: Entity, target: Entity, damage: f32, critical: bool },
    EntityDied { entity: Entity, killer: Entity },

    ItemPickedUp { entity: Entity, item: String },
    ItemDropped { entity: Entity, item: String },

    DoorOpened { door: Entity, by: Entity },
    DoorClosed { door: Entity, by: Entity },

    TurnStarted { turn: u64 },
    TurnEnded { turn: u64 },

    LevelCompleted { depth: u32 },

    FieldOfViewUpdated { entity: Entity, visible_cells: u32 },

    StatusApplied { entity: Entity, status: String, duration: u32 },
    StatusRemoved { entity: Entity, status: String },
}

impl Event for GameEvent {
    fn tag(&self) -> &'static str {
        match self {
            GameEvent::EntitySpawned { .. } => "entity.spawned",
            GameEvent::EntityDespawned { .. } => "entity.despawned",
            GameEvent::ComponentAdded { .. } => "component.added",
            GameEvent::ComponentRemoved { .. } => "component.removed",
            GameEvent::EntityMoved { .. } => "entity.moved",
            GameEvent::CombatDamage { .. } => "combat.damage",
            GameEvent::EntityDied { .. } => "entity.died",
            GameEvent::ItemPickedUp { .. } => "item.picked_up",
            GameEvent::ItemDropped { .. } => "item.dropped",
            GameEvent::DoorOpened { .. } => "door.opened",
            GameEvent::DoorClosed { .. } => "door.closed",
            GameEvent::TurnStarted { .. } => "turn.started",
            GameEvent::TurnEnded { .. } => "turn.ended",
            GameEvent::LevelCompleted { .. } => "level.completed",
            GameEvent::FieldOfViewUpdated { .. } => "fov.updated",
            GameEvent::StatusApplied { .. } => "status.applied",
            GameEvent::StatusRemoved { .. } => "status.removed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combat_damage_tag_matches_the_documented_emission_name() {
        let event = GameEvent::CombatDamage { attacker: Entity::NULL, target: Entity::NULL, damage: 1.0, critical: false };
        assert_eq!(event.tag(), "combat.damage");
    }

    #[test]
    fn entity_died_tag_matches_the_documented_emission_name() {
        let event = GameEvent::EntityDied { entity: Entity::NULL, killer: Entity::NULL };
        assert_eq!(event.tag(), "entity.died");
    }
}
