//! Interaction handling (§4.16): processes `InteractRequest` components.
//! When the request names a target entity directly, dispatch goes straight
//! to that entity's interactable kind; otherwise the system inspects the
//! adjacent cell in the requested direction, checking door > stairs >
//! container > generic, in that order, and acts on the first match.

use dg_ecs::error::EcsError;
use dg_ecs::query::QueryDescriptor;
use dg_ecs::world::World;

use crate::components::{Blocking, Container, Door, InteractRequest, Inventory, Key, Position, Stairs};
use crate::events::GameEvent;
use crate::systems::emit;

pub fn interaction_system(world: &mut World) -> Result<(), EcsError> {
    let Some(request_id) = world.components().id_of_type::<InteractRequest>() else {
        return Ok(());
    };

    let query = world.query(QueryDescriptor::new(vec![request_id], vec![]));
    let interactors: Vec<_> = world.execute(query).to_vec();

    for by in interactors {
        let Some(request) = world.get_component::<InteractRequest>(by).copied() else {
            continue;
        };

        let target = request.target.or_else(|| adjacent_interactable(world, by, request.direction));

        if let Some(target) = target {
            if world.has_component::<Door>(target) {
                handle_door(world, target, by)?;
            } else if world.has_component::<Stairs>(target) {
                handle_stairs(world, target, by);
            } else if world.has_component::<Container>(target) {
                handle_loot(world, target, by);
            } else {
                tracing::debug!(?by, ?target, "interact target has no recognized interactable kind");
            }
        }

        world.remove_component::<InteractRequest>(by);
    }

    Ok(())
}

fn adjacent_cell(world: &World, by: dg_ecs::entity::Entity, direction: crate::components::Direction) -> Option<(i32, i32)> {
    let pos = world.get_component::<Position>(by)?;
    let (dx, dy) = direction.offset();
    Some((pos.x + dx, pos.y + dy))
}

/// Finds the entity at `by`'s adjacent cell with the highest-priority
/// interactable component present: door, then stairs, then container.
/// Entities with none of the three (decoration, other actors) are not
/// matched here - a direct `target` is required to interact with them.
fn adjacent_interactable(
    world: &mut World,
    by: dg_ecs::entity::Entity,
    direction: crate::components::Direction,
) -> Option<dg_ecs::entity::Entity> {
    let (x, y) = adjacent_cell(&*world, by, direction)?;

    for finder in [entity_at::<Door> as fn(&mut World, i32, i32) -> Option<dg_ecs::entity::Entity>, entity_at::<Stairs>, entity_at::<Container>] {
        if let Some(entity) = finder(world, x, y) {
            return Some(entity);
        }
    }
    None
}

fn entity_at<T: dg_ecs::component::Component>(world: &mut World, x: i32, y: i32) -> Option<dg_ecs::entity::Entity> {
    let id = world.components().id_of_type::<T>()?;
    let query = world.query(QueryDescriptor::new(vec![id], vec![]));
    world
        .execute(query)
        .to_vec()
        .into_iter()
        .find(|&e| world.get_component::<Position>(e) == Some(&Position { x, y }))
}

/// Verifies locks, consumes a matching key held by `by` when the key's
/// `consume_on_use` is set, toggles `open`, updates the `Blocking` marker,
/// and emits `door.opened` / `door.closed`.
fn handle_door(world: &mut World, door_entity: dg_ecs::entity::Entity, by: dg_ecs::entity::Entity) -> Result<(), EcsError> {
    let Some(door) = world.get_component::<Door>(door_entity).copied() else {
        return Ok(());
    };

    if door.open {
        world.set_component(door_entity, Door { open: false, ..door })?;
        world.set_component(door_entity, Blocking)?;
        emit(world, GameEvent::DoorClosed { door: door_entity, by });
        return Ok(());
    }

    if door.locked {
        let held_key = world.get_component::<Key>(by).copied();
        let unlocks = matches!((door.key_id, held_key), (Some(id), Some(key)) if key.id == id);
        if !unlocks {
            tracing::debug!(?door_entity, ?by, "door is locked and the interactor holds no matching key");
            return Ok(());
        }
        if held_key.map(|k| k.consume_on_use).unwrap_or(false) {
            world.remove_component::<Key>(by);
        }
    }

    world.set_component(door_entity, Door { open: true, locked: false, ..door })?;
    world.remove_component::<Blocking>(door_entity);
    emit(world, GameEvent::DoorOpened { door: door_entity, by });
    Ok(())
}

/// Illustrative only: the spec leaves "use-stairs" otherwise unspecified
/// beyond dispatch priority, so this just logs the transition rather than
/// asserting a depth-tracking resource a real deployment may not want.
fn handle_stairs(_world: &mut World, stairs: dg_ecs::entity::Entity, by: dg_ecs::entity::Entity) {
    tracing::info!(?stairs, ?by, "interactor used stairs");
}

/// Transfers container items to `by`'s inventory up to capacity; anything
/// that doesn't fit is left in the container (dropped on the ground).
fn handle_loot(world: &mut World, container_entity: dg_ecs::entity::Entity, by: dg_ecs::entity::Entity) {
    let Some(container) = world.get_component::<Container>(container_entity).cloned() else {
        return;
    };
    if !world.has_component::<Inventory>(by) {
        return;
    }

    let mut overflow = Vec::new();
    let mut picked_up = Vec::new();
    {
        let Some(inventory) = world.get_component_mut::<Inventory>(by) else { return };
        for item in container.items {
            if inventory.try_add(item.clone()) {
                picked_up.push(item);
            } else {
                overflow.push(item);
            }
        }
    }

    let _ = world.set_component(container_entity, Container { items: overflow, capacity: container.capacity });
    for item in picked_up {
        emit(world, GameEvent::ItemPickedUp { entity: by, item });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Direction;

    fn setup() -> World {
        let mut world = World::new();
        world.register_component::<InteractRequest>().unwrap();
        world.register_component::<Position>().unwrap();
        world.register_component::<Door>().unwrap();
        world.register_component::<Stairs>().unwrap();
        world.register_component::<Container>().unwrap();
        world.register_component::<Inventory>().unwrap();
        world.register_component::<Key>().unwrap();
        world.register_component::<Blocking>().unwrap();
        world
    }

    #[test]
    fn opening_an_unlocked_door_toggles_state_and_clears_blocking() {
        let mut world = setup();
        let player = world.spawn().unwrap();
        world.set_component(player, Position { x: 0, y: 0 }).unwrap();

        let door = world.spawn().unwrap();
        world.set_component(door, Position { x: 1, y: 0 }).unwrap();
        world.set_component(door, Door { locked: false, open: false, key_id: None }).unwrap();
        world.set_component(door, Blocking).unwrap();

        world.set_component(player, InteractRequest { target: None, direction: Direction::East }).unwrap();
        interaction_system(&mut world).unwrap();

        assert!(world.get_component::<Door>(door).unwrap().open);
        assert!(!world.has_component::<Blocking>(door));
    }

    #[test]
    fn locked_door_without_matching_key_stays_shut() {
        let mut world = setup();
        let player = world.spawn().unwrap();
        world.set_component(player, Position { x: 0, y: 0 }).unwrap();

        let door = world.spawn().unwrap();
        world.set_component(door, Position { x: 1, y: 0 }).unwrap();
        world.set_component(door, Door { locked: true, open: false, key_id: Some(7) }).unwrap();

        world.set_component(player, InteractRequest { target: Some(door), direction: Direction::East }).unwrap();
        interaction_system(&mut world).unwrap();

        assert!(!world.get_component::<Door>(door).unwrap().open);
    }

    #[test]
    fn matching_key_unlocks_and_is_consumed_when_marked() {
        let mut world = setup();
        let player = world.spawn().unwrap();
        world.set_component(player, Key { id: 7, consume_on_use: true }).unwrap();

        let door = world.spawn().unwrap();
        world.set_component(door, Door { locked: true, open: false, key_id: Some(7) }).unwrap();

        world.set_component(player, InteractRequest { target: Some(door), direction: Direction::North }).unwrap();
        interaction_system(&mut world).unwrap();

        assert!(world.get_component::<Door>(door).unwrap().open);
        assert!(!world.has_component::<Key>(player));
    }

    #[test]
    fn looting_transfers_items_up_to_capacity_and_leaves_the_rest() {
        let mut world = setup();
        let player = world.spawn().unwrap();
        world.set_component(player, Inventory { items: vec![], capacity: 1 }).unwrap();

        let chest = world.spawn().unwrap();
        world
            .set_component(chest, Container { items: vec!["sword".into(), "shield".into()], capacity: 10 })
            .unwrap();

        world.set_component(player, InteractRequest { target: Some(chest), direction: Direction::North }).unwrap();
        interaction_system(&mut world).unwrap();

        let inv = world.get_component::<Inventory>(player).unwrap();
        assert_eq!(inv.items, vec!["sword".to_string()]);
        let remaining = world.get_component::<Container>(chest).unwrap();
        assert_eq!(remaining.items, vec!["shield".to_string()]);
    }
}
