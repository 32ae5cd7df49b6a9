// command.rs - deferred structural mutation
//
// Systems iterate queries by reference; spawning, despawning, or adding and
// removing components mid-iteration would invalidate the very storage being
// walked. A `CommandBuffer` records what *should* happen instead, against
// either a live `Entity` or a `PendingEntity` - a handle to an entity that
// will be spawned later in the same flush - and `flush` replays every
// recorded command against the world in FIFO order once iteration is done.
//
// Resolution is two-phase: first every `spawn`/`spawn_with` pending handle is
// turned into a real entity (in recording order, so pending handle N always
// maps to the Nth entity spawned this flush), then the remaining commands run
// with pending handles substituted for their resolved entities. A pending
// handle referenced by a later command but never spawned is a programmer
// error (`EcsError::UnresolvedPendingEntity`).

use std::collections::HashMap;

use crate::component::{Component, ComponentId};
use crate::entity::Entity;
use crate::error::EcsError;
use crate::world::World;

/// A handle to an entity that will exist only once this buffer is flushed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PendingEntity(u32);

/// Either a live entity or a same-flush pending handle. Every command target
/// accepts this so callers can mix freshly-spawned and pre-existing entities
/// in one buffer (e.g. "spawn a chest, then give the player a key to it").
#[derive(Copy, Clone, Debug)]
pub enum EntityRef {
    Real(Entity),
    Pending(PendingEntity),
}

impl From<Entity> for EntityRef {
    fn from(e: Entity) -> Self {
        EntityRef::Real(e)
    }
}

impl From<PendingEntity> for EntityRef {
    fn from(p: PendingEntity) -> Self {
        EntityRef::Pending(p)
    }
}

type DeferredOp = Box<dyn FnOnce(&mut World, &HashMap<PendingEntity, Entity>) -> Result<(), EcsError> + Send>;

enum Command {
    Spawn(PendingEntity),
    Op(DeferredOp),
}

#[derive(Default)]
pub struct CommandBuffer {
    next_pending: u32,
    commands: Vec<Command>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Reserve a handle for an entity that will be spawned on flush.
    pub fn spawn(&mut self) -> PendingEntity {
        let handle = PendingEntity(self.next_pending);
        self.next_pending += 1;
        self.commands.push(Command::Spawn(handle));
        handle
    }

    /// Reserve a handle and queue an initial component for it in one step.
    pub fn spawn_with<T: Component>(&mut self, value: T) -> PendingEntity {
        let handle = self.spawn();
        self.add_component(handle, value);
        handle
    }

    pub fn despawn(&mut self, target: impl Into<EntityRef>) {
        let target = target.into();
        self.push_op(move |world, resolved| {
            let entity = resolve(target, resolved)?;
            world.despawn(entity);
            Ok(())
        });
    }

    /// Add-or-replace a component on `target`, matching the store-level
    /// `set` semantics documented on `SoaStore::add`/`AosStore::add`.
    pub fn add_component<T: Component>(&mut self, target: impl Into<EntityRef>, value: T) {
        let target = target.into();
        self.push_op(move |world, resolved| {
            let entity = resolve(target, resolved)?;
            world.set_component(entity, value)
        });
    }

    pub fn remove_component<T: Component>(&mut self, target: impl Into<EntityRef>) {
        let target = target.into();
        self.push_op(move |world, resolved| {
            let entity = resolve(target, resolved)?;
            world.remove_component::<T>(entity);
            Ok(())
        });
    }

    /// Escape hatch for operations this buffer doesn't model directly
    /// (used by the bridge and game systems for multi-step structural work).
    pub fn custom(
        &mut self,
        op: impl FnOnce(&mut World, &HashMap<PendingEntity, Entity>) -> Result<(), EcsError> + Send + 'static,
    ) {
        self.push_op(op);
    }

    fn push_op(
        &mut self,
        op: impl FnOnce(&mut World, &HashMap<PendingEntity, Entity>) -> Result<(), EcsError> + Send + 'static,
    ) {
        self.commands.push(Command::Op(Box::new(op)));
    }

    /// Replay every recorded command against `world` in FIFO order, then
    /// clear the buffer. Spawns resolve first so later ops in the same
    /// buffer can reference entities spawned earlier in it.
    pub fn flush(&mut self, world: &mut World) -> Result<(), EcsError> {
        if self.commands.is_empty() {
            return Ok(());
        }

        let mut resolved = HashMap::new();
        for command in &self.commands {
            if let Command::Spawn(handle) = command {
                let entity = world.spawn()?;
                resolved.insert(*handle, entity);
            }
        }

        for command in self.commands.drain(..) {
            if let Command::Op(op) = command {
                op(world, &resolved)?;
            }
        }

        world.queries_mut().invalidate_all();
        Ok(())
    }
}

fn resolve(target: EntityRef, resolved: &HashMap<PendingEntity, Entity>) -> Result<Entity, EcsError> {
    match target {
        EntityRef::Real(e) => Ok(e),
        EntityRef::Pending(p) => resolved
            .get(&p)
            .copied()
            .ok_or(EcsError::UnresolvedPendingEntity(p.0)),
    }
}

#[allow(dead_code)]
fn _assert_send(_c: ComponentId) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentSchema, FieldSchema, FieldType, FieldValue, StorageHint};
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
    struct Marker(i32);

    impl Component for Marker {
        const NAME: &'static str = "Marker";
        fn schema() -> ComponentSchema {
            ComponentSchema::new(
                "Marker",
                vec![FieldSchema {
                    name: "value".into(),
                    ty: FieldType::I32,
                    default: FieldValue::I32(0),
                }],
                StorageHint::Auto,
            )
        }
    }

    #[test]
    fn spawn_with_then_flush_produces_component_on_real_entity() {
        let mut world = World::new();
        world.register_component::<Marker>().unwrap();

        let mut cmds = CommandBuffer::new();
        let pending = cmds.spawn_with(Marker(42));
        cmds.flush(&mut world).unwrap();

        // The pending handle itself doesn't carry forward, but we can verify
        // exactly one live entity exists with the expected component.
        let alive: Vec<_> = world.iter_alive().collect();
        assert_eq!(alive.len(), 1);
        assert_eq!(world.get_component::<Marker>(alive[0]), Some(&Marker(42)));
        let _ = pending;
    }

    #[test]
    fn unresolved_pending_reference_is_an_error() {
        let mut world = World::new();
        world.register_component::<Marker>().unwrap();

        let mut cmds = CommandBuffer::new();
        let ghost = PendingEntity(999);
        cmds.add_component(ghost, Marker(1));
        assert!(matches!(
            cmds.flush(&mut world),
            Err(EcsError::UnresolvedPendingEntity(999))
        ));
    }
}
