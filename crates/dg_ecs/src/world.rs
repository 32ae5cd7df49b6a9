// world.rs - the ECS aggregate
//
// `World` owns every other piece: the entity manager, the component
// registry, the query cache, the resource registry, a command buffer for
// deferred structural changes, the system scheduler, and the tick counter.
// It is the single stable surface everything else (the dungeon bridge, game
// systems, the CLI) programs against - internals can be reshuffled freely as
// long as these methods keep their documented behavior.

use tracing::{trace, warn};

use crate::command::CommandBuffer;
use crate::component::Component;
use crate::entity::{Entity, EntityManager};
use crate::error::EcsError;
use crate::query::{QueryCache, QueryDescriptor, QueryId};
use crate::registry::ComponentRegistry;
use crate::resources::{Resource, ResourceRegistry};
use crate::scheduler::Scheduler;

pub struct World {
    entities: EntityManager,
    components: ComponentRegistry,
    queries: QueryCache,
    resources: ResourceRegistry,
    commands: CommandBuffer,
    scheduler: Scheduler,
    tick: u64,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self {
            entities: EntityManager::new(),
            components: ComponentRegistry::new(),
            queries: QueryCache::new(),
            resources: ResourceRegistry::new(),
            commands: CommandBuffer::new(),
            scheduler: Scheduler::new(),
            tick: 0,
        }
    }

    // -- entities ---------------------------------------------------------

    pub fn spawn(&mut self) -> Result<Entity, EcsError> {
        let entity = self.entities.spawn()?;
        self.queries.invalidate_all();
        Ok(entity)
    }

    pub fn spawn_batch(&mut self, count: usize) -> Result<Vec<Entity>, EcsError> {
        let entities = self.entities.spawn_batch(count)?;
        self.queries.invalidate_all();
        Ok(entities)
    }

    /// Despawn `entity`, removing it from every component store it appears
    /// in. A stale handle or double despawn is ignored, matching
    /// `EntityManager::despawn`'s failure model.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.entities.despawn(entity) {
            return false;
        }
        let touched = self.components.clear_entity(entity);
        if !touched.is_empty() {
            self.queries.invalidate_by_components(&touched);
        }
        self.queries.invalidate_all();
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    pub fn live_count(&self) -> usize {
        self.entities.live_count()
    }

    pub fn iter_alive(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter_alive()
    }

    // -- components ---------------------------------------------------------

    pub fn register_component<T: Component>(&mut self) -> Result<(), EcsError> {
        self.components.register::<T>()?;
        Ok(())
    }

    /// Add-or-replace `value` on `entity`. Registers `T` automatically if it
    /// hasn't been registered yet (convenient for tests and ad-hoc tooling;
    /// production call sites should register up front during world setup).
    pub fn set_component<T: Component>(&mut self, entity: Entity, value: T) -> Result<(), EcsError> {
        if !self.is_alive(entity) {
            warn!(?entity, component = T::NAME, "set_component on dead entity ignored");
            return Ok(());
        }
        if self.components.id_of_type::<T>().is_none() {
            self.components.register::<T>()?;
        }
        let id = self.components.id_of_type::<T>().unwrap();

        match T::schema().resolved_storage_kind() {
            crate::component::StorageKind::Soa => {
                self.components
                    .typed_store_mut::<T>()
                    .ok_or_else(|| EcsError::MissingComponentStore { name: T::NAME.to_string() })?
                    .add(entity, value);
            }
            crate::component::StorageKind::Aos => {
                self.components
                    .typed_aos_store_mut::<T>()
                    .ok_or_else(|| EcsError::MissingComponentStore { name: T::NAME.to_string() })?
                    .add(entity, value);
            }
        }

        self.queries.invalidate_by_components(&[id]);
        Ok(())
    }

    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        if let Some(s) = self.components.typed_store::<T>() {
            return s.get(entity);
        }
        self.components.typed_aos_store::<T>().and_then(|s| s.get(entity))
    }

    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        // Borrow-check friendly: probe read-only first via id existence, then
        // take the one mutable path that actually applies.
        if self.components.typed_store::<T>().is_some() {
            return self.components.typed_store_mut::<T>().and_then(|s| s.get_mut(entity));
        }
        self.components.typed_aos_store_mut::<T>().and_then(|s| s.get_mut(entity))
    }

    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.get_component::<T>(entity).is_some()
    }

    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> bool {
        let Some(id) = self.components.id_of_type::<T>() else {
            return false;
        };
        let removed = self
            .components
            .store_mut(id)
            .map(|s| s.remove(entity))
            .unwrap_or(false);
        if removed {
            self.queries.invalidate_by_components(&[id]);
        }
        removed
    }

    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    // -- queries ---------------------------------------------------------

    pub fn query(&mut self, descriptor: QueryDescriptor) -> QueryId {
        self.queries.get_or_create(descriptor)
    }

    pub fn execute(&mut self, query: QueryId) -> &[Entity] {
        self.queries.entities(query, &self.components)
    }

    pub fn count(&mut self, query: QueryId) -> usize {
        self.execute(query).len()
    }

    pub fn for_each(&mut self, query: QueryId, mut visit: impl FnMut(Entity)) {
        let matches = self.queries.entities(query, &self.components).to_vec();
        for entity in matches {
            visit(entity);
        }
    }

    pub fn queries_mut(&mut self) -> &mut QueryCache {
        &mut self.queries
    }

    // -- resources ---------------------------------------------------------

    pub fn insert_resource<T: Resource>(&mut self, name: impl Into<String>, value: T) {
        self.resources.insert(name, value);
    }

    pub fn resource<T: Resource>(&self, name: &str) -> Option<&T> {
        self.resources.get(name)
    }

    pub fn resource_mut<T: Resource>(&mut self, name: &str) -> Option<&mut T> {
        self.resources.get_mut(name)
    }

    pub fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }

    // -- commands ---------------------------------------------------------

    pub fn commands(&mut self) -> &mut CommandBuffer {
        &mut self.commands
    }

    /// Flush any commands recorded via `commands()` since the last flush.
    pub fn flush_commands(&mut self) -> Result<(), EcsError> {
        let mut pending = std::mem::take(&mut self.commands);
        let result = pending.flush(self);
        self.commands = pending;
        result
    }

    // -- scheduler / tick ---------------------------------------------------

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn set_current_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    /// Run `Init` once. Call before the first `tick`.
    pub fn initialize(&mut self) -> Result<(), EcsError> {
        let mut scheduler = std::mem::take(&mut self.scheduler);
        let result = scheduler.run_init(self);
        self.scheduler = scheduler;
        result
    }

    /// Run every non-`Init` phase once, flush the command buffer, and
    /// advance the tick counter.
    pub fn tick(&mut self) -> Result<(), EcsError> {
        let mut scheduler = std::mem::take(&mut self.scheduler);
        let result = scheduler.run_all(self);
        self.scheduler = scheduler;
        result?;
        self.flush_commands()?;
        self.tick += 1;
        trace!(tick = self.tick, "world tick complete");
        Ok(())
    }

    /// Despawn every entity and clear resources/queries, keeping component
    /// registrations and scheduled systems intact - used between runs of
    /// the same process rather than a full rebuild.
    pub fn reset(&mut self) {
        let alive: Vec<Entity> = self.entities.iter_alive().collect();
        for entity in alive {
            self.despawn(entity);
        }
        self.resources.clear();
        self.tick = 0;
    }

    /// Full wipe: entities, component registrations and stores, queries,
    /// resources, pending commands and scheduled systems all go - as if the
    /// `World` had just been constructed. Use this rather than `reset` when
    /// a caller is about to rebuild a world from scratch (e.g. loading a
    /// different dungeon) and the old component schema set shouldn't linger.
    pub fn clear(&mut self) {
        *self = World::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentSchema, FieldSchema, FieldType, FieldValue, StorageHint};
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
    struct Hp(i32);

    impl Component for Hp {
        const NAME: &'static str = "Hp";
        fn schema() -> ComponentSchema {
            ComponentSchema::new(
                "Hp",
                vec![FieldSchema { name: "value".into(), ty: FieldType::I32, default: FieldValue::I32(0) }],
                StorageHint::Auto,
            )
        }
    }

    #[test]
    fn spawn_set_get_despawn_round_trip() {
        let mut world = World::new();
        world.register_component::<Hp>().unwrap();
        let e = world.spawn().unwrap();
        world.set_component(e, Hp(10)).unwrap();
        assert_eq!(world.get_component::<Hp>(e), Some(&Hp(10)));
        world.despawn(e);
        assert_eq!(world.get_component::<Hp>(e), None);
    }

    #[test]
    fn query_reflects_component_membership() {
        let mut world = World::new();
        world.register_component::<Hp>().unwrap();
        let hp_id = world.components().id_of_type::<Hp>().unwrap();
        let q = world.query(QueryDescriptor::new(vec![hp_id], vec![]));

        let a = world.spawn().unwrap();
        let _b = world.spawn().unwrap();
        world.set_component(a, Hp(5)).unwrap();

        assert_eq!(world.count(q), 1);
        assert_eq!(world.execute(q), &[a]);
    }

    #[test]
    fn tick_advances_counter() {
        let mut world = World::new();
        world.initialize().unwrap();
        world.tick().unwrap();
        assert_eq!(world.current_tick(), 1);
    }

    #[test]
    fn clear_drops_component_registrations_unlike_reset() {
        let mut world = World::new();
        world.register_component::<Hp>().unwrap();
        let e = world.spawn().unwrap();
        world.set_component(e, Hp(10)).unwrap();
        world.tick().unwrap();

        world.clear();

        assert_eq!(world.live_count(), 0);
        assert_eq!(world.current_tick(), 0);
        assert!(world.components().id_of_type::<Hp>().is_none());
        // A fresh registration after clear gets a clean store, not a stale one.
        world.register_component::<Hp>().unwrap();
        let e2 = world.spawn().unwrap();
        assert_eq!(world.get_component::<Hp>(e2), None);
    }
}
