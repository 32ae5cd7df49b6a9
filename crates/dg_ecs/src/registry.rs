// registry.rs - name -> store registry
//
// Exactly one store per component name. Registration chooses SoA when the
// schema is all-primitive (and doesn't request AoS), AoS otherwise.
// Duplicate registration (same name, different schema or store kind) is a
// fatal programmer error, matching §4.17: "Missing component store on
// access: Fatal error" and "Duplicate component registration: Fatal error".

use std::collections::HashMap;

use crate::component::{Component, ComponentId, ComponentSchema, StorageKind};
use crate::error::EcsError;
use crate::storage::{AosStore, ComponentStore, SoaStore};

#[derive(Default)]
pub struct ComponentRegistry {
    by_name: HashMap<String, ComponentId>,
    next_id: ComponentId,
    stores: HashMap<ComponentId, Box<dyn ComponentStore>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component type, building its store on first use. Returns
    /// the interned id. Calling this again for the same `T` is a no-op that
    /// returns the existing id - components are typically registered once
    /// at world setup and then looked up by id for every spawn.
    pub fn register<T: Component>(&mut self) -> Result<ComponentId, EcsError> {
        if let Some(&id) = self.by_name.get(T::NAME) {
            let existing_kind = self.stores[&id].storage_kind();
            let requested_kind = T::schema().resolved_storage_kind();
            if existing_kind != requested_kind || self.stores[&id].schema() != &T::schema() {
                return Err(EcsError::DuplicateComponentRegistration {
                    name: T::NAME.to_string(),
                });
            }
            return Ok(id);
        }

        let id = self.next_id;
        self.next_id += 1;

        let schema = T::schema();
        let store: Box<dyn ComponentStore> = match schema.resolved_storage_kind() {
            StorageKind::Soa => Box::new(SoaStore::<T>::new()),
            StorageKind::Aos => Box::new(AosStore::<T>::new()),
        };

        self.by_name.insert(T::NAME.to_string(), id);
        self.stores.insert(id, store);
        Ok(id)
    }

    pub fn id_of(&self, name: &str) -> Option<ComponentId> {
        self.by_name.get(name).copied()
    }

    pub fn id_of_type<T: Component>(&self) -> Option<ComponentId> {
        self.id_of(T::NAME)
    }

    pub fn store(&self, id: ComponentId) -> Option<&dyn ComponentStore> {
        self.stores.get(&id).map(|b| b.as_ref())
    }

    pub fn store_mut(&mut self, id: ComponentId) -> Option<&mut (dyn ComponentStore + 'static)> {
        self.stores.get_mut(&id).map(|b| b.as_mut())
    }

    pub fn typed_store<T: Component>(&self) -> Option<&SoaStore<T>> {
        let id = self.id_of_type::<T>()?;
        self.stores.get(&id)?.as_any().downcast_ref::<SoaStore<T>>()
    }

    pub fn typed_store_mut<T: Component>(&mut self) -> Option<&mut SoaStore<T>> {
        let id = self.id_of_type::<T>()?;
        self.stores.get_mut(&id)?.as_any_mut().downcast_mut::<SoaStore<T>>()
    }

    pub fn typed_aos_store<T: Component>(&self) -> Option<&AosStore<T>> {
        let id = self.id_of_type::<T>()?;
        self.stores.get(&id)?.as_any().downcast_ref::<AosStore<T>>()
    }

    pub fn typed_aos_store_mut<T: Component>(&mut self) -> Option<&mut AosStore<T>> {
        let id = self.id_of_type::<T>()?;
        self.stores.get_mut(&id)?.as_any_mut().downcast_mut::<AosStore<T>>()
    }

    /// All registered schemas, used by despawn sweeps and serialization.
    pub fn schemas(&self) -> impl Iterator<Item = (ComponentId, &ComponentSchema)> {
        self.stores.iter().map(|(&id, store)| (id, store.schema()))
    }

    pub fn names(&self) -> impl Iterator<Item = (&str, ComponentId)> {
        self.by_name.iter().map(|(name, &id)| (name.as_str(), id))
    }

    /// Remove an entity's data from every registered store. Used by despawn.
    pub fn clear_entity(&mut self, entity: crate::entity::Entity) -> smallvec::SmallVec<[ComponentId; 8]> {
        let mut touched = smallvec::SmallVec::new();
        for (&id, store) in self.stores.iter_mut() {
            if store.remove(entity) {
                touched.push(id);
            }
        }
        touched
    }
}
