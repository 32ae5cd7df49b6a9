// storage/aos.rs - Array-of-Structures component store
//
// Used for schemas with non-primitive fields (sets, maps, nested objects).
// `add` clones the incoming value one level deep so the store never holds a
// reference into caller-owned data - the source's deep structured clone,
// replaced here by `Clone::clone` on an owned value instead of a manual
// recursive copy, since every `Component` is already required to be `Clone`.

use std::any::Any;

use crate::component::{Component, ComponentSchema, StorageKind};
use crate::entity::Entity;

use super::{ComponentStore, InsertSlot, SparseIndex};

pub struct AosStore<T: Component> {
    schema: ComponentSchema,
    index: SparseIndex,
    dense: Vec<T>,
}

impl<T: Component> AosStore<T> {
    pub fn new() -> Self {
        Self {
            schema: T::schema(),
            index: SparseIndex::new(),
            dense: Vec::new(),
        }
    }

    pub fn add(&mut self, entity: Entity, value: T) {
        // One-level deep clone: `value` is already owned here, but cloning
        // explicitly documents that the store takes its own copy rather
        // than aliasing whatever the caller does with `value` afterward.
        let owned = value.clone();
        match self.index.insert(entity) {
            InsertSlot::New(dense_idx) => {
                debug_assert_eq!(dense_idx, self.dense.len());
                self.dense.push(owned);
            }
            InsertSlot::Existing(dense_idx) => {
                self.dense[dense_idx] = owned;
            }
        }
    }

    pub fn get(&self, entity: Entity) -> Option<&T> {
        let dense = self.index.dense_index_of(entity)?;
        self.dense.get(dense)
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        let dense = self.index.dense_index_of(entity)?;
        self.dense.get_mut(dense)
    }

    pub fn values(&self) -> &[T] {
        &self.dense
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.index.dense_entities().iter().copied().zip(self.dense.iter())
    }
}

impl<T: Component> Default for AosStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> ComponentStore for AosStore<T> {
    fn schema(&self) -> &ComponentSchema {
        &self.schema
    }

    fn storage_kind(&self) -> StorageKind {
        StorageKind::Aos
    }

    fn has(&self, entity: Entity) -> bool {
        self.index.has(entity)
    }

    fn remove(&mut self, entity: Entity) -> bool {
        match self.index.remove(entity) {
            Some(dense_idx) => {
                self.dense.swap_remove(dense_idx);
                true
            }
            None => false,
        }
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn entities(&self) -> &[Entity] {
        self.index.dense_entities()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
