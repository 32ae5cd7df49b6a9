// storage/soa.rs - Structure-of-Arrays component store
//
// One dense, tightly-packed `Vec<T>` plus the shared sparse index. Preferred
// whenever every field in the schema is primitive: insertion is a plain
// value copy, no heap indirection, and iteration is a straight slice walk.

use std::any::Any;

use crate::component::{Component, ComponentSchema, StorageKind};
use crate::entity::Entity;

use super::{ComponentStore, InsertSlot, SparseIndex};

pub struct SoaStore<T: Component> {
    schema: ComponentSchema,
    index: SparseIndex,
    dense: Vec<T>,
}

impl<T: Component> SoaStore<T> {
    pub fn new() -> Self {
        Self {
            schema: T::schema(),
            index: SparseIndex::new(),
            dense: Vec::new(),
        }
    }

    /// Add-or-replace: inserting an already-present entity overwrites its
    /// value in place (documented `set` semantics for the command buffer).
    pub fn add(&mut self, entity: Entity, value: T) {
        match self.index.insert(entity) {
            InsertSlot::New(dense_idx) => {
                debug_assert_eq!(dense_idx, self.dense.len());
                self.dense.push(value);
            }
            InsertSlot::Existing(dense_idx) => {
                self.dense[dense_idx] = value;
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

    /// Ordered dense slice, matching `self.entities()` index-for-index.
    pub fn values(&self) -> &[T] {
        &self.dense
    }

    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.dense
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.index.dense_entities().iter().copied().zip(self.dense.iter())
    }
}

impl<T: Component> Default for SoaStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> ComponentStore for SoaStore<T> {
    fn schema(&self) -> &ComponentSchema {
        &self.schema
    }

    fn storage_kind(&self) -> StorageKind {
        StorageKind::Soa
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentSchema, FieldSchema, FieldType, FieldValue, StorageHint};
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
    struct Position {
        x: f32,
        y: f32,
    }

    impl Component for Position {
        const NAME: &'static str = "Position";
        fn schema() -> ComponentSchema {
            ComponentSchema::new(
                "Position",
                vec![
                    FieldSchema { name: "x".into(), ty: FieldType::F32, default: FieldValue::F32(0.0) },
                    FieldSchema { name: "y".into(), ty: FieldType::F32, default: FieldValue::F32(0.0) },
                ],
                StorageHint::Auto,
            )
        }
    }

    fn entity_at(slot: u16, gen: u16) -> Entity {
        // Constructed via round-trip through bits since `new` is crate-private;
        // tests live in the same crate so they can reach into entity internals.
        Entity::from_bits(((slot as u32) << 16) | gen as u32)
    }

    #[test]
    fn add_get_remove_round_trip() {
        let mut store = SoaStore::<Position>::new();
        let e = entity_at(0, 0);
        store.add(e, Position { x: 1.0, y: 2.0 });
        assert_eq!(store.get(e), Some(&Position { x: 1.0, y: 2.0 }));
        assert!(store.remove(e));
        assert_eq!(store.get(e), None);
        assert!(!store.remove(e));
    }

    #[test]
    fn swap_remove_keeps_density() {
        let mut store = SoaStore::<Position>::new();
        let a = entity_at(0, 0);
        let b = entity_at(1, 0);
        let c = entity_at(2, 0);
        store.add(a, Position { x: 0.0, y: 0.0 });
        store.add(b, Position { x: 1.0, y: 1.0 });
        store.add(c, Position { x: 2.0, y: 2.0 });
        store.remove(a);
        assert_eq!(store.len(), 2);
        assert!(store.get(b).is_some());
        assert!(store.get(c).is_some());
    }

    #[test]
    fn set_semantics_overwrite_in_place() {
        let mut store = SoaStore::<Position>::new();
        let e = entity_at(3, 0);
        store.add(e, Position { x: 1.0, y: 1.0 });
        store.add(e, Position { x: 9.0, y: 9.0 });
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(e), Some(&Position { x: 9.0, y: 9.0 }));
    }
}
