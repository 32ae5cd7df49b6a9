// storage/mod.rs - sparse-set indexing shared by the SoA and AoS stores
//
// `sparse[slot]` points at a dense index whose `dense_entities[dense]`
// equals the full entity handle (slot + generation) that occupies it. A
// stale handle (wrong generation) simply fails the equality check, which is
// exactly the invariant required by §3: `has(e) => generation(e) ==
// stored_generation(index(e))`.
//
// Removal is swap-with-last: the last dense slot is moved into the vacated
// position so iteration stays dense and O(1) add/remove/has/get holds.

mod aos;
mod soa;

pub use aos::AosStore;
pub use soa::SoaStore;

use std::any::Any;

use crate::component::{ComponentSchema, StorageKind};
use crate::entity::Entity;

const INVALID_INDEX: u32 = u32::MAX;

#[derive(Default)]
pub(crate) struct SparseIndex {
    sparse: Vec<u32>,
    dense_entities: Vec<Entity>,
}

impl SparseIndex {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.dense_entities.len()
    }

    pub(crate) fn dense_entities(&self) -> &[Entity] {
        &self.dense_entities
    }

    pub(crate) fn dense_index_of(&self, entity: Entity) -> Option<usize> {
        let slot = entity.slot();
        let dense = *self.sparse.get(slot)?;
        if dense == INVALID_INDEX {
            return None;
        }
        let dense = dense as usize;
        (self.dense_entities.get(dense) == Some(&entity)).then_some(dense)
    }

    pub(crate) fn has(&self, entity: Entity) -> bool {
        self.dense_index_of(entity).is_some()
    }

    /// Insert a new entity, or return the existing dense index if already
    /// present with a matching generation (add-or-replace semantics - see
    /// DESIGN.md on `CommandBuffer::set_component`).
    pub(crate) fn insert(&mut self, entity: Entity) -> InsertSlot {
        if let Some(existing) = self.dense_index_of(entity) {
            return InsertSlot::Existing(existing);
        }
        let slot = entity.slot();
        if slot >= self.sparse.len() {
            self.sparse.resize(slot + 1, INVALID_INDEX);
        }
        let dense = self.dense_entities.len();
        self.dense_entities.push(entity);
        self.sparse[slot] = dense as u32;
        InsertSlot::New(dense)
    }

    /// Swap-remove the entity's dense slot. Returns the removed dense index;
    /// the caller must perform the matching `swap_remove` on its parallel
    /// value array using the same index.
    pub(crate) fn remove(&mut self, entity: Entity) -> Option<usize> {
        let dense = self.dense_index_of(entity)?;
        let slot = entity.slot();
        self.dense_entities.swap_remove(dense);
        self.sparse[slot] = INVALID_INDEX;
        if dense < self.dense_entities.len() {
            let moved = self.dense_entities[dense];
            self.sparse[moved.slot()] = dense as u32;
        }
        Some(dense)
    }
}

pub(crate) enum InsertSlot {
    New(usize),
    Existing(usize),
}

/// Type-erased interface the registry, query engine, command buffer and
/// serializer use without knowing the concrete component type.
pub trait ComponentStore: Send + Sync {
    fn schema(&self) -> &ComponentSchema;
    fn storage_kind(&self) -> StorageKind;
    fn has(&self, entity: Entity) -> bool;
    fn remove(&mut self, entity: Entity) -> bool;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Entities in dense iteration order - the order components are visited
    /// when this store is the smallest `with` set in a query.
    fn entities(&self) -> &[Entity];

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
