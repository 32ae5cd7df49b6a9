// query.rs - cached multi-component queries
//
// A query descriptor is a `with`/`without` component-id pair. Evaluating one
// walks the smallest `with` store's dense entity list and filters against the
// rest, then caches the resulting entity list keyed by `QueryId`. The cache
// is invalidated precisely: each component id maintains the set of queries
// that mention it, so a single `add_component`/`remove_component` only dirties
// the queries that could actually be affected, not the whole cache. A bare
// spawn or despawn still invalidates everything, since any query's matched
// set can change shape without a component edit (despawn removes the entity
// from every store that held it).

use std::collections::{HashMap, HashSet};

use crate::component::ComponentId;
use crate::entity::Entity;
use crate::registry::ComponentRegistry;

pub type QueryId = u32;

/// `with`: entity must have every listed component. `without`: entity must
/// have none of the listed components. An entity satisfying both is a match.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryDescriptor {
    pub with: Vec<ComponentId>,
    pub without: Vec<ComponentId>,
}

impl QueryDescriptor {
    pub fn new(with: Vec<ComponentId>, without: Vec<ComponentId>) -> Self {
        let mut with = with;
        let mut without = without;
        with.sort_unstable();
        without.sort_unstable();
        Self { with, without }
    }
}

struct CachedQuery {
    descriptor: QueryDescriptor,
    matches: Vec<Entity>,
    dirty: bool,
}

#[derive(Default)]
pub struct QueryCache {
    queries: HashMap<QueryId, CachedQuery>,
    descriptor_to_id: HashMap<QueryDescriptor, QueryId>,
    /// component id -> queries that mention it in either `with` or `without`.
    component_index: HashMap<ComponentId, HashSet<QueryId>>,
    next_id: QueryId,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a descriptor, returning a stable id shared by every caller
    /// that requests the same `with`/`without` pair.
    pub fn get_or_create(&mut self, descriptor: QueryDescriptor) -> QueryId {
        if let Some(&id) = self.descriptor_to_id.get(&descriptor) {
            return id;
        }
        let id = self.next_id;
        self.next_id += 1;

        for &c in descriptor.with.iter().chain(descriptor.without.iter()) {
            self.component_index.entry(c).or_default().insert(id);
        }

        self.descriptor_to_id.insert(descriptor.clone(), id);
        self.queries.insert(
            id,
            CachedQuery {
                descriptor,
                matches: Vec::new(),
                dirty: true,
            },
        );
        id
    }

    /// Returns the cached match list, re-evaluating first if dirty.
    pub fn entities(&mut self, id: QueryId, registry: &ComponentRegistry) -> &[Entity] {
        if let Some(cached) = self.queries.get(&id) {
            if cached.dirty {
                let matches = Self::evaluate(&cached.descriptor, registry);
                let cached = self.queries.get_mut(&id).unwrap();
                cached.matches = matches;
                cached.dirty = false;
            }
        }
        self.queries.get(&id).map(|c| c.matches.as_slice()).unwrap_or(&[])
    }

    fn evaluate(descriptor: &QueryDescriptor, registry: &ComponentRegistry) -> Vec<Entity> {
        if descriptor.with.is_empty() {
            return Vec::new();
        }

        // Iterate the smallest `with` store to minimize filtering work.
        let smallest = descriptor
            .with
            .iter()
            .filter_map(|&id| registry.store(id).map(|s| (id, s)))
            .min_by_key(|(_, s)| s.len());

        let Some((smallest_id, smallest_store)) = smallest else {
            return Vec::new();
        };

        smallest_store
            .entities()
            .iter()
            .copied()
            .filter(|&e| {
                descriptor.with.iter().all(|&id| {
                    id == smallest_id || registry.store(id).map(|s| s.has(e)).unwrap_or(false)
                }) && descriptor
                    .without
                    .iter()
                    .all(|&id| !registry.store(id).map(|s| s.has(e)).unwrap_or(false))
            })
            .collect()
    }

    /// Mark only the queries that reference one of `components` as dirty.
    pub fn invalidate_by_components(&mut self, components: &[ComponentId]) {
        for &c in components {
            if let Some(ids) = self.component_index.get(&c) {
                for &id in ids {
                    if let Some(cached) = self.queries.get_mut(&id) {
                        cached.dirty = true;
                    }
                }
            }
        }
    }

    /// Mark every cached query dirty - used for bare spawn/despawn, where an
    /// entity's presence in a store's dense list changes without an explicit
    /// `add_component`/`remove_component` call being observed here.
    pub fn invalidate_all(&mut self) {
        for cached in self.queries.values_mut() {
            cached.dirty = true;
        }
    }

    pub fn descriptor_of(&self, id: QueryId) -> Option<&QueryDescriptor> {
        self.queries.get(&id).map(|c| &c.descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_normalizes_component_order() {
        let a = QueryDescriptor::new(vec![2, 1], vec![]);
        let b = QueryDescriptor::new(vec![1, 2], vec![]);
        assert_eq!(a, b);
    }

    #[test]
    fn same_descriptor_interns_to_same_id() {
        let mut cache = QueryCache::new();
        let id1 = cache.get_or_create(QueryDescriptor::new(vec![1], vec![2]));
        let id2 = cache.get_or_create(QueryDescriptor::new(vec![1], vec![2]));
        assert_eq!(id1, id2);
    }

    #[test]
    fn invalidate_by_components_only_dirties_relevant_queries() {
        let mut cache = QueryCache::new();
        let q1 = cache.get_or_create(QueryDescriptor::new(vec![1], vec![]));
        let q2 = cache.get_or_create(QueryDescriptor::new(vec![2], vec![]));
        cache.queries.get_mut(&q1).unwrap().dirty = false;
        cache.queries.get_mut(&q2).unwrap().dirty = false;

        cache.invalidate_by_components(&[1]);
        assert!(cache.queries[&q1].dirty);
        assert!(!cache.queries[&q2].dirty);
    }
}
