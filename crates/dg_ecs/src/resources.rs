// resources.rs - name-keyed singleton registry
//
// Resources are world-global singletons that don't belong to any one entity
// (the active `GameMap`, RNG state, a tuning config). Stored type-erased by a
// stable string name so the world doesn't need a second generic registry
// alongside the component one.

use std::any::Any;
use std::collections::HashMap;

// `World` is single-threaded per instance (one thread owns one world at a
// time; see the concurrency model): resources only need to survive a move
// to whatever thread owns the world, never concurrent access from two, so
// the bound is `Send`, not `Send + Sync`. This also lets a resource hold
// a boxed event handler (`Box<dyn FnMut + Send>`), which is never `Sync`.
pub trait Resource: Send + 'static {}
impl<T: Send + 'static> Resource for T {}

#[derive(Default)]
pub struct ResourceRegistry {
    entries: HashMap<String, Box<dyn Any + Send>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Resource>(&mut self, name: impl Into<String>, value: T) {
        self.entries.insert(name.into(), Box::new(value));
    }

    pub fn get<T: Resource>(&self, name: &str) -> Option<&T> {
        self.entries.get(name)?.downcast_ref::<T>()
    }

    pub fn get_mut<T: Resource>(&mut self, name: &str) -> Option<&mut T> {
        self.entries.get_mut(name)?.downcast_mut::<T>()
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|s| s.as_str())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_round_trip() {
        let mut res = ResourceRegistry::new();
        res.insert("tick_rate", 30u32);
        assert_eq!(res.get::<u32>("tick_rate"), Some(&30));
    }

    #[test]
    fn wrong_type_lookup_returns_none() {
        let mut res = ResourceRegistry::new();
        res.insert("tick_rate", 30u32);
        assert_eq!(res.get::<String>("tick_rate"), None);
    }

    #[test]
    fn remove_clears_entry() {
        let mut res = ResourceRegistry::new();
        res.insert("x", 1i32);
        assert!(res.remove("x"));
        assert!(!res.contains("x"));
    }
}
