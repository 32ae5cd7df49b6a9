// entity.rs - generational entity handles and the slot allocator
//
// An Entity packs a 16-bit slot index and a 16-bit generation counter into a
// single u32. Reusing a slot bumps its generation, so a handle captured
// before a despawn/respawn cycle is detected as stale by a generation
// mismatch rather than silently aliasing a new entity.
//
// The two 20/12 and 16/16 slot/generation splits seen in the source history
// were collapsed to 16/16 here (see DESIGN.md) - it gives a comfortable
// 65,536 live entities and 65,536 respawns per slot before generation wraps,
// which is ample for a single dungeon's population.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::EcsError;

/// Maximum number of entities alive at once (bounded by the 16-bit slot space).
pub const MAX_ENTITIES: usize = 1 << 16;

const GENERATION_MASK: u32 = 0xFFFF;

/// A 32-bit generational entity handle: opaque, comparable, hashable,
/// value-typed, and carrying no pointer semantics.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity(u32);

impl Entity {
    /// Sentinel meaning "no entity". Never returned by `spawn`.
    pub const NULL: Entity = Entity(u32::MAX);

    #[inline]
    pub(crate) fn new(slot: u16, generation: u16) -> Self {
        Entity(((slot as u32) << 16) | generation as u32)
    }

    /// The slot index, used to key into per-component sparse arrays.
    #[inline]
    pub fn slot(self) -> usize {
        (self.0 >> 16) as usize
    }

    /// The generation counter for this slot at the time this handle was issued.
    #[inline]
    pub fn generation(self) -> u16 {
        (self.0 & GENERATION_MASK) as u16
    }

    /// Whether this handle is the NULL sentinel.
    #[inline]
    pub fn is_null(self) -> bool {
        self == Entity::NULL
    }

    /// Pack into a single u32 for FFI or serialization contexts that want a
    /// plain integer key.
    #[inline]
    pub fn to_bits(self) -> u32 {
        self.0
    }

    /// Reconstruct a handle from bits previously produced by `to_bits`.
    #[inline]
    pub fn from_bits(bits: u32) -> Self {
        Entity(bits)
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Entity(NULL)")
        } else {
            write!(f, "Entity({}v{})", self.slot(), self.generation())
        }
    }
}

impl Default for Entity {
    fn default() -> Self {
        Entity::NULL
    }
}

/// Owns the dense bitmap of alive slots, the per-slot generation array, and
/// the free-list of recycled indices. This is the sole authority for "is
/// this slot alive" and "what generation is it on" - component stores defer
/// to it indirectly via the `Entity` handles they are given.
#[derive(Default)]
pub struct EntityManager {
    alive: Vec<bool>,
    generations: Vec<u16>,
    free: Vec<u16>,
    /// Total slots ever allocated. Kept wider than the 16-bit slot index so
    /// the `>= MAX_ENTITIES` capacity check below is reachable instead of
    /// wrapping the counter before it fires.
    high_water_mark: u32,
    live_count: usize,
}

impl EntityManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a single entity, reusing a freed slot when available.
    pub fn spawn(&mut self) -> Result<Entity, EcsError> {
        let slot = if let Some(slot) = self.free.pop() {
            slot
        } else {
            if self.high_water_mark as usize >= MAX_ENTITIES {
                return Err(EcsError::CapacityExceeded {
                    max_entities: MAX_ENTITIES,
                });
            }
            let slot = self.high_water_mark as u16;
            self.high_water_mark += 1;
            self.alive.push(false);
            self.generations.push(0);
            slot
        };

        let idx = slot as usize;
        self.alive[idx] = true;
        self.live_count += 1;
        Ok(Entity::new(slot, self.generations[idx]))
    }

    /// Allocate `count` entities at once. Preserves the per-entity contract
    /// of `spawn`: each call either fully succeeds or the manager is left
    /// unchanged by the entities already allocated before a capacity error.
    pub fn spawn_batch(&mut self, count: usize) -> Result<Vec<Entity>, EcsError> {
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(self.spawn()?);
        }
        Ok(out)
    }

    /// Despawn an entity: marks the slot dead, bumps its generation modulo
    /// the 16-bit mask, and returns the slot to the free list.
    ///
    /// Returns `false` for a stale handle or a double despawn rather than
    /// panicking - per the failure model, this hazard is absorbed silently.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let idx = entity.slot();
        self.alive[idx] = false;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.free.push(idx as u16);
        self.live_count -= 1;
        true
    }

    /// Despawn a batch of entities, skipping any that are already dead.
    pub fn despawn_batch(&mut self, entities: &[Entity]) -> usize {
        entities.iter().filter(|&&e| self.despawn(e)).count()
    }

    /// Slot alive AND generation matches: the only correct aliveness check.
    #[inline]
    pub fn is_alive(&self, entity: Entity) -> bool {
        if entity.is_null() {
            return false;
        }
        let idx = entity.slot();
        idx < self.alive.len() && self.alive[idx] && self.generations[idx] == entity.generation()
    }

    /// Current generation for a slot, regardless of handle. Used by stores
    /// to validate their own generation mirrors.
    #[inline]
    pub fn generation_of_slot(&self, slot: usize) -> Option<u16> {
        self.generations.get(slot).copied()
    }

    /// Number of currently alive entities.
    pub fn live_count(&self) -> usize {
        self.live_count
    }

    /// Total slots ever allocated (alive + recycled-but-unused-since).
    pub fn high_water_mark(&self) -> usize {
        self.high_water_mark as usize
    }

    /// Iterate every currently alive entity, in slot order.
    pub fn iter_alive(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive.iter().enumerate().filter_map(move |(idx, &alive)| {
            alive.then(|| Entity::new(idx as u16, self.generations[idx]))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_is_immediately_alive_with_no_components() {
        let mut mgr = EntityManager::new();
        let e = mgr.spawn().unwrap();
        assert!(mgr.is_alive(e));
    }

    #[test]
    fn despawn_invalidates_handle_and_stale_checks_return_false() {
        let mut mgr = EntityManager::new();
        let e = mgr.spawn().unwrap();
        assert!(mgr.despawn(e));
        assert!(!mgr.is_alive(e));
        // Double despawn is silently ignored.
        assert!(!mgr.despawn(e));
    }

    #[test]
    fn generation_monotonicity_across_respawns() {
        let mut mgr = EntityManager::new();
        let mut last_gen = None;
        for _ in 0..5 {
            let e = mgr.spawn().unwrap();
            if let Some(prev) = last_gen {
                assert_eq!(e.generation(), prev + 1);
            }
            last_gen = Some(e.generation());
            mgr.despawn(e);
        }
    }

    #[test]
    fn respawned_slot_gets_new_handle_old_one_is_stale() {
        let mut mgr = EntityManager::new();
        let e1 = mgr.spawn().unwrap();
        mgr.despawn(e1);
        let e2 = mgr.spawn().unwrap();
        assert_eq!(e1.slot(), e2.slot());
        assert_ne!(e1.generation(), e2.generation());
        assert!(!mgr.is_alive(e1));
        assert!(mgr.is_alive(e2));
    }

    #[test]
    fn capacity_error_when_exceeding_max_entities() {
        let mut mgr = EntityManager::new();
        // Cheaply validate the failure path without allocating 65536 slots:
        // simulate by forcing the high water mark near the ceiling.
        mgr.high_water_mark = (MAX_ENTITIES - 1) as u32;
        mgr.alive = vec![true; MAX_ENTITIES - 1];
        mgr.generations = vec![0; MAX_ENTITIES - 1];
        mgr.live_count = MAX_ENTITIES - 1;
        assert!(mgr.spawn().is_ok());
        assert!(matches!(
            mgr.spawn(),
            Err(EcsError::CapacityExceeded { .. })
        ));
    }
}
