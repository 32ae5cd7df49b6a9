// hierarchy.rs - parent/child tree over the entity graph
//
// `Parent` and `Children` are ordinary components; `HierarchyManager` is a
// thin set of validated operations over them; there is no separate tree
// structure to keep in sync. `set_parent` rejects dead entities, self-parent,
// cycles (walked via ancestor `Parent` chains), and depths beyond a
// configurable limit (default 32, matching the recursion budget a stack-based
// despawn walk should tolerate). A `Parent` pointing at a despawned entity is
// never proactively cleaned up - `effective_parent` treats it as "no parent"
// and the stale component is purged the next time that entity's parent is
// written, which is cheaper than sweeping every despawn for dangling
// children.

use smallvec::SmallVec;
use serde::{Deserialize, Serialize};

use crate::component::{Component, ComponentSchema, FieldSchema, FieldType, FieldValue, StorageHint};
use crate::entity::Entity;
use crate::error::HierarchyError;
use crate::world::World;

pub const DEFAULT_MAX_DEPTH: u32 = 32;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Parent(pub Entity);

impl Component for Parent {
    const NAME: &'static str = "Parent";
    fn schema() -> ComponentSchema {
        ComponentSchema::new(
            "Parent",
            vec![FieldSchema {
                name: "entity".into(),
                ty: FieldType::EntityRef,
                default: FieldValue::EntityRef(u32::MAX),
            }],
            StorageHint::Auto,
        )
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Children(pub SmallVec<[Entity; 8]>);

impl Component for Children {
    const NAME: &'static str = "Children";
    fn schema() -> ComponentSchema {
        ComponentSchema::new(
            "Children",
            vec![FieldSchema {
                name: "entities".into(),
                ty: FieldType::Set,
                default: FieldValue::Set(Vec::new()),
            }],
            StorageHint::ForceAos,
        )
    }
}

pub struct HierarchyManager {
    max_depth: u32,
}

impl Default for HierarchyManager {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH }
    }
}

impl HierarchyManager {
    pub fn new(max_depth: u32) -> Self {
        Self { max_depth }
    }

    /// The live parent of `entity`, or `None` if it has no `Parent`
    /// component or that component points at a dead entity.
    pub fn effective_parent(&self, world: &World, entity: Entity) -> Option<Entity> {
        let parent = world.get_component::<Parent>(entity)?.0;
        world.is_alive(parent).then_some(parent)
    }

    fn depth_of(&self, world: &World, entity: Entity) -> u32 {
        let mut depth = 0;
        let mut current = entity;
        while let Some(parent) = self.effective_parent(world, current) {
            depth += 1;
            current = parent;
            if depth > self.max_depth {
                break;
            }
        }
        depth
    }

    /// Reparent `child` under `new_parent`, validating liveness, self-parent,
    /// cycles, and depth before mutating anything.
    pub fn set_parent(
        &self,
        world: &mut World,
        child: Entity,
        new_parent: Entity,
    ) -> Result<(), HierarchyError> {
        if !world.is_alive(child) || !world.is_alive(new_parent) {
            return Err(HierarchyError::DeadEntity);
        }
        if child == new_parent {
            return Err(HierarchyError::SelfParent);
        }

        let mut ancestor = Some(new_parent);
        let mut steps = 0;
        while let Some(current) = ancestor {
            if current == child {
                return Err(HierarchyError::CycleDetected);
            }
            steps += 1;
            if steps > self.max_depth {
                return Err(HierarchyError::DepthExceeded { limit: self.max_depth });
            }
            ancestor = self.effective_parent(world, current);
        }

        let new_depth = self.depth_of(world, new_parent) + 1;
        if new_depth > self.max_depth {
            return Err(HierarchyError::DepthExceeded { limit: self.max_depth });
        }

        if let Some(old_parent) = self.effective_parent(world, child) {
            self.detach_child(world, old_parent, child);
        }

        world.set_component(child, Parent(new_parent)).ok();
        let mut children = world.get_component::<Children>(new_parent).cloned().unwrap_or_default();
        if !children.0.contains(&child) {
            children.0.push(child);
        }
        world.set_component(new_parent, children).ok();
        Ok(())
    }

    fn detach_child(&self, world: &mut World, parent: Entity, child: Entity) {
        if let Some(mut children) = world.get_component::<Children>(parent).cloned() {
            children.0.retain(|&e| e != child);
            world.set_component(parent, children).ok();
        }
    }

    /// Remove `child`'s `Parent` and unlink it from its parent's `Children`,
    /// leaving it a root with no surviving references either direction.
    pub fn clear_parent(&self, world: &mut World, child: Entity) {
        if let Some(parent) = self.effective_parent(world, child) {
            self.detach_child(world, parent, child);
        }
        world.remove_component::<Parent>(child);
    }

    /// Despawn `root` and every descendant, leaves first: the deepest nodes
    /// in the subtree are despawned before their ancestors, so no system
    /// observes a despawn event for a child whose parent is already gone.
    pub fn despawn_recursive(&self, world: &mut World, root: Entity) {
        let mut order = Vec::new();
        let mut frontier = vec![root];
        while let Some(next) = frontier.pop() {
            order.push(next);
            if let Some(children) = world.get_component::<Children>(next) {
                frontier.extend(children.0.iter().copied());
            }
        }
        for entity in order.into_iter().rev() {
            world.despawn(entity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_parent_rejects_self_parent() {
        let mut world = World::new();
        world.register_component::<Parent>().unwrap();
        world.register_component::<Children>().unwrap();
        let e = world.spawn().unwrap();
        let hier = HierarchyManager::default();
        assert_eq!(hier.set_parent(&mut world, e, e), Err(HierarchyError::SelfParent));
    }

    #[test]
    fn set_parent_rejects_cycle() {
        let mut world = World::new();
        world.register_component::<Parent>().unwrap();
        world.register_component::<Children>().unwrap();
        let hier = HierarchyManager::default();
        let a = world.spawn().unwrap();
        let b = world.spawn().unwrap();
        hier.set_parent(&mut world, b, a).unwrap();
        assert_eq!(hier.set_parent(&mut world, a, b), Err(HierarchyError::CycleDetected));
    }

    #[test]
    fn despawn_recursive_removes_whole_subtree() {
        let mut world = World::new();
        world.register_component::<Parent>().unwrap();
        world.register_component::<Children>().unwrap();
        let hier = HierarchyManager::default();
        let root = world.spawn().unwrap();
        let child = world.spawn().unwrap();
        let grandchild = world.spawn().unwrap();
        hier.set_parent(&mut world, child, root).unwrap();
        hier.set_parent(&mut world, grandchild, child).unwrap();

        hier.despawn_recursive(&mut world, root);
        assert!(!world.is_alive(root));
        assert!(!world.is_alive(child));
        assert!(!world.is_alive(grandchild));
    }

    #[test]
    fn depth_limit_is_enforced() {
        let mut world = World::new();
        world.register_component::<Parent>().unwrap();
        world.register_component::<Children>().unwrap();
        let hier = HierarchyManager::new(2);
        let a = world.spawn().unwrap();
        let b = world.spawn().unwrap();
        let c = world.spawn().unwrap();
        hier.set_parent(&mut world, b, a).unwrap();
        hier.set_parent(&mut world, c, b).unwrap();
        let d = world.spawn().unwrap();
        assert_eq!(
            hier.set_parent(&mut world, d, c),
            Err(HierarchyError::DepthExceeded { limit: 2 })
        );
    }
}
