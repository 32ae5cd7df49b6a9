// templates.rs - named pre-baked component sets used to construct
// entities. A template is just a function from (world, entity) to "attach
// my baseline components"; the bridge calls it once per instantiated spawn
// and then overrides Position with the spawn's actual location.

use std::collections::HashMap;

use dg_ecs::entity::Entity;
use dg_ecs::error::EcsError;
use dg_ecs::world::World;

use crate::components::{CombatStats, Health, Inventory, Name, Player, Position};

pub struct Template {
    name: String,
    apply: Box<dyn Fn(&mut World, Entity) -> Result<(), EcsError> + Send + Sync>,
}

impl Template {
    pub fn new(
        name: impl Into<String>,
        apply: impl Fn(&mut World, Entity) -> Result<(), EcsError> + Send + Sync + 'static,
    ) -> Self {
        Self { name: name.into(), apply: Box::new(apply) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, world: &mut World, entity: Entity) -> Result<(), EcsError> {
        (self.apply)(world, entity)
    }
}

#[derive(Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Template>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, template: Template) {
        self.templates.insert(template.name().to_string(), template);
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(|s| s.as_str())
    }
}

/// The name the bridge looks up to instantiate the player. A registry
/// passed to `load_dungeon` must contain a template under this name.
pub const PLAYER_TEMPLATE: &str = "player";

/// A small illustrative catalog covering the player plus one generic enemy
/// and one generic item template - real deployments supply their own
/// content-driven registry with the same shape.
pub fn default_templates() -> TemplateRegistry {
    let mut registry = TemplateRegistry::new();

    registry.register(Template::new(PLAYER_TEMPLATE, |world, entity| {
        world.set_component(entity, Player)?;
        world.set_component(entity, Position::default())?;
        world.set_component(entity, Health { current: 100.0, max: 100.0 })?;
        world.set_component(entity, CombatStats { attack: 5.0, defense: 2.0, crit_chance: 0.1 })?;
        world.set_component(entity, Inventory { items: Vec::new(), capacity: 16 })?;
        world.set_component(entity, Name("player".to_string()))?;
        Ok(())
    }));

    registry.register(Template::new("generic_enemy", |world, entity| {
        world.set_component(entity, Position::default())?;
        world.set_component(entity, Health { current: 20.0, max: 20.0 })?;
        world.set_component(entity, CombatStats { attack: 4.0, defense: 1.0, crit_chance: 0.05 })?;
        world.set_component(entity, Name("wandering enemy".to_string()))?;
        Ok(())
    }));

    registry.register(Template::new("generic_item", |world, entity| {
        world.set_component(entity, Position::default())?;
        world.set_component(entity, Name("item".to_string()))?;
        Ok(())
    }));

    registry
}
