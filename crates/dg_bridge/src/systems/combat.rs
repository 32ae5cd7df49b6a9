//! Combat resolution (§4.16): processes every entity carrying an
//! `AttackRequest`, resolves damage against the target, and queues the
//! target's despawn through the command buffer on death rather than
//! despawning directly mid-system.

use dg_ecs::error::EcsError;
use dg_ecs::query::QueryDescriptor;
use dg_ecs::world::World;

use crate::components::{AttackRequest, CombatStats, Health};
use crate::events::GameEvent;
use crate::systems::{emit, GameRng, RNG_RESOURCE};

/// `max(1, attack - defense)`, doubled on a critical roll drawn from the
/// attacker's own `crit_chance`.
fn resolve_damage(attack: f32, defense: f32, crit_chance: f32, roll: f32) -> (f32, bool) {
    let base = (attack - defense).max(1.0);
    let critical = roll < crit_chance;
    (if critical { base * 2.0 } else { base }, critical)
}

pub fn combat_system(world: &mut World) -> Result<(), EcsError> {
    let Some(request_id) = world.components().id_of_type::<AttackRequest>() else {
        return Ok(());
    };

    let query = world.query(QueryDescriptor::new(vec![request_id], vec![]));
    let attackers: Vec<_> = world.execute(query).to_vec();

    for attacker in attackers {
        let Some(&AttackRequest { target }) = world.get_component::<AttackRequest>(attacker) else {
            continue;
        };

        if !world.is_alive(target) {
            world.remove_component::<AttackRequest>(attacker);
            continue;
        }

        let attacker_stats = world.get_component::<CombatStats>(attacker).copied().unwrap_or_default();
        let target_stats = world.get_component::<CombatStats>(target).copied().unwrap_or_default();

        let roll = match world.resource_mut::<GameRng>(RNG_RESOURCE) {
            Some(rng) => rng.roll(),
            None => 1.0, // no RNG resource configured: never crits
        };
        let (damage, critical) = resolve_damage(attacker_stats.attack, target_stats.defense, attacker_stats.crit_chance, roll);

        let mut died = false;
        if let Some(health) = world.get_component_mut::<Health>(target) {
            health.current = (health.current - damage).max(0.0);
            died = health.current <= 0.0;
        }

        emit(world, GameEvent::CombatDamage { attacker, target, damage, critical });
        if died {
            emit(world, GameEvent::EntityDied { entity: target, killer: attacker });
            world.commands().despawn(target);
        }

        world.remove_component::<AttackRequest>(attacker);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Position;

    fn setup() -> World {
        let mut world = World::new();
        world.register_component::<AttackRequest>().unwrap();
        world.register_component::<CombatStats>().unwrap();
        world.register_component::<Health>().unwrap();
        world.register_component::<Position>().unwrap();
        world
    }

    #[test]
    fn damage_formula_floors_at_one() {
        let (dmg, crit) = resolve_damage(2.0, 10.0, 0.1, 0.5);
        assert_eq!(dmg, 1.0);
        assert!(!crit);
    }

    #[test]
    fn damage_formula_doubles_on_crit() {
        let (dmg, crit) = resolve_damage(10.0, 0.0, 0.5, 0.1);
        assert_eq!(dmg, 20.0);
        assert!(crit);
    }

    #[test]
    fn attack_request_kills_target_and_queues_despawn() {
        let mut world = setup();
        let attacker = world.spawn().unwrap();
        world.set_component(attacker, CombatStats { attack: 10.0, defense: 0.0, crit_chance: 0.0 }).unwrap();

        let target = world.spawn().unwrap();
        world.set_component(target, Health { current: 5.0, max: 5.0 }).unwrap();
        world.set_component(target, CombatStats { attack: 0.0, defense: 0.0, crit_chance: 0.0 }).unwrap();

        world.set_component(attacker, AttackRequest { target }).unwrap();

        combat_system(&mut world).unwrap();

        let health = world.get_component::<Health>(target).unwrap();
        assert_eq!(health.current, 0.0);
        assert!(!world.has_component::<AttackRequest>(attacker));

        world.flush_commands().unwrap();
        assert!(!world.is_alive(target));
    }

    #[test]
    fn surviving_target_keeps_remaining_health() {
        let mut world = setup();
        let attacker = world.spawn().unwrap();
        world.set_component(attacker, CombatStats { attack: 4.0, defense: 0.0, crit_chance: 0.0 }).unwrap();

        let target = world.spawn().unwrap();
        world.set_component(target, Health { current: 20.0, max: 20.0 }).unwrap();
        world.set_component(target, CombatStats { attack: 0.0, defense: 1.0, crit_chance: 0.0 }).unwrap();
        world.set_component(attacker, AttackRequest { target }).unwrap();

        combat_system(&mut world).unwrap();
        world.flush_commands().unwrap();

        assert!(world.is_alive(target));
        assert_eq!(world.get_component::<Health>(target).unwrap().current, 17.0);
    }

    #[test]
    fn stale_target_clears_the_request_without_panicking() {
        let mut world = setup();
        let attacker = world.spawn().unwrap();
        let target = world.spawn().unwrap();
        world.despawn(target);
        world.set_component(attacker, AttackRequest { target }).unwrap();

        combat_system(&mut world).unwrap();
        assert!(!world.has_component::<AttackRequest>(attacker));
    }
}
