//! Illustrative game systems (§4.16): ordinary user systems from the ECS's
//! point of view, following the same `FnMut(&mut World) -> Result<(),
//! EcsError>` contract every `System` wraps. They exist to exercise the
//! bridge's component/event set end to end, not to be a complete combat or
//! interaction design - a real game replaces them with its own systems
//! registered on the same scheduler.

mod combat;
mod interaction;

pub use combat::combat_system;
pub use interaction::interaction_system;

use dg_ecs::events::EventBus;
use rand::RngCore;
use rand_chacha::ChaCha8Rng;

use crate::events::GameEvent;

/// The resource name game systems look up their shared event bus under.
/// `load_dungeon` doesn't insert this itself - a caller wiring up a world
/// for play inserts `EventBus::<GameEvent>::new()` here before running the
/// scheduler, the same way it supplies `GameMap`.
pub const EVENTS_RESOURCE: &str = "Events";

/// The resource name game systems look up their shared RNG under, for
/// rolls that must not perturb the four generation-time streams (combat
/// crits, anything else decided after the dungeon is already built).
pub const RNG_RESOURCE: &str = "Rng";

/// A world resource wrapping the turn-time RNG stream. Distinct from the
/// generation pipeline's four `dg_core::RngStreams` - those are owned by a
/// pipeline run and gone once generation finishes; this one lives as long
/// as the world does.
pub struct GameRng(pub ChaCha8Rng);

impl GameRng {
    pub fn from_seed(seed: u64) -> Self {
        use rand::SeedableRng;
        Self(ChaCha8Rng::seed_from_u64(seed))
    }

    /// A uniform draw in `[0, 1)`, used for probability rolls (crit chance,
    /// Bernoulli-style gates) the way `dg_core::rng::bernoulli` is used in
    /// the generation streams.
    pub fn roll(&mut self) -> f32 {
        (self.0.next_u32() as f32) / (u32::MAX as f32 + 1.0)
    }
}

pub(crate) fn emit(world: &mut dg_ecs::world::World, event: GameEvent) {
    if let Some(bus) = world.resource_mut::<EventBus<GameEvent>>(EVENTS_RESOURCE) {
        bus.emit(event);
    }
}
