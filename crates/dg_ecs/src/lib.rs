//! Dungeon Engine ECS
//!
//! A data-oriented Entity-Component-System runtime built for the dungeon
//! engine's simulation layer:
//! - generational entity identifiers (16-bit slot / 16-bit generation)
//! - sparse-set component storage, SoA for all-primitive schemas and AoS
//!   for everything else
//! - cached multi-component queries with precise invalidation
//! - deferred command buffering for structural mutation during iteration
//! - phased system scheduling with topological ordering
//! - a typed event bus
//! - parent/child hierarchy management
//! - world (de)serialization with template-relative deltas

pub mod command;
pub mod component;
pub mod entity;
pub mod error;
pub mod events;
pub mod hierarchy;
pub mod query;
pub mod registry;
pub mod resources;
pub mod scheduler;
pub mod serialization;
pub mod storage;
pub mod world;

pub use command::{CommandBuffer, PendingEntity};
pub use component::{Component, ComponentSchema, FieldType, FieldValue, StorageHint};
pub use entity::{Entity, EntityManager, MAX_ENTITIES};
pub use error::{EcsError, HierarchyError};
pub use events::{EventBus, EventHandlerId};
pub use hierarchy::HierarchyManager;
pub use query::{QueryCache, QueryDescriptor, QueryId};
pub use registry::ComponentRegistry;
pub use scheduler::{Phase, Scheduler, System, SystemId};
pub use world::World;

/// Engine version, surfaced for diagnostics and save-file compatibility checks.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
