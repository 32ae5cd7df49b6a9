// error.rs - ECS failure taxonomy
//
// Per the failure model: stale handles and double-despawn degrade silently;
// capacity, duplicate registration, missing stores and scheduler cycles are
// programmer mistakes and surface as errors (or panics at the boundary that
// caught them); hierarchy operations return tagged results instead of
// throwing since cycle/depth rejection is routine, expected control flow.

use thiserror::Error;

use crate::component::ComponentId;

#[derive(Debug, Error)]
pub enum EcsError {
    #[error("entity capacity exceeded: at most {max_entities} entities may be alive at once")]
    CapacityExceeded { max_entities: usize },

    #[error("component '{name}' is already registered with a different schema")]
    DuplicateComponentRegistration { name: String },

    #[error("no store registered for component '{name}'")]
    MissingComponentStore { name: String },

    #[error("component '{name}' expects storage kind {expected:?} but schema requests {requested:?}")]
    StorageKindMismatch {
        name: String,
        expected: &'static str,
        requested: &'static str,
    },

    #[error("dependency cycle detected among systems in phase {phase}: {cycle}")]
    SchedulerCycle { phase: String, cycle: String },

    #[error("resource '{name}' not found")]
    MissingResource { name: String },

    #[error("pending entity handle {0:?} was never resolved by the command buffer")]
    UnresolvedPendingEntity(u32),

    #[error("serialized world format version '{found}' is not supported (expected '{expected}')")]
    UnsupportedSaveVersion { found: String, expected: String },

    #[error("template '{0}' not found")]
    UnknownTemplate(String),

    #[error("failed to deserialize component '{name}': {reason}")]
    ComponentDeserializeFailed { name: String, reason: String },
}

/// Tagged outcome for hierarchy operations - never thrown, per §4.13/§4.17.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("entity is not alive")]
    DeadEntity,

    #[error("an entity cannot be its own parent")]
    SelfParent,

    #[error("CYCLE_DETECTED: new parent is a descendant of the entity")]
    CycleDetected,

    #[error("hierarchy depth limit ({limit}) exceeded")]
    DepthExceeded { limit: u32 },
}

/// A component id referenced by an error but not found - kept distinct from
/// `EcsError` so callers that only care about query/store plumbing don't
/// need to match on hierarchy or serialization variants too.
#[derive(Debug, Error)]
#[error("component id {0} is not registered")]
pub struct UnknownComponentId(pub ComponentId);
