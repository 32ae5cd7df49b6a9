//! Per-pass metrics: cheap counts emitted after every pass, suitable for
//! dashboards even when full tracing/snapshots are off.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassCounts {
    pub rooms: usize,
    pub connections: usize,
    pub spawns: usize,
    pub floor_ratio: f32,
    pub custom: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassMetrics {
    pub pass_id: String,
    pub duration_ms: f64,
    pub room_count: usize,
    pub connection_count: usize,
    pub spawn_count: usize,
    pub floor_ratio: f32,
    pub custom: Map<String, Value>,
}

impl PassMetrics {
    pub fn new(pass_id: impl Into<String>, duration_ms: f64, counts: PassCounts) -> Self {
        Self {
            pass_id: pass_id.into(),
            duration_ms,
            room_count: counts.rooms,
            connection_count: counts.connections,
            spawn_count: counts.spawns,
            floor_ratio: counts.floor_ratio,
            custom: counts.custom,
        }
    }
}
