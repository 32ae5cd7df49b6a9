//! Dungeon generation core: the seed bundle and RNG streams, the dungeon
//! data model (`Room`, `Connection`, `Dungeon`, `SpawnDescriptor`), the
//! generation configuration and its validation, and the pass/pipeline
//! framework every concrete generator in `dg_procgen` composes with.

pub mod config;
pub mod error;
pub mod metrics;
pub mod model;
pub mod pass;
pub mod pipeline;
pub mod rng;
pub mod seed;
pub mod snapshot;
pub mod trace;

pub use config::{Algorithm, BspConfig, CellularConfig, ContentConfig, GenerationConfig};
pub use error::{ProcgenError, Severity, ValidationReport, Violation};
pub use metrics::{PassCounts, PassMetrics};
pub use model::{compute_checksum, Connection, CorridorStyle, Dungeon, Room, RoomId, RoomType, SpawnDescriptor, SpawnKind, TileKind};
pub use pass::{CancellationToken, Context, Pass};
pub use pipeline::{Pipeline, PipelineResult};
pub use rng::{bernoulli, RngStreams, Stream};
pub use seed::SeedBundle;
pub use snapshot::{Snapshot, SnapshotCollector};
pub use trace::{Decision, DecisionSystem, NoopCollector, RecordingCollector, TraceCollector, TraceEvent, TraceEventType};
