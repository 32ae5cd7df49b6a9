//! The pass/context contract every generator and post-processor programs
//! against: a pure `(input, context) -> output` transform plus the shared
//! mutable context (RNG streams, config, trace, cancellation) it runs under.
//!
//! A pass must never mutate its input in place; artifacts are value types
//! and ownership moves from one pass to the next through the pipeline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::config::GenerationConfig;
use crate::error::ProcgenError;
use crate::metrics::{PassCounts, PassMetrics};
use crate::rng::RngStreams;
use crate::seed::SeedBundle;
use crate::snapshot::SnapshotCollector;
use crate::trace::TraceCollector;

/// Checked between passes (never mid-pass) by `Pipeline::execute`. A sync
/// caller that never shares a token simply never observes cancellation,
/// matching the "sync execution does not honor cancellation" contract.
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Shared mutable state threaded through every pass in a pipeline run.
/// Owns the four RNG streams, the immutable config, the trace collector,
/// and an optional cancellation token. One `Context` belongs to exactly
/// one pipeline run and must not be shared across concurrent runs.
pub struct Context<'a> {
    pub rng: RngStreams,
    pub config: &'a GenerationConfig,
    pub seed: SeedBundle,
    pub trace: &'a mut dyn TraceCollector,
    pub cancellation: Option<CancellationToken>,
    pub snapshots: SnapshotCollector,
    pub pass_metrics: Vec<PassMetrics>,
    pub pass_index: usize,
    started_at: Instant,
}

impl<'a> Context<'a> {
    pub fn new(config: &'a GenerationConfig, trace: &'a mut dyn TraceCollector) -> Self {
        let seed = config.seed;
        Self {
            rng: RngStreams::from_seed(&seed),
            config,
            seed,
            trace,
            cancellation: None,
            snapshots: SnapshotCollector::new(config.snapshots),
            pass_metrics: Vec::new(),
            pass_index: 0,
            started_at: Instant::now(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Milliseconds elapsed since this context was created. Timestamps are
    /// wall-clock, used only for trace/snapshot/metrics bookkeeping -
    /// determinism of the generated artifact never depends on timing.
    pub fn now_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }
}

/// A pure transform from one artifact type to another. `In`/`Out` are
/// value-typed and owned; `run` takes `input` by value so there is no way
/// for a pass to retain and later mutate an artifact another pass still
/// holds.
pub trait Pass<In, Out> {
    fn id(&self) -> &'static str;

    fn run(&self, input: In, ctx: &mut Context) -> Result<Out, ProcgenError>;

    /// Lightweight counts extracted from `output`, merged into this pass's
    /// metrics entry. Default: no counts (e.g. a pass that only tweaks
    /// internal bookkeeping with nothing worth dashboarding).
    fn metrics(&self, _output: &Out) -> PassCounts {
        PassCounts::default()
    }

    /// An independent terrain copy for snapshotting, when `output` carries
    /// terrain and `ctx.config.snapshots` is set. Default: none.
    fn snapshot_terrain(&self, _output: &Out) -> Option<Vec<u8>> {
        None
    }
}
