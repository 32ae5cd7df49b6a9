//! The typed linear pipeline builder: `pipe` chains an unconditional pass,
//! `when` runs a same-type pass only if a runtime predicate holds (and
//! otherwise leaves the artifact identical to the input of that pass).
//! `execute` drives the whole chain and always returns a [`PipelineResult`]
//! carrying duration, trace events, snapshots, and metrics - on both the
//! success and failure path.

use crate::error::ProcgenError;
use crate::metrics::PassMetrics;
use crate::pass::{Context, Pass};
use crate::snapshot::Snapshot;
use crate::trace::TraceEvent;

type Step<In, Out> = Box<dyn Fn(In, &mut Context) -> Result<Out, ProcgenError>>;

pub struct Pipeline<In, Out> {
    run: Step<In, Out>,
    pass_ids: Vec<&'static str>,
}

impl<In: 'static> Pipeline<In, In> {
    /// The empty pipeline: `execute` just returns its input unchanged.
    pub fn new() -> Self {
        Self {
            run: Box::new(|input, _ctx| Ok(input)),
            pass_ids: Vec::new(),
        }
    }
}

impl<In: 'static> Default for Pipeline<In, In> {
    fn default() -> Self {
        Self::new()
    }
}

impl<In: 'static, Out: 'static> Pipeline<In, Out> {
    /// Append an unconditional pass. Runs after every prior stage,
    /// recording a start/end trace pair, a metrics entry, and (if enabled)
    /// a snapshot.
    pub fn pipe<NextOut: 'static>(self, pass: impl Pass<Out, NextOut> + 'static) -> Pipeline<In, NextOut> {
        let prev = self.run;
        let mut pass_ids = self.pass_ids;
        pass_ids.push(pass.id());

        Pipeline {
            run: Box::new(move |input, ctx| {
                let mid = prev(input, ctx)?;
                run_one(&pass, mid, ctx)
            }),
            pass_ids,
        }
    }

    /// Append a pass that only runs if `predicate(&artifact)` holds at
    /// that point; otherwise the artifact is passed through unchanged.
    /// Because the skip branch must produce the same type as the input,
    /// `when` only accepts passes whose input and output types match -
    /// every non-boundary pass in this pipeline's domain is exactly such a
    /// same-type transform (see DESIGN.md).
    pub fn when(self, predicate: impl Fn(&Out) -> bool + 'static, pass: impl Pass<Out, Out> + 'static) -> Pipeline<In, Out> {
        let prev = self.run;
        let mut pass_ids = self.pass_ids;
        pass_ids.push(pass.id());

        Pipeline {
            run: Box::new(move |input, ctx| {
                let mid = prev(input, ctx)?;
                if predicate(&mid) {
                    run_one(&pass, mid, ctx)
                } else {
                    Ok(mid)
                }
            }),
            pass_ids,
        }
    }

    pub fn pass_ids(&self) -> &[&'static str] {
        &self.pass_ids
    }

    pub fn execute(self, input: In, config: &crate::config::GenerationConfig, trace: &mut dyn crate::trace::TraceCollector) -> PipelineResult<Out> {
        let mut ctx = Context::new(config, trace);
        self.execute_with_context(input, &mut ctx)
    }

    /// Runs the pipeline against a caller-constructed `Context` - used when
    /// the caller wants to supply a cancellation token or reuse RNG state
    /// across runs.
    pub fn execute_with_context(self, input: In, ctx: &mut Context) -> PipelineResult<Out> {
        let start = ctx.now_ms();
        let outcome = (self.run)(input, ctx);
        let duration_ms = (ctx.now_ms() - start) as f64;

        PipelineResult {
            outcome,
            duration_ms,
            trace_events: ctx.trace.events().to_vec(),
            snapshots: std::mem::replace(&mut ctx.snapshots, crate::snapshot::SnapshotCollector::new(false)).into_vec(),
            metrics: std::mem::take(&mut ctx.pass_metrics),
        }
    }
}

fn run_one<Mid: 'static, Out: 'static, P: Pass<Mid, Out>>(pass: &P, mid: Mid, ctx: &mut Context) -> Result<Out, ProcgenError> {
    if let Some(token) = &ctx.cancellation {
        if token.is_cancelled() {
            let last = ctx.pass_metrics.last().map(|m| m.pass_id.clone()).unwrap_or_default();
            return Err(ProcgenError::Cancelled { last_completed_pass: last });
        }
    }

    let pass_start = ctx.now_ms();
    ctx.trace.pass_start(pass.id(), pass_start);
    let out = pass.run(mid, ctx)?;
    let pass_end = ctx.now_ms();
    ctx.trace.pass_end(pass.id(), pass_end);

    let counts = pass.metrics(&out);
    ctx.pass_index += 1;
    if ctx.snapshots.enabled() {
        let terrain = pass.snapshot_terrain(&out);
        ctx.snapshots.capture(pass.id(), ctx.pass_index, pass_end, counts.rooms, counts.connections, terrain);
    }
    ctx.pass_metrics.push(PassMetrics::new(pass.id(), (pass_end - pass_start) as f64, counts));

    Ok(out)
}

pub struct PipelineResult<Out> {
    pub outcome: Result<Out, ProcgenError>,
    pub duration_ms: f64,
    pub trace_events: Vec<TraceEvent>,
    pub snapshots: Vec<Snapshot>,
    pub metrics: Vec<PassMetrics>,
}

impl<Out> PipelineResult<Out> {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationConfig;
    use crate::trace::NoopCollector;

    struct AddOne;
    impl Pass<i32, i32> for AddOne {
        fn id(&self) -> &'static str {
            "add_one"
        }
        fn run(&self, input: i32, _ctx: &mut Context) -> Result<i32, ProcgenError> {
            Ok(input + 1)
        }
    }

    struct Double;
    impl Pass<i32, i32> for Double {
        fn id(&self) -> &'static str {
            "double"
        }
        fn run(&self, input: i32, _ctx: &mut Context) -> Result<i32, ProcgenError> {
            Ok(input * 2)
        }
    }

    struct AlwaysFails;
    impl Pass<i32, i32> for AlwaysFails {
        fn id(&self) -> &'static str {
            "always_fails"
        }
        fn run(&self, _input: i32, _ctx: &mut Context) -> Result<i32, ProcgenError> {
            Err(ProcgenError::PassFailed {
                pass_id: "always_fails".into(),
                message: "boom".into(),
            })
        }
    }

    #[test]
    fn pipe_chains_in_order() {
        let cfg = GenerationConfig::default();
        let mut trace = NoopCollector;
        let pipeline = Pipeline::<i32, i32>::new().pipe(AddOne).pipe(Double);
        let result = pipeline.execute(1, &cfg, &mut trace);
        assert_eq!(result.outcome.unwrap(), 4); // (1+1)*2
        assert_eq!(result.metrics.len(), 2);
    }

    #[test]
    fn when_false_leaves_artifact_identical_to_input_of_pass() {
        let cfg = GenerationConfig::default();
        let mut trace = NoopCollector;
        let pipeline = Pipeline::<i32, i32>::new().pipe(AddOne).when(|_| false, Double);
        let result = pipeline.execute(1, &cfg, &mut trace);
        assert_eq!(result.outcome.unwrap(), 2); // AddOne ran, Double skipped
    }

    #[test]
    fn when_true_runs_the_pass() {
        let cfg = GenerationConfig::default();
        let mut trace = NoopCollector;
        let pipeline = Pipeline::<i32, i32>::new().pipe(AddOne).when(|_| true, Double);
        let result = pipeline.execute(1, &cfg, &mut trace);
        assert_eq!(result.outcome.unwrap(), 4);
    }

    #[test]
    fn pass_failure_surfaces_as_result_error_with_partial_metrics() {
        let cfg = GenerationConfig::default();
        let mut trace = NoopCollector;
        let pipeline = Pipeline::<i32, i32>::new().pipe(AddOne).pipe(AlwaysFails).pipe(Double);
        let result = pipeline.execute(1, &cfg, &mut trace);
        assert!(result.outcome.is_err());
        // AddOne ran and recorded metrics; AlwaysFails and Double did not complete.
        assert_eq!(result.metrics.len(), 1);
    }
}
