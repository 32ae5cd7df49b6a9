//! Pass tracing: structured decisions, warnings, and artifact summaries
//! recorded as a pipeline runs. A [`NoopCollector`] is used when tracing is
//! disabled and must not allocate on its start/end paths; a
//! [`RecordingCollector`] keeps every event for later inspection.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraceEventType {
    Start,
    End,
    Decision,
    Artifact,
    Warning,
}

/// The closed set of subsystems a structured decision can be attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionSystem {
    Layout,
    RoomPlacement,
    Connectivity,
    CorridorCarving,
    Enrichment,
    Simulation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub system: DecisionSystem,
    pub question: String,
    pub options: Vec<String>,
    pub chosen: String,
    pub reason: String,
    pub confidence: f32,
    pub rng_consumed: u32,
    pub context: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    pub timestamp_ms: u64,
    pub pass_id: String,
    pub event_type: TraceEventType,
    pub data: Option<Value>,
    pub decision: Option<Decision>,
}

/// Anything that can record pipeline trace events. Implemented by both the
/// no-op collector (tracing disabled) and the recording collector (tracing
/// enabled); `Pipeline::execute` only ever talks to this trait.
pub trait TraceCollector {
    fn pass_start(&mut self, pass_id: &str, timestamp_ms: u64);
    fn pass_end(&mut self, pass_id: &str, timestamp_ms: u64);
    fn decision(&mut self, pass_id: &str, timestamp_ms: u64, decision: Decision);
    fn warning(&mut self, pass_id: &str, timestamp_ms: u64, message: &str);
    fn artifact(&mut self, pass_id: &str, timestamp_ms: u64, summary: Value);
    fn events(&self) -> &[TraceEvent];
}

/// Zero-allocation no-op, used when `GenerationConfig::trace` is false.
#[derive(Default)]
pub struct NoopCollector;

impl TraceCollector for NoopCollector {
    #[inline]
    fn pass_start(&mut self, _pass_id: &str, _timestamp_ms: u64) {}
    #[inline]
    fn pass_end(&mut self, _pass_id: &str, _timestamp_ms: u64) {}
    #[inline]
    fn decision(&mut self, _pass_id: &str, _timestamp_ms: u64, _decision: Decision) {}
    #[inline]
    fn warning(&mut self, _pass_id: &str, _timestamp_ms: u64, _message: &str) {}
    #[inline]
    fn artifact(&mut self, _pass_id: &str, _timestamp_ms: u64, _summary: Value) {}
    #[inline]
    fn events(&self) -> &[TraceEvent] {
        &[]
    }
}

#[derive(Default)]
pub struct RecordingCollector {
    events: Vec<TraceEvent>,
}

impl RecordingCollector {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, pass_id: &str, timestamp_ms: u64, event_type: TraceEventType, data: Option<Value>, decision: Option<Decision>) {
        self.events.push(TraceEvent {
            timestamp_ms,
            pass_id: pass_id.to_string(),
            event_type,
            data,
            decision,
        });
    }
}

impl TraceCollector for RecordingCollector {
    fn pass_start(&mut self, pass_id: &str, timestamp_ms: u64) {
        self.push(pass_id, timestamp_ms, TraceEventType::Start, None, None);
    }

    fn pass_end(&mut self, pass_id: &str, timestamp_ms: u64) {
        self.push(pass_id, timestamp_ms, TraceEventType::End, None, None);
    }

    fn decision(&mut self, pass_id: &str, timestamp_ms: u64, decision: Decision) {
        self.push(pass_id, timestamp_ms, TraceEventType::Decision, None, Some(decision));
    }

    fn warning(&mut self, pass_id: &str, timestamp_ms: u64, message: &str) {
        self.push(pass_id, timestamp_ms, TraceEventType::Warning, Some(Value::String(message.to_string())), None);
    }

    fn artifact(&mut self, pass_id: &str, timestamp_ms: u64, summary: Value) {
        self.push(pass_id, timestamp_ms, TraceEventType::Artifact, Some(summary), None);
    }

    fn events(&self) -> &[TraceEvent] {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_collector_records_nothing() {
        let mut c = NoopCollector;
        c.pass_start("p", 0);
        c.warning("p", 0, "uh oh");
        assert!(c.events().is_empty());
    }

    #[test]
    fn recording_collector_preserves_order() {
        let mut c = RecordingCollector::new();
        c.pass_start("a", 0);
        c.pass_end("a", 5);
        c.pass_start("b", 5);
        assert_eq!(c.events().len(), 3);
        assert_eq!(c.events()[0].pass_id, "a");
        assert!(matches!(c.events()[0].event_type, TraceEventType::Start));
        assert!(matches!(c.events()[2].event_type, TraceEventType::Start));
    }
}
