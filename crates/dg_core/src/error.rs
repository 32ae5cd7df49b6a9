//! Error taxonomy for the generation pipeline. Configuration problems are
//! returned as a structured validation report; a pass failing mid-run is
//! captured by the pipeline and returned as a failure result carrying the
//! partial trace - neither panics the caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
    pub severity: Severity,
}

impl Violation {
    pub fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: Severity::Warning,
        }
    }
}

/// The result of validating a `GenerationConfig`: a flat list of
/// violations. Generation refuses to run while any `Error`-severity
/// violation is present, unless the caller sets `skip_validation`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.violations.iter().any(|v| v.severity == Severity::Error)
    }

    pub fn push(&mut self, v: Violation) {
        self.violations.push(v);
    }
}

#[derive(Debug, Error)]
pub enum ProcgenError {
    #[error("configuration invalid: {0:?}")]
    InvalidConfig(ValidationReport),

    #[error("pass `{pass_id}` failed: {message}")]
    PassFailed { pass_id: String, message: String },

    #[error("generation cancelled after pass `{last_completed_pass}`")]
    Cancelled { last_completed_pass: String },
}
