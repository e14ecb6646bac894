//! Report data model: outcomes, per-scenario results, and the suite report.
//!
//! The suite report is the single structured artifact a run produces. It is
//! serializable as-is, so the file sink can write it verbatim and external
//! renderers can consume it without knowledge of the harness.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Terminal classification of one scenario execution.
///
/// Exactly one variant is produced per scenario run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Body completed and every assertion held
    Passed,
    /// An assertion inside the body did not hold
    Failed { message: String },
    /// An unexpected fault from the action layer (or a panic in the body)
    Errored { cause: String },
    /// The deadline elapsed before the body completed
    TimedOut,
}

impl Outcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Passed)
    }

    /// Short tag for log lines and table cells
    pub fn tag(&self) -> &'static str {
        match self {
            Outcome::Passed => "passed",
            Outcome::Failed { .. } => "failed",
            Outcome::Errored { .. } => "errored",
            Outcome::TimedOut => "timed_out",
        }
    }

    /// The assertion message or fault cause, if this outcome carries one
    pub fn message(&self) -> Option<&str> {
        match self {
            Outcome::Failed { message } => Some(message),
            Outcome::Errored { cause } => Some(cause),
            _ => None,
        }
    }
}

/// Result of a single scenario execution. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub duration_ms: u64,
    pub started_at: DateTime<Utc>,
}

/// Per-outcome counters for a suite run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub timed_out: usize,
}

impl Totals {
    /// Count one outcome
    pub fn count(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Passed => self.passed += 1,
            Outcome::Failed { .. } => self.failed += 1,
            Outcome::Errored { .. } => self.errored += 1,
            Outcome::TimedOut => self.timed_out += 1,
        }
    }

    pub fn sum(&self) -> usize {
        self.passed + self.failed + self.errored + self.timed_out
    }
}

/// Aggregated report for one suite run.
///
/// Results appear in registration order. `setup_failure` is set (and
/// `results` empty) when suite setup failed and no scenario ran.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub suite_name: String,
    pub results: Vec<ScenarioResult>,
    pub totals: Totals,
    pub overall_duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup_failure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teardown_failure: Option<String>,
}

impl SuiteReport {
    pub fn all_passed(&self) -> bool {
        self.setup_failure.is_none() && self.totals.sum() == self.totals.passed
    }

    /// True when something worse than an assertion failure happened:
    /// an action-layer fault, a timeout, or a suite-level setup fault.
    pub fn has_faults(&self) -> bool {
        self.setup_failure.is_some() || self.totals.errored > 0 || self.totals.timed_out > 0
    }
}
