//! Result aggregation into the suite report
//!
//! One slot per registered scenario keeps report order equal to registration
//! order no matter when results arrive, and makes double-recording
//! detectable.

use sitecheck_common::{Error, Result, ScenarioResult, SuiteReport, Totals};

/// Collects per-scenario results into a suite-level report.
pub struct ResultAggregator {
    suite_name: String,
    order: Vec<String>,
    slots: Vec<Option<ScenarioResult>>,
    totals: Totals,
    recorded: usize,
}

impl ResultAggregator {
    /// Create an aggregator for the given registration order.
    pub fn new(suite_name: impl Into<String>, names: Vec<String>) -> Self {
        let slots = names.iter().map(|_| None).collect();
        Self {
            suite_name: suite_name.into(),
            order: names,
            slots,
            totals: Totals::default(),
            recorded: 0,
        }
    }

    /// Record one scenario result. Recording twice for one scenario, or for
    /// a scenario that was never registered, is a caller bug.
    pub fn record(&mut self, result: ScenarioResult) -> Result<()> {
        let idx = self
            .order
            .iter()
            .position(|n| n == &result.name)
            .ok_or_else(|| {
                Error::InvalidConfig(format!(
                    "result recorded for unregistered scenario '{}'",
                    result.name
                ))
            })?;

        if self.slots[idx].is_some() {
            return Err(Error::DuplicateResult(result.name));
        }

        self.totals.count(&result.outcome);
        self.slots[idx] = Some(result);
        self.recorded += 1;
        Ok(())
    }

    pub fn recorded(&self) -> usize {
        self.recorded
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    /// Freeze the report. Fails unless every registered scenario has been
    /// attempted and recorded.
    pub fn finalize(
        self,
        overall_duration_ms: u64,
        teardown_failure: Option<String>,
    ) -> Result<SuiteReport> {
        if self.recorded != self.order.len() {
            return Err(Error::NotAllScenariosComplete {
                recorded: self.recorded,
                registered: self.order.len(),
            });
        }

        Ok(SuiteReport {
            suite_name: self.suite_name,
            results: self.slots.into_iter().flatten().collect(),
            totals: self.totals,
            overall_duration_ms,
            setup_failure: None,
            teardown_failure,
        })
    }

    /// Produce the report for a suite whose setup failed: zero results, a
    /// suite-level fault marker, and no teardown record (teardown never ran).
    pub fn into_setup_failed(self, cause: String, overall_duration_ms: u64) -> SuiteReport {
        SuiteReport {
            suite_name: self.suite_name,
            results: Vec::new(),
            totals: Totals::default(),
            overall_duration_ms,
            setup_failure: Some(cause),
            teardown_failure: None,
        }
    }
}
