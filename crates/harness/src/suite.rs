//! Suite lifecycle: ordered scenarios sharing one setup/teardown
//!
//! A suite owns the target context's lifecycle: setup creates it, every
//! scenario borrows it in turn, teardown releases it. Scenarios run strictly
//! sequentially, so the shared context is never touched by two scenarios at
//! once.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{error, info, warn};

use sitecheck_common::{Error, Outcome, Result, SuiteReport};

use crate::aggregate::ResultAggregator;
use crate::runner;
use crate::scenario::{BodyResult, Scenario};

/// Suite lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiteState {
    Created,
    SettingUp,
    Running,
    TearingDown,
    Completed,
}

/// What to do with the shared context after a scenario times out.
///
/// A timed-out scenario's action is abandoned mid-flight, so the context may
/// be in an arbitrary state. The conservative default reacquires it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeoutPolicy {
    #[default]
    ResetContext,
    Continue,
}

/// A target context the suite can hand to scenarios.
#[async_trait]
pub trait Target: Send + Sync + 'static {
    /// Reacquire a known-good state after a scenario was abandoned
    /// mid-action. The default is a no-op for stateless targets.
    async fn reset(&self) -> Result<()> {
        Ok(())
    }
}

impl Target for () {}

/// An ordered collection of scenarios sharing one setup/teardown.
pub struct Suite<C: Target> {
    name: String,
    scenarios: Vec<Scenario<C>>,
    state: SuiteState,
    timeout_policy: TimeoutPolicy,
    timeout_override: Option<Duration>,
}

impl<C: Target> Suite<C> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scenarios: Vec::new(),
            state: SuiteState::Created,
            timeout_policy: TimeoutPolicy::default(),
            timeout_override: None,
        }
    }

    pub fn with_timeout_policy(mut self, policy: TimeoutPolicy) -> Self {
        self.timeout_policy = policy;
        self
    }

    /// Replace every scenario's deadline with one suite-wide value
    /// (the CLI `--timeout` override).
    pub fn with_timeout_override(mut self, timeout: Option<Duration>) -> Self {
        self.timeout_override = timeout;
        self
    }

    /// Register a scenario. Names are unique within a suite; registration
    /// order is execution and report order. A rejected registration leaves
    /// the scenario list unchanged.
    pub fn register<F, Fut>(&mut self, name: impl Into<String>, timeout_ms: u64, body: F) -> Result<()>
    where
        F: Fn(Arc<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = BodyResult> + Send + 'static,
    {
        if self.state != SuiteState::Created {
            return Err(Error::InvalidConfig(
                "cannot register scenarios after the suite has started".to_string(),
            ));
        }

        let name = name.into();
        if self.scenarios.iter().any(|s| s.name() == name) {
            return Err(Error::DuplicateName(name));
        }

        let scenario = Scenario::new(name, timeout_ms, body)?;
        self.scenarios.push(scenario);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> SuiteState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn scenario_names(&self) -> Vec<String> {
        self.scenarios.iter().map(|s| s.name().to_string()).collect()
    }

    /// Execute the suite: setup once, every scenario in order, teardown once.
    ///
    /// Scenario-level faults are captured into the report and never abort
    /// the run; only a setup failure does (recorded as a suite-level fault,
    /// zero results, teardown skipped). Teardown runs unconditionally after
    /// the last scenario whenever setup succeeded; its failure is recorded
    /// but non-fatal.
    pub async fn run<S, FutS, T, FutT>(&mut self, setup: S, teardown: T) -> Result<SuiteReport>
    where
        S: FnOnce() -> FutS,
        FutS: Future<Output = Result<C>>,
        T: FnOnce(Arc<C>) -> FutT,
        FutT: Future<Output = Result<()>>,
    {
        if self.state != SuiteState::Created {
            return Err(Error::InvalidConfig(format!(
                "suite '{}' has already run",
                self.name
            )));
        }
        if self.timeout_override.is_some_and(|t| t.is_zero()) {
            return Err(Error::InvalidConfig(
                "suite timeout override must be positive".to_string(),
            ));
        }

        let start = Instant::now();
        let mut aggregator = ResultAggregator::new(self.name.clone(), self.scenario_names());

        self.state = SuiteState::SettingUp;
        info!(suite = %self.name, scenarios = self.scenarios.len(), "suite setup");

        let ctx = match setup().await {
            Ok(ctx) => Arc::new(ctx),
            Err(e) => {
                error!(suite = %self.name, "suite setup failed: {}", e);
                self.state = SuiteState::Completed;
                return Ok(aggregator
                    .into_setup_failed(e.to_string(), start.elapsed().as_millis() as u64));
            }
        };

        self.state = SuiteState::Running;

        for scenario in &self.scenarios {
            let deadline = self.timeout_override.unwrap_or(scenario.timeout());
            let result = runner::run_with_deadline(scenario, deadline, Arc::clone(&ctx)).await;

            let timed_out = matches!(result.outcome, Outcome::TimedOut);
            aggregator.record(result)?;

            // Post-timeout context state is unreliable; reacquire it before
            // the next scenario unless the policy says otherwise.
            if timed_out && self.timeout_policy == TimeoutPolicy::ResetContext {
                if let Err(e) = ctx.reset().await {
                    warn!(suite = %self.name, "context reset after timeout failed: {}", e);
                }
            }
        }

        self.state = SuiteState::TearingDown;
        let teardown_failure = match teardown(Arc::clone(&ctx)).await {
            Ok(()) => None,
            Err(e) => {
                warn!(suite = %self.name, "suite teardown failed: {}", e);
                Some(e.to_string())
            }
        };

        self.state = SuiteState::Completed;
        let totals = aggregator.totals();
        info!(
            suite = %self.name,
            passed = totals.passed,
            failed = totals.failed,
            errored = totals.errored,
            timed_out = totals.timed_out,
            "suite completed"
        );

        aggregator.finalize(start.elapsed().as_millis() as u64, teardown_failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_registration_leaves_suite_unchanged() {
        let mut suite: Suite<()> = Suite::new("shop");
        suite.register("loads-home", 5000, |_| async { Ok(()) }).unwrap();

        let err = suite
            .register("loads-home", 1000, |_| async { Ok(()) })
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateName(_)));
        assert_eq!(suite.len(), 1);
        assert_eq!(suite.scenario_names(), vec!["loads-home"]);
    }

    #[tokio::test]
    async fn test_invalid_timeout_rejected_at_registration() {
        let mut suite: Suite<()> = Suite::new("shop");
        let err = suite.register("zero", 0, |_| async { Ok(()) }).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert!(suite.is_empty());
    }

    #[tokio::test]
    async fn test_zero_timeout_override_rejected_at_run() {
        let mut suite: Suite<()> =
            Suite::new("shop").with_timeout_override(Some(Duration::from_millis(0)));
        suite.register("one", 1000, |_| async { Ok(()) }).unwrap();

        let err = suite
            .run(|| async { Ok(()) }, |_| async { Ok(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_suite_runs_only_once() {
        let mut suite: Suite<()> = Suite::new("shop");
        suite.register("one", 1000, |_| async { Ok(()) }).unwrap();

        suite
            .run(|| async { Ok(()) }, |_| async { Ok(()) })
            .await
            .unwrap();
        assert_eq!(suite.state(), SuiteState::Completed);

        let err = suite
            .run(|| async { Ok(()) }, |_| async { Ok(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
