//! Scenario execution under a deadline
//!
//! Runs a single scenario body and normalizes whatever happens (completion,
//! assertion failure, action fault, panic, or deadline) into exactly one
//! `Outcome`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::time::timeout;
use tracing::{debug, warn};

use sitecheck_common::{Outcome, ScenarioResult};

use crate::scenario::{Scenario, ScenarioError};

/// Run one scenario against `ctx` under its configured timeout.
pub async fn run_scenario<C: Send + Sync + 'static>(
    scenario: &Scenario<C>,
    ctx: Arc<C>,
) -> ScenarioResult {
    run_with_deadline(scenario, scenario.timeout(), ctx).await
}

/// Run one scenario with an explicit deadline (suite-level timeout override).
///
/// The body runs as a spawned task so a panic surfaces as a join error
/// rather than unwinding through the suite, and so the deadline can abort
/// the in-flight work. Abortion is best-effort: external side effects of an
/// abandoned action are not undone.
pub async fn run_with_deadline<C: Send + Sync + 'static>(
    scenario: &Scenario<C>,
    deadline: Duration,
    ctx: Arc<C>,
) -> ScenarioResult {
    let started_at = Utc::now();
    let start = Instant::now();

    debug!(scenario = scenario.name(), "running scenario");

    let body = scenario.body();
    let mut task = tokio::spawn(body(ctx));

    let outcome = match timeout(deadline, &mut task).await {
        Ok(Ok(Ok(()))) => Outcome::Passed,
        Ok(Ok(Err(ScenarioError::Assertion(message)))) => Outcome::Failed { message },
        Ok(Ok(Err(ScenarioError::Action(e)))) => Outcome::Errored {
            cause: e.to_string(),
        },
        Ok(Err(join_err)) => Outcome::Errored {
            cause: panic_cause(join_err),
        },
        Err(_) => {
            task.abort();
            warn!(
                scenario = scenario.name(),
                deadline_ms = deadline.as_millis() as u64,
                "scenario timed out, abandoning in-flight action"
            );
            Outcome::TimedOut
        }
    };

    ScenarioResult {
        name: scenario.name().to_string(),
        outcome,
        duration_ms: start.elapsed().as_millis() as u64,
        started_at,
    }
}

fn panic_cause(err: tokio::task::JoinError) -> String {
    if err.is_panic() {
        let payload = err.into_panic();
        if let Some(s) = payload.downcast_ref::<&str>() {
            format!("panic: {}", s)
        } else if let Some(s) = payload.downcast_ref::<String>() {
            format!("panic: {}", s)
        } else {
            "panic in scenario body".to_string()
        }
    } else {
        "scenario task cancelled".to_string()
    }
}
