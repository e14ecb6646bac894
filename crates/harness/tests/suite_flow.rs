//! Suite lifecycle integration tests against a stub storefront target.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use sitecheck_common::{Outcome, Result};
use sitecheck_harness::{ensure_eq, Suite, Target, TimeoutPolicy};

/// Stand-in for a browser/HTTP context: a title to read and a reset counter.
struct StubShop {
    title: String,
    resets: AtomicUsize,
}

impl StubShop {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            resets: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Target for StubShop {
    async fn reset(&self) -> Result<()> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn report_has_one_result_per_scenario_in_registration_order() {
    let mut suite: Suite<StubShop> = Suite::new("storefront");
    suite.register("first", 1000, |_| async { Ok(()) }).unwrap();
    suite
        .register("second", 1000, |_| async {
            ensure_eq("count mismatch", 1, 2)
        })
        .unwrap();
    suite
        .register("third", 100, |_| async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(())
        })
        .unwrap();
    suite
        .register("fourth", 1000, |_| async { panic!("kaboom") })
        .unwrap();

    let report = suite
        .run(|| async { Ok(StubShop::new("Shop")) }, |_| async { Ok(()) })
        .await
        .unwrap();

    let names: Vec<&str> = report.results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["first", "second", "third", "fourth"]);
    assert_eq!(report.totals.sum(), 4);
    assert_eq!(report.totals.passed, 1);
    assert_eq!(report.totals.failed, 1);
    assert_eq!(report.totals.timed_out, 1);
    assert_eq!(report.totals.errored, 1);
    assert!(report.setup_failure.is_none());
    assert!(report.teardown_failure.is_none());
}

#[tokio::test]
async fn setup_failure_yields_empty_report_and_skips_teardown() {
    let teardowns = Arc::new(AtomicUsize::new(0));
    let teardowns_seen = Arc::clone(&teardowns);

    let mut suite: Suite<StubShop> = Suite::new("storefront");
    suite.register("never-runs", 1000, |_| async { Ok(()) }).unwrap();

    let report = suite
        .run(
            || async {
                Err(sitecheck_common::Error::SetupFailed(
                    "fixture server did not become healthy".to_string(),
                ))
            },
            move |_| {
                let teardowns = Arc::clone(&teardowns_seen);
                async move {
                    teardowns.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            },
        )
        .await
        .unwrap();

    assert!(report.results.is_empty());
    assert_eq!(report.totals.sum(), 0);
    assert!(report
        .setup_failure
        .as_deref()
        .unwrap()
        .contains("did not become healthy"));
    assert_eq!(teardowns.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn teardown_runs_exactly_once_even_when_every_scenario_fails() {
    let teardowns = Arc::new(AtomicUsize::new(0));
    let teardowns_seen = Arc::clone(&teardowns);

    let mut suite: Suite<StubShop> = Suite::new("storefront");
    suite
        .register("fails", 1000, |_| async { ensure_eq("total", 10, 11) })
        .unwrap();
    suite
        .register("errors", 1000, |_| async { panic!("driver gone") })
        .unwrap();

    let report = suite
        .run(
            || async { Ok(StubShop::new("Shop")) },
            move |_| {
                let teardowns = Arc::clone(&teardowns_seen);
                async move {
                    teardowns.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            },
        )
        .await
        .unwrap();

    assert_eq!(teardowns.load(Ordering::SeqCst), 1);
    assert_eq!(report.totals.failed, 1);
    assert_eq!(report.totals.errored, 1);
}

#[tokio::test]
async fn teardown_failure_is_recorded_but_non_fatal() {
    let mut suite: Suite<StubShop> = Suite::new("storefront");
    suite.register("ok", 1000, |_| async { Ok(()) }).unwrap();

    let report = suite
        .run(
            || async { Ok(StubShop::new("Shop")) },
            |_| async {
                Err(sitecheck_common::Error::TeardownFailed(
                    "browser already dead".to_string(),
                ))
            },
        )
        .await
        .unwrap();

    assert_eq!(report.totals.passed, 1);
    assert!(report
        .teardown_failure
        .as_deref()
        .unwrap()
        .contains("browser already dead"));
}

#[tokio::test]
async fn timeout_resets_context_and_suite_continues() {
    let mut suite: Suite<StubShop> = Suite::new("storefront");
    suite
        .register("hangs", 50, |_| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .unwrap();
    suite.register("after", 1000, |_| async { Ok(()) }).unwrap();

    let ctx_probe = Arc::new(AtomicUsize::new(0));
    let probe = Arc::clone(&ctx_probe);

    let report = suite
        .run(
            || async { Ok(StubShop::new("Shop")) },
            move |ctx| {
                let probe = Arc::clone(&probe);
                async move {
                    probe.store(ctx.resets.load(Ordering::SeqCst), Ordering::SeqCst);
                    Ok(())
                }
            },
        )
        .await
        .unwrap();

    assert_eq!(report.results[0].outcome, Outcome::TimedOut);
    assert_eq!(report.results[1].outcome, Outcome::Passed);
    // Default policy reacquired the context after the one timeout
    assert_eq!(ctx_probe.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn continue_policy_skips_context_reset() {
    let mut suite: Suite<StubShop> =
        Suite::new("storefront").with_timeout_policy(TimeoutPolicy::Continue);
    suite
        .register("hangs", 50, |_| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .unwrap();

    let ctx_probe = Arc::new(AtomicUsize::new(usize::MAX));
    let probe = Arc::clone(&ctx_probe);

    suite
        .run(
            || async { Ok(StubShop::new("Shop")) },
            move |ctx| {
                let probe = Arc::clone(&probe);
                async move {
                    probe.store(ctx.resets.load(Ordering::SeqCst), Ordering::SeqCst);
                    Ok(())
                }
            },
        )
        .await
        .unwrap();

    assert_eq!(ctx_probe.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn suite_timeout_override_replaces_scenario_deadlines() {
    let mut suite: Suite<StubShop> =
        Suite::new("storefront").with_timeout_override(Some(Duration::from_millis(50)));
    suite
        .register("generous-deadline", 60_000, |_| async {
            tokio::time::sleep(Duration::from_millis(300)).await;
            Ok(())
        })
        .unwrap();

    let report = suite
        .run(|| async { Ok(StubShop::new("Shop")) }, |_| async { Ok(()) })
        .await
        .unwrap();

    assert_eq!(report.results[0].outcome, Outcome::TimedOut);
    assert!(report.results[0].duration_ms < 250);
}

#[tokio::test]
async fn loads_home_passes_against_matching_title() {
    let mut suite: Suite<StubShop> = Suite::new("storefront");
    suite
        .register("loads-home", 5000, |ctx: Arc<StubShop>| async move {
            ensure_eq("title mismatch", "Shop".to_string(), ctx.title.clone())
        })
        .unwrap();

    let report = suite
        .run(|| async { Ok(StubShop::new("Shop")) }, |_| async { Ok(()) })
        .await
        .unwrap();
    assert_eq!(report.results[0].outcome, Outcome::Passed);
    assert!(report.all_passed());
}

#[tokio::test]
async fn loads_home_fails_with_divergence_message() {
    let mut suite: Suite<StubShop> = Suite::new("storefront");
    suite
        .register("loads-home", 5000, |ctx: Arc<StubShop>| async move {
            ensure_eq("title mismatch", "Shop".to_string(), ctx.title.clone())
        })
        .unwrap();

    let report = suite
        .run(|| async { Ok(StubShop::new("Other")) }, |_| async { Ok(()) })
        .await
        .unwrap();
    assert_eq!(
        report.results[0].outcome,
        Outcome::Failed {
            message: "title mismatch: expected Shop got Other".to_string()
        }
    );
}

#[tokio::test]
async fn slow_search_times_out_at_deadline_not_body_duration() {
    let mut suite: Suite<StubShop> = Suite::new("storefront");
    suite
        .register("slow-search", 100, |_| async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(())
        })
        .unwrap();

    let report = suite
        .run(|| async { Ok(StubShop::new("Shop")) }, |_| async { Ok(()) })
        .await
        .unwrap();

    assert_eq!(report.results[0].outcome, Outcome::TimedOut);
    assert!(report.results[0].duration_ms >= 100);
    assert!(report.results[0].duration_ms < 400);
}
