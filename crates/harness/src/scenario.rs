//! Scenario definition and assertion helpers

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use thiserror::Error;

use sitecheck_common::{Error, Result};

/// Fault raised by a scenario body.
///
/// The runner maps `Assertion` to `Outcome::Failed` and `Action` to
/// `Outcome::Errored`; a body never observes or swallows this distinction
/// itself.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// An expectation did not hold (expected vs actual divergence)
    #[error("{0}")]
    Assertion(String),

    /// An unexpected fault from the action layer
    #[error(transparent)]
    Action(#[from] Error),
}

/// What a scenario body resolves to.
pub type BodyResult = std::result::Result<(), ScenarioError>;

/// Boxed scenario body: async work against a shared context.
pub type ScenarioBody<C> = Arc<dyn Fn(Arc<C>) -> BoxFuture<'static, BodyResult> + Send + Sync>;

/// A named unit of work: ordered actions plus assertions, run under a
/// deadline. Immutable once registered in a suite.
pub struct Scenario<C> {
    name: String,
    timeout: Duration,
    body: ScenarioBody<C>,
}

impl<C> Scenario<C> {
    /// Create a scenario. `timeout_ms` must be a positive integer.
    pub fn new<F, Fut>(name: impl Into<String>, timeout_ms: u64, body: F) -> Result<Self>
    where
        F: Fn(Arc<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = BodyResult> + Send + 'static,
    {
        let name = name.into();
        if timeout_ms == 0 {
            return Err(Error::InvalidConfig(format!(
                "scenario '{}' has a zero timeout",
                name
            )));
        }

        Ok(Self {
            name,
            timeout: Duration::from_millis(timeout_ms),
            body: Arc::new(move |ctx| -> BoxFuture<'static, BodyResult> {
                Box::pin(body(ctx))
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub(crate) fn body(&self) -> ScenarioBody<C> {
        Arc::clone(&self.body)
    }
}

impl<C> std::fmt::Debug for Scenario<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Fail the scenario with `message` unless `condition` holds.
pub fn ensure(condition: bool, message: impl Into<String>) -> BodyResult {
    if condition {
        Ok(())
    } else {
        Err(ScenarioError::Assertion(message.into()))
    }
}

/// Assert equality, reporting the divergence as
/// `"<what>: expected <expected> got <actual>"`.
pub fn ensure_eq<T: PartialEq + Display>(what: &str, expected: T, actual: T) -> BodyResult {
    if expected == actual {
        Ok(())
    } else {
        Err(ScenarioError::Assertion(format!(
            "{}: expected {} got {}",
            what, expected, actual
        )))
    }
}

/// Assert that `haystack` contains `needle`.
pub fn ensure_contains(what: &str, haystack: &str, needle: &str) -> BodyResult {
    if haystack.contains(needle) {
        Ok(())
    } else {
        Err(ScenarioError::Assertion(format!(
            "{}: expected text containing '{}' got '{}'",
            what, needle, haystack
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_timeout_rejected() {
        let result = Scenario::<()>::new("bad", 0, |_| async { Ok(()) });
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_ensure_eq_message_shape() {
        let err = ensure_eq("title mismatch", "Shop", "Other").unwrap_err();
        assert_eq!(
            err.to_string(),
            "title mismatch: expected Shop got Other"
        );
    }

    #[test]
    fn test_ensure_passes_through() {
        assert!(ensure(true, "unused").is_ok());
        assert!(ensure(false, "nope").is_err());
        assert!(ensure_contains("body", "hello world", "world").is_ok());
    }
}
