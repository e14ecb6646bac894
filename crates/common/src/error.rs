//! Error types for sitecheck

use thiserror::Error;

/// Result type alias using sitecheck Error
pub type Result<T> = std::result::Result<T, Error>;

/// sitecheck error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Scenario '{0}' is already registered")]
    DuplicateName(String),

    #[error("Result for scenario '{0}' was already recorded")]
    DuplicateResult(String),

    #[error("Report finalized early: {recorded} of {registered} scenarios recorded")]
    NotAllScenariosComplete { recorded: usize, registered: usize },

    #[error("Suite setup failed: {0}")]
    SetupFailed(String),

    #[error("Suite teardown failed: {0}")]
    TeardownFailed(String),

    #[error("Report sink write failed: {0}")]
    SinkWrite(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Browser driver error: {0}")]
    Driver(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Timed out waiting for: {0}")]
    WaitTimeout(String),

    #[error("Scenario script error: {0}")]
    Script(String),

    #[error("Fixture server error: {0}")]
    Fixture(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
