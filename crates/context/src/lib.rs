//! sitecheck Target Context
//!
//! The capability object scenario bodies use to act on the system under
//! test: a Playwright-driven browser page, an HTTP client for API calls,
//! and (for hermetic runs) the fixture server that serves the target. The
//! harness only sees the `Target` trait; scenario bodies see the full
//! surface.

pub mod browser;
pub mod fixture;
pub mod http;
pub mod script;

pub use browser::{Browser, BrowserConfig, BrowserSession, ElementHandle};
pub use fixture::{FixtureConfig, FixtureServer};
pub use http::{ApiResponse, HttpClient};
pub use script::{register_scripts, ScenarioScript, ScriptStep};

use async_trait::async_trait;

use sitecheck_common::Result;
use sitecheck_harness::Target;

/// Configuration for building an `ActionContext`
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Base URL pages navigate against
    pub base_url: String,

    /// Base URL for API requests (defaults to `base_url`)
    pub api_base_url: Option<String>,

    pub browser: BrowserConfig,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            api_base_url: None,
            browser: BrowserConfig::default(),
        }
    }
}

/// Capability handle passed to scenario bodies.
///
/// Lifetime is bounded to one suite run: created at setup, released at
/// teardown. Holds no scenario-visible state of its own.
pub struct ActionContext {
    browser: BrowserSession,
    http: HttpClient,
    base_url: String,
    // Owned so a hermetic target lives exactly as long as the context
    fixture: Option<FixtureServer>,
}

impl ActionContext {
    pub async fn new(config: ContextConfig) -> Result<Self> {
        let api_base = config
            .api_base_url
            .clone()
            .unwrap_or_else(|| config.base_url.clone());
        let browser = BrowserSession::launch(config.browser).await?;
        let http = HttpClient::new(api_base)?;

        Ok(Self {
            browser,
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            fixture: None,
        })
    }

    /// Attach a fixture server so it is torn down with the context.
    pub fn with_fixture(mut self, fixture: FixtureServer) -> Self {
        self.fixture = Some(fixture);
        self
    }

    /// The fixture server backing this context, when running hermetically.
    pub fn fixture(&self) -> Option<&FixtureServer> {
        self.fixture.as_ref()
    }

    pub fn browser(&self) -> &BrowserSession {
        &self.browser
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Navigate, resolving relative paths against the base URL.
    pub async fn navigate(&self, url: &str) -> Result<()> {
        let absolute = if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}/{}", self.base_url, url.trim_start_matches('/'))
        };
        self.browser.navigate(&absolute).await
    }

    /// Release the browser; the fixture (if any) stops when the context
    /// is dropped.
    pub async fn close(&self) -> Result<()> {
        self.browser.close().await
    }
}

#[async_trait]
impl Target for ActionContext {
    async fn reset(&self) -> Result<()> {
        self.browser.restart().await
    }
}
