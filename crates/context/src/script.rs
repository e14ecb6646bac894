//! Declarative YAML scenario scripts
//!
//! A script is a named, ordered list of steps against the storefront
//! (browser actions, API calls, and assertions), registered into a suite as
//! an ordinary scenario whose body replays the steps.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use sitecheck_common::{Error, Result};
use sitecheck_harness::{ensure, ensure_contains, ensure_eq, BodyResult, ScenarioError, Suite};

use crate::ActionContext;

/// A complete scenario script parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioScript {
    /// Unique name within the suite
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering
    #[serde(default)]
    pub tags: Vec<String>,

    /// Per-scenario deadline
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Viewport applied before the first step
    #[serde(default)]
    pub viewport: Option<Viewport>,

    /// Steps to execute in order
    pub steps: Vec<ScriptStep>,
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_wait_timeout() -> u64 {
    5000
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// A single step in a scenario script
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptStep {
    /// Navigate to a URL (relative to the base URL)
    Navigate {
        url: String,
        #[serde(default)]
        wait_for: Option<String>,
    },

    /// Click an element
    Click { selector: String },

    /// Clear a field and type text into it
    TypeText { selector: String, text: String },

    /// Wait for an element to appear
    WaitFor {
        selector: String,
        #[serde(default = "default_wait_timeout")]
        timeout_ms: u64,
    },

    /// Wait for a fixed amount of time (use sparingly)
    Sleep { ms: u64 },

    /// Assert on the page title
    AssertTitle {
        #[serde(default)]
        equals: Option<String>,
        #[serde(default)]
        contains: Option<String>,
    },

    /// Assert on an element's text
    AssertText {
        selector: String,
        #[serde(default)]
        equals: Option<String>,
        #[serde(default)]
        contains: Option<String>,
    },

    /// Change the viewport mid-scenario (responsive checks)
    SetViewport { width: u32, height: u32 },

    /// Issue an API request and assert on the response
    Request {
        method: String,
        url: String,
        #[serde(default)]
        json: Option<serde_json::Value>,
        #[serde(default)]
        expect_status: Option<u16>,
        #[serde(default)]
        expect_keys: Vec<String>,
    },
}

impl ScenarioScript {
    /// Parse a scenario script from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let script: Self = serde_yaml::from_str(yaml)?;
        if script.steps.is_empty() {
            return Err(Error::Script(format!("scenario '{}' has no steps", script.name)));
        }
        Ok(script)
    }

    /// Parse a scenario script from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Script(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&content)
    }

    /// Load all scenario scripts under a directory, in path order
    pub fn load_all(dir: &Path) -> Result<Vec<Self>> {
        let mut scripts = Vec::new();

        let mut entries: Vec<_> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
            .collect();
        entries.sort_by(|a, b| a.path().cmp(b.path()));

        for entry in entries {
            scripts.push(Self::from_file(entry.path())?);
        }

        Ok(scripts)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Register each script as a scenario on the suite, preserving order.
pub fn register_scripts(
    suite: &mut Suite<ActionContext>,
    scripts: Vec<ScenarioScript>,
) -> Result<()> {
    for script in scripts {
        let steps = Arc::new(script.steps);
        let viewport = script.viewport;

        suite.register(script.name, script.timeout_ms, move |ctx: Arc<ActionContext>| {
            let steps = Arc::clone(&steps);
            async move {
                if let Some(vp) = viewport {
                    ctx.browser().viewport(vp.width, vp.height).await?;
                }
                for step in steps.iter() {
                    run_step(&ctx, step).await?;
                }
                Ok(())
            }
        })?;
    }
    Ok(())
}

async fn run_step(ctx: &ActionContext, step: &ScriptStep) -> BodyResult {
    match step {
        ScriptStep::Navigate { url, wait_for } => {
            ctx.navigate(url).await?;
            if let Some(selector) = wait_for {
                wait_or_fail(ctx, selector, default_wait_timeout()).await?;
            }
        }

        ScriptStep::Click { selector } => {
            let element = ctx
                .browser()
                .find(selector)
                .await?
                .ok_or_else(|| sitecheck_common::Error::ElementNotFound(selector.clone()))?;
            ctx.browser().click(&element).await?;
        }

        ScriptStep::TypeText { selector, text } => {
            let element = ctx
                .browser()
                .find(selector)
                .await?
                .ok_or_else(|| sitecheck_common::Error::ElementNotFound(selector.clone()))?;
            ctx.browser().type_text(&element, text).await?;
        }

        ScriptStep::WaitFor {
            selector,
            timeout_ms,
        } => {
            wait_or_fail(ctx, selector, *timeout_ms).await?;
        }

        ScriptStep::Sleep { ms } => {
            tokio::time::sleep(std::time::Duration::from_millis(*ms)).await;
        }

        ScriptStep::AssertTitle { equals, contains } => {
            let title = ctx.browser().title().await?;
            if let Some(expected) = equals {
                ensure_eq("title mismatch", expected.clone(), title.clone())?;
            }
            if let Some(needle) = contains {
                ensure_contains("title", &title, needle)?;
            }
        }

        ScriptStep::AssertText {
            selector,
            equals,
            contains,
        } => {
            let element = ctx
                .browser()
                .find(selector)
                .await?
                .ok_or_else(|| sitecheck_common::Error::ElementNotFound(selector.clone()))?;
            let text = ctx.browser().read_text(&element).await?;
            let what = format!("text mismatch at {}", selector);
            if let Some(expected) = equals {
                ensure_eq(&what, expected.clone(), text.trim().to_string())?;
            }
            if let Some(needle) = contains {
                ensure_contains(&format!("text at {}", selector), &text, needle)?;
            }
        }

        ScriptStep::SetViewport { width, height } => {
            ctx.browser().viewport(*width, *height).await?;
        }

        ScriptStep::Request {
            method,
            url,
            json,
            expect_status,
            expect_keys,
        } => {
            let response = ctx.http().request(method, url, json.as_ref()).await?;
            if let Some(expected) = expect_status {
                ensure_eq(
                    &format!("{} {} status mismatch", method.to_uppercase(), url),
                    *expected,
                    response.status,
                )?;
            }
            for key in expect_keys {
                ensure(
                    response.key(key).is_some(),
                    format!("response body missing key '{}'", key),
                )?;
            }
        }
    }

    Ok(())
}

/// A selector not appearing in time is an expectation not met, not an
/// action-layer fault.
async fn wait_or_fail(ctx: &ActionContext, selector: &str, timeout_ms: u64) -> BodyResult {
    match ctx.browser().wait_for(selector, timeout_ms).await {
        Ok(_) => Ok(()),
        Err(sitecheck_common::Error::WaitTimeout(_)) => Err(ScenarioError::Assertion(format!(
            "element '{}' did not appear within {}ms",
            selector, timeout_ms
        ))),
        Err(e) => Err(ScenarioError::Action(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_browser_script() {
        let yaml = r#"
name: search-flow
description: Search for a product from the home page
tags:
  - search
  - smoke
steps:
  - action: navigate
    url: /
    wait_for: '#search-input'
  - action: type_text
    selector: '#search-input'
    text: 'wireless keyboard'
  - action: click
    selector: '#search-button'
  - action: wait_for
    selector: '.product-card'
    timeout_ms: 5000
  - action: assert_text
    selector: '.product-card h3'
    contains: keyboard
"#;
        let script = ScenarioScript::from_yaml(yaml).unwrap();
        assert_eq!(script.name, "search-flow");
        assert_eq!(script.steps.len(), 5);
        assert_eq!(script.timeout_ms, 30_000);
        assert!(script.has_tag("smoke"));
        assert!(!script.has_tag("checkout"));
    }

    #[test]
    fn test_parse_api_script() {
        let yaml = r#"
name: create-order
timeout_ms: 10000
steps:
  - action: request
    method: get
    url: /products
    expect_status: 200
  - action: request
    method: post
    url: /orders
    json:
      userId: 1
      products:
        - id: 10
          quantity: 2
    expect_status: 201
    expect_keys:
      - orderId
      - status
"#;
        let script = ScenarioScript::from_yaml(yaml).unwrap();
        assert_eq!(script.timeout_ms, 10_000);
        match &script.steps[1] {
            ScriptStep::Request {
                expect_status,
                expect_keys,
                ..
            } => {
                assert_eq!(*expect_status, Some(201));
                assert_eq!(expect_keys, &["orderId", "status"]);
            }
            other => panic!("expected request step, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_viewport_script() {
        let yaml = r#"
name: mobile-home
viewport:
  width: 375
  height: 667
steps:
  - action: navigate
    url: /
  - action: assert_title
    contains: Shop
"#;
        let script = ScenarioScript::from_yaml(yaml).unwrap();
        let viewport = script.viewport.unwrap();
        assert_eq!(viewport.width, 375);
        assert_eq!(viewport.height, 667);
    }

    #[test]
    fn test_empty_steps_rejected() {
        let yaml = "name: hollow\nsteps: []\n";
        assert!(matches!(
            ScenarioScript::from_yaml(yaml),
            Err(Error::Script(_))
        ));
    }

    #[test]
    fn test_load_all_reads_directory_in_order() {
        let dir = tempfile::tempdir().unwrap();
        for (file, name) in [("b.yaml", "second"), ("a.yaml", "first")] {
            std::fs::write(
                dir.path().join(file),
                format!("name: {}\nsteps:\n  - action: navigate\n    url: /\n", name),
            )
            .unwrap();
        }

        let scripts = ScenarioScript::load_all(dir.path()).unwrap();
        let names: Vec<&str> = scripts.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }
}
