//! Playwright browser automation
//!
//! A `BrowserSession` owns a long-lived `node` subprocess running a small
//! Playwright driver and speaks to it over newline-delimited JSON: each
//! request carries an id, each response echoes it. One command is in flight
//! at a time; scenarios are strictly sequential so the session never sees
//! contention.

use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Deserialize;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command as TokioCommand};
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

use sitecheck_common::{Error, Result};

/// Driver script executed by `node`. Reads one JSON command per line on
/// stdin, writes one JSON response per line on stdout.
const DRIVER_JS: &str = r#"
const readline = require('readline');
const playwright = require('playwright');

let browser = null;
let context = null;
let page = null;
let viewport = { width: 1280, height: 720 };

function reply(msg) { process.stdout.write(JSON.stringify(msg) + '\n'); }

async function openPage() {
  context = await browser.newContext({ viewport });
  page = await context.newPage();
}

async function handle(msg) {
  const a = msg.args || {};
  switch (msg.cmd) {
    case 'init':
      viewport = { width: a.width, height: a.height };
      browser = await playwright[a.browser].launch({ headless: a.headless });
      await openPage();
      return {};
    case 'navigate':
      await page.goto(a.url, { waitUntil: 'load' });
      return {};
    case 'find': {
      const el = await page.$(a.selector);
      return { found: el !== null };
    }
    case 'click':
      await page.click(a.selector);
      return {};
    case 'type':
      await page.fill(a.selector, '');
      await page.type(a.selector, a.text);
      return {};
    case 'wait_for':
      try {
        await page.waitForSelector(a.selector, { timeout: a.timeout_ms });
      } catch (e) {
        if (e.name === 'TimeoutError') {
          throw { kind: 'timeout', message: 'selector ' + a.selector };
        }
        throw e;
      }
      return {};
    case 'read_text': {
      const el = await page.$(a.selector);
      if (el === null) throw { kind: 'not_found', message: a.selector };
      return { text: await el.textContent() };
    }
    case 'title':
      return { title: await page.title() };
    case 'viewport':
      viewport = { width: a.width, height: a.height };
      await page.setViewportSize(viewport);
      return {};
    case 'reset':
      if (context) await context.close();
      await openPage();
      return {};
    case 'shutdown':
      if (browser) await browser.close();
      process.exit(0);
    default:
      throw { kind: 'driver', message: 'unknown command ' + msg.cmd };
  }
}

const rl = readline.createInterface({ input: process.stdin });
rl.on('line', (line) => {
  let msg;
  try { msg = JSON.parse(line); } catch (e) { return; }
  handle(msg).then(
    (value) => reply({ id: msg.id, ok: true, value }),
    (err) => reply({
      id: msg.id,
      ok: false,
      error: { kind: err.kind || 'driver', message: err.message || String(err) },
    })
  );
});
"#;

#[derive(Debug, Clone, Copy, Default)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl std::str::FromStr for Browser {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "chromium" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" => Ok(Browser::Webkit),
            other => Err(Error::InvalidConfig(format!("unknown browser '{}'", other))),
        }
    }
}

/// Configuration for a browser session
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
        }
    }
}

/// A page element located by `find` or `wait_for`.
#[derive(Debug, Clone)]
pub struct ElementHandle {
    selector: String,
}

impl ElementHandle {
    pub fn selector(&self) -> &str {
        &self.selector
    }
}

struct Driver {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    // Holds the driver script file alive for the lifetime of the process
    _dir: tempfile::TempDir,
}

#[derive(Debug, Deserialize)]
struct DriverResponse {
    id: u64,
    ok: bool,
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default)]
    error: Option<DriverFault>,
}

#[derive(Debug, Deserialize)]
struct DriverFault {
    #[serde(default)]
    kind: String,
    message: String,
}

/// Handle to a live browser page, driven through the Playwright driver.
pub struct BrowserSession {
    config: BrowserConfig,
    driver: Mutex<Option<Driver>>,
    next_id: AtomicU64,
}

impl BrowserSession {
    /// Launch the driver process and open a page.
    pub async fn launch(config: BrowserConfig) -> Result<Self> {
        check_playwright_installed()?;

        let session = Self {
            config,
            driver: Mutex::new(None),
            next_id: AtomicU64::new(1),
        };

        let driver = session.spawn_driver().await?;
        *session.driver.lock().await = Some(driver);
        Ok(session)
    }

    async fn spawn_driver(&self) -> Result<Driver> {
        let dir = tempfile::tempdir()?;
        let script_path = dir.path().join("driver.js");
        std::fs::write(&script_path, DRIVER_JS)?;

        debug!("Spawning browser driver: node {}", script_path.display());

        let mut child = TokioCommand::new("node")
            .arg(&script_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Driver(format!("failed to spawn node: {}", e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Driver("driver stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Driver("driver stdout unavailable".to_string()))?;

        let mut driver = Driver {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            _dir: dir,
        };

        let init = json!({
            "browser": self.config.browser.as_str(),
            "headless": self.config.headless,
            "width": self.config.viewport_width,
            "height": self.config.viewport_height,
        });
        self.execute_on(&mut driver, "init", init).await?;
        Ok(driver)
    }

    async fn execute(&self, cmd: &str, args: serde_json::Value) -> Result<serde_json::Value> {
        let mut guard = self.driver.lock().await;
        let driver = guard
            .as_mut()
            .ok_or_else(|| Error::Driver("browser session is closed".to_string()))?;
        self.execute_on(driver, cmd, args).await
    }

    async fn execute_on(
        &self,
        driver: &mut Driver,
        cmd: &str,
        args: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = json!({ "id": id, "cmd": cmd, "args": args });
        let line = serde_json::to_string(&request)?;
        trace!("driver command: {}", line);

        driver
            .stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| Error::Driver(format!("driver write failed: {}", e)))?;
        driver
            .stdin
            .write_all(b"\n")
            .await
            .map_err(|e| Error::Driver(format!("driver write failed: {}", e)))?;
        driver
            .stdin
            .flush()
            .await
            .map_err(|e| Error::Driver(format!("driver write failed: {}", e)))?;

        loop {
            let mut buf = String::new();
            let n = driver
                .stdout
                .read_line(&mut buf)
                .await
                .map_err(|e| Error::Driver(format!("driver read failed: {}", e)))?;
            if n == 0 {
                return Err(Error::Driver("driver process exited".to_string()));
            }
            trace!("driver response: {}", buf.trim());

            // Skip console noise and stale responses from abandoned commands
            let response: DriverResponse = match serde_json::from_str(&buf) {
                Ok(r) => r,
                Err(_) => continue,
            };
            if response.id != id {
                continue;
            }

            if response.ok {
                return Ok(response.value);
            }

            let fault = response.error.unwrap_or(DriverFault {
                kind: "driver".to_string(),
                message: "unknown driver fault".to_string(),
            });
            return Err(match fault.kind.as_str() {
                "timeout" => Error::WaitTimeout(fault.message),
                "not_found" => Error::ElementNotFound(fault.message),
                _ => Error::Driver(fault.message),
            });
        }
    }

    /// Navigate the page to an absolute URL.
    pub async fn navigate(&self, url: &str) -> Result<()> {
        self.execute("navigate", json!({ "url": url })).await?;
        Ok(())
    }

    /// Locate an element. Absence is not an error.
    pub async fn find(&self, selector: &str) -> Result<Option<ElementHandle>> {
        let value = self.execute("find", json!({ "selector": selector })).await?;
        let found = value
            .get("found")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        Ok(found.then(|| ElementHandle {
            selector: selector.to_string(),
        }))
    }

    pub async fn click(&self, element: &ElementHandle) -> Result<()> {
        self.execute("click", json!({ "selector": element.selector }))
            .await?;
        Ok(())
    }

    /// Clear the element and type `text` into it.
    pub async fn type_text(&self, element: &ElementHandle, text: &str) -> Result<()> {
        self.execute(
            "type",
            json!({ "selector": element.selector, "text": text }),
        )
        .await?;
        Ok(())
    }

    /// Wait until `selector` appears, up to `timeout_ms`. Expiry surfaces as
    /// `WaitTimeout`.
    pub async fn wait_for(&self, selector: &str, timeout_ms: u64) -> Result<ElementHandle> {
        self.execute(
            "wait_for",
            json!({ "selector": selector, "timeout_ms": timeout_ms }),
        )
        .await?;
        Ok(ElementHandle {
            selector: selector.to_string(),
        })
    }

    pub async fn read_text(&self, element: &ElementHandle) -> Result<String> {
        let value = self
            .execute("read_text", json!({ "selector": element.selector }))
            .await?;
        Ok(value
            .get("text")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string())
    }

    pub async fn title(&self) -> Result<String> {
        let value = self.execute("title", json!({})).await?;
        Ok(value
            .get("title")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string())
    }

    pub async fn viewport(&self, width: u32, height: u32) -> Result<()> {
        self.execute("viewport", json!({ "width": width, "height": height }))
            .await?;
        Ok(())
    }

    /// Kill and respawn the driver process, yielding a fresh page.
    ///
    /// Used to reacquire a known-good context after a scenario was abandoned
    /// mid-action; a protocol desync from the aborted command cannot survive
    /// a new process.
    pub async fn restart(&self) -> Result<()> {
        let mut guard = self.driver.lock().await;
        if let Some(mut old) = guard.take() {
            if let Err(e) = old.child.kill().await {
                warn!("failed to kill browser driver: {}", e);
            }
        }
        let driver = self.spawn_driver().await?;
        *guard = Some(driver);
        debug!("browser driver restarted");
        Ok(())
    }

    /// Shut the driver down. Idempotent.
    pub async fn close(&self) -> Result<()> {
        let mut guard = self.driver.lock().await;
        if let Some(mut driver) = guard.take() {
            // Best-effort graceful shutdown, then make sure it is gone
            let _ = self.execute_on(&mut driver, "shutdown", json!({})).await;
            let _ = driver.child.kill().await;
        }
        Ok(())
    }
}

/// Check that Playwright is available to `node`.
fn check_playwright_installed() -> Result<()> {
    let status = std::process::Command::new("npx")
        .args(["playwright", "--version"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match status {
        Ok(status) if status.success() => Ok(()),
        _ => Err(Error::Driver(
            "Playwright not found. Install with: npx playwright install".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_parse() {
        assert!(matches!("chromium".parse(), Ok(Browser::Chromium)));
        assert!(matches!("webkit".parse(), Ok(Browser::Webkit)));
        assert!("edge".parse::<Browser>().is_err());
    }

    #[test]
    fn test_driver_response_parsing() {
        let ok: DriverResponse =
            serde_json::from_str(r#"{"id":3,"ok":true,"value":{"found":true}}"#).unwrap();
        assert_eq!(ok.id, 3);
        assert!(ok.ok);
        assert_eq!(ok.value["found"], true);

        let err: DriverResponse = serde_json::from_str(
            r#"{"id":4,"ok":false,"error":{"kind":"timeout","message":"selector .cart"}}"#,
        )
        .unwrap();
        assert!(!err.ok);
        assert_eq!(err.error.unwrap().kind, "timeout");
    }
}
