//! Fixture server management - spawning and health checking the target
//!
//! For hermetic runs the suite owns the system under test: a fixture web
//! server binary is spawned at setup and torn down with the context.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use sitecheck_common::{Error, Result};

/// Handle to a running fixture server process
pub struct FixtureServer {
    child: Child,
    base_url: String,
    port: u16,
}

impl FixtureServer {
    /// Spawn the fixture binary and wait until it answers health checks.
    pub async fn spawn(config: FixtureConfig) -> Result<Self> {
        let port = match config.port {
            Some(port) => port,
            None => find_free_port()?,
        };
        let base_url = format!("http://127.0.0.1:{}", port);

        info!("Spawning fixture server on port {}", port);

        let mut cmd = Command::new(&config.binary_path);
        cmd.env("SITECHECK_FIXTURE_PORT", port.to_string())
            .env("SITECHECK_FIXTURE_HOST", "127.0.0.1")
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let child = cmd.spawn().map_err(|e| {
            Error::Fixture(format!(
                "failed to spawn {}: {}",
                config.binary_path.display(),
                e
            ))
        })?;

        let handle = FixtureServer {
            child,
            base_url,
            port,
        };

        handle.wait_for_healthy(config.startup_timeout).await?;

        info!("Fixture server is healthy at {}", handle.base_url);
        Ok(handle)
    }

    /// Poll the health endpoint until it responds or the timeout elapses.
    async fn wait_for_healthy(&self, timeout: Duration) -> Result<()> {
        let health_url = format!("{}/health", self.base_url);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .map_err(|e| Error::Fixture(e.to_string()))?;

        let start = std::time::Instant::now();
        let mut attempts = 0usize;

        while start.elapsed() < timeout {
            attempts += 1;

            match client.get(&health_url).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                Ok(resp) => {
                    warn!("Fixture health check returned {}", resp.status());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for fixture server to start...");
                    }
                    // Connection refused is expected while the server starts
                    if !e.is_connect() {
                        warn!("Fixture health check error: {}", e);
                    }
                }
            }

            sleep(Duration::from_millis(100)).await;
        }

        Err(Error::Fixture(format!(
            "health check failed after {} attempts",
            attempts
        )))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Stop the fixture server, SIGTERM first.
    pub fn stop(&mut self) {
        info!("Stopping fixture server (pid: {})", self.child.id());

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(self.child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                std::thread::sleep(Duration::from_millis(500));
            }
        }

        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl Drop for FixtureServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Configuration for spawning a fixture server
#[derive(Debug, Clone)]
pub struct FixtureConfig {
    /// Path to the fixture server binary
    pub binary_path: PathBuf,

    /// Port to listen on (None = find free port)
    pub port: Option<u16>,

    /// Timeout for server startup
    pub startup_timeout: Duration,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            binary_path: PathBuf::from("target/debug/fixture-shop"),
            port: None,
            startup_timeout: Duration::from_secs(30),
        }
    }
}

/// Find a free port to use
fn find_free_port() -> Result<u16> {
    use std::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|e| Error::Fixture(format!("no free port: {}", e)))?;
    let port = listener
        .local_addr()
        .map_err(|e| Error::Fixture(e.to_string()))?
        .port();
    Ok(port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_free_port() {
        let port1 = find_free_port().unwrap();
        let port2 = find_free_port().unwrap();

        assert!(port1 > 1024);
        assert!(port2 > 1024);
    }
}
