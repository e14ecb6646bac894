//! sitecheck CLI - Main Entry Point
//!
//! Loads scenario scripts, assembles a suite against a browser + HTTP
//! context, runs it, and emits the report to the selected sinks.
//!
//! Exit codes: 0 when every scenario passed, 1 when only assertion failures
//! occurred, 2 when errors, timeouts, or a suite-level setup fault were
//! present.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};

use sitecheck_common::SuiteReport;
use sitecheck_context::{
    register_scripts, ActionContext, Browser, BrowserConfig, ContextConfig, FixtureConfig,
    FixtureServer, ScenarioScript,
};
use sitecheck_harness::{ReportSink, Suite};

/// sitecheck - scripted end-to-end scenario harness
#[derive(Parser)]
#[command(name = "sitecheck")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing scenario scripts (YAML)
    #[arg(default_value = "scenarios")]
    scripts: PathBuf,

    /// Suite name used in the report
    #[arg(long, default_value = "sitecheck")]
    suite: String,

    /// Run only the scenario with this name
    #[arg(short, long)]
    name: Option<String>,

    /// Run only scenarios carrying this tag
    #[arg(short, long)]
    tag: Option<String>,

    /// Override every scenario's timeout (milliseconds, must be positive)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Base URL of the system under test
    #[arg(long, default_value = "http://127.0.0.1:8080", env = "SITECHECK_BASE_URL")]
    base_url: String,

    /// Base URL for API requests (defaults to --base-url)
    #[arg(long)]
    api_base_url: Option<String>,

    /// Spawn this fixture server binary and target it instead of --base-url
    #[arg(long)]
    fixture_binary: Option<PathBuf>,

    /// Fixture server port (0 = auto); only meaningful with --fixture-binary
    #[arg(long, default_value = "0")]
    port: u16,

    /// Browser to use (chromium, firefox, webkit)
    #[arg(long, default_value = "chromium")]
    browser: String,

    /// Run the browser headless (pass `--headless false` for a headful run)
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    headless: bool,

    /// Viewport width
    #[arg(long, default_value = "1280")]
    viewport_width: u32,

    /// Viewport height
    #[arg(long, default_value = "720")]
    viewport_height: u32,

    /// Also write the report as JSON to this path
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    if cli.port != 0 && cli.fixture_binary.is_none() {
        anyhow::bail!("--port only applies to a spawned fixture server; pass --fixture-binary");
    }

    let mut scripts = ScenarioScript::load_all(&cli.scripts)?;
    if let Some(tag) = &cli.tag {
        scripts.retain(|s| s.has_tag(tag));
    }
    if let Some(name) = &cli.name {
        scripts.retain(|s| &s.name == name);
    }
    if scripts.is_empty() {
        anyhow::bail!("no scenarios selected under {}", cli.scripts.display());
    }
    tracing::info!(
        "Loaded {} scenarios from {}",
        scripts.len(),
        cli.scripts.display()
    );

    let mut suite: Suite<ActionContext> = Suite::new(cli.suite.clone())
        .with_timeout_override(cli.timeout.map(Duration::from_millis));
    register_scripts(&mut suite, scripts)?;

    let browser: Browser = cli.browser.parse()?;
    let browser_config = BrowserConfig {
        browser,
        headless: cli.headless,
        viewport_width: cli.viewport_width,
        viewport_height: cli.viewport_height,
    };

    let fixture_binary = cli.fixture_binary.clone();
    let fixture_port = (cli.port != 0).then_some(cli.port);
    let base_url = cli.base_url.clone();
    let api_base_url = cli.api_base_url.clone();

    let report = suite
        .run(
            move || async move {
                let (fixture, base_url) = match fixture_binary {
                    Some(binary_path) => {
                        let fixture = FixtureServer::spawn(FixtureConfig {
                            binary_path,
                            port: fixture_port,
                            startup_timeout: Duration::from_secs(30),
                        })
                        .await?;
                        let url = fixture.base_url().to_string();
                        (Some(fixture), url)
                    }
                    None => (None, base_url),
                };

                let ctx = ActionContext::new(ContextConfig {
                    base_url,
                    api_base_url,
                    browser: browser_config,
                })
                .await?;

                Ok(match fixture {
                    Some(fixture) => ctx.with_fixture(fixture),
                    None => ctx,
                })
            },
            |ctx| async move { ctx.close().await },
        )
        .await?;

    ReportSink::Console.emit(&report)?;
    if let Some(path) = &cli.report {
        ReportSink::file(path).emit(&report)?;
    }

    Ok(exit_code(&report))
}

fn exit_code(report: &SuiteReport) -> i32 {
    if report.all_passed() {
        0
    } else if report.has_faults() {
        2
    } else {
        1
    }
}
