//! Report sinks
//!
//! A closed set of destinations for the finalized suite report. Emission
//! never mutates the report; an I/O failure surfaces as `SinkWrite` and
//! leaves the computed totals intact.

use std::io::Write;
use std::path::PathBuf;

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use tracing::info;

use sitecheck_common::{Error, Outcome, Result, SuiteReport};

/// Where the finalized report goes.
#[derive(Debug, Clone)]
pub enum ReportSink {
    /// Human-readable table and summary on stdout
    Console,
    /// Pretty-printed JSON document at `path`
    File { path: PathBuf },
}

impl ReportSink {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        ReportSink::File { path: path.into() }
    }

    /// Consume the report once. Call after the aggregator has finalized it.
    pub fn emit(&self, report: &SuiteReport) -> Result<()> {
        match self {
            ReportSink::Console => emit_console(report),
            ReportSink::File { path } => emit_file(path, report),
        }
    }
}

fn emit_console(report: &SuiteReport) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let write_err = |e: std::io::Error| Error::SinkWrite(e.to_string());

    writeln!(out).map_err(write_err)?;
    writeln!(out, "{} {}", "Suite:".blue().bold(), report.suite_name.bold())
        .map_err(write_err)?;

    if let Some(cause) = &report.setup_failure {
        writeln!(out, "{} {}", "✗ setup failed:".red().bold(), cause).map_err(write_err)?;
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Scenario", "Outcome", "Duration", "Detail"]);

    for result in &report.results {
        let outcome = match &result.outcome {
            Outcome::Passed => "✓ passed".green().to_string(),
            Outcome::Failed { .. } => "✗ failed".red().to_string(),
            Outcome::Errored { .. } => "✗ errored".red().bold().to_string(),
            Outcome::TimedOut => "⧗ timed out".yellow().to_string(),
        };
        table.add_row(vec![
            result.name.clone(),
            outcome,
            format!("{} ms", result.duration_ms),
            result.outcome.message().unwrap_or("").to_string(),
        ]);
    }

    writeln!(out, "{table}").map_err(write_err)?;

    let totals = &report.totals;
    let summary = format!(
        "{} passed, {} failed, {} errored, {} timed out ({} ms)",
        totals.passed, totals.failed, totals.errored, totals.timed_out,
        report.overall_duration_ms
    );
    if report.all_passed() {
        writeln!(out, "{}", summary.green().bold()).map_err(write_err)?;
    } else {
        writeln!(out, "{}", summary.red().bold()).map_err(write_err)?;
    }

    if let Some(cause) = &report.teardown_failure {
        writeln!(out, "{} {}", "⚠ teardown failed:".yellow(), cause).map_err(write_err)?;
    }

    Ok(())
}

fn emit_file(path: &PathBuf, report: &SuiteReport) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| Error::SinkWrite(e.to_string()))?;
        }
    }

    let json = serde_json::to_string_pretty(report).map_err(|e| Error::SinkWrite(e.to_string()))?;
    std::fs::write(path, json).map_err(|e| {
        Error::SinkWrite(format!("{}: {}", path.display(), e))
    })?;

    info!("Report written to: {}", path.display());
    Ok(())
}
