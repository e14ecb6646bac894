//! sitecheck Harness
//!
//! The scenario-runner core: named scenarios execute strictly in registration
//! order against one shared target context, each under its own deadline, and
//! every execution folds into exactly one recorded outcome.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     Suite<C: Target>                    │
//! │  Created → SettingUp → Running → TearingDown → Completed│
//! ├─────────────────────────────────────────────────────────┤
//! │  setup() ─────────────► Arc<C> (shared context)         │
//! │  for scenario in registration order:                    │
//! │      runner::run_scenario ──► ScenarioResult            │
//! │      ResultAggregator::record                           │
//! │      (TimedOut + ResetContext policy ──► C::reset)      │
//! │  teardown(), exactly once, unconditionally              │
//! │  ResultAggregator::finalize ──► SuiteReport             │
//! │  ReportSink::{Console, File}::emit                      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Scenario-level faults never abort the suite; only a setup failure does.

pub mod aggregate;
pub mod runner;
pub mod scenario;
pub mod sink;
pub mod suite;

pub use aggregate::ResultAggregator;
pub use runner::run_scenario;
pub use scenario::{ensure, ensure_contains, ensure_eq, BodyResult, Scenario, ScenarioError};
pub use sink::ReportSink;
pub use suite::{Suite, SuiteState, Target, TimeoutPolicy};
