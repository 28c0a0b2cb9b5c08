//! qareport - test and performance report consolidation
//!
//! Reduces heterogeneous test artifacts into normalized XML reports:
//! - JUnit-style suite reports plus JaCoCo coverage into one functional report
//! - JMeter JTL sample logs into a perf report with per-run percentiles
//! - Pre-computed JSON perf summaries into the same perf report schema

pub mod aggregate;
pub mod config;
pub mod coverage;
pub mod discovery;
pub mod environment;
pub mod error;
pub mod jtl;
pub mod junit;
pub mod percentile;
pub mod pipeline;
pub mod report;

pub use aggregate::{AggregateFunctionalReport, AggregatePerfReport, PerfSummaryInput, RunSection};
pub use config::Config;
pub use coverage::CoverageSummary;
pub use environment::{EnvironmentProvider, EnvironmentSnapshot, HostEnvironment, NoEnvironment};
pub use error::{InputKind, ReportError};
pub use jtl::{RunRecord, StatusFallback};
pub use junit::{SuiteParse, TestCaseOutcome, TestStatus};
pub use pipeline::{JtlJob, SuiteJob};
