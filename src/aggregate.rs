//! Merging parsed inputs into aggregate reports
//!
//! Perf aggregation keeps one section per run in input order and sums the
//! counts for the summary. Functional aggregation concatenates outcomes in
//! file order and sums each file's declared totals as-is, even when they
//! disagree with the cases actually present.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::coverage::CoverageSummary;
use crate::environment::EnvironmentSnapshot;
use crate::error::{InputKind, ReportError};
use crate::jtl::RunRecord;
use crate::junit::{SuiteParse, TestCaseOutcome};
use crate::percentile;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerfTotals {
    pub samples: u64,
    pub successes: u64,
    pub failures: u64,
}

/// Latency figures computed from raw samples
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyStats {
    pub mean_ms: f64,
    /// `(percentile, estimate)` pairs in request order
    pub percentiles: Vec<(f64, f64)>,
}

impl LatencyStats {
    /// Estimate for percentile `p`, if it was requested
    pub fn percentile(&self, p: f64) -> Option<f64> {
        self.percentiles
            .iter()
            .find(|(requested, _)| *requested == p)
            .map(|&(_, value)| value)
    }
}

/// One `Run` block of a perf report
#[derive(Debug, Clone, PartialEq)]
pub struct RunSection {
    pub target_tps: u64,
    pub duration_sec: u64,
    pub samples: u64,
    pub successes: u64,
    pub failures: u64,
    /// `None` when the run came from a summary without raw samples
    pub latency: Option<LatencyStats>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatePerfReport {
    pub generated_at: DateTime<Utc>,
    pub summary: PerfTotals,
    pub runs: Vec<RunSection>,
    /// Percentiles every run reports, in output order
    pub percentiles: Vec<f64>,
    pub environment: EnvironmentSnapshot,
}

/// Merge raw runs into one perf report
pub fn aggregate_runs(
    runs: &[RunRecord],
    requested: &[f64],
    environment: EnvironmentSnapshot,
    generated_at: DateTime<Utc>,
) -> AggregatePerfReport {
    let sections: Vec<RunSection> = runs
        .iter()
        .map(|run| RunSection {
            target_tps: run.target_tps.unwrap_or(0),
            duration_sec: run.duration_sec,
            samples: run.sample_count(),
            successes: run.successes,
            failures: run.failures,
            latency: Some(LatencyStats {
                mean_ms: run.mean_latency(),
                percentiles: percentile::percentiles(&run.samples, requested),
            }),
        })
        .collect();

    AggregatePerfReport {
        generated_at,
        summary: sum_sections(&sections),
        runs: sections,
        percentiles: requested.to_vec(),
        environment,
    }
}

fn sum_sections(sections: &[RunSection]) -> PerfTotals {
    sections.iter().fold(PerfTotals::default(), |acc, run| PerfTotals {
        samples: acc.samples + run.samples,
        successes: acc.successes + run.successes,
        failures: acc.failures + run.failures,
    })
}

/// Pre-computed summary written by the service's own perf test
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerfSummaryInput {
    pub total_tx: u64,
    pub committed: u64,
    pub failed: u64,
    pub throughput: f64,
    pub duration_ms: u64,
}

impl PerfSummaryInput {
    /// Load a summary, failing only when the file is missing or not JSON
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ReportError::MissingInput {
                path: path.to_path_buf(),
                kind: InputKind::PerfSummary,
            }
            .into());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Self::from_json(&value))
    }

    /// Read the known fields; absent or non-numeric ones become zero
    pub fn from_json(value: &Value) -> Self {
        let empty = Map::new();
        let object = value.as_object().unwrap_or(&empty);
        let number = |key: &str| -> f64 {
            match object.get(key) {
                Some(v) => v.as_f64().unwrap_or_else(|| {
                    tracing::warn!(field = key, value = %v, "non-numeric summary field, using 0");
                    0.0
                }),
                None => 0.0,
            }
        };
        let count = |key: &str| number(key).max(0.0) as u64;

        Self {
            total_tx: count("totalTx"),
            committed: count("committed"),
            failed: count("failed"),
            throughput: number("throughput"),
            duration_ms: count("durationMs"),
        }
    }
}

/// Single-run perf report from a summary; latency fields stay zero
pub fn aggregate_summary(
    input: &PerfSummaryInput,
    requested: &[f64],
    environment: EnvironmentSnapshot,
    generated_at: DateTime<Utc>,
) -> AggregatePerfReport {
    let section = RunSection {
        target_tps: input.throughput.max(0.0).trunc() as u64,
        duration_sec: input.duration_ms / 1000,
        samples: input.total_tx,
        successes: input.committed,
        failures: input.failed,
        latency: None,
    };

    AggregatePerfReport {
        generated_at,
        summary: PerfTotals {
            samples: input.total_tx,
            successes: input.committed,
            failures: input.failed,
        },
        runs: vec![section],
        percentiles: requested.to_vec(),
        environment,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FunctionalTotals {
    pub tests: i64,
    pub passed: i64,
    pub failures: i64,
    pub errors: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateFunctionalReport {
    pub generated_at: DateTime<Utc>,
    pub report_date: NaiveDate,
    pub summary: FunctionalTotals,
    pub coverage: CoverageSummary,
    pub cases: Vec<TestCaseOutcome>,
}

/// Merge suite parses, already in processing order, into one report
pub fn aggregate_suites(
    suites: Vec<SuiteParse>,
    coverage: CoverageSummary,
    report_date: NaiveDate,
    generated_at: DateTime<Utc>,
) -> AggregateFunctionalReport {
    let mut summary = FunctionalTotals::default();
    let mut cases = Vec::new();

    for suite in suites {
        if suite.tests != suite.cases.len() as i64 {
            tracing::debug!(
                file = %suite.source,
                declared = suite.tests,
                found = suite.cases.len(),
                "declared test count differs from cases found"
            );
        }
        summary.tests += suite.tests;
        summary.failures += suite.failures;
        summary.errors += suite.errors;
        cases.extend(suite.cases);
    }
    summary.passed = summary.tests - summary.failures - summary.errors;

    AggregateFunctionalReport {
        generated_at,
        report_date,
        summary,
        coverage,
        cases,
    }
}
