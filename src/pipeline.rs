//! The three report pipelines
//!
//! Each one reads every input first, reduces, and writes exactly one output
//! file. Invocation errors are raised before anything is written.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use std::path::{Path, PathBuf};

use crate::aggregate::{
    aggregate_runs, aggregate_suites, aggregate_summary, AggregateFunctionalReport,
    AggregatePerfReport, PerfSummaryInput,
};
use crate::coverage::read_coverage;
use crate::discovery::discover_suite_reports;
use crate::environment::EnvironmentProvider;
use crate::error::{InputKind, ReportError};
use crate::jtl::{parse_jtl, StatusFallback};
use crate::junit::parse_suite_file;
use crate::report::{write_functional_report, write_perf_report};

/// Inputs for suite aggregation
#[derive(Debug, Clone)]
pub struct SuiteJob {
    pub reports_dir: PathBuf,
    pub pattern: String,
    pub coverage: PathBuf,
    pub report_date: NaiveDate,
    pub output: PathBuf,
}

/// Merge every matching suite report into one functional report
pub fn aggregate_suite_reports(job: &SuiteJob, now: DateTime<Utc>) -> Result<AggregateFunctionalReport> {
    let files = discover_suite_reports(&job.reports_dir, &job.pattern)?;
    let suites = files.iter().map(|f| parse_suite_file(f)).collect();
    let coverage = read_coverage(&job.coverage);

    let report = aggregate_suites(suites, coverage, job.report_date, now);
    write_functional_report(&report, &job.output)?;

    tracing::info!(
        files = files.len(),
        cases = report.cases.len(),
        output = %job.output.display(),
        "wrote functional report"
    );
    Ok(report)
}

/// Convert a pre-computed JSON summary into a single-run perf report
pub fn convert_summary(
    input: &Path,
    output: &Path,
    percentiles: &[f64],
    environment: &dyn EnvironmentProvider,
    now: DateTime<Utc>,
) -> Result<AggregatePerfReport> {
    let summary = PerfSummaryInput::load(input)?;
    let report = aggregate_summary(&summary, percentiles, environment.snapshot(), now);
    write_perf_report(&report, output)?;

    tracing::info!(input = %input.display(), output = %output.display(), "wrote perf report from summary");
    Ok(report)
}

/// Inputs for JTL conversion; `targets[i]` is the target throughput of `inputs[i]`
#[derive(Debug, Clone)]
pub struct JtlJob {
    pub inputs: Vec<PathBuf>,
    pub targets: Vec<u64>,
    pub duration_sec: u64,
    pub output: PathBuf,
    pub percentiles: Vec<f64>,
    pub missing_status: StatusFallback,
}

impl JtlJob {
    /// Reject mismatched lists and missing files before any file is read
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.inputs.len() != self.targets.len() {
            return Err(ReportError::TargetCountMismatch {
                inputs: self.inputs.len(),
                targets: self.targets.len(),
            });
        }

        if let Some(missing) = self.inputs.iter().find(|p| !p.exists()) {
            return Err(ReportError::MissingInput {
                path: missing.clone(),
                kind: InputKind::SampleLog,
            });
        }

        Ok(())
    }
}

/// Convert raw JTL sample logs into a perf report with one run per log
pub fn convert_sample_logs(
    job: &JtlJob,
    environment: &dyn EnvironmentProvider,
    now: DateTime<Utc>,
) -> Result<AggregatePerfReport> {
    job.validate()?;

    let mut runs = Vec::with_capacity(job.inputs.len());
    for (input, &target) in job.inputs.iter().zip(&job.targets) {
        tracing::debug!(input = %input.display(), target_tps = target, "reading sample log");
        runs.push(parse_jtl(input, job.missing_status)?.with_target(target, job.duration_sec));
    }

    let report = aggregate_runs(&runs, &job.percentiles, environment.snapshot(), now);
    write_perf_report(&report, &job.output)?;

    tracing::info!(runs = runs.len(), output = %job.output.display(), "wrote perf report");
    Ok(report)
}
