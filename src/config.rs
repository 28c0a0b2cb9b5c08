use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::ReportError;
use crate::jtl::StatusFallback;
use crate::percentile::DEFAULT_PERCENTILES;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub project: Project,
    #[serde(default)]
    pub suites: Suites,
    #[serde(default)]
    pub perf: Perf,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Project {
    /// Shown in front of the suite summary line
    #[serde(default)]
    pub name: Option<String>,
    /// `date` attribute of the functional report
    #[serde(default = "default_report_date")]
    pub report_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Suites {
    #[serde(default = "default_reports_dir")]
    pub reports_dir: String,
    /// Glob matched against file names inside `reports_dir`
    #[serde(default = "default_suite_pattern")]
    pub pattern: String,
    #[serde(default = "default_coverage")]
    pub coverage: String,
    #[serde(default = "default_suites_output")]
    pub output: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Perf {
    #[serde(default = "default_percentiles")]
    pub percentiles: Vec<f64>,
    /// Run duration in seconds when `--duration` is not given
    #[serde(default = "default_duration")]
    pub duration: u64,
    #[serde(default = "default_perf_output")]
    pub output: String,
    /// Classification of samples in logs with no status column
    #[serde(default)]
    pub missing_status: StatusFallback,
}

/// Pinned so the functional report does not change from one day to the next
pub const DEFAULT_REPORT_DATE: &str = "2026-01-19";

fn default_report_date() -> NaiveDate {
    DEFAULT_REPORT_DATE.parse().unwrap_or_default()
}

fn default_reports_dir() -> String {
    "target/surefire-reports".to_string()
}

fn default_suite_pattern() -> String {
    "TEST-*.xml".to_string()
}

fn default_coverage() -> String {
    "target/site/jacoco/jacoco.xml".to_string()
}

fn default_suites_output() -> String {
    "test/report/integration-report.xml".to_string()
}

fn default_percentiles() -> Vec<f64> {
    DEFAULT_PERCENTILES.to_vec()
}

fn default_duration() -> u64 {
    60
}

fn default_perf_output() -> String {
    "test/report/perf-report.xml".to_string()
}

impl Default for Project {
    fn default() -> Self {
        Self {
            name: None,
            report_date: default_report_date(),
        }
    }
}

impl Default for Suites {
    fn default() -> Self {
        Self {
            reports_dir: default_reports_dir(),
            pattern: default_suite_pattern(),
            coverage: default_coverage(),
            output: default_suites_output(),
        }
    }
}

impl Default for Perf {
    fn default() -> Self {
        Self {
            percentiles: default_percentiles(),
            duration: default_duration(),
            output: default_perf_output(),
            missing_status: StatusFallback::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| ReportError::Config(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.perf.percentiles.is_empty() {
            return Err(ReportError::Config("perf.percentiles must not be empty".to_string()).into());
        }

        if let Some(p) = self.perf.percentiles.iter().find(|p| !(0.0..=100.0).contains(*p)) {
            return Err(ReportError::Config(format!(
                "percentile {} is outside 0..=100",
                p
            ))
            .into());
        }

        if let Err(e) = glob::Pattern::new(&self.suites.pattern) {
            return Err(ReportError::Config(format!(
                "suites.pattern '{}' is not a valid glob: {}",
                self.suites.pattern, e
            ))
            .into());
        }

        Ok(())
    }
}
