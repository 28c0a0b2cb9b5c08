//! Coverage module
//!
//! Reduces a coverage report to a single percentage. Reading is best effort:
//! a missing or unreadable report is [`CoverageSummary::Unavailable`], never an
//! error.

mod jacoco;

pub use jacoco::*;

use std::fmt;
use std::path::Path;

/// Text written when no coverage figure could be produced
pub const UNAVAILABLE: &str = "N/A";

/// Coverage reduced to one counter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoverageSummary {
    Measured { covered: u64, missed: u64 },
    Unavailable,
}

impl CoverageSummary {
    /// Covered share in percent, `0.0` when the counter saw nothing
    pub fn percentage(&self) -> Option<f64> {
        match *self {
            CoverageSummary::Measured { covered, missed } => {
                let total = covered + missed;
                if total == 0 {
                    return Some(0.0);
                }
                Some(covered as f64 / total as f64 * 100.0)
            }
            CoverageSummary::Unavailable => None,
        }
    }
}

impl fmt::Display for CoverageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            CoverageSummary::Measured { covered: 0, missed: 0 } => write!(f, "0%"),
            CoverageSummary::Measured { .. } => {
                write!(f, "{:.2}%", self.percentage().unwrap_or_default())
            }
            CoverageSummary::Unavailable => write!(f, "{}", UNAVAILABLE),
        }
    }
}

/// Read a JaCoCo report if one exists at `path`
pub fn read_coverage(path: &Path) -> CoverageSummary {
    if !path.exists() {
        tracing::info!(path = %path.display(), "no coverage report found");
        return CoverageSummary::Unavailable;
    }

    match parse_jacoco(path) {
        Ok(summary) => summary,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "coverage report could not be read");
            CoverageSummary::Unavailable
        }
    }
}
