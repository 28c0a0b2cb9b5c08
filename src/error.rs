//! User-visible failures
//!
//! Only problems with the invocation itself surface here. Malformed documents,
//! malformed fields and absent optional artifacts are recovered where they are
//! read and never reach this type.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// What a missing input was supposed to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// A JMeter JTL sample log
    SampleLog,
    /// A pre-computed JSON perf summary
    PerfSummary,
    /// The configuration file named with `--config`
    Config,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputKind::SampleLog => write!(f, "sample log"),
            InputKind::PerfSummary => write!(f, "perf summary"),
            InputKind::Config => write!(f, "config file"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Missing {kind}: {}", path.display())]
    MissingInput { path: PathBuf, kind: InputKind },

    #[error("Got {inputs} input file(s) but {targets} target value(s); supply exactly one target per input")]
    TargetCountMismatch { inputs: usize, targets: usize },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ReportError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            ReportError::MissingInput { kind: InputKind::SampleLog, .. } => 2,
            ReportError::TargetCountMismatch { .. } => 2,
            _ => 1,
        }
    }
}

/// Exit code for an arbitrary error coming out of a command
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<ReportError>()
        .map(ReportError::exit_code)
        .unwrap_or(1)
}
