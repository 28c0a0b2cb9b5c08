use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use qareport::discovery::{find_config, find_project_root};
use qareport::environment::{EnvironmentProvider, HostEnvironment, NoEnvironment};
use qareport::error::{exit_code_for, InputKind, ReportError};
use qareport::pipeline::{self, JtlJob, SuiteJob};
use qareport::Config;

const LOG_ENV: &str = "QAREPORT_LOG";

#[derive(Parser)]
#[command(name = "qareport")]
#[command(about = "Consolidate test suites and perf results into normalized XML reports")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file (default: qareport.toml in the project root)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate JUnit suite reports and coverage into one functional report
    Suites,

    /// Convert a JSON perf summary into a perf report
    FromJson {
        /// Perf summary JSON written by the perf test
        #[arg(long)]
        input: PathBuf,

        /// Output path for the XML report
        #[arg(long)]
        output: Option<PathBuf>,

        /// Leave the Hardware section empty
        #[arg(long)]
        no_hardware: bool,
    },

    /// Convert JMeter JTL sample logs into a perf report
    FromJtl {
        /// JTL files, one run each
        #[arg(long, num_args = 1.., required = true)]
        inputs: Vec<PathBuf>,

        /// Target throughput for each input, in the same order
        #[arg(long, num_args = 1.., required = true)]
        targets: Vec<u64>,

        /// Run duration in seconds
        #[arg(long)]
        duration: Option<u64>,

        /// Output path for the XML report
        #[arg(long)]
        output: Option<PathBuf>,

        /// Leave the Hardware section empty
        #[arg(long)]
        no_hardware: bool,
    },
}

fn main() {
    init_tracing();

    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(exit_code_for(&e));
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let (root, config) = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Suites => cmd_suites(&root, &config),
        Commands::FromJson { input, output, no_hardware } => {
            let output = output.unwrap_or_else(|| root.join(&config.perf.output));
            cmd_from_json(&config, &input, &output, no_hardware)
        }
        Commands::FromJtl { inputs, targets, duration, output, no_hardware } => {
            let job = JtlJob {
                inputs,
                targets,
                duration_sec: duration.unwrap_or(config.perf.duration),
                output: output.unwrap_or_else(|| root.join(&config.perf.output)),
                percentiles: config.perf.percentiles.clone(),
                missing_status: config.perf.missing_status,
            };
            cmd_from_jtl(&job, no_hardware)
        }
    }
}

/// Resolve the project root and its configuration
fn load_config(explicit: Option<&Path>) -> Result<(PathBuf, Config)> {
    if let Some(path) = explicit {
        // Canonicalize config path to get absolute path, then get parent
        let path = std::fs::canonicalize(path).map_err(|_| ReportError::MissingInput {
            path: path.to_path_buf(),
            kind: InputKind::Config,
        })?;
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        return Ok((root, Config::load(&path)?));
    }

    let cwd = std::env::current_dir().context("Could not determine current directory")?;
    let root = find_project_root(&cwd);
    let config = match find_config(&root) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    tracing::debug!(root = %root.display(), "resolved project root");
    Ok((root, config))
}

fn environment(no_hardware: bool) -> Box<dyn EnvironmentProvider> {
    if no_hardware {
        Box::new(NoEnvironment)
    } else {
        Box::new(HostEnvironment)
    }
}

fn cmd_suites(root: &Path, config: &Config) -> Result<()> {
    let now = Utc::now();
    let job = SuiteJob {
        reports_dir: root.join(&config.suites.reports_dir),
        pattern: config.suites.pattern.clone(),
        coverage: root.join(&config.suites.coverage),
        report_date: config.project.report_date,
        output: root.join(&config.suites.output),
    };

    let report = pipeline::aggregate_suite_reports(&job, now)?;

    let summary = &report.summary;
    if let Some(name) = &config.project.name {
        print!("{}: ", name.bold());
    }
    println!(
        "{} tests, {} passed, {} failures, {} errors, coverage {}",
        summary.tests.to_string().bold(),
        summary.passed.to_string().green(),
        summary.failures.to_string().red(),
        summary.errors.to_string().yellow(),
        report.coverage.to_string().cyan()
    );
    print_written(&job.output);
    Ok(())
}

fn cmd_from_json(config: &Config, input: &Path, output: &Path, no_hardware: bool) -> Result<()> {
    pipeline::convert_summary(
        input,
        output,
        &config.perf.percentiles,
        environment(no_hardware).as_ref(),
        Utc::now(),
    )?;
    print_written(output);
    Ok(())
}

fn cmd_from_jtl(job: &JtlJob, no_hardware: bool) -> Result<()> {
    let report = pipeline::convert_sample_logs(job, environment(no_hardware).as_ref(), Utc::now())?;
    println!(
        "{} run(s), {} samples",
        report.runs.len().to_string().bold(),
        report.summary.samples.to_string().bold()
    );
    print_written(&job.output);
    Ok(())
}

fn print_written(path: &Path) {
    println!("{} {}", "Wrote report to".green(), path.display());
}
