//! JMeter JTL sample log parsing
//!
//! A JTL file is CSV with a header row, one row per request sample. Rows are
//! never rejected: a latency that cannot be read becomes `0.0` and the row
//! still counts as a sample.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Columns tried, in order, for a row's latency
const LATENCY_COLUMNS: [&str; 3] = ["latency", "time", "elapsed"];
const SUCCESS_COLUMN: &str = "success";
const RESPONSE_CODE_COLUMN: &str = "responseCode";

/// How a row is classified when the log has neither a `success` nor a
/// `responseCode` column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFallback {
    #[default]
    Success,
    Failure,
}

/// One performance run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunRecord {
    /// Latency of every recorded sample in milliseconds, in file order
    pub samples: Vec<f64>,
    pub successes: u64,
    pub failures: u64,
    /// Declared target throughput (transactions/sec)
    pub target_tps: Option<u64>,
    /// Declared run duration in seconds
    pub duration_sec: u64,
}

impl RunRecord {
    pub fn sample_count(&self) -> u64 {
        self.samples.len() as u64
    }

    /// Arithmetic mean over all samples, `0.0` when there are none
    pub fn mean_latency(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    pub fn with_target(mut self, target_tps: u64, duration_sec: u64) -> Self {
        self.target_tps = Some(target_tps);
        self.duration_sec = duration_sec;
        self
    }
}

/// Column positions resolved from the header row
struct Columns {
    latency: Vec<usize>,
    success: Option<usize>,
    response_code: Option<usize>,
}

impl Columns {
    fn from_header(header: &csv::ByteRecord) -> Self {
        let position = |name: &str| header.iter().position(|h| h == name.as_bytes());
        Self {
            latency: LATENCY_COLUMNS.iter().filter_map(|&c| position(c)).collect(),
            success: position(SUCCESS_COLUMN),
            response_code: position(RESPONSE_CODE_COLUMN),
        }
    }
}

/// Parse a JTL file from disk
pub fn parse_jtl(path: &Path, fallback: StatusFallback) -> Result<RunRecord> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open sample log: {}", path.display()))?;
    parse_jtl_reader(file, fallback)
        .with_context(|| format!("Failed to read sample log: {}", path.display()))
}

/// Parse JTL content from any reader
pub fn parse_jtl_reader<R: Read>(input: R, fallback: StatusFallback) -> Result<RunRecord> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(input);

    let columns = Columns::from_header(reader.byte_headers()?);
    if columns.success.is_none() && columns.response_code.is_none() {
        tracing::warn!(
            ?fallback,
            "sample log has neither a success nor a responseCode column, classifying every row by fallback"
        );
    }

    let mut record = RunRecord::default();
    for row in reader.byte_records() {
        let row = row?;
        record.samples.push(row_latency(&row, &columns.latency));

        if row_succeeded(&row, &columns, fallback) {
            record.successes += 1;
        } else {
            record.failures += 1;
        }
    }

    tracing::debug!(
        samples = record.samples.len(),
        successes = record.successes,
        failures = record.failures,
        "parsed sample log"
    );

    Ok(record)
}

fn cell<'a>(row: &'a csv::ByteRecord, index: Option<usize>) -> Option<std::borrow::Cow<'a, str>> {
    index
        .and_then(|i| row.get(i))
        .map(String::from_utf8_lossy)
}

fn row_latency(row: &csv::ByteRecord, candidates: &[usize]) -> f64 {
    candidates
        .iter()
        .filter_map(|&i| cell(row, Some(i)))
        .find_map(|value| {
            value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
        })
        .unwrap_or(0.0)
}

fn row_succeeded(row: &csv::ByteRecord, columns: &Columns, fallback: StatusFallback) -> bool {
    if let Some(success) = cell(row, columns.success) {
        return success.eq_ignore_ascii_case("true") || success == "1";
    }

    if columns.response_code.is_some() {
        return match cell(row, columns.response_code) {
            Some(code) if !code.is_empty() => code.starts_with('2'),
            _ => true,
        };
    }

    fallback == StatusFallback::Success
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> RunRecord {
        parse_jtl_reader(content.as_bytes(), StatusFallback::Success).unwrap()
    }

    #[test]
    fn test_success_column_wins() {
        let record = parse(
            "timeStamp,elapsed,responseCode,success\n\
             1,100,200,true\n\
             2,200,500,TRUE\n\
             3,300,200,false\n\
             4,400,200,1\n",
        );
        assert_eq!(record.samples, vec![100.0, 200.0, 300.0, 400.0]);
        assert_eq!(record.successes, 3);
        assert_eq!(record.failures, 1);
        assert_eq!(record.mean_latency(), 250.0);
    }

    #[test]
    fn test_response_code_classification() {
        let record = parse(
            "elapsed,responseCode\n\
             10,200\n\
             20,204\n\
             30,503\n\
             40,\n\
             50,Non HTTP response code\n",
        );
        assert_eq!(record.successes, 3);
        assert_eq!(record.failures, 2);
    }

    #[test]
    fn test_latency_column_priority() {
        let record = parse(
            "elapsed,time,latency\n\
             1,2,3\n\
             1,2,\n\
             1,x,oops\n",
        );
        assert_eq!(record.samples, vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_unparseable_latency_counts_as_zero() {
        let record = parse("latency,success\nabc,true\n,false\n12.5,true\n");
        assert_eq!(record.sample_count(), 3);
        assert_eq!(record.samples, vec![0.0, 0.0, 12.5]);
        assert_eq!(record.failures, 1);
    }

    #[test]
    fn test_missing_status_columns_use_fallback() {
        let content = "elapsed,label\n5,a\n6,b\n";

        let optimistic = parse_jtl_reader(content.as_bytes(), StatusFallback::Success).unwrap();
        assert_eq!((optimistic.successes, optimistic.failures), (2, 0));

        let strict = parse_jtl_reader(content.as_bytes(), StatusFallback::Failure).unwrap();
        assert_eq!((strict.successes, strict.failures), (0, 2));
    }

    #[test]
    fn test_quoted_labels_and_short_rows() {
        let record = parse(
            "elapsed,label,responseCode,success\n\
             15,\"POST /tx, transfer\",200,true\n\
             25,short\n",
        );
        assert_eq!(record.samples, vec![15.0, 25.0]);
        // the short row has no success or responseCode cell at all
        assert_eq!(record.successes, 2);
    }

    #[test]
    fn test_header_only_file() {
        let record = parse("elapsed,success\n");
        assert_eq!(record.sample_count(), 0);
        assert_eq!(record.mean_latency(), 0.0);
    }
}
