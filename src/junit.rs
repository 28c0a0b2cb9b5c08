//! JUnit-style suite report parsing
//!
//! A suite file yields its declared totals (read from the document root) and
//! one [`TestCaseOutcome`] per `testcase` element, in document order. A file
//! that cannot be parsed at all still yields exactly one outcome describing
//! the failure, so a broken report never hides the rest of a batch.

use anyhow::{anyhow, bail, Context, Result};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TestStatus {
    #[default]
    Passed,
    Failed,
    Error,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Passed => write!(f, "passed"),
            TestStatus::Failed => write!(f, "failed"),
            TestStatus::Error => write!(f, "error"),
        }
    }
}

/// Normalized outcome of one `testcase` element
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TestCaseOutcome {
    pub classname: String,
    pub name: String,
    /// `time` attribute, kept verbatim
    pub time: Option<String>,
    pub status: TestStatus,
    pub message: String,
    pub system_out: String,
    /// Base name of the file this case was read from
    pub source: String,
}

/// Everything read from one suite file
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SuiteParse {
    pub source: String,
    pub tests: i64,
    pub failures: i64,
    pub errors: i64,
    pub cases: Vec<TestCaseOutcome>,
}

impl SuiteParse {
    /// Stand-in for a file that could not be parsed
    pub fn unreadable(source: &str, cause: &str) -> Self {
        Self {
            source: source.to_string(),
            cases: vec![TestCaseOutcome {
                classname: String::new(),
                name: source.to_string(),
                time: Some("0".to_string()),
                status: TestStatus::Error,
                message: format!("Failed to parse report: {}", cause),
                system_out: String::new(),
                source: source.to_string(),
            }],
            ..Default::default()
        }
    }
}

/// Parse a suite file, converting any failure into a synthetic error outcome
pub fn parse_suite_file(path: &Path) -> SuiteParse {
    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let parsed = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))
        .and_then(|content| parse_suite_string(&content, &source));

    match parsed {
        Ok(suite) => {
            tracing::debug!(file = %suite.source, cases = suite.cases.len(), "parsed suite report");
            suite
        }
        Err(e) => {
            tracing::warn!(file = %source, error = %format!("{:#}", e), "suite report could not be parsed");
            SuiteParse::unreadable(&source, &format!("{:#}", e))
        }
    }
}

/// Which child of the current test case is collecting text
#[derive(Debug, Clone, Copy, PartialEq)]
enum Capture {
    Failure,
    Error,
    SystemOut,
}

/// Test case under construction
#[derive(Default)]
struct PendingCase {
    outcome: TestCaseOutcome,
    depth: usize,
    failure: Option<(String, String)>,
    error: Option<(String, String)>,
    system_out: Option<String>,
    capture: Option<(Capture, usize)>,
}

impl PendingCase {
    fn open(e: &BytesStart, depth: usize, source: &str) -> Self {
        let mut outcome = TestCaseOutcome {
            source: source.to_string(),
            ..Default::default()
        };
        for attr in e.attributes().filter_map(|a| a.ok()) {
            match attr.key.as_ref() {
                b"name" => outcome.name = attr_value(&attr),
                b"classname" => outcome.classname = attr_value(&attr),
                b"time" => outcome.time = Some(attr_value(&attr)),
                _ => {}
            }
        }
        Self {
            outcome,
            depth,
            ..Default::default()
        }
    }

    /// Record a direct child element; returns what its text should feed
    fn child(&mut self, e: &BytesStart) -> Option<Capture> {
        let message = || {
            e.attributes()
                .filter_map(|a| a.ok())
                .find(|a| a.key.as_ref() == b"message")
                .map(|a| attr_value(&a))
                .unwrap_or_default()
        };
        match e.name().as_ref() {
            b"failure" if self.failure.is_none() => {
                self.failure = Some((message(), String::new()));
                Some(Capture::Failure)
            }
            b"error" if self.error.is_none() => {
                self.error = Some((message(), String::new()));
                Some(Capture::Error)
            }
            b"system-out" if self.system_out.is_none() => {
                self.system_out = Some(String::new());
                Some(Capture::SystemOut)
            }
            _ => None,
        }
    }

    fn push_text(&mut self, text: &str) {
        let target = match self.capture {
            Some((Capture::Failure, _)) => self.failure.as_mut().map(|(_, body)| body),
            Some((Capture::Error, _)) => self.error.as_mut().map(|(_, body)| body),
            Some((Capture::SystemOut, _)) => self.system_out.as_mut(),
            None => None,
        };
        if let Some(buf) = target {
            buf.push_str(text);
        }
    }

    fn finish(self) -> TestCaseOutcome {
        let mut outcome = self.outcome;
        let (status, detail) = match (self.failure, self.error) {
            (Some(failure), _) => (TestStatus::Failed, Some(failure)),
            (None, Some(error)) => (TestStatus::Error, Some(error)),
            (None, None) => (TestStatus::Passed, None),
        };
        outcome.status = status;
        if let Some((message, body)) = detail {
            outcome.message = format!("{}\n{}", message, body).trim().to_string();
        }
        outcome.system_out = self.system_out.unwrap_or_default().trim().to_string();
        outcome
    }
}

/// Parse suite XML content; `source` tags every produced outcome
pub fn parse_suite_string(xml: &str, source: &str) -> Result<SuiteParse> {
    let mut reader = Reader::from_str(xml);
    reader.check_end_names(true);

    let mut suite = SuiteParse {
        source: source.to_string(),
        ..Default::default()
    };
    let mut depth = 0usize;
    let mut seen_root = false;
    let mut current: Option<PendingCase> = None;
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| anyhow!("malformed XML at byte {}: {}", reader.buffer_position(), e))?;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                if depth == 0 {
                    if seen_root {
                        bail!("multiple root elements");
                    }
                    seen_root = true;
                    read_declared_totals(e, &mut suite);
                }

                let capture = match current.as_mut() {
                    Some(case) if case.capture.is_none() && depth == case.depth + 1 => case.child(e),
                    _ => None,
                };

                if current.is_none() && e.name().as_ref() == b"testcase" {
                    let case = PendingCase::open(e, depth, source);
                    if is_empty {
                        suite.cases.push(case.finish());
                    } else {
                        current = Some(case);
                    }
                } else if let (Some(case), Some(capture), false) = (current.as_mut(), capture, is_empty) {
                    case.capture = Some((capture, depth));
                }

                if !is_empty {
                    depth += 1;
                }
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                let closes_case = match current.as_mut() {
                    Some(case) => {
                        if matches!(case.capture, Some((_, d)) if d == depth) {
                            case.capture = None;
                        }
                        case.depth == depth
                    }
                    None => false,
                };
                if closes_case {
                    if let Some(case) = current.take() {
                        suite.cases.push(case.finish());
                    }
                }
            }
            Event::Text(ref e) => {
                let text = e
                    .unescape()
                    .map_err(|err| anyhow!("invalid character data: {}", err))?;
                if depth == 0 && !text.trim().is_empty() {
                    bail!("text outside the root element");
                }
                if let Some(case) = current.as_mut() {
                    case.push_text(&text);
                }
            }
            Event::CData(e) => {
                if let Some(case) = current.as_mut() {
                    case.push_text(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        bail!("no element found");
    }
    if depth != 0 {
        bail!("unexpected end of document ({} unclosed element(s))", depth);
    }

    Ok(suite)
}

fn read_declared_totals(e: &BytesStart, suite: &mut SuiteParse) {
    for attr in e.attributes().filter_map(|a| a.ok()) {
        let count = || attr_value(&attr).trim().parse::<i64>().unwrap_or(0);
        match attr.key.as_ref() {
            b"tests" => suite.tests = count(),
            b"failures" => suite.failures = count(),
            b"errors" => suite.errors = count(),
            _ => {}
        }
    }
}

fn attr_value(attr: &Attribute) -> String {
    attr.unescape_value()
        .map(|v| v.to_string())
        .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_suite() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuite name="TransferTest" tests="3" failures="1" errors="1" skipped="0" time="1.234">
    <testcase name="test_pass" classname="org.pilot.TransferTest" time="0.100">
        <system-out>
            started transfer
        </system-out>
    </testcase>
    <testcase name="test_fail" classname="org.pilot.TransferTest" time="0.200">
        <failure message="boom" type="AssertionError">trace line 1
trace line 2</failure>
    </testcase>
    <testcase name="test_error" classname="org.pilot.TransferTest">
        <error message="NullPointerException"/>
    </testcase>
</testsuite>"#;

        let suite = parse_suite_string(xml, "TEST-TransferTest.xml").unwrap();
        assert_eq!((suite.tests, suite.failures, suite.errors), (3, 1, 1));
        assert_eq!(suite.cases.len(), 3);

        let pass = &suite.cases[0];
        assert_eq!(pass.status, TestStatus::Passed);
        assert_eq!(pass.system_out, "started transfer");
        assert_eq!(pass.time.as_deref(), Some("0.100"));
        assert_eq!(pass.source, "TEST-TransferTest.xml");

        let fail = &suite.cases[1];
        assert_eq!(fail.status, TestStatus::Failed);
        assert!(fail.message.starts_with("boom"));
        assert_eq!(fail.message, "boom\ntrace line 1\ntrace line 2");

        let error = &suite.cases[2];
        assert_eq!(error.status, TestStatus::Error);
        assert_eq!(error.message, "NullPointerException");
        assert_eq!(error.time, None);
    }

    #[test]
    fn test_failure_takes_precedence_over_error() {
        let xml = r#"<testsuite tests="1">
  <testcase name="both" classname="C">
    <error message="second">e</error>
    <failure message="first">f</failure>
  </testcase>
</testsuite>"#;
        let suite = parse_suite_string(xml, "both.xml").unwrap();
        assert_eq!(suite.cases[0].status, TestStatus::Failed);
        assert_eq!(suite.cases[0].message, "first\nf");
    }

    #[test]
    fn test_failure_body_only() {
        let xml = r#"<testsuite><testcase name="t"><failure><![CDATA[at Foo.bar(Foo.java:1)]]></failure></testcase></testsuite>"#;
        let suite = parse_suite_string(xml, "cdata.xml").unwrap();
        assert_eq!(suite.cases[0].message, "at Foo.bar(Foo.java:1)");
    }

    #[test]
    fn test_declared_totals_default_to_zero() {
        let xml = r#"<testsuite tests="many" failures="2"><testcase name="a"/></testsuite>"#;
        let suite = parse_suite_string(xml, "odd.xml").unwrap();
        assert_eq!((suite.tests, suite.failures, suite.errors), (0, 2, 0));
        assert_eq!(suite.cases.len(), 1);
        assert_eq!(suite.cases[0].status, TestStatus::Passed);
    }

    #[test]
    fn test_declared_totals_are_not_recounted() {
        let xml = r#"<testsuite tests="10" failures="0" errors="0"><testcase name="only"/></testsuite>"#;
        let suite = parse_suite_string(xml, "lying.xml").unwrap();
        assert_eq!(suite.tests, 10);
        assert_eq!(suite.cases.len(), 1);
    }

    #[test]
    fn test_nested_testsuites_root() {
        let xml = r#"<testsuites tests="2" failures="1">
  <testsuite name="A"><testcase name="a1" classname="A"/></testsuite>
  <testsuite name="B"><testcase name="b1" classname="B"><failure message="x"/></testcase></testsuite>
</testsuites>"#;
        let suite = parse_suite_string(xml, "all.xml").unwrap();
        assert_eq!((suite.tests, suite.failures), (2, 1));
        let names: Vec<_> = suite.cases.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a1", "b1"]);
        assert_eq!(suite.cases[1].status, TestStatus::Failed);
    }

    #[test]
    fn test_escaped_attributes_are_unescaped() {
        let xml = r#"<testsuite><testcase name="a &amp; b"><failure message="expected &lt;1&gt;"/></testcase></testsuite>"#;
        let suite = parse_suite_string(xml, "esc.xml").unwrap();
        assert_eq!(suite.cases[0].name, "a & b");
        assert_eq!(suite.cases[0].message, "expected <1>");
    }

    #[test]
    fn test_malformed_documents_are_rejected() {
        assert!(parse_suite_string("", "empty.xml").is_err());
        assert!(parse_suite_string("<testsuite><testcase name=\"a\">", "truncated.xml").is_err());
        assert!(parse_suite_string("<testsuite></testcase>", "mismatch.xml").is_err());
        assert!(parse_suite_string("not xml at all", "garbage.xml").is_err());
    }

    #[test]
    fn test_unparseable_file_becomes_error_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("TEST-Broken.xml");
        let mut file = fs::File::create(&path).unwrap();
        write!(file, "<testsuite tests=\"1\"><testcase name=\"x\">").unwrap();

        let suite = parse_suite_file(&path);
        assert_eq!((suite.tests, suite.failures, suite.errors), (0, 0, 0));
        assert_eq!(suite.cases.len(), 1);

        let case = &suite.cases[0];
        assert_eq!(case.classname, "");
        assert_eq!(case.name, "TEST-Broken.xml");
        assert_eq!(case.status, TestStatus::Error);
        assert!(case.message.starts_with("Failed to parse report: "));
        assert_eq!(case.source, "TEST-Broken.xml");
    }

    #[test]
    fn test_missing_file_becomes_error_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let suite = parse_suite_file(&dir.path().join("TEST-Gone.xml"));
        assert_eq!(suite.source, "TEST-Gone.xml");
        assert_eq!(suite.cases.len(), 1);
        assert_eq!(suite.cases[0].status, TestStatus::Error);
    }

    #[test]
    fn test_suite_file_is_tagged_with_base_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("TEST-org.pilot.CreditTest.xml");
        fs::write(&path, r#"<testsuite tests="1"><testcase classname="c" name="n"/></testsuite>"#).unwrap();

        let suite = parse_suite_file(&path);
        assert_eq!(suite.source, "TEST-org.pilot.CreditTest.xml");
        assert_eq!(suite.cases[0].source, suite.source);
        assert_eq!(suite.cases[0].status, TestStatus::Passed);
    }
}
