//! XML report writer
//!
//! Both report kinds are written with an XML declaration and two-space
//! indentation. Output is a pure function of the aggregate report, so two
//! runs over the same inputs differ only in `generatedAt`.

use anyhow::{anyhow, Context, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fs;
use std::path::Path;

use crate::aggregate::{AggregateFunctionalReport, AggregatePerfReport, RunSection};
use crate::percentile::element_name;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
const DATE_FORMAT: &str = "%Y-%m-%d";
/// Latency text used when a run has no raw samples
const LATENCY_PLACEHOLDER: &str = "0.0";

/// Thin layer over the quick-xml writer for element-only documents
struct XmlDoc {
    writer: Writer<Vec<u8>>,
}

impl XmlDoc {
    fn new() -> quick_xml::Result<Self> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        Ok(Self { writer })
    }

    fn open(&mut self, name: &str, attrs: &[(&str, &str)]) -> quick_xml::Result<()> {
        let mut start = BytesStart::new(name);
        for &attr in attrs {
            start.push_attribute(attr);
        }
        self.writer.write_event(Event::Start(start))
    }

    fn close(&mut self, name: &str) -> quick_xml::Result<()> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))
    }

    fn empty(&mut self, name: &str) -> quick_xml::Result<()> {
        self.writer.write_event(Event::Empty(BytesStart::new(name)))
    }

    /// `<name>text</name>`, or `<name/>` when text is empty
    fn leaf(&mut self, name: &str, text: &str) -> quick_xml::Result<()> {
        if text.is_empty() {
            return self.empty(name);
        }
        self.writer.write_event(Event::Start(BytesStart::new(name)))?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        self.close(name)
    }

    fn finish(self) -> String {
        let mut bytes = self.writer.into_inner();
        bytes.push(b'\n');
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

/// Render a perf report as `PerformanceReport` XML
pub fn render_perf_report(report: &AggregatePerfReport) -> Result<String> {
    build_perf(report).map_err(|e| anyhow!("Error writing perf report XML: {}", e))
}

fn build_perf(report: &AggregatePerfReport) -> quick_xml::Result<String> {
    let mut doc = XmlDoc::new()?;
    let generated_at = report.generated_at.format(TIMESTAMP_FORMAT).to_string();

    doc.open("PerformanceReport", &[("generatedAt", generated_at.as_str())])?;

    doc.open("Summary", &[])?;
    doc.leaf("TotalSamples", &report.summary.samples.to_string())?;
    doc.leaf("TotalSuccess", &report.summary.successes.to_string())?;
    doc.leaf("TotalFailure", &report.summary.failures.to_string())?;
    doc.close("Summary")?;

    let hardware = report.environment.entries();
    if hardware.is_empty() {
        doc.empty("Hardware")?;
    } else {
        doc.open("Hardware", &[])?;
        for (key, value) in hardware {
            doc.leaf(key, value)?;
        }
        doc.close("Hardware")?;
    }

    if report.runs.is_empty() {
        doc.empty("Runs")?;
    } else {
        doc.open("Runs", &[])?;
        for run in &report.runs {
            write_run(&mut doc, run, &report.percentiles)?;
        }
        doc.close("Runs")?;
    }

    doc.close("PerformanceReport")?;
    Ok(doc.finish())
}

fn write_run(doc: &mut XmlDoc, run: &RunSection, percentiles: &[f64]) -> quick_xml::Result<()> {
    doc.open("Run", &[])?;
    doc.leaf("TargetTPS", &run.target_tps.to_string())?;
    doc.leaf("DurationSec", &run.duration_sec.to_string())?;
    doc.leaf("Samples", &run.samples.to_string())?;
    doc.leaf("Successes", &run.successes.to_string())?;
    doc.leaf("Failures", &run.failures.to_string())?;

    let mean = match &run.latency {
        Some(stats) => format!("{:.2}", stats.mean_ms),
        None => LATENCY_PLACEHOLDER.to_string(),
    };
    doc.leaf("AvgLatencyMs", &mean)?;

    doc.open("Percentiles", &[])?;
    for &p in percentiles {
        let value = run
            .latency
            .as_ref()
            .and_then(|stats| stats.percentile(p))
            .map(|v| format!("{:.2}", v))
            .unwrap_or_else(|| LATENCY_PLACEHOLDER.to_string());
        doc.leaf(&element_name(p), &value)?;
    }
    doc.close("Percentiles")?;

    doc.close("Run")
}

/// Render a functional report as `integrationTestReport` XML
pub fn render_functional_report(report: &AggregateFunctionalReport) -> Result<String> {
    build_functional(report).map_err(|e| anyhow!("Error writing test report XML: {}", e))
}

fn build_functional(report: &AggregateFunctionalReport) -> quick_xml::Result<String> {
    let mut doc = XmlDoc::new()?;
    let generated_at = report.generated_at.format(TIMESTAMP_FORMAT).to_string();
    let date = report.report_date.format(DATE_FORMAT).to_string();

    doc.open(
        "integrationTestReport",
        &[("generatedAt", generated_at.as_str()), ("date", date.as_str())],
    )?;

    doc.open("summary", &[])?;
    doc.leaf("totalTests", &report.summary.tests.to_string())?;
    doc.leaf("passed", &report.summary.passed.to_string())?;
    doc.leaf("failures", &report.summary.failures.to_string())?;
    doc.leaf("errors", &report.summary.errors.to_string())?;
    doc.leaf("coverage", &report.coverage.to_string())?;
    doc.close("summary")?;

    if report.cases.is_empty() {
        doc.empty("testcases")?;
    } else {
        doc.open("testcases", &[])?;
        for case in &report.cases {
            let mut attrs = vec![("classname", case.classname.as_str()), ("name", case.name.as_str())];
            if let Some(time) = &case.time {
                attrs.push(("time", time.as_str()));
            }
            doc.open("testcase", &attrs)?;
            doc.empty("description")?;
            doc.leaf("status", &case.status.to_string())?;
            doc.leaf("sourceReport", &case.source)?;
            doc.leaf("message", &case.message)?;
            doc.leaf("systemOut", &case.system_out)?;
            doc.close("testcase")?;
        }
        doc.close("testcases")?;
    }

    doc.close("integrationTestReport")?;
    Ok(doc.finish())
}

/// Write rendered XML, creating parent directories as needed
pub fn write_xml(xml: &str, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(output_path, xml)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;
    Ok(())
}

pub fn write_perf_report(report: &AggregatePerfReport, output_path: &Path) -> Result<()> {
    write_xml(&render_perf_report(report)?, output_path)
}

pub fn write_functional_report(report: &AggregateFunctionalReport, output_path: &Path) -> Result<()> {
    write_xml(&render_functional_report(report)?, output_path)
}
