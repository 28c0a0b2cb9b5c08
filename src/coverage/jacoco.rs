//! JaCoCo XML report parser

use anyhow::{anyhow, bail, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs;
use std::path::Path;

use super::CoverageSummary;

/// Counter types consulted, in order of preference
const PREFERRED_COUNTERS: [&str; 2] = ["INSTRUCTION", "LINE"];

#[derive(Debug)]
struct Counter {
    kind: String,
    covered: u64,
    missed: u64,
}

fn read_counter(e: &BytesStart) -> Counter {
    let mut counter = Counter {
        kind: String::new(),
        covered: 0,
        missed: 0,
    };
    for attr in e.attributes().filter_map(|a| a.ok()) {
        let value = String::from_utf8_lossy(&attr.value);
        match attr.key.as_ref() {
            b"type" => counter.kind = value.to_string(),
            b"covered" => counter.covered = value.trim().parse().unwrap_or(0),
            b"missed" => counter.missed = value.trim().parse().unwrap_or(0),
            _ => {}
        }
    }
    counter
}

/// Parse a JaCoCo XML file
pub fn parse_jacoco(path: &Path) -> Result<CoverageSummary> {
    let content = fs::read_to_string(path)?;
    parse_jacoco_string(&content)
}

/// Parse JaCoCo XML content from a string.
///
/// The first INSTRUCTION counter in document order is used, wherever it is
/// nested, then the first LINE counter. A report with neither is
/// [`CoverageSummary::Unavailable`].
pub fn parse_jacoco_string(content: &str) -> Result<CoverageSummary> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut counters = Vec::new();
    let mut depth = 0usize;
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| anyhow!("Error parsing JaCoCo XML: {}", e))?;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                if e.name().as_ref() == b"counter" {
                    counters.push(read_counter(e));
                }
                if matches!(event, Event::Start(_)) {
                    depth += 1;
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if depth != 0 {
        bail!("Error parsing JaCoCo XML: unexpected end of document");
    }

    let picked = PREFERRED_COUNTERS
        .iter()
        .find_map(|kind| counters.iter().find(|c| c.kind == *kind));

    Ok(match picked {
        Some(counter) => CoverageSummary::Measured {
            covered: counter.covered,
            missed: counter.missed,
        },
        None => CoverageSummary::Unavailable,
    })
}
