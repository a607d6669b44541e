//! # Check Reports
//!
//! Rendered scripts print one report line per predicate right before
//! asserting it:
//!
//! ```text
//! sfcheck-check name=dhcp-host:10.0.0.5 observed=1 expected=1
//! ```
//!
//! The script's exit code stays the pass/fail signal. Reports only tell the
//! operator what was actually seen.

use std::fmt;

use tracing::warn;

use crate::error::ProtocolError;

pub const REPORT_PREFIX: &str = "sfcheck-check";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub name: String,
    pub observed: u64,
    pub expected: u64,
}

impl CheckReport {
    pub fn passed(&self) -> bool {
        self.observed == self.expected
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: observed {}, expected {}",
            self.name, self.observed, self.expected
        )
    }
}

/// Parses a single line.
///
/// Returns `None` for lines that are not reports at all (ordinary tool
/// output), and an error for lines that claim to be reports but are broken.
pub fn parse_line(line: &str) -> Option<Result<CheckReport, ProtocolError>> {
    let rest = line.trim().strip_prefix(REPORT_PREFIX)?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(parse_fields(rest))
}

fn parse_fields(rest: &str) -> Result<CheckReport, ProtocolError> {
    let mut name = None;
    let mut observed = None;
    let mut expected = None;

    for token in rest.split_whitespace() {
        let Some((key, value)) = token.split_once('=') else {
            return Err(ProtocolError::UnexpectedToken(token.to_string()));
        };
        match key {
            "name" => name = Some(value.to_string()),
            "observed" => observed = Some(parse_count("observed", value)?),
            "expected" => expected = Some(parse_count("expected", value)?),
            _ => return Err(ProtocolError::UnexpectedToken(token.to_string())),
        }
    }

    Ok(CheckReport {
        name: name.ok_or(ProtocolError::MissingField("name"))?,
        observed: observed.ok_or(ProtocolError::MissingField("observed"))?,
        expected: expected.ok_or(ProtocolError::MissingField("expected"))?,
    })
}

fn parse_count(field: &'static str, value: &str) -> Result<u64, ProtocolError> {
    value.parse::<u64>().map_err(|_| ProtocolError::InvalidCount {
        field,
        value: value.to_string(),
    })
}

/// Collects every well-formed report in `output`. Broken report lines are
/// logged and skipped.
pub fn parse_reports(output: &str) -> Vec<CheckReport> {
    output
        .lines()
        .filter_map(parse_line)
        .filter_map(|res| match res {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("Ignoring malformed check report: {e}");
                None
            }
        })
        .collect()
}
