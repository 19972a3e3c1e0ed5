use thiserror::Error;
use tracing::debug;

use crate::record::BenchmarkRecord;
use crate::schema::FieldGroup;

/// Problems found while reading a record out of captured output.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("output ended before the {group} line")]
    MissingLine { group: FieldGroup },
    #[error("expected {group} line, found `{line}`")]
    GroupMismatch { group: FieldGroup, line: String },
    #[error("field {field} is not a number: `{text}`")]
    InvalidNumber { field: &'static str, text: String },
}

impl ParseError {
    /// Field group the error was raised for.
    pub fn group(&self) -> Option<FieldGroup> {
        match self {
            ParseError::MissingLine { group } | ParseError::GroupMismatch { group, .. } => {
                Some(*group)
            }
            ParseError::InvalidNumber { .. } => None,
        }
    }

    /// Whether the error ended the scan, as opposed to dropping a single field.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ParseError::InvalidNumber { .. })
    }
}

/// Record recovered from one capture plus everything that went wrong on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    pub record: BenchmarkRecord,
    /// `false` when the run-time marker never appeared.
    pub marker_found: bool,
    pub errors: Vec<ParseError>,
}

impl ParseOutcome {
    /// Every group matched and every captured number converted.
    pub fn is_complete(&self) -> bool {
        self.marker_found && self.errors.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.record.is_empty()
    }

    pub fn into_record(self) -> BenchmarkRecord {
        self.record
    }
}

/// Extracts the record from captured output text.
pub fn parse_output(text: &str) -> ParseOutcome {
    parse_lines(text.lines())
}

/// Scans `lines` for the first run-time marker and reads the record anchored there.
///
/// A missing marker yields an empty outcome. After the marker, the next three
/// lines must match the hit, other and total groups in order; the first line
/// that does not stops the scan and the fields captured so far are kept.
pub fn parse_lines<I, S>(lines: I) -> ParseOutcome
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut outcome = ParseOutcome::default();
    let mut lines = lines.into_iter();

    let Some(anchor) = lines
        .by_ref()
        .find(|line| FieldGroup::RunTime.pattern().is_match(line.as_ref()))
    else {
        debug!("run-time marker not found in output");
        return outcome;
    };
    outcome.marker_found = true;
    capture_group(FieldGroup::RunTime, anchor.as_ref(), &mut outcome);

    for group in &FieldGroup::ORDER[1..] {
        let Some(line) = lines.next() else {
            outcome.errors.push(ParseError::MissingLine { group: *group });
            break;
        };
        if !capture_group(*group, line.as_ref(), &mut outcome) {
            outcome.errors.push(ParseError::GroupMismatch {
                group: *group,
                line: line.as_ref().trim_end().to_string(),
            });
            break;
        }
    }

    outcome
}

/// Copies the group's captures into the record. Returns `false` if the line
/// does not match the group's pattern.
fn capture_group(group: FieldGroup, line: &str, outcome: &mut ParseOutcome) -> bool {
    let Some(captures) = group.pattern().captures(line) else {
        return false;
    };

    for &field in group.fields() {
        let Some(text) = captures.name(field).map(|m| m.as_str()) else {
            continue;
        };
        match text.parse::<f64>() {
            Ok(value) => outcome.record.insert(field, value),
            Err(_) => outcome.errors.push(ParseError::InvalidNumber {
                field,
                text: text.to_string(),
            }),
        }
    }
    true
}
