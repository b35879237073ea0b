use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::CHILD_HEADERS;
use crate::domain::{Gender, PreviousPreschool};
use crate::processing::import::{ParsedImport, ParsedRow};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid"));

/// Columns a row cannot meaningfully be imported without
const REQUIRED_COLUMNS: [&str; 2] = ["name", "parentEmail"];

/// Severity levels for row issues
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum IssueSeverity {
    /// Worth knowing, nothing was changed
    Info,
    /// A value was defaulted or dropped
    Warning,
    /// The row imports, but with data the portal cannot use
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum IssueKind {
    ShortRow { expected: usize, found: usize },
    ExtraCells { expected: usize, found: usize },
    CoercedValue { original: String },
    MissingRequired,
    InvalidDate,
    InvalidEmail,
    UnknownColumn,
}

/// Something the lenient import quietly smoothed over in one row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RowIssue {
    /// Source line the issue was found on
    pub line: usize,
    pub field: Option<String>,
    pub kind: IssueKind,
    pub severity: IssueSeverity,
    pub description: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImportPolicy {
    /// Import everything, defaulting as needed
    #[default]
    Lenient,
    /// Refuse the whole file if any row has an error
    Strict,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ImportDecision {
    Accept,
    AcceptWithWarnings,
    Reject,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QualityReport {
    pub issues: Vec<RowIssue>,
}

impl QualityReport {
    pub fn count(&self, severity: IssueSeverity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn errors(&self) -> usize {
        self.count(IssueSeverity::Error)
    }

    pub fn decision(&self, policy: ImportPolicy) -> ImportDecision {
        let worst = self.issues.iter().map(|i| i.severity).max();
        match (worst, policy) {
            (Some(IssueSeverity::Error), ImportPolicy::Strict) => ImportDecision::Reject,
            (Some(IssueSeverity::Error | IssueSeverity::Warning), _) => {
                ImportDecision::AcceptWithWarnings
            }
            _ => ImportDecision::Accept,
        }
    }
}

/// Inspect a parsed file without changing what the importer produces.
pub fn assess(parsed: &ParsedImport) -> QualityReport {
    let mut issues = assess_header(parsed.header_line, &parsed.header);
    for row in &parsed.rows {
        issues.extend(assess_row(&parsed.header, row));
    }
    QualityReport { issues }
}

fn assess_header(line: usize, header: &[String]) -> Vec<RowIssue> {
    header
        .iter()
        .filter(|column| !CHILD_HEADERS.contains(&column.as_str()))
        .map(|column| RowIssue {
            line,
            field: Some(column.clone()),
            kind: IssueKind::UnknownColumn,
            severity: IssueSeverity::Info,
            description: format!("Column '{}' is not part of the child profile and is ignored", column),
        })
        .collect()
}

fn assess_row(header: &[String], row: &ParsedRow) -> Vec<RowIssue> {
    let mut issues = Vec::new();
    let expected = header.len();
    let found = row.cells.len();

    if found < expected {
        issues.push(RowIssue {
            line: row.line,
            field: None,
            kind: IssueKind::ShortRow { expected, found },
            severity: IssueSeverity::Warning,
            description: format!("Row has {} of {} cells; missing cells are left empty", found, expected),
        });
    } else if found > expected {
        issues.push(RowIssue {
            line: row.line,
            field: None,
            kind: IssueKind::ExtraCells { expected, found },
            severity: IssueSeverity::Warning,
            description: format!("Row has {} cells but the header has {}; extras are dropped", found, expected),
        });
    }

    let record = row.to_record(header);
    let value = |key: &str| record.get(key).copied().unwrap_or("");

    let gender = value("gender");
    if !gender.is_empty() && !Gender::is_valid(gender) {
        issues.push(coerced(row.line, "gender", gender, Gender::Other.as_str()));
    }

    let previous = value("previousPreschool");
    if !previous.is_empty() && !PreviousPreschool::is_valid(previous) {
        issues.push(coerced(row.line, "previousPreschool", previous, PreviousPreschool::No.as_str()));
    }

    for column in REQUIRED_COLUMNS {
        if value(column).trim().is_empty() {
            issues.push(RowIssue {
                line: row.line,
                field: Some(column.to_string()),
                kind: IssueKind::MissingRequired,
                severity: IssueSeverity::Error,
                description: format!("'{}' is empty", column),
            });
        }
    }

    let dob = value("dateOfBirth");
    if !dob.is_empty() && NaiveDate::parse_from_str(dob, "%Y-%m-%d").is_err() {
        issues.push(RowIssue {
            line: row.line,
            field: Some("dateOfBirth".to_string()),
            kind: IssueKind::InvalidDate,
            severity: IssueSeverity::Error,
            description: format!("'{}' is not a YYYY-MM-DD date", dob),
        });
    }

    let email = value("parentEmail");
    if !email.trim().is_empty() && !EMAIL_RE.is_match(email) {
        issues.push(RowIssue {
            line: row.line,
            field: Some("parentEmail".to_string()),
            kind: IssueKind::InvalidEmail,
            severity: IssueSeverity::Error,
            description: format!("'{}' is not an email address", email),
        });
    }

    issues
}

fn coerced(line: usize, field: &str, original: &str, replacement: &str) -> RowIssue {
    RowIssue {
        line,
        field: Some(field.to_string()),
        kind: IssueKind::CoercedValue {
            original: original.to_string(),
        },
        severity: IssueSeverity::Warning,
        description: format!("'{}' is not a valid {}; stored as '{}'", original, field, replacement),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::import::{parse_rows, ImportFormat};

    fn report(source: &str) -> QualityReport {
        assess(&parse_rows(source, ImportFormat::Csv).unwrap())
    }

    #[test]
    fn test_clean_file_is_accepted() {
        let report = report(
            "name,dateOfBirth,gender,parentEmail,previousPreschool\n\
             Jane Doe,2020-01-01,female,jane@example.com,yes",
        );
        assert!(report.issues.is_empty());
        assert_eq!(report.decision(ImportPolicy::Strict), ImportDecision::Accept);
    }

    #[test]
    fn test_coerced_values_are_warnings() {
        let report = report("name,gender,previousPreschool,parentEmail\nJane,robot,maybe,jane@example.com");
        assert_eq!(report.count(IssueSeverity::Warning), 2);
        assert!(report.issues.iter().any(|i| i.kind
            == IssueKind::CoercedValue {
                original: "robot".to_string()
            }));
        assert_eq!(
            report.decision(ImportPolicy::Strict),
            ImportDecision::AcceptWithWarnings
        );
    }

    #[test]
    fn test_empty_enum_values_are_not_reported() {
        let report = report("name,gender,previousPreschool,parentEmail\nJane,,,jane@example.com");
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_ragged_rows() {
        let report = report("name,parentEmail,address\nJane\nBob,bob@example.com,1 Main St,extra");
        let short = report
            .issues
            .iter()
            .find(|i| matches!(i.kind, IssueKind::ShortRow { .. }))
            .unwrap();
        assert_eq!(short.line, 2);
        assert_eq!(short.kind, IssueKind::ShortRow { expected: 3, found: 1 });
        assert!(report
            .issues
            .iter()
            .any(|i| i.line == 3 && i.kind == IssueKind::ExtraCells { expected: 3, found: 4 }));
    }

    #[test]
    fn test_errors_reject_only_under_strict_policy() {
        let report = report("name,dateOfBirth,parentEmail\n,01/02/2020,not-an-email");
        assert_eq!(report.errors(), 3);
        assert_eq!(report.decision(ImportPolicy::Strict), ImportDecision::Reject);
        assert_eq!(
            report.decision(ImportPolicy::Lenient),
            ImportDecision::AcceptWithWarnings
        );
    }

    #[test]
    fn test_unknown_columns_are_informational() {
        let report = report("name,parentEmail,shoeSize\nJane,jane@example.com,28");
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].kind, IssueKind::UnknownColumn);
        assert_eq!(report.decision(ImportPolicy::Strict), ImportDecision::Accept);
    }

    #[test]
    fn test_header_issues_carry_the_header_line() {
        let report = report("\n\nname,parentEmail,shoeSize\nJane,jane@example.com,28");
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].line, 3);
        assert_eq!(report.issues[0].field.as_deref(), Some("shoeSize"));
    }
}
