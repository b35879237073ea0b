use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{MALFORMED_INPUT_MESSAGE, PLACEHOLDER_PHOTO, TSV_MIME_TYPE};
use crate::domain::{Gender, ImportedProfile, PreviousPreschool};
use crate::error::{PortalError, Result};

/// Delimited text flavour of an uploaded roster file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportFormat {
    Csv,
    Tsv,
}

impl ImportFormat {
    /// Decide the format from what the upload says about itself, never from
    /// the content.
    pub fn from_file(file_name: &str, mime_type: Option<&str>) -> Self {
        if file_name.ends_with(".tsv") || mime_type == Some(TSV_MIME_TYPE) {
            ImportFormat::Tsv
        } else {
            ImportFormat::Csv
        }
    }

    pub fn delimiter(&self) -> char {
        match self {
            ImportFormat::Csv => ',',
            ImportFormat::Tsv => '\t',
        }
    }

    pub fn split_row(&self, line: &str) -> Vec<String> {
        match self {
            ImportFormat::Csv => split_csv_row(line),
            ImportFormat::Tsv => split_tsv_row(line),
        }
    }
}

impl fmt::Display for ImportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportFormat::Csv => write!(f, "csv"),
            ImportFormat::Tsv => write!(f, "tsv"),
        }
    }
}

impl FromStr for ImportFormat {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ImportFormat::Csv),
            "tsv" => Ok(ImportFormat::Tsv),
            other => Err(PortalError::Config(format!("Unknown file format: {}", other))),
        }
    }
}

/// Split one CSV line into cells.
///
/// A single in-quotes flag drives the scan: a doubled quote inside quotes
/// yields one literal quote, any other quote toggles the flag, and a comma
/// outside quotes ends the cell. The flag never carries over to the next line,
/// so quoted cells cannot span lines.
pub fn split_csv_row(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                cells.push(std::mem::take(&mut field));
            }
            _ => field.push(c),
        }
    }
    cells.push(field);
    cells
}

/// Split one TSV line on tabs. No quoting is recognised.
pub fn split_tsv_row(line: &str) -> Vec<String> {
    line.split('\t').map(str::to_string).collect()
}

/// One data line of the source, in source order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRow {
    /// 1-based line number in the source text
    pub line: usize,
    pub cells: Vec<String>,
}

impl ParsedRow {
    /// Zip the cells against the header by position. Missing cells read as
    /// empty, cells past the header are dropped, and a repeated header name
    /// keeps its last column.
    pub fn to_record<'a>(&'a self, header: &'a [String]) -> HashMap<&'a str, &'a str> {
        header
            .iter()
            .enumerate()
            .map(|(i, key)| (key.as_str(), self.cells.get(i).map(String::as_str).unwrap_or("")))
            .collect()
    }
}

/// Header and data rows of a delimited file, before any field mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedImport {
    pub format: ImportFormat,
    /// 1-based line number of the header in the source text
    pub header_line: usize,
    pub header: Vec<String>,
    pub rows: Vec<ParsedRow>,
}

/// Split the source into a header and data rows.
///
/// Blank lines are skipped. Fewer than two remaining lines is the only
/// failure.
pub fn parse_rows(source: &str, format: ImportFormat) -> Result<ParsedImport> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);

    let mut lines = source
        .split('\n')
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| (index + 1, line.trim().replace('\r', "")));

    let (header_number, header_text) = lines
        .next()
        .ok_or_else(|| PortalError::MalformedInput(MALFORMED_INPUT_MESSAGE.to_string()))?;

    let rows: Vec<ParsedRow> = lines
        .map(|(line, text)| ParsedRow {
            line,
            cells: format.split_row(&text),
        })
        .collect();

    if rows.is_empty() {
        return Err(PortalError::MalformedInput(MALFORMED_INPUT_MESSAGE.to_string()));
    }

    let header = format
        .split_row(&header_text)
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();

    debug!("parse_rows: format={} data_rows={}", format, rows.len());
    Ok(ParsedImport {
        format,
        header_line: header_number,
        header,
        rows,
    })
}

/// Turns roster files into child profiles, defaulting rather than rejecting
/// anything it does not understand
#[derive(Debug, Clone)]
pub struct DelimitedRecordImporter {
    pub placeholder_photo: String,
}

impl Default for DelimitedRecordImporter {
    fn default() -> Self {
        Self {
            placeholder_photo: PLACEHOLDER_PHOTO.to_string(),
        }
    }
}

impl DelimitedRecordImporter {
    pub fn new(placeholder_photo: impl Into<String>) -> Self {
        Self {
            placeholder_photo: placeholder_photo.into(),
        }
    }

    pub fn parse(&self, source: &str, format: ImportFormat) -> Result<Vec<ImportedProfile>> {
        let parsed = parse_rows(source, format)?;
        Ok(self.profiles(&parsed))
    }

    /// Map every parsed row to a profile; one profile per row, in order.
    pub fn profiles(&self, parsed: &ParsedImport) -> Vec<ImportedProfile> {
        parsed
            .rows
            .iter()
            .map(|row| self.to_profile(&row.to_record(&parsed.header)))
            .collect()
    }

    fn to_profile(&self, record: &HashMap<&str, &str>) -> ImportedProfile {
        let text = |key: &str| record.get(key).copied().unwrap_or("").to_string();

        ImportedProfile {
            name: text("name"),
            date_of_birth: text("dateOfBirth"),
            gender: Gender::coerce(record.get("gender").copied().unwrap_or("")),
            address: text("address"),
            parent: text("parent"),
            parent_email: text("parentEmail"),
            parent_phone: text("parentPhone"),
            photo: self.placeholder_photo.clone(),
            medical_conditions: text("medicalConditions"),
            emergency_contact_name: text("emergencyContactName"),
            emergency_contact_phone: text("emergencyContactPhone"),
            previous_preschool: PreviousPreschool::coerce(
                record.get("previousPreschool").copied().unwrap_or(""),
            ),
            additional_notes: text("additionalNotes"),
        }
    }
}

/// Parse with the default placeholder photo.
pub fn parse(source: &str, format: ImportFormat) -> Result<Vec<ImportedProfile>> {
    DelimitedRecordImporter::default().parse(source, format)
}
