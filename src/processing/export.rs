use crate::constants::CHILD_HEADERS;
use crate::domain::Child;
use crate::error::{PortalError, Result};
use crate::processing::import::ImportFormat;

/// Render children as a delimited file using the import header contract, so
/// an export can be edited and imported again.
pub fn export(children: &[Child], format: ImportFormat) -> Result<String> {
    if children.is_empty() {
        return Err(PortalError::EmptyExport);
    }

    let delimiter = format.delimiter().to_string();
    let mut lines = Vec::with_capacity(children.len() + 1);
    lines.push(CHILD_HEADERS.join(delimiter.as_str()));

    for child in children {
        let cells: Vec<String> = CHILD_HEADERS
            .iter()
            .map(|column| escape_field(child.profile.field(column).unwrap_or(""), format))
            .collect();
        lines.push(cells.join(delimiter.as_str()));
    }

    Ok(lines.join("\n"))
}

/// CSV cells holding a comma, quote or newline are quoted with inner quotes
/// doubled. Every other cell has its line breaks flattened to spaces.
pub fn escape_field(value: &str, format: ImportFormat) -> String {
    if format == ImportFormat::Csv
        && (value.contains(',') || value.contains('"') || value.contains('\n'))
    {
        return format!("\"{}\"", value.replace('"', "\"\""));
    }
    value.replace(['\n', '\r'], " ")
}
