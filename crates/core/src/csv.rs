//! CSV export of in-memory table rows.
//!
//! Rows are the JSON records the gateway returned; columns pick values out of
//! them by key, with `.` descending into nested objects (`building.name`).

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// One exported column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvColumn {
    /// Dotted path into the row object.
    pub key: String,
    /// Header text.
    pub header: String,
}

impl CsvColumn {
    pub fn new(key: &str, header: &str) -> Self {
        Self {
            key: key.to_string(),
            header: header.to_string(),
        }
    }
}

/// Escape a value for CSV: wrap in quotes if it contains comma, quote, or newline.
fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r')
    {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Convert a JSON value to a CSV-friendly string.
fn json_value_to_csv(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Array(arr) => arr
            .iter()
            .map(json_value_to_csv)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("; "),
        serde_json::Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Look up a dotted path in a JSON object.
pub fn lookup<'a>(row: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    path.split('.').try_fold(row, |current, segment| current.get(segment))
}

/// Build a CSV document from `rows`. The first line is the header row.
///
/// Fails when there is nothing to export, so the caller can surface a notice
/// instead of downloading an empty file.
pub fn build_csv(columns: &[CsvColumn], rows: &[serde_json::Value]) -> Result<String, CoreError> {
    if columns.is_empty() {
        return Err(CoreError::Validation(
            "At least one column is required for export".to_string(),
        ));
    }
    if rows.is_empty() {
        return Err(CoreError::Validation("There are no rows to export".to_string()));
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(
        columns
            .iter()
            .map(|c| csv_escape(&c.header))
            .collect::<Vec<_>>()
            .join(","),
    );

    for row in rows {
        let cells: Vec<String> = columns
            .iter()
            .map(|c| {
                let value = lookup(row, &c.key).unwrap_or(&serde_json::Value::Null);
                csv_escape(&json_value_to_csv(value))
            })
            .collect();
        lines.push(cells.join(","));
    }

    Ok(lines.join("\n"))
}

/// Derive columns from the keys of the first row, in the order the backend
/// sent them.
pub fn columns_from_first_row(rows: &[serde_json::Value]) -> Vec<CsvColumn> {
    rows.first()
        .and_then(|r| r.as_object())
        .map(|obj| obj.keys().map(|k| CsvColumn::new(k, k)).collect())
        .unwrap_or_default()
}
