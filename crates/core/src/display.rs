//! Placeholders for missing backend values.
//!
//! Remote records treat every field as optional. Tables render a missing
//! value as `-`; detail cards use `--`.

/// Placeholder used in table cells.
pub const TABLE_PLACEHOLDER: &str = "-";

/// Placeholder used on detail cards.
pub const DETAIL_PLACEHOLDER: &str = "--";

/// Text of an optional value for a table cell.
pub fn cell(value: Option<&str>) -> &str {
    or_placeholder(value, TABLE_PLACEHOLDER)
}

/// Text of an optional value for a detail card.
pub fn detail(value: Option<&str>) -> &str {
    or_placeholder(value, DETAIL_PLACEHOLDER)
}

fn or_placeholder<'a>(value: Option<&'a str>, placeholder: &'a str) -> &'a str {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => placeholder,
    }
}

/// Render any JSON value for a table cell.
pub fn json_cell(value: Option<&serde_json::Value>) -> String {
    match value {
        None | Some(serde_json::Value::Null) => TABLE_PLACEHOLDER.to_string(),
        Some(serde_json::Value::String(s)) => cell(Some(s.as_str())).to_string(),
        Some(serde_json::Value::Bool(b)) => (if *b { "Yes" } else { "No" }).to_string(),
        Some(other) => other.to_string(),
    }
}
