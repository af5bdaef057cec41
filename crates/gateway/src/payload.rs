//! Parsing of list responses.
//!
//! Endpoints disagree on envelope shape. Accepted forms:
//!
//! * a bare JSON array of records. It carries no total, so a full page
//!   reports one extra record to keep the next page reachable, and a short
//!   page ends the list;
//! * an object holding the records under the resource's collection key
//!   (e.g. `complaints`) or under `data`.
//!
//! Pagination is read from a `pagination` object when present, otherwise
//! from top-level `total_count` / `current_page`. Summary counters come from
//! a `counts` object or from top-level `*_count` numbers.

use facility_core::baseline::BaselineCounts;
use facility_core::list_state::Page;
use facility_core::query::ListQuery;
use facility_core::resources::Resource;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::GatewayError;

/// Parse a list response into an untyped page.
pub fn parse_list_payload(
    value: Value,
    resource: Resource,
    query: &ListQuery,
) -> Result<Page<Value>, GatewayError> {
    let mut obj = match value {
        Value::Array(rows) => {
            let seen = query.offset() + rows.len() as u64;
            let full = rows.len() as u64 >= u64::from(query.page_size());
            return Ok(Page {
                total_count: if full { seen + 1 } else { seen },
                rows,
                page: query.page(),
                page_size: query.page_size(),
                counts: BaselineCounts::new(),
            });
        }
        Value::Object(obj) => obj,
        other => {
            return Err(GatewayError::UnexpectedPayload(format!(
                "expected a list of {resource}, got {}",
                type_name(&other)
            )));
        }
    };

    let rows = match obj
        .remove(resource.collection_key())
        .or_else(|| obj.remove("data"))
    {
        Some(Value::Array(rows)) => rows,
        Some(other) => {
            return Err(GatewayError::UnexpectedPayload(format!(
                "'{}' is {}, not a list",
                resource.collection_key(),
                type_name(&other)
            )));
        }
        None => {
            return Err(GatewayError::UnexpectedPayload(format!(
                "no '{}' or 'data' key in response",
                resource.collection_key()
            )));
        }
    };

    let pagination = match obj.get("pagination") {
        Some(Value::Object(p)) => p.clone(),
        _ => obj.clone(),
    };

    let total_count = read_u64(&pagination, "total_count")
        .or_else(|| read_u64(&pagination, "total"))
        .unwrap_or(query.offset() + rows.len() as u64);
    let page = read_u64(&pagination, "current_page")
        .and_then(|p| u32::try_from(p).ok())
        .filter(|p| *p >= 1)
        .unwrap_or(query.page());

    Ok(Page {
        rows,
        total_count,
        page,
        page_size: query.page_size(),
        counts: read_counts(&obj),
    })
}

/// Deserialize the rows of an untyped page into entity models.
pub fn decode_rows<T: DeserializeOwned>(page: Page<Value>) -> Result<Page<T>, GatewayError> {
    let rows = page
        .rows
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<T>, _>>()?;
    Ok(Page {
        rows,
        total_count: page.total_count,
        page: page.page,
        page_size: page.page_size,
        counts: page.counts,
    })
}

fn read_counts(obj: &Map<String, Value>) -> BaselineCounts {
    if let Some(Value::Object(counts)) = obj.get("counts") {
        return BaselineCounts::from_pairs(
            counts
                .iter()
                .filter_map(|(k, v)| as_u64(v).map(|n| (k.as_str(), n))),
        );
    }
    BaselineCounts::from_pairs(
        obj.iter()
            .filter(|(k, _)| k.ends_with("_count") && k.as_str() != "total_count")
            .filter_map(|(k, v)| as_u64(v).map(|n| (k.as_str(), n))),
    )
}

fn read_u64(obj: &Map<String, Value>, key: &str) -> Option<u64> {
    obj.get(key).and_then(as_u64)
}

/// Numbers sometimes arrive as strings.
fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
