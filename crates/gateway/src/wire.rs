//! Mapping between typed queries and the backend's query-string keys.
//!
//! The backend filters with `q[<field>_<predicate>]` keys:
//!
//! | Predicate              | Keys                                   |
//! |------------------------|----------------------------------------|
//! | `Contains`             | `q[field_cont]=v`                      |
//! | `Equals`               | `q[field_eq]=v`                        |
//! | `In`                   | `q[field_in][]=a&q[field_in][]=b`      |
//! | `Range { from, to }`   | `q[field_gteq]=from&q[field_lteq]=to`  |
//!
//! Sorting is `q[s]=<field> <asc|desc>`; pagination is `page` / `per_page`.

use facility_core::error::CoreError;
use facility_core::filter::{FilterPredicate, FilterSet};
use facility_core::query::ListQuery;
use facility_core::types::EntityId;

/// Query-string pairs in send order.
pub type Params = Vec<(String, String)>;

/// Query pairs for a filter set. Blank predicates are dropped first.
pub fn filter_params(filters: &FilterSet) -> Params {
    let mut params = Params::new();
    for (field, predicate) in filters.normalized().iter() {
        match predicate {
            FilterPredicate::Contains { value } => {
                params.push((format!("q[{field}_cont]"), value.clone()));
            }
            FilterPredicate::Equals { value } => {
                params.push((format!("q[{field}_eq]"), value.clone()));
            }
            FilterPredicate::In { values } => {
                let key = format!("q[{field}_in][]");
                params.extend(values.iter().map(|v| (key.clone(), v.clone())));
            }
            FilterPredicate::Range { from, to } => {
                if let Some(from) = from {
                    params.push((format!("q[{field}_gteq]"), from.clone()));
                }
                if let Some(to) = to {
                    params.push((format!("q[{field}_lteq]"), to.clone()));
                }
            }
        }
    }
    params
}

/// Query pairs for one page of a list request.
pub fn list_params(query: &ListQuery) -> Params {
    let mut params = vec![
        ("page".to_string(), query.page().to_string()),
        ("per_page".to_string(), query.page_size().to_string()),
    ];
    if let Some(sort) = query.sort() {
        params.push((
            "q[s]".to_string(),
            format!("{} {}", sort.field, sort.direction.as_str()),
        ));
    }
    params.extend(filter_params(query.filters()));
    params
}

/// Bulk-action ids, comma-joined: `1,2,3`.
pub fn join_ids(ids: &[EntityId]) -> String {
    ids.iter()
        .map(EntityId::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

const SUFFIXES: &[&str] = &["_gteq", "_lteq", "_cont", "_in", "_eq"];

/// Parse a compact filter string such as
/// `heading_cont=leak,issue_status_in=Open|Pending,created_at_gteq=2024-01-01`.
///
/// Entries are comma-separated `<field>_<predicate>=<value>` pairs; `in`
/// values are separated by `|`. A `gteq` and an `lteq` on the same field
/// merge into one range.
pub fn parse_filter_spec(spec: &str) -> Result<FilterSet, CoreError> {
    let mut filters = FilterSet::new();

    for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (key, value) = entry.split_once('=').ok_or_else(|| {
            CoreError::Validation(format!("Filter '{entry}' must look like field_predicate=value"))
        })?;
        let key = key.trim();
        let value = value.trim();

        let (field, suffix) = SUFFIXES
            .iter()
            .find_map(|s| key.strip_suffix(*s).map(|field| (field, *s)))
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Filter '{key}' must end with one of: {}",
                    SUFFIXES.join(", ")
                ))
            })?;

        let predicate = match suffix {
            "_cont" => FilterPredicate::contains(value),
            "_in" => FilterPredicate::one_of(value.split('|').map(str::trim)),
            "_gteq" | "_lteq" => {
                let (mut from, mut to) = match filters.get(field) {
                    Some(FilterPredicate::Range { from, to }) => (from.clone(), to.clone()),
                    _ => (None, None),
                };
                if suffix == "_gteq" {
                    from = Some(value.to_string());
                } else {
                    to = Some(value.to_string());
                }
                FilterPredicate::Range { from, to }
            }
            _ => FilterPredicate::equals(value),
        };
        filters.insert(field, predicate)?;
    }

    Ok(filters)
}
