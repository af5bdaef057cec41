//! Typed filter predicates and filter sets.
//!
//! Dashboards filter lists by field/predicate pairs. The wire form of these
//! predicates (`q[name_cont]=...`) is produced by the gateway crate; this
//! module only knows the typed shape, normalisation, and the canonical
//! signature used to de-duplicate "no results" notices.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Field names must be lowercase snake_case so they can be embedded in
/// `q[<field>_<predicate>]` keys without escaping.
static FIELD_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("static regex is valid"));

/// A single filter condition on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FilterPredicate {
    /// Case-insensitive substring match.
    Contains { value: String },
    /// Exact match.
    Equals { value: String },
    /// Membership in a set of values.
    In { values: Vec<String> },
    /// Inclusive range; either bound may be open.
    Range {
        from: Option<String>,
        to: Option<String>,
    },
}

impl FilterPredicate {
    pub fn contains(value: impl Into<String>) -> Self {
        Self::Contains {
            value: value.into(),
        }
    }

    pub fn equals(value: impl Into<String>) -> Self {
        Self::Equals {
            value: value.into(),
        }
    }

    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::In {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn range(from: Option<impl Into<String>>, to: Option<impl Into<String>>) -> Self {
        Self::Range {
            from: from.map(Into::into),
            to: to.map(Into::into),
        }
    }

    /// Short name of the predicate kind, used in signatures.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Contains { .. } => "contains",
            Self::Equals { .. } => "equals",
            Self::In { .. } => "in",
            Self::Range { .. } => "range",
        }
    }

    /// Return the predicate with blank values removed, or `None` if nothing
    /// meaningful is left to send.
    pub fn normalized(&self) -> Option<Self> {
        match self {
            Self::Contains { value } => {
                non_blank(value).map(|value| Self::Contains { value })
            }
            Self::Equals { value } => non_blank(value).map(|value| Self::Equals { value }),
            Self::In { values } => {
                let mut kept: Vec<String> = values.iter().filter_map(|v| non_blank(v)).collect();
                kept.sort();
                kept.dedup();
                (!kept.is_empty()).then_some(Self::In { values: kept })
            }
            Self::Range { from, to } => {
                let from = from.as_deref().and_then(non_blank);
                let to = to.as_deref().and_then(non_blank);
                (from.is_some() || to.is_some()).then_some(Self::Range { from, to })
            }
        }
    }

    /// Canonical rendering of the predicate's value.
    fn canonical_value(&self) -> String {
        match self {
            Self::Contains { value } | Self::Equals { value } => value.clone(),
            Self::In { values } => values.join(","),
            Self::Range { from, to } => format!(
                "{}..{}",
                from.as_deref().unwrap_or_default(),
                to.as_deref().unwrap_or_default()
            ),
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Validate that a filter field name is safe to embed in a query key.
pub fn validate_field_name(field: &str) -> Result<(), CoreError> {
    if FIELD_NAME_RE.is_match(field) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid filter field '{field}'. Must be lowercase snake_case"
        )))
    }
}

/// The active filters of a list view, keyed by field name.
///
/// One predicate per field; inserting a second predicate for the same field
/// replaces the first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    entries: BTreeMap<String, FilterPredicate>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. Fails on an invalid field name.
    pub fn with(
        mut self,
        field: impl Into<String>,
        predicate: FilterPredicate,
    ) -> Result<Self, CoreError> {
        self.insert(field, predicate)?;
        Ok(self)
    }

    pub fn insert(
        &mut self,
        field: impl Into<String>,
        predicate: FilterPredicate,
    ) -> Result<(), CoreError> {
        let field = field.into();
        validate_field_name(&field)?;
        self.entries.insert(field, predicate);
        Ok(())
    }

    pub fn remove(&mut self, field: &str) -> Option<FilterPredicate> {
        self.entries.remove(field)
    }

    pub fn get(&self, field: &str) -> Option<&FilterPredicate> {
        self.entries.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate entries in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterPredicate)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Drop empty/blank predicates. Values are trimmed and `In` lists are
    /// sorted and de-duplicated so equal intents compare equal.
    pub fn normalized(&self) -> Self {
        let entries = self
            .entries
            .iter()
            .filter_map(|(field, pred)| pred.normalized().map(|p| (field.clone(), p)))
            .collect();
        Self { entries }
    }

    /// Canonical signature: entries sorted by field, rendered
    /// `field.kind=value`, joined with `&`. Empty for an empty set.
    pub fn signature(&self) -> String {
        self.normalized()
            .entries
            .iter()
            .map(|(field, pred)| format!("{field}.{}={}", pred.kind(), pred.canonical_value()))
            .collect::<Vec<_>>()
            .join("&")
    }
}
