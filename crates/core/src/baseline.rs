//! Baseline counts for quick-filter summary cards.
//!
//! Summary counters above a table (total / active / inactive / ...) are
//! clickable shortcuts. They must describe the unfiltered dataset so they
//! stay put while the table underneath is filtered.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Named counters reported by the gateway alongside a list page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineCounts {
    counts: BTreeMap<String, u64>,
}

impl BaselineCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, u64)>,
        K: Into<String>,
    {
        Self {
            counts: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.counts.get(name).copied()
    }

    pub fn set(&mut self, name: impl Into<String>, value: u64) {
        self.counts.insert(name.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Holds the last counts observed while no filters were active.
#[derive(Debug, Clone, Default)]
pub struct BaselineTracker {
    current: BaselineCounts,
}

impl BaselineTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer counts from a fresh response. Accepted only when the response
    /// was for an unfiltered query. Returns whether the baseline changed.
    pub fn offer(&mut self, counts: &BaselineCounts, filters_active: bool) -> bool {
        if filters_active || counts.is_empty() || *counts == self.current {
            return false;
        }
        self.current = counts.clone();
        true
    }

    pub fn counts(&self) -> &BaselineCounts {
        &self.current
    }
}
