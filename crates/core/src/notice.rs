//! User-facing notices and the empty-result de-duplication guard.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Message shown when a filtered list comes back empty.
pub const NO_RESULTS_MESSAGE: &str = "No records match the selected filters";

/// Fallback shown when the backend gives no usable error message.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A non-blocking notification (toast) queued for the view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Decides whether a "no results" notice should fire for a result.
///
/// A notice fires at most once per filter signature. Observing any non-empty
/// result forgets every remembered signature, so a filter that was empty,
/// then had rows, then is empty again will notify again. Unfiltered empty
/// results never notify.
#[derive(Debug, Clone, Default)]
pub struct EmptyResultGuard {
    notified: HashSet<String>,
}

impl EmptyResultGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a result for `signature` with `row_count` rows. Returns `true`
    /// when the caller should show the notice.
    pub fn observe(&mut self, signature: &str, row_count: usize) -> bool {
        if row_count > 0 {
            self.notified.clear();
            return false;
        }
        if signature.is_empty() {
            return false;
        }
        self.notified.insert(signature.to_string())
    }

    pub fn reset(&mut self) {
        self.notified.clear();
    }
}
