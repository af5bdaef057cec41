//! List query state: page, page size, filters, and sort.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::filter::FilterSet;

/// Page size used by dashboards that do not override it.
pub const DEFAULT_PAGE_SIZE: u32 = 15;

/// Largest page size the client will ask for.
pub const MAX_PAGE_SIZE: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// The request parameters of a paginated, filterable list view.
///
/// Filters are stored normalised. Changing filters or sort resets the page
/// to 1; changing the page leaves filters untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    page: u32,
    page_size: u32,
    filters: FilterSet,
    sort: Option<SortKey>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            filters: FilterSet::new(),
            sort: None,
        }
    }
}

impl ListQuery {
    pub fn new(page_size: u32) -> Result<Self, CoreError> {
        validate_page_size(page_size)?;
        Ok(Self {
            page_size,
            ..Self::default()
        })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn sort(&self) -> Option<&SortKey> {
        self.sort.as_ref()
    }

    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }

    /// Replace the filter set. Returns `false` (and changes nothing) when the
    /// normalised filters equal the current ones.
    pub fn set_filters(&mut self, filters: &FilterSet) -> bool {
        let normalized = filters.normalized();
        if normalized == self.filters {
            return false;
        }
        self.filters = normalized;
        self.page = 1;
        true
    }

    /// Replace the sort key. Returns `false` when unchanged.
    pub fn set_sort(&mut self, sort: Option<SortKey>) -> bool {
        if sort == self.sort {
            return false;
        }
        self.sort = sort;
        self.page = 1;
        true
    }

    /// Move to page `n`, clamped to `[1, total_pages]`. Returns the page
    /// actually selected.
    pub fn set_page(&mut self, n: u32, total_count: u64) -> u32 {
        self.page = clamp_page(n, total_pages(total_count, self.page_size));
        self.page
    }

    /// Zero-based offset of the first row on the current page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

/// Validate that a page size is in `1..=MAX_PAGE_SIZE`.
pub fn validate_page_size(page_size: u32) -> Result<(), CoreError> {
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(CoreError::Validation(format!(
            "Page size {page_size} is out of range (1..{MAX_PAGE_SIZE})"
        )));
    }
    Ok(())
}

/// Number of pages needed for `total_count` rows. Never less than 1, so an
/// empty list still has a page to show.
pub fn total_pages(total_count: u64, page_size: u32) -> u32 {
    let size = u64::from(page_size.max(1));
    let pages = total_count.div_ceil(size).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Clamp a requested page number to `[1, total_pages]`.
pub fn clamp_page(requested: u32, total_pages: u32) -> u32 {
    requested.clamp(1, total_pages.max(1))
}

/// Number of rows expected on `page` given the total count.
pub fn rows_on_page(page: u32, page_size: u32, total_count: u64) -> u64 {
    let start = u64::from(page.saturating_sub(1)) * u64::from(page_size);
    total_count.saturating_sub(start).min(u64::from(page_size))
}
