use std::path::PathBuf;

use facility_core::error::CoreError;
use facility_core::filter::FilterSet;
use facility_core::query;
use facility_core::resources::Resource;
use facility_gateway::wire;

/// Default output file.
pub const DEFAULT_OUTPUT: &str = "export.csv";

/// Default rows fetched per request.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// What to export and where to write it.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub resource: Resource,
    pub filters: FilterSet,
    pub output: PathBuf,
    pub page_size: u32,
}

impl ExportConfig {
    /// Load the export job from environment variables.
    ///
    /// | Env Var            | Required | Default      |
    /// |--------------------|----------|--------------|
    /// | `EXPORT_RESOURCE`  | yes      | --           |
    /// | `EXPORT_FILTERS`   | no       | (none)       |
    /// | `EXPORT_OUTPUT`    | no       | `export.csv` |
    /// | `EXPORT_PAGE_SIZE` | no       | `100`        |
    ///
    /// `EXPORT_FILTERS` uses the `field_predicate=value,...` form, e.g.
    /// `issue_status_in=Open|Pending,created_at_gteq=2024-01-01`.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let resource = lookup("EXPORT_RESOURCE")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                CoreError::Configuration("EXPORT_RESOURCE environment variable is required".into())
            })?
            .trim()
            .parse::<Resource>()?;

        let filters = match lookup("EXPORT_FILTERS") {
            Some(raw) => wire::parse_filter_spec(&raw)?,
            None => FilterSet::new(),
        };

        let output = lookup("EXPORT_OUTPUT")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

        let page_size = match lookup("EXPORT_PAGE_SIZE") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                CoreError::Configuration(format!("EXPORT_PAGE_SIZE must be a positive integer, got '{raw}'"))
            })?,
            None => DEFAULT_PAGE_SIZE,
        };
        query::validate_page_size(page_size)?;

        Ok(Self {
            resource,
            filters,
            output,
            page_size,
        })
    }
}
