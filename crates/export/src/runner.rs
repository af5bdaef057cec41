use std::path::PathBuf;

use chrono::{DateTime, Utc};
use facility_client::export;
use facility_core::error::CoreError;
use facility_core::resources::Resource;
use facility_gateway::{Gateway, GatewayError};

use crate::config::ExportConfig;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The filters matched no records.
    #[error("No {resource} matched the export filters")]
    NoRows { resource: String },

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result of a finished export.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub resource: Resource,
    pub rows: usize,
    pub output: PathBuf,
    pub finished_at: DateTime<Utc>,
}

/// Fetch every matching row of the configured resource and write it as CSV.
///
/// An export that matches nothing fails instead of writing a header-only file.
pub async fn run_export(
    gateway: &dyn Gateway,
    config: &ExportConfig,
) -> Result<ExportSummary, ExportError> {
    tracing::info!(
        resource = %config.resource,
        filters = %config.filters.signature(),
        page_size = config.page_size,
        "Starting export",
    );

    let rows = export::fetch_all(gateway, config.resource, &config.filters, config.page_size).await?;
    if rows.is_empty() {
        return Err(ExportError::NoRows {
            resource: config.resource.label().to_lowercase(),
        });
    }

    let csv = export::rows_to_csv(&rows, &[])?;
    export::write_export(&config.output, csv.as_bytes())?;

    let summary = ExportSummary {
        resource: config.resource,
        rows: rows.len(),
        output: config.output.clone(),
        finished_at: Utc::now(),
    };
    tracing::info!(
        resource = %summary.resource,
        rows = summary.rows,
        output = %summary.output.display(),
        "Export finished",
    );
    Ok(summary)
}
