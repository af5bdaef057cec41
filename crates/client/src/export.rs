//! Export helpers shared by list views and the headless exporter.

use std::path::Path;

use facility_core::csv::{self, CsvColumn};
use facility_core::error::CoreError;
use facility_core::filter::FilterSet;
use facility_core::query::{self, ListQuery};
use facility_core::resources::Resource;
use facility_gateway::{Gateway, GatewayError};
use serde_json::Value;

/// Fetch every page of `resource` matching `filters`.
///
/// Stops at the last page reported by the backend, or earlier once a page
/// comes back short of `page_size`.
pub async fn fetch_all(
    gateway: &dyn Gateway,
    resource: Resource,
    filters: &FilterSet,
    page_size: u32,
) -> Result<Vec<Value>, GatewayError> {
    let mut query = ListQuery::new(page_size)?;
    query.set_filters(filters);

    let mut rows = Vec::new();
    loop {
        let page = gateway.fetch_page(resource, &query).await?;
        let fetched = page.rows.len();
        rows.extend(page.rows);

        let last_page = query::total_pages(page.total_count, page_size);
        tracing::debug!(
            resource = %resource,
            page = query.page(),
            last_page,
            fetched,
            "Export page fetched",
        );
        if fetched < page_size as usize || query.page() >= last_page {
            break;
        }

        let current = query.page();
        if query.set_page(current + 1, page.total_count) == current {
            break;
        }
    }
    Ok(rows)
}

/// Build a CSV from `rows`, deriving columns from the first row when none
/// are given.
pub fn rows_to_csv(rows: &[Value], columns: &[CsvColumn]) -> Result<String, CoreError> {
    if columns.is_empty() {
        let derived = csv::columns_from_first_row(rows);
        return csv::build_csv(&derived, rows);
    }
    csv::build_csv(columns, rows)
}

/// Write export bytes to `dest`. Empty content is refused so a failed export
/// never leaves an empty file behind.
pub fn write_export(dest: &Path, bytes: &[u8]) -> Result<(), GatewayError> {
    if bytes.is_empty() {
        return Err(GatewayError::EmptyBody);
    }
    std::fs::write(dest, bytes).map_err(|e| {
        CoreError::Storage(format!("write export to {}: {e}", dest.display()))
    })?;
    tracing::info!(path = %dest.display(), bytes = bytes.len(), "Export written");
    Ok(())
}

/// Download a server-rendered export for `query` and save it to `dest`.
pub async fn download_to_file(
    gateway: &dyn Gateway,
    path: &str,
    query: &ListQuery,
    dest: &Path,
) -> Result<(), GatewayError> {
    let bytes = gateway.download(path, query).await?;
    write_export(dest, &bytes)
}
