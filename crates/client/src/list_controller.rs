//! Controller for a remote-backed, paginated, filterable table.
//!
//! Wraps a [`ListState`] and a gateway handle. The convenience methods
//! (`set_filters`, `set_page`, `refetch`, ...) issue the request and apply
//! the response in one call. Views that keep several requests in flight use
//! [`EntityListController::begin_fetch`], [`PendingFetch::run`] and
//! [`EntityListController::complete`] instead; responses that are no longer
//! the latest are dropped by the state.

use std::sync::Arc;

use facility_core::csv::{self, CsvColumn};
use facility_core::error::CoreError;
use facility_core::filter::FilterSet;
use facility_core::form::FormValues;
use facility_core::list_state::{ApplyOutcome, Identified, ListState, Page};
use facility_core::notice::Notice;
use facility_core::query::{ListQuery, SortKey};
use facility_core::resources::Resource;
use facility_core::sequence::RequestTicket;
use facility_core::types::EntityId;
use facility_gateway::payload::decode_rows;
use facility_gateway::{Gateway, GatewayError, MutationBody};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A list request that has been issued a ticket but not yet sent.
#[derive(Debug, Clone)]
pub struct PendingFetch {
    ticket: RequestTicket,
    resource: Resource,
    query: ListQuery,
}

impl PendingFetch {
    pub fn ticket(&self) -> RequestTicket {
        self.ticket
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    /// Send the request and decode the rows.
    pub async fn run<T: DeserializeOwned>(self, gateway: &dyn Gateway) -> FetchResult<T> {
        let result = match gateway.fetch_page(self.resource, &self.query).await {
            Ok(page) => decode_rows(page),
            Err(e) => Err(e),
        };
        FetchResult {
            ticket: self.ticket,
            result,
        }
    }
}

/// The outcome of a [`PendingFetch`], ready to hand back to the controller.
#[derive(Debug)]
pub struct FetchResult<T> {
    pub ticket: RequestTicket,
    pub result: Result<Page<T>, GatewayError>,
}

pub struct EntityListController<T> {
    gateway: Arc<dyn Gateway>,
    resource: Resource,
    record_root: Option<String>,
    state: ListState<T>,
}

impl<T> EntityListController<T>
where
    T: Identified + Clone + Serialize + DeserializeOwned + Send,
{
    pub fn new(
        gateway: Arc<dyn Gateway>,
        resource: Resource,
        page_size: u32,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            gateway,
            resource,
            record_root: None,
            state: ListState::new(ListQuery::new(page_size)?),
        })
    }

    /// Nest mutation bodies under `root`, e.g. `complaint`.
    pub fn with_record_root(mut self, root: impl Into<String>) -> Self {
        self.record_root = Some(root.into());
        self
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn state(&self) -> &ListState<T> {
        &self.state
    }

    // ---- fetching ----

    /// Issue a ticket for the current query without sending anything.
    pub fn begin_fetch(&mut self) -> PendingFetch {
        let ticket = self.state.begin_refetch();
        self.pending(ticket)
    }

    /// Apply a finished fetch. Superseded results are discarded.
    pub fn complete(&mut self, fetched: FetchResult<T>) -> ApplyOutcome {
        match fetched.result {
            Ok(page) => {
                tracing::debug!(
                    resource = %self.resource,
                    rows = page.rows.len(),
                    total = page.total_count,
                    "List page received",
                );
                self.state.apply_page(fetched.ticket, page)
            }
            Err(e) => {
                tracing::error!(resource = %self.resource, error = %e, "List fetch failed");
                self.state.apply_failure(fetched.ticket, &e.user_message())
            }
        }
    }

    /// Refetch the current page with the current filters.
    pub async fn refetch(&mut self) -> ApplyOutcome {
        let pending = self.begin_fetch();
        self.execute(pending).await
    }

    /// Replace the filters. Unchanged (after normalisation) filters send no
    /// request and return `None`; otherwise the page resets to 1 and the
    /// selection is cleared.
    pub async fn set_filters(&mut self, filters: &FilterSet) -> Option<ApplyOutcome> {
        let ticket = self.state.set_filters(filters)?;
        let pending = self.pending(ticket);
        Some(self.execute(pending).await)
    }

    pub async fn set_sort(&mut self, sort: Option<SortKey>) -> Option<ApplyOutcome> {
        let ticket = self.state.set_sort(sort)?;
        let pending = self.pending(ticket);
        Some(self.execute(pending).await)
    }

    /// Go to page `n`, clamped to the known page range.
    pub async fn set_page(&mut self, n: u32) -> ApplyOutcome {
        let ticket = self.state.set_page(n);
        let pending = self.pending(ticket);
        self.execute(pending).await
    }

    fn pending(&self, ticket: RequestTicket) -> PendingFetch {
        PendingFetch {
            ticket,
            resource: self.resource,
            query: self.state.query().clone(),
        }
    }

    async fn execute(&mut self, pending: PendingFetch) -> ApplyOutcome {
        let gateway = Arc::clone(&self.gateway);
        let fetched = pending.run(gateway.as_ref()).await;
        self.complete(fetched)
    }

    // ---- selection ----

    pub fn toggle_select(&mut self, id: EntityId, checked: bool) -> bool {
        self.state.toggle_select(id, checked)
    }

    pub fn select_all(&mut self, checked: bool) {
        self.state.select_all(checked);
    }

    pub fn clear_selection(&mut self) {
        self.state.clear_selection();
    }

    // ---- mutations ----

    fn body(&self, values: FormValues) -> MutationBody {
        let body = MutationBody::new(values);
        match &self.record_root {
            Some(root) => body.with_root(root.clone()),
            None => body,
        }
    }

    /// Flip a boolean column on one row.
    ///
    /// The row changes locally first. If the backend rejects the update the
    /// row is restored and an error notice is queued.
    pub async fn toggle_flag(
        &mut self,
        id: EntityId,
        field: &str,
        value: bool,
    ) -> Result<(), GatewayError> {
        let patched = self.patched_row(id, field, Value::Bool(value))?;
        let previous = self
            .state
            .update_row(id, |row| *row = patched)
            .ok_or(CoreError::NotFound {
                entity: self.resource.as_str(),
                id,
            })?;

        let mut values = FormValues::new();
        values.insert(field.to_string(), Value::Bool(value));
        let body = self.body(values);

        match self.gateway.update(self.resource, id, &body).await {
            Ok(_) => {
                tracing::info!(resource = %self.resource, id, field, value, "Flag updated");
                Ok(())
            }
            Err(e) => {
                tracing::error!(resource = %self.resource, id, field, error = %e, "Flag update failed, rolling back");
                self.state.restore_row(previous);
                self.state.push_notice(Notice::error(e.user_message()));
                Err(e)
            }
        }
    }

    /// Copy of row `id` with `field` set to `value`.
    fn patched_row(&self, id: EntityId, field: &str, value: Value) -> Result<T, GatewayError> {
        let row = self
            .state
            .rows()
            .iter()
            .find(|r| r.id() == id)
            .ok_or(CoreError::NotFound {
                entity: self.resource.as_str(),
                id,
            })?;
        let mut json = serde_json::to_value(row)?;
        match json.as_object_mut() {
            Some(obj) => {
                obj.insert(field.to_string(), value);
            }
            None => {
                return Err(GatewayError::UnexpectedPayload(format!(
                    "{} rows are not objects",
                    self.resource
                )))
            }
        }
        Ok(serde_json::from_value(json)?)
    }

    /// Apply `values` to every selected row.
    ///
    /// On success the selection is cleared and the page refetched; on failure
    /// the selection is kept so the user can retry.
    pub async fn bulk_update(&mut self, values: FormValues) -> Result<(), GatewayError> {
        let ids = self.state.selection().ids();
        if ids.is_empty() {
            let err = GatewayError::Core(CoreError::Validation(
                "Select at least one record first".into(),
            ));
            self.state.push_notice(Notice::error(err.user_message()));
            return Err(err);
        }

        let body = self.body(values);
        match self.gateway.bulk_update(self.resource, &ids, &body).await {
            Ok(()) => {
                tracing::info!(resource = %self.resource, count = ids.len(), "Bulk update applied");
                self.state.clear_selection();
                self.state.push_notice(Notice::success(format!(
                    "Updated {} {}",
                    ids.len(),
                    if ids.len() == 1 { "record" } else { "records" }
                )));
                self.refetch().await;
                Ok(())
            }
            Err(e) => {
                tracing::error!(resource = %self.resource, error = %e, "Bulk update failed");
                self.state.push_notice(Notice::error(e.user_message()));
                Err(e)
            }
        }
    }

    // ---- export ----

    /// CSV of the rows currently loaded.
    pub fn export_csv(&self, columns: &[CsvColumn]) -> Result<String, CoreError> {
        let rows = self
            .state
            .rows()
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CoreError::Internal(format!("serialize rows: {e}")))?;
        csv::build_csv(columns, &rows)
    }

    /// Download a server-rendered export (spreadsheet, PDF) for the current
    /// filters. A failure also queues an error notice.
    pub async fn download_export(&mut self, path: &str) -> Result<Vec<u8>, GatewayError> {
        match self.gateway.download(path, self.state.query()).await {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                tracing::error!(resource = %self.resource, path, error = %e, "Export download failed");
                self.state.push_notice(Notice::error(e.user_message()));
                Err(e)
            }
        }
    }

    // ---- notices ----

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.state.drain_notices()
    }
}
