use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use facility_core::baseline::BaselineCounts;
use facility_core::filter::FilterPredicate;
use facility_core::list_state::Page;
use facility_core::query::ListQuery;
use facility_core::resources::Resource;
use facility_core::types::EntityId;
use facility_gateway::{Gateway, GatewayError, MutationBody};
use serde_json::{json, Value};

/// A call the fake gateway received.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Fetch { resource: Resource, page: u32 },
    Create { resource: Resource, body: Value },
    Update { resource: Resource, id: EntityId, body: Value },
    BulkUpdate { resource: Resource, ids: Vec<EntityId> },
    Download { path: String },
}

/// In-memory stand-in for the backend.
///
/// Rows are filtered with the typed predicates directly, paginated, and
/// reported with a `total` counter for the matching set.
#[derive(Default)]
pub struct FakeGateway {
    rows: Mutex<HashMap<Resource, Vec<Value>>>,
    calls: Mutex<Vec<Call>>,
    fail_fetch: Mutex<bool>,
    fail_mutations: Mutex<Option<String>>,
    download_body: Mutex<Vec<u8>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(self, resource: Resource, rows: Vec<Value>) -> Self {
        self.rows.lock().unwrap().insert(resource, rows);
        self
    }

    /// `count` rows `{id, heading, issue_status, is_flagged}`.
    pub fn tickets(count: i64) -> Vec<Value> {
        (1..=count)
            .map(|id| {
                json!({
                    "id": id,
                    "heading": format!("Ticket {id}"),
                    "issue_status": if id % 2 == 0 { "Closed" } else { "Open" },
                    "is_flagged": false,
                })
            })
            .collect()
    }

    pub fn fail_fetches(&self, fail: bool) {
        *self.fail_fetch.lock().unwrap() = fail;
    }

    /// Make create/update/bulk calls fail with a 422 carrying `message`.
    pub fn reject_mutations(&self, message: &str) {
        *self.fail_mutations.lock().unwrap() = Some(message.to_string());
    }

    pub fn set_download(&self, body: &[u8]) {
        *self.download_body.lock().unwrap() = body.to_vec();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Fetch { .. }))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn mutation_error(&self) -> Option<GatewayError> {
        self.fail_mutations
            .lock()
            .unwrap()
            .as_ref()
            .map(|message| GatewayError::Api {
                status: 422,
                body: json!({ "error": message }).to_string(),
            })
    }
}

fn cell(row: &Value, field: &str) -> Option<String> {
    match row.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn row_matches(row: &Value, query: &ListQuery) -> bool {
    query.filters().normalized().iter().all(|(field, predicate)| {
        let Some(value) = cell(row, field) else {
            return false;
        };
        match predicate {
            FilterPredicate::Contains { value: needle } => {
                value.to_lowercase().contains(&needle.to_lowercase())
            }
            FilterPredicate::Equals { value: wanted } => &value == wanted,
            FilterPredicate::In { values } => values.contains(&value),
            FilterPredicate::Range { from, to } => {
                from.as_ref().map_or(true, |f| value >= *f) && to.as_ref().map_or(true, |t| value <= *t)
            }
        }
    })
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn fetch_page(
        &self,
        resource: Resource,
        query: &ListQuery,
    ) -> Result<Page<Value>, GatewayError> {
        self.record(Call::Fetch {
            resource,
            page: query.page(),
        });
        if *self.fail_fetch.lock().unwrap() {
            return Err(GatewayError::Api {
                status: 500,
                body: "<html>oops</html>".into(),
            });
        }

        let all = self
            .rows
            .lock()
            .unwrap()
            .get(&resource)
            .cloned()
            .unwrap_or_default();
        let matching: Vec<Value> = all.into_iter().filter(|r| row_matches(r, query)).collect();
        let rows = matching
            .iter()
            .skip(query.offset() as usize)
            .take(query.page_size() as usize)
            .cloned()
            .collect();

        Ok(Page {
            rows,
            total_count: matching.len() as u64,
            page: query.page(),
            page_size: query.page_size(),
            counts: BaselineCounts::from_pairs([("total", matching.len() as u64)]),
        })
    }

    async fn create(&self, resource: Resource, body: &MutationBody) -> Result<Value, GatewayError> {
        self.record(Call::Create {
            resource,
            body: body.to_json(),
        });
        match self.mutation_error() {
            Some(e) => Err(e),
            None => Ok(json!({"id": 1000})),
        }
    }

    async fn update(
        &self,
        resource: Resource,
        id: EntityId,
        body: &MutationBody,
    ) -> Result<Value, GatewayError> {
        self.record(Call::Update {
            resource,
            id,
            body: body.to_json(),
        });
        match self.mutation_error() {
            Some(e) => Err(e),
            None => Ok(json!({"id": id})),
        }
    }

    async fn bulk_update(
        &self,
        resource: Resource,
        ids: &[EntityId],
        _body: &MutationBody,
    ) -> Result<(), GatewayError> {
        self.record(Call::BulkUpdate {
            resource,
            ids: ids.to_vec(),
        });
        match self.mutation_error() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn download(&self, path: &str, _query: &ListQuery) -> Result<Vec<u8>, GatewayError> {
        self.record(Call::Download {
            path: path.to_string(),
        });
        let body = self.download_body.lock().unwrap().clone();
        if body.is_empty() {
            return Err(GatewayError::EmptyBody);
        }
        Ok(body)
    }
}
