use async_trait::async_trait;
use facility_core::form::FormValues;
use facility_core::list_state::Page;
use facility_core::query::ListQuery;
use facility_core::resources::Resource;
use facility_core::types::EntityId;
use serde_json::Value;

use crate::error::GatewayError;

/// A file uploaded alongside a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Form field the file belongs to, e.g. `attachments`.
    pub field_name: String,
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Body of a create or update request.
///
/// Sent as multipart when any attachment is present and as JSON otherwise.
/// With a `root`, values are nested under it (`{"complaint": {...}}` or
/// `complaint[heading]` form parts).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationBody {
    pub root: Option<String>,
    pub values: FormValues,
    pub attachments: Vec<Attachment>,
}

impl MutationBody {
    pub fn new(values: FormValues) -> Self {
        Self {
            root: None,
            values,
            attachments: Vec::new(),
        }
    }

    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn is_multipart(&self) -> bool {
        !self.attachments.is_empty()
    }

    /// Form-part name for a field, e.g. `complaint[heading]`.
    pub fn part_name(&self, field: &str) -> String {
        match &self.root {
            Some(root) => format!("{root}[{field}]"),
            None => field.to_string(),
        }
    }

    /// JSON body for the non-multipart case.
    pub fn to_json(&self) -> Value {
        let values = Value::Object(self.values.clone());
        match &self.root {
            Some(root) => {
                let mut wrapped = serde_json::Map::new();
                wrapped.insert(root.clone(), values);
                Value::Object(wrapped)
            }
            None => values,
        }
    }
}

/// Remote data access used by the controllers.
///
/// [`GatewayClient`](crate::GatewayClient) is the HTTP implementation;
/// tests substitute in-memory fakes.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Fetch one page of `resource` for `query`.
    async fn fetch_page(
        &self,
        resource: Resource,
        query: &ListQuery,
    ) -> Result<Page<Value>, GatewayError>;

    /// Create a record; returns the backend's representation of it.
    async fn create(&self, resource: Resource, body: &MutationBody) -> Result<Value, GatewayError>;

    /// Update one record by id.
    async fn update(
        &self,
        resource: Resource,
        id: EntityId,
        body: &MutationBody,
    ) -> Result<Value, GatewayError>;

    /// Apply the same change to several records at once.
    async fn bulk_update(
        &self,
        resource: Resource,
        ids: &[EntityId],
        body: &MutationBody,
    ) -> Result<(), GatewayError>;

    /// Download a binary export (spreadsheet, PDF) from a path below the
    /// base URL. An empty body is an error.
    async fn download(&self, path: &str, query: &ListQuery) -> Result<Vec<u8>, GatewayError>;
}
