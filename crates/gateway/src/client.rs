//! HTTP implementation of [`Gateway`] using [`reqwest`].

use std::time::Duration;

use async_trait::async_trait;
use facility_core::error::CoreError;
use facility_core::list_state::Page;
use facility_core::query::ListQuery;
use facility_core::resources::Resource;
use facility_core::types::EntityId;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::config::{GatewayConfig, SessionConfig, SessionSource};
use crate::error::GatewayError;
use crate::gateway::{Gateway, MutationBody};
use crate::payload;
use crate::wire;

/// HTTP client for the facility backend.
///
/// The session (host and token) is resolved per request from its
/// [`SessionSource`], so a missing configuration fails before anything is
/// sent.
#[derive(Clone)]
pub struct GatewayClient {
    client: reqwest::Client,
    session: SessionSource,
}

impl GatewayClient {
    /// Create a client with its own connection pool and the configured
    /// request timeout.
    pub fn new(config: &GatewayConfig, session: SessionSource) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { client, session })
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, session: SessionSource) -> Self {
        Self { client, session }
    }

    fn session(&self) -> Result<SessionConfig, GatewayError> {
        self.session.resolve()
    }

    fn collection_url(session: &SessionConfig, resource: Resource) -> String {
        format!("{}/{}.json", session.base_url(), resource.path())
    }

    fn member_url(session: &SessionConfig, resource: Resource, id: EntityId) -> String {
        format!("{}/{}/{id}.json", session.base_url(), resource.path())
    }

    fn path_url(session: &SessionConfig, path: &str) -> String {
        format!("{}/{}", session.base_url(), path.trim_start_matches('/'))
    }

    /// Attach the bearer token and the mutation body.
    fn prepare(
        &self,
        request: reqwest::RequestBuilder,
        session: &SessionConfig,
        body: &MutationBody,
    ) -> Result<reqwest::RequestBuilder, GatewayError> {
        let request = request.bearer_auth(session.token());
        if body.is_multipart() {
            Ok(request.multipart(multipart_form(body)?))
        } else {
            Ok(request.json(&body.to_json()))
        }
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`GatewayError::Api`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            let url = response.url().path().to_string();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::error!(status = status.as_u16(), url = %url, "Backend request failed");
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body. An empty body reads as `null`.
    async fn parse_response(response: reqwest::Response) -> Result<Value, GatewayError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), GatewayError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl Gateway for GatewayClient {
    async fn fetch_page(
        &self,
        resource: Resource,
        query: &ListQuery,
    ) -> Result<Page<Value>, GatewayError> {
        let session = self.session()?;
        tracing::debug!(
            resource = %resource,
            page = query.page(),
            per_page = query.page_size(),
            filters = query.filters().len(),
            "Fetching list page",
        );

        let response = self
            .client
            .get(Self::collection_url(&session, resource))
            .bearer_auth(session.token())
            .query(&wire::list_params(query))
            .send()
            .await?;

        let value = Self::parse_response(response).await?;
        payload::parse_list_payload(value, resource, query)
    }

    async fn create(&self, resource: Resource, body: &MutationBody) -> Result<Value, GatewayError> {
        let session = self.session()?;
        tracing::debug!(resource = %resource, multipart = body.is_multipart(), "Creating record");

        let request = self.client.post(Self::collection_url(&session, resource));
        let response = self.prepare(request, &session, body)?.send().await?;
        Self::parse_response(response).await
    }

    async fn update(
        &self,
        resource: Resource,
        id: EntityId,
        body: &MutationBody,
    ) -> Result<Value, GatewayError> {
        let session = self.session()?;
        tracing::debug!(resource = %resource, id, multipart = body.is_multipart(), "Updating record");

        let request = self.client.put(Self::member_url(&session, resource, id));
        let response = self.prepare(request, &session, body)?.send().await?;
        Self::parse_response(response).await
    }

    async fn bulk_update(
        &self,
        resource: Resource,
        ids: &[EntityId],
        body: &MutationBody,
    ) -> Result<(), GatewayError> {
        if ids.is_empty() {
            return Err(GatewayError::Core(CoreError::Validation(
                "Select at least one record first".into(),
            )));
        }
        let session = self.session()?;
        tracing::debug!(resource = %resource, count = ids.len(), "Bulk updating records");

        let url = format!("{}/{}/bulk_update.json", session.base_url(), resource.path());
        let request = self
            .client
            .post(url)
            .query(&[("ids", wire::join_ids(ids))]);
        let response = self.prepare(request, &session, body)?.send().await?;
        Self::check_status(response).await
    }

    async fn download(&self, path: &str, query: &ListQuery) -> Result<Vec<u8>, GatewayError> {
        let session = self.session()?;
        tracing::debug!(path, filters = query.filters().len(), "Downloading export");

        let response = self
            .client
            .get(Self::path_url(&session, path))
            .bearer_auth(session.token())
            .query(&wire::filter_params(query.filters()))
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            tracing::error!(path, "Export download returned an empty body");
            return Err(GatewayError::EmptyBody);
        }
        Ok(bytes.to_vec())
    }
}

/// Build the multipart form for a body with attachments.
///
/// Scalars become text parts, arrays become repeated `name[]` parts, objects
/// are sent as JSON text.
fn multipart_form(body: &MutationBody) -> Result<Form, GatewayError> {
    let mut form = Form::new();

    for (field, value) in &body.values {
        let name = body.part_name(field);
        match value {
            Value::Array(items) => {
                for item in items {
                    form = form.text(format!("{name}[]"), text_value(item));
                }
            }
            other => form = form.text(name, text_value(other)),
        }
    }

    for attachment in &body.attachments {
        let part = Part::bytes(attachment.bytes.clone())
            .file_name(attachment.file_name.clone())
            .mime_str(&attachment.mime)?;
        form = form.part(body.part_name(&attachment.field_name), part);
    }

    Ok(form)
}

fn text_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
