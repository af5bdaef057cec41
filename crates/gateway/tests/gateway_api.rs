//! Integration tests for the HTTP gateway against a fake backend.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use axum::http::Method;
use common::{api_status, FakeBackend};
use facility_core::filter::{FilterPredicate, FilterSet};
use facility_core::notice::GENERIC_ERROR_MESSAGE;
use facility_core::persist::MemoryStore;
use facility_core::query::{ListQuery, SortKey};
use facility_core::resources::Resource;
use facility_gateway::config::SessionSource;
use facility_gateway::{Attachment, Gateway, GatewayClient, GatewayError, MutationBody};
use serde_json::json;

fn values(v: serde_json::Value) -> facility_core::form::FormValues {
    v.as_object().cloned().unwrap()
}

// ---------------------------------------------------------------------------
// Test: list request carries auth, paging, sort, and q[...] filters
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_page_sends_query_and_parses_envelope() {
    let backend = FakeBackend::start().await;
    let client = backend.client();

    let mut query = ListQuery::new(15).unwrap();
    let filters = FilterSet::new()
        .with("heading", FilterPredicate::contains("leak"))
        .unwrap()
        .with("issue_status", FilterPredicate::one_of(["Open", "Pending"]))
        .unwrap();
    query.set_filters(&filters);
    query.set_sort(Some(SortKey::desc("created_at")));

    let page = client.fetch_page(Resource::Tickets, &query).await.unwrap();
    assert_eq!(page.rows.len(), 2);
    assert_eq!(page.total_count, 31);
    assert_eq!(page.page, 2);
    assert_eq!(page.counts.get("open_count"), Some(12));

    let req = backend.last();
    assert_eq!(req.method, Method::GET);
    assert_eq!(req.path, "/pms/admin/complaints.json");
    assert_eq!(req.authorization.as_deref(), Some("Bearer test-token"));
    assert_eq!(req.query_values("page"), vec!["1"]);
    assert_eq!(req.query_values("per_page"), vec!["15"]);
    assert_eq!(req.query_values("q[s]"), vec!["created_at desc"]);
    assert_eq!(req.query_values("q[heading_cont]"), vec!["leak"]);
    assert_eq!(
        req.query_values("q[issue_status_in][]"),
        vec!["Open", "Pending"]
    );
}

// ---------------------------------------------------------------------------
// Test: backend validation errors surface the server's message
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unprocessable_create_surfaces_field_errors() {
    let backend = FakeBackend::start().await;
    let client = backend.client();

    let body = MutationBody::new(values(json!({"priority": "P1"}))).with_root("complaint");
    let err = client.create(Resource::Tickets, &body).await.unwrap_err();

    assert_eq!(api_status(&err), 422);
    assert_eq!(err.user_message(), "heading can't be blank");
}

#[tokio::test]
async fn html_error_page_falls_back_to_generic_message() {
    let backend = FakeBackend::start().await;
    let client = backend.client();

    let query = ListQuery::new(15).unwrap();
    let err = client.fetch_page(Resource::Rooms, &query).await.unwrap_err();

    assert_eq!(api_status(&err), 500);
    assert_eq!(err.user_message(), GENERIC_ERROR_MESSAGE);
}

// ---------------------------------------------------------------------------
// Test: JSON vs multipart bodies
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_without_attachments_sends_json() {
    let backend = FakeBackend::start().await;
    let client = backend.client();

    let body = MutationBody::new(values(json!({"heading": "Leak"}))).with_root("complaint");
    let created = client.create(Resource::Tickets, &body).await.unwrap();
    assert_eq!(created["id"], 99);

    let req = backend.last();
    assert_eq!(req.method, Method::POST);
    assert!(req
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.starts_with("application/json")));
    let sent: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
    assert_eq!(sent, json!({"complaint": {"heading": "Leak"}}));
}

#[tokio::test]
async fn create_with_attachment_sends_multipart() {
    let backend = FakeBackend::start().await;
    let client = backend.client();

    let body = MutationBody::new(values(json!({"heading": "Leak", "tags": ["a", "b"]})))
        .with_root("complaint")
        .with_attachment(Attachment {
            field_name: "attachments".into(),
            file_name: "photo.jpg".into(),
            mime: "image/jpeg".into(),
            bytes: b"jpegbytes".to_vec(),
        });
    client.create(Resource::Tickets, &body).await.unwrap();

    let req = backend.last();
    assert!(req
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.starts_with("multipart/form-data")));
    let text = req.body_text();
    assert!(text.contains(r#"name="complaint[heading]""#));
    assert!(text.contains(r#"name="complaint[tags][]""#));
    assert!(text.contains(r#"filename="photo.jpg""#));
    assert!(text.contains("jpegbytes"));
}

// ---------------------------------------------------------------------------
// Test: update and bulk update addressing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn update_puts_to_member_url() {
    let backend = FakeBackend::start().await;
    let client = backend.client();

    let body = MutationBody::new(values(json!({"is_flagged": true})));
    let updated = client.update(Resource::Tickets, 5, &body).await.unwrap();
    assert_eq!(updated["is_flagged"], true);

    let req = backend.last();
    assert_eq!(req.method, Method::PUT);
    assert_eq!(req.path, "/pms/admin/complaints/5.json");
}

#[tokio::test]
async fn bulk_update_joins_ids() {
    let backend = FakeBackend::start().await;
    let client = backend.client();

    let body = MutationBody::new(values(json!({"issue_status": "Closed"})));
    client
        .bulk_update(Resource::Tickets, &[3, 8, 13], &body)
        .await
        .unwrap();

    let req = backend.last();
    assert_eq!(req.path, "/pms/admin/complaints/bulk_update.json");
    assert_eq!(req.query_values("ids"), vec!["3,8,13"]);
}

#[tokio::test]
async fn bulk_update_with_no_ids_sends_nothing() {
    let backend = FakeBackend::start().await;
    let client = backend.client();

    let body = MutationBody::new(values(json!({"issue_status": "Closed"})));
    let err = client
        .bulk_update(Resource::Tickets, &[], &body)
        .await
        .unwrap_err();
    assert_matches!(err, GatewayError::Core(_));
    assert!(backend.requests().is_empty());
}

// ---------------------------------------------------------------------------
// Test: downloads
// ---------------------------------------------------------------------------

#[tokio::test]
async fn download_returns_bytes_with_filters() {
    let backend = FakeBackend::start().await;
    let client = backend.client();

    let mut query = ListQuery::new(15).unwrap();
    query.set_filters(
        &FilterSet::new()
            .with("guest_type", FilterPredicate::equals("vendor"))
            .unwrap(),
    );
    let bytes = client
        .download("pms/visitors/export.xlsx", &query)
        .await
        .unwrap();
    assert!(bytes.starts_with(b"PK"));
    assert_eq!(backend.last().query_values("q[guest_type_eq]"), vec!["vendor"]);
}

#[tokio::test]
async fn empty_download_is_an_error() {
    let backend = FakeBackend::start().await;
    let client = backend.client();

    let query = ListQuery::new(15).unwrap();
    let err = client
        .download("/pms/permits/export.pdf", &query)
        .await
        .unwrap_err();
    assert_matches!(err, GatewayError::EmptyBody);
}

// ---------------------------------------------------------------------------
// Test: session configuration
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_session_fails_before_any_request() {
    let backend = FakeBackend::start().await;
    let client = GatewayClient::with_client(
        reqwest::Client::new(),
        SessionSource::Store(Arc::new(MemoryStore::new())),
    );

    let query = ListQuery::new(15).unwrap();
    let err = client.fetch_page(Resource::Tickets, &query).await.unwrap_err();
    assert!(err.is_configuration());
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn store_session_is_read_per_request() {
    let backend = FakeBackend::start().await;
    let store = Arc::new(MemoryStore::new());
    let client = GatewayClient::with_client(
        reqwest::Client::new(),
        SessionSource::Store(store.clone()),
    );
    let query = ListQuery::new(15).unwrap();
    assert!(client.fetch_page(Resource::Tickets, &query).await.is_err());

    facility_gateway::config::SessionConfig::new(&backend.base_url, common::TEST_TOKEN)
        .unwrap()
        .save(&*store)
        .unwrap();

    let page = client.fetch_page(Resource::Tickets, &query).await.unwrap();
    assert_eq!(page.rows.len(), 2);
}

#[tokio::test]
async fn wrong_token_is_unauthorized() {
    let backend = FakeBackend::start().await;
    let session =
        facility_gateway::config::SessionConfig::new(&backend.base_url, "stale").unwrap();
    let client =
        GatewayClient::with_client(reqwest::Client::new(), SessionSource::Fixed(session));

    let query = ListQuery::new(15).unwrap();
    let err = client.fetch_page(Resource::Tickets, &query).await.unwrap_err();
    assert_eq!(api_status(&err), 401);
    assert!(err.user_message().contains("session"));
}
