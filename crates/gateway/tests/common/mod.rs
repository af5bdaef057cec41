use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;

use facility_gateway::config::{SessionConfig, SessionSource};
use facility_gateway::{GatewayClient, GatewayError};

pub const TEST_TOKEN: &str = "test-token";

/// One request as seen by the fake backend.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn query_values(&self, key: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub type Log = Arc<Mutex<Vec<Recorded>>>;

/// A running fake backend.
pub struct FakeBackend {
    pub base_url: String,
    pub log: Log,
}

impl FakeBackend {
    /// Bind to an ephemeral port and serve in the background.
    pub async fn start() -> Self {
        let log: Log = Arc::default();
        let app = Router::new().fallback(handle).with_state(Arc::clone(&log));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            log,
        }
    }

    pub fn client(&self) -> GatewayClient {
        let session = SessionConfig::new(&self.base_url, TEST_TOKEN).unwrap();
        GatewayClient::with_client(reqwest::Client::new(), SessionSource::Fixed(session))
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }

    pub fn last(&self) -> Recorded {
        self.requests().pop().expect("no request reached the backend")
    }
}

async fn handle(
    State(log): State<Log>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
    body: Bytes,
) -> Response {
    let header = |name: HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };
    let recorded = Recorded {
        method: method.clone(),
        path: uri.path().to_string(),
        query,
        authorization: header(AUTHORIZATION),
        content_type: header(CONTENT_TYPE),
        body: body.to_vec(),
    };
    log.lock().unwrap().push(recorded.clone());

    let expected = format!("Bearer {TEST_TOKEN}");
    if recorded.authorization.as_deref() != Some(expected.as_str()) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    match (method, recorded.path.as_str()) {
        (Method::GET, "/pms/admin/complaints.json") => Json(json!({
            "complaints": [
                {"id": 1, "heading": "Leak", "issue_status": "Open"},
                {"id": 2, "heading": "No power", "issue_status": "Pending"},
            ],
            "pagination": {"current_page": 2, "total_count": 31, "total_pages": 3},
            "open_count": 12,
        }))
        .into_response(),
        (Method::POST, "/pms/admin/complaints.json") => {
            let is_json = recorded
                .content_type
                .as_deref()
                .is_some_and(|ct| ct.starts_with("application/json"));
            if is_json && !recorded.body_text().contains("heading") {
                return (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({"errors": {"heading": ["can't be blank"]}})),
                )
                    .into_response();
            }
            (StatusCode::CREATED, Json(json!({"id": 99}))).into_response()
        }
        (Method::PUT, "/pms/admin/complaints/5.json") => {
            Json(json!({"id": 5, "is_flagged": true})).into_response()
        }
        (Method::POST, "/pms/admin/complaints/bulk_update.json") => {
            StatusCode::NO_CONTENT.into_response()
        }
        (Method::GET, "/pms/visitors/export.xlsx") => {
            (StatusCode::OK, b"PK\x03\x04sheet".to_vec()).into_response()
        }
        (Method::GET, "/pms/permits/export.pdf") => StatusCode::OK.into_response(),
        (Method::GET, "/pms/units.json") => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "<html>Internal Server Error</html>",
        )
            .into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({"error": "Not found"}))).into_response(),
    }
}

/// Unwrap a gateway error's HTTP status, panicking on other variants.
pub fn api_status(err: &GatewayError) -> u16 {
    match err {
        GatewayError::Api { status, .. } => *status,
        other => panic!("expected an API error, got {other:?}"),
    }
}
