use facility_core::error::CoreError;
use facility_core::notice::GENERIC_ERROR_MESSAGE;

/// Errors from the gateway layer.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Base URL or token missing/invalid. Raised before any request is sent.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Backend error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A download finished with no bytes.
    #[error("The server returned an empty file")]
    EmptyBody,

    /// The response body was not the JSON shape expected.
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The response parsed but did not contain what the caller needs.
    #[error("Unexpected response: {0}")]
    UnexpectedPayload(String),

    /// A domain-level error from `facility_core`.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl GatewayError {
    /// Message suitable for a notice.
    ///
    /// Backend errors surface the server's own `error` / `message` /
    /// `errors` text when present; everything else falls back to a generic
    /// message, except configuration problems which are shown as-is.
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration(msg) => msg.clone(),
            Self::Api { status, body } => server_message(body).unwrap_or_else(|| {
                if *status == 401 {
                    "Your session has expired. Please log in again.".to_string()
                } else {
                    GENERIC_ERROR_MESSAGE.to_string()
                }
            }),
            Self::EmptyBody => "The server returned an empty file".to_string(),
            Self::Core(CoreError::Validation(msg)) => msg.clone(),
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }

    /// True if the failure happened before a request was attempted.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::Core(CoreError::Configuration(_))
        )
    }
}

/// Extract a human-readable message from a JSON error body.
///
/// Handles `{"error": "..."}`, `{"message": "..."}`, `{"errors": [...]}`,
/// and Rails-style `{"errors": {"field": ["msg", ...]}}`.
fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    for key in ["error", "message"] {
        if let Some(s) = value.get(key).and_then(|v| v.as_str()) {
            if !s.trim().is_empty() {
                return Some(s.to_string());
            }
        }
    }

    let messages: Vec<String> = match value.get("errors")? {
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect(),
        serde_json::Value::Object(fields) => fields
            .iter()
            .flat_map(|(field, msgs)| {
                let msgs: Vec<String> = match msgs {
                    serde_json::Value::Array(a) => {
                        a.iter().filter_map(|m| m.as_str().map(String::from)).collect()
                    }
                    serde_json::Value::String(s) => vec![s.clone()],
                    _ => Vec::new(),
                };
                msgs.into_iter().map(move |m| format!("{field} {m}"))
            })
            .collect(),
        serde_json::Value::String(s) => vec![s.clone()],
        _ => Vec::new(),
    };

    (!messages.is_empty()).then(|| messages.join(", "))
}
