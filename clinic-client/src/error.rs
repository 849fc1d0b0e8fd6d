use reqwest::StatusCode;
use serde_json::Value;
use service_core::retry::Retryable;
use std::collections::BTreeMap;
use thiserror::Error;

/// Error body returned by the backend on a non-success status.
///
/// Validation failures arrive as `{"field": ["message", ...]}`, other
/// rejections as `{"detail": "..."}`. Anything else is kept as-is.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendErrorPayload {
    FieldErrors(BTreeMap<String, Vec<String>>),
    Detail(String),
    Unknown(Value),
}

impl BackendErrorPayload {
    pub fn from_bytes(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => Self::from_value(value),
            Err(_) => Self::Unknown(Value::String(String::from_utf8_lossy(body).into_owned())),
        }
    }

    pub fn from_value(value: Value) -> Self {
        let map = match value {
            Value::Object(map) => map,
            other => return Self::Unknown(other),
        };

        if let Some(Value::String(detail)) = map.get("detail") {
            return Self::Detail(detail.clone());
        }

        let fields: Option<BTreeMap<String, Vec<String>>> = map
            .iter()
            .map(|(field, messages)| field_messages(messages).map(|m| (field.clone(), m)))
            .collect();

        match fields {
            Some(fields) if !fields.is_empty() => Self::FieldErrors(fields),
            _ => Self::Unknown(Value::Object(map)),
        }
    }

    /// Messages reported against `field`, if any.
    pub fn field(&self, field: &str) -> Option<&[String]> {
        match self {
            Self::FieldErrors(fields) => fields.get(field).map(Vec::as_slice),
            _ => None,
        }
    }

    /// One line suitable for an inline form message.
    pub fn message(&self) -> String {
        match self {
            Self::FieldErrors(fields) => fields
                .iter()
                .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
                .collect::<Vec<_>>()
                .join("; "),
            Self::Detail(detail) => detail.clone(),
            Self::Unknown(Value::String(body)) => body.clone(),
            Self::Unknown(value) => value.to_string(),
        }
    }
}

fn field_messages(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(message) => Some(vec![message.clone()]),
        Value::Array(entries) => entries
            .iter()
            .map(|entry| entry.as_str().map(str::to_string))
            .collect(),
        _ => None,
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request to {target} failed: {source}")]
    Transport {
        target: String,
        source: reqwest::Error,
    },

    #[error("Backend rejected {target} with status {status}: {}", .payload.message())]
    Backend {
        target: String,
        status: StatusCode,
        payload: BackendErrorPayload,
    },

    #[error("Unexpected response shape from {target}: {source}")]
    Parse {
        target: String,
        source: serde_json::Error,
    },

    #[error("Authentication required for page '{page}'")]
    AuthRequired { page: String },

    #[error("Pagination exceeded {limit} pages at {target}")]
    PageLimitExceeded { target: String, limit: usize },

    #[error("Request to {target} was cancelled")]
    Cancelled { target: String },

    #[error("Invalid endpoint '{target}': {reason}")]
    InvalidEndpoint { target: String, reason: String },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Session store error: {0}")]
    Session(anyhow::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Backend { status, .. } => Some(*status),
            ClientError::Transport { source, .. } => source.status(),
            _ => None,
        }
    }

    /// True when the backend refused the credential (expired or revoked).
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// The request target the failure is attributed to, when there is one.
    pub fn target(&self) -> Option<&str> {
        match self {
            ClientError::Transport { target, .. }
            | ClientError::Backend { target, .. }
            | ClientError::Parse { target, .. }
            | ClientError::PageLimitExceeded { target, .. }
            | ClientError::Cancelled { target }
            | ClientError::InvalidEndpoint { target, .. } => Some(target),
            _ => None,
        }
    }
}

impl Retryable for ClientError {
    fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport { source, .. } => !source.is_builder(),
            ClientError::Backend { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}
