//! Persistence gateway: create, read, update and delete of CV and resume records
//! on the backend.
//!
//! `AppState` holds an `Arc<dyn DocumentGateway>`, chosen at startup:
//! `HttpGateway` when `BACKEND_URL` is configured, `InMemoryGateway` otherwise.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::document::model::DocumentKind;

pub mod http;
pub mod memory;

pub use http::HttpGateway;
pub use memory::InMemoryGateway;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no bearer token configured for the backend")]
    MissingToken,

    #[error("document has no id; it must be created before it can be updated")]
    MissingDocumentId,

    #[error("backend URL is not usable: {0}")]
    InvalidBaseUrl(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("backend rejected the request: {0}")]
    Rejected(String),

    #[error("backend returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed backend response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl GatewayError {
    /// Preconditions the user cannot fix by retrying.
    pub fn is_unrecoverable(&self) -> bool {
        matches!(
            self,
            GatewayError::MissingToken
                | GatewayError::MissingDocumentId
                | GatewayError::InvalidBaseUrl(_)
        )
    }
}

/// `{success, data, message}` envelope used by every backend response.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// Unwraps a successful envelope, turning `success: false` into `Rejected`.
    pub fn into_result(self) -> Result<Option<T>, GatewayError> {
        if self.success {
            Ok(self.data)
        } else {
            Err(GatewayError::Rejected(
                self.message
                    .unwrap_or_else(|| "request was not successful".to_string()),
            ))
        }
    }
}

/// The gateway trait. Records travel as raw JSON; hydration is the caller's job.
#[async_trait]
pub trait DocumentGateway: Send + Sync {
    async fn fetch(&self, kind: DocumentKind, id: &str) -> Result<Value, GatewayError>;

    async fn create(&self, kind: DocumentKind, payload: &Value) -> Result<Value, GatewayError>;

    async fn update(
        &self,
        kind: DocumentKind,
        id: &str,
        payload: &Value,
    ) -> Result<Value, GatewayError>;

    async fn delete(&self, kind: DocumentKind, id: &str) -> Result<(), GatewayError>;

    /// "http" | "memory", for logs and health output.
    fn backend(&self) -> &'static str;
}

/// Overlays the server's (possibly partial) returned record onto what was sent.
pub fn supersede(sent: &Value, returned: Option<Value>) -> Value {
    let mut merged = sent.clone();
    match (returned, &mut merged) {
        (Some(Value::Object(returned)), Value::Object(base)) => {
            for (key, value) in returned {
                base.insert(key, value);
            }
        }
        (Some(other), _) if !other.is_null() => merged = other,
        _ => {}
    }
    merged
}
