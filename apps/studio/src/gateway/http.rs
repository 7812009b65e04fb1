use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::document::model::DocumentKind;
use crate::gateway::{DocumentGateway, Envelope, GatewayError};

/// REST client for the document backend.
///
/// Every request carries the configured bearer token. There is no retry: a
/// failed save surfaces to the user, who retries by submitting again.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<Value>,
}

impl HttpGateway {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| GatewayError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(GatewayError::InvalidBaseUrl(base_url.to_string()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: parsed,
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// `<base>/<resource>[/<id>]`, with the id escaped as a single path segment.
    fn resource_url(&self, kind: DocumentKind, id: Option<&str>) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| GatewayError::InvalidBaseUrl(self.base_url.to_string()))?;
            segments.pop_if_empty().push(kind.resource());
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> Result<RequestBuilder, GatewayError> {
        let token = self.token.as_deref().ok_or(GatewayError::MissingToken)?;
        debug!("backend {} {}", method, url);
        Ok(self.client.request(method, url).bearer_auth(token))
    }

    async fn read_envelope(
        response: Response,
        kind: DocumentKind,
        id: Option<&str>,
    ) -> Result<Option<Value>, GatewayError> {
        let status = response.status();

        if status.as_u16() == 404 {
            return Err(GatewayError::NotFound {
                kind: kind.resource(),
                id: id.unwrap_or_default().to_string(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("backend returned {}: {}", status, body);
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|e| {
                    e.message.or_else(|| {
                        e.error.map(|v| match v {
                            Value::String(s) => s,
                            other => other.to_string(),
                        })
                    })
                })
                .unwrap_or(body);
            return Err(GatewayError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(None);
        }
        let envelope: Envelope<Value> = serde_json::from_slice(&bytes)?;
        envelope.into_result()
    }
}

#[async_trait]
impl DocumentGateway for HttpGateway {
    async fn fetch(&self, kind: DocumentKind, id: &str) -> Result<Value, GatewayError> {
        let url = self.resource_url(kind, Some(id))?;
        let response = self.request(Method::GET, url)?.send().await?;
        let data = Self::read_envelope(response, kind, Some(id)).await?;
        data.ok_or_else(|| GatewayError::NotFound {
            kind: kind.resource(),
            id: id.to_string(),
        })
    }

    async fn create(&self, kind: DocumentKind, payload: &Value) -> Result<Value, GatewayError> {
        let url = self.resource_url(kind, None)?;
        let response = self
            .request(Method::POST, url)?
            .json(payload)
            .send()
            .await?;
        let data = Self::read_envelope(response, kind, None).await?;
        Ok(data.unwrap_or(Value::Null))
    }

    async fn update(
        &self,
        kind: DocumentKind,
        id: &str,
        payload: &Value,
    ) -> Result<Value, GatewayError> {
        if id.trim().is_empty() {
            return Err(GatewayError::MissingDocumentId);
        }
        let url = self.resource_url(kind, Some(id))?;
        let response = self
            .request(Method::PUT, url)?
            .json(payload)
            .send()
            .await?;
        let data = Self::read_envelope(response, kind, Some(id)).await?;
        Ok(data.unwrap_or(Value::Null))
    }

    async fn delete(&self, kind: DocumentKind, id: &str) -> Result<(), GatewayError> {
        if id.trim().is_empty() {
            return Err(GatewayError::MissingDocumentId);
        }
        let url = self.resource_url(kind, Some(id))?;
        let response = self.request(Method::DELETE, url)?.send().await?;
        Self::read_envelope(response, kind, Some(id)).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "http"
    }
}
