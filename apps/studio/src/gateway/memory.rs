use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::document::model::DocumentKind;
use crate::gateway::{DocumentGateway, GatewayError};

/// Process-local document store used when no backend is configured, and in tests.
#[derive(Default)]
pub struct InMemoryGateway {
    records: RwLock<HashMap<(DocumentKind, String), Value>>,
    next_id: AtomicU64,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a record directly, bypassing `create`.
    #[cfg(test)]
    pub async fn insert(&self, kind: DocumentKind, id: &str, record: Value) {
        self.records
            .write()
            .await
            .insert((kind, id.to_string()), with_id(record, id));
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

fn with_id(mut record: Value, id: &str) -> Value {
    if let Value::Object(map) = &mut record {
        map.insert("id".to_string(), Value::String(id.to_string()));
    }
    record
}

fn not_found(kind: DocumentKind, id: &str) -> GatewayError {
    GatewayError::NotFound {
        kind: kind.resource(),
        id: id.to_string(),
    }
}

#[async_trait]
impl DocumentGateway for InMemoryGateway {
    async fn fetch(&self, kind: DocumentKind, id: &str) -> Result<Value, GatewayError> {
        self.records
            .read()
            .await
            .get(&(kind, id.to_string()))
            .cloned()
            .ok_or_else(|| not_found(kind, id))
    }

    async fn create(&self, kind: DocumentKind, payload: &Value) -> Result<Value, GatewayError> {
        let id = (self.next_id.fetch_add(1, Ordering::SeqCst) + 1).to_string();
        let record = with_id(payload.clone(), &id);
        self.records
            .write()
            .await
            .insert((kind, id), record.clone());
        Ok(record)
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
        let mut records = self.records.write().await;
        let slot = records
            .get_mut(&(kind, id.to_string()))
            .ok_or_else(|| not_found(kind, id))?;
        *slot = with_id(payload.clone(), id);
        Ok(slot.clone())
    }

    async fn delete(&self, kind: DocumentKind, id: &str) -> Result<(), GatewayError> {
        self.records
            .write()
            .await
            .remove(&(kind, id.to_string()))
            .map(|_| ())
            .ok_or_else(|| not_found(kind, id))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let gw = InMemoryGateway::new();
        let a = gw.create(DocumentKind::Cv, &json!({"summary": "a"})).await.unwrap();
        let b = gw.create(DocumentKind::Cv, &json!({"summary": "b"})).await.unwrap();
        assert_eq!(a["id"], json!("1"));
        assert_eq!(b["id"], json!("2"));
        assert_eq!(gw.len().await, 2);
    }

    #[tokio::test]
    async fn test_kinds_are_separate_collections() {
        let gw = InMemoryGateway::new();
        gw.insert(DocumentKind::Cv, "1", json!({})).await;
        assert!(gw.fetch(DocumentKind::Resume, "1").await.is_err());
        assert!(gw.fetch(DocumentKind::Cv, "1").await.is_ok());
    }

    #[tokio::test]
    async fn test_update_unknown_is_not_found() {
        let gw = InMemoryGateway::new();
        let err = gw.update(DocumentKind::Cv, "5", &json!({})).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_removes_record() {
        let gw = InMemoryGateway::new();
        gw.insert(DocumentKind::Resume, "x", json!({"summary": "s"})).await;
        gw.delete(DocumentKind::Resume, "x").await.unwrap();
        assert!(gw.fetch(DocumentKind::Resume, "x").await.is_err());
    }
}
