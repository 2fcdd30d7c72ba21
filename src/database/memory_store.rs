use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tokio::sync::RwLock;

use super::document_store::{into_object, DocumentStore};
use crate::error::Result;

/// Process-local store used when no `DATABASE_URL` is configured, and by tests.
#[derive(Default)]
pub struct MemoryDocumentStore {
    // collection -> documents in insertion order
    collections: RwLock<HashMap<String, Vec<(String, JsonValue)>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<JsonValue>> {
        let guard = self.collections.read().await;
        Ok(guard
            .get(collection)
            .and_then(|docs| docs.iter().find(|(doc_id, _)| doc_id == id))
            .map(|(_, doc)| doc.clone()))
    }

    async fn set(&self, collection: &str, id: &str, data: JsonValue) -> Result<()> {
        let doc = JsonValue::Object(into_object(id, data)?);
        let mut guard = self.collections.write().await;
        let docs = guard.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|(doc_id, _)| doc_id == id) {
            Some((_, existing)) => *existing = doc,
            None => docs.push((id.to_string(), doc)),
        }
        Ok(())
    }

    async fn merge(&self, collection: &str, id: &str, patch: JsonValue) -> Result<JsonValue> {
        let patch = into_object(id, patch)?;
        let mut guard = self.collections.write().await;
        let docs = guard.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|(doc_id, _)| doc_id == id) {
            Some((_, JsonValue::Object(existing))) => {
                existing.extend(patch);
                Ok(JsonValue::Object(existing.clone()))
            }
            Some((_, other)) => {
                *other = JsonValue::Object(patch);
                Ok(other.clone())
            }
            None => {
                let doc = JsonValue::Object(patch);
                docs.push((id.to_string(), doc.clone()));
                Ok(doc)
            }
        }
    }

    async fn list(&self, collection: &str) -> Result<Vec<JsonValue>> {
        let guard = self.collections.read().await;
        Ok(guard
            .get(collection)
            .map(|docs| docs.iter().map(|(_, doc)| doc.clone()).collect())
            .unwrap_or_default())
    }

    async fn find_by(
        &self,
        collection: &str,
        field: &str,
        value: &JsonValue,
    ) -> Result<Vec<JsonValue>> {
        let guard = self.collections.read().await;
        Ok(guard
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, doc)| doc.get(field) == Some(value))
                    .map(|(_, doc)| doc.clone())
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn merge_upserts_and_keeps_untouched_keys() {
        let store = MemoryDocumentStore::new();
        let merged = store
            .merge("candidates", "c1", json!({"title": "Engineer", "skills": ["rust"]}))
            .await
            .unwrap();
        assert_eq!(merged["id"], "c1");

        let merged = store
            .merge("candidates", "c1", json!({"title": "Senior Engineer"}))
            .await
            .unwrap();
        assert_eq!(merged["title"], "Senior Engineer");
        assert_eq!(merged["skills"], json!(["rust"]));
    }

    #[tokio::test]
    async fn set_replaces_the_document() {
        let store = MemoryDocumentStore::new();
        store.set("jobs", "j1", json!({"title": "A", "department": "Eng"})).await.unwrap();
        store.set("jobs", "j1", json!({"title": "B"})).await.unwrap();
        let doc = store.get("jobs", "j1").await.unwrap().unwrap();
        assert_eq!(doc, json!({"id": "j1", "title": "B"}));
    }

    #[tokio::test]
    async fn find_by_matches_top_level_field_in_insertion_order() {
        let store = MemoryDocumentStore::new();
        store.set("applications", "a1", json!({"jobId": "j1"})).await.unwrap();
        store.set("applications", "a2", json!({"jobId": "j2"})).await.unwrap();
        store.set("applications", "a3", json!({"jobId": "j1"})).await.unwrap();

        let found = store.find_by("applications", "jobId", &json!("j1")).await.unwrap();
        let ids: Vec<_> = found.iter().map(|d| d["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["a1", "a3"]);
        assert!(store.list("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_non_object_documents() {
        let store = MemoryDocumentStore::new();
        let err = store.set("jobs", "j1", json!([1, 2])).await.unwrap_err();
        assert!(err.to_string().contains("array"));
    }
}
