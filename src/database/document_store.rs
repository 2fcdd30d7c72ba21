//! Collection/id keyed JSON document storage.
//!
//! Documents are JSON objects. Writes are either full replacements (`set`) or
//! shallow merges of top-level keys (`merge`); there are no transactions and no
//! referential integrity between collections.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{Error, Result};

pub type SharedStore = Arc<dyn DocumentStore>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<JsonValue>>;

    /// Replace the whole document, creating it if missing.
    async fn set(&self, collection: &str, id: &str, data: JsonValue) -> Result<()>;

    /// Upsert: top-level keys of `patch` overwrite the stored ones. Returns the merged document.
    async fn merge(&self, collection: &str, id: &str, patch: JsonValue) -> Result<JsonValue>;

    /// Every document of a collection, oldest first.
    async fn list(&self, collection: &str) -> Result<Vec<JsonValue>>;

    /// Documents whose top-level `field` equals `value`, oldest first.
    async fn find_by(&self, collection: &str, field: &str, value: &JsonValue)
        -> Result<Vec<JsonValue>>;

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Normalizes a write payload into an object carrying its own `id`.
pub(crate) fn into_object(id: &str, data: JsonValue) -> Result<Map<String, JsonValue>> {
    match data {
        JsonValue::Object(mut map) => {
            map.insert("id".to_string(), JsonValue::String(id.to_string()));
            Ok(map)
        }
        other => Err(Error::BadRequest(format!(
            "documents must be JSON objects, got {}",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

pub async fn fetch<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    id: &str,
) -> Result<Option<T>> {
    match store.get(collection, id).await? {
        Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
        None => Ok(None),
    }
}

pub async fn fetch_all<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
) -> Result<Vec<T>> {
    store
        .list(collection)
        .await?
        .into_iter()
        .map(|doc| serde_json::from_value(doc).map_err(Error::from))
        .collect()
}

pub async fn fetch_where<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    field: &str,
    value: JsonValue,
) -> Result<Vec<T>> {
    store
        .find_by(collection, field, &value)
        .await?
        .into_iter()
        .map(|doc| serde_json::from_value(doc).map_err(Error::from))
        .collect()
}

pub async fn put<T: Serialize>(
    store: &dyn DocumentStore,
    collection: &str,
    id: &str,
    value: &T,
) -> Result<()> {
    store.set(collection, id, serde_json::to_value(value)?).await
}
