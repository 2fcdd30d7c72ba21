use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use sqlx::PgPool;

use super::document_store::{into_object, DocumentStore};
use crate::error::Result;

/// PostgreSQL-backed store: one `documents` table keyed by `(collection, id)`.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<JsonValue>> {
        let doc = sqlx::query_scalar::<_, JsonValue>(
            "SELECT data FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(doc)
    }

    async fn set(&self, collection: &str, id: &str, data: JsonValue) -> Result<()> {
        let doc = JsonValue::Object(into_object(id, data)?);
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id)
            DO UPDATE SET data = EXCLUDED.data, updated_at = NOW()
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(doc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn merge(&self, collection: &str, id: &str, patch: JsonValue) -> Result<JsonValue> {
        let patch = JsonValue::Object(into_object(id, patch)?);
        let merged = sqlx::query_scalar::<_, JsonValue>(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id)
            DO UPDATE SET data = documents.data || EXCLUDED.data, updated_at = NOW()
            RETURNING data
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(patch)
        .fetch_one(&self.pool)
        .await?;
        Ok(merged)
    }

    async fn list(&self, collection: &str) -> Result<Vec<JsonValue>> {
        let docs = sqlx::query_scalar::<_, JsonValue>(
            "SELECT data FROM documents WHERE collection = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;
        Ok(docs)
    }

    async fn find_by(
        &self,
        collection: &str,
        field: &str,
        value: &JsonValue,
    ) -> Result<Vec<JsonValue>> {
        let mut filter = Map::new();
        filter.insert(field.to_string(), value.clone());
        let docs = sqlx::query_scalar::<_, JsonValue>(
            r#"
            SELECT data FROM documents
            WHERE collection = $1 AND data @> $2
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(collection)
        .bind(JsonValue::Object(filter))
        .fetch_all(&self.pool)
        .await?;
        Ok(docs)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
