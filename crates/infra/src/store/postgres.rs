//! Postgres-backed document store.
//!
//! Every collection shares one table:
//!
//! ```sql
//! documents (collection TEXT, id TEXT, body JSONB, updated_at TIMESTAMPTZ,
//!            PRIMARY KEY (collection, id))
//! ```
//!
//! Records are stored as their serde JSON representation.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed / other | N/A | `Backend` |

use std::fmt::Display;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::{PgPool, Row};
use tracing::instrument;

use super::{Store, StoreError};

/// Create the `documents` table if it does not exist.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            body JSONB NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            PRIMARY KEY (collection, id)
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| map_sqlx_error("ensure_schema", e))?;
    Ok(())
}

/// One collection inside the `documents` table.
#[derive(Debug, Clone)]
pub struct PostgresJsonStore<K, V> {
    pool: PgPool,
    collection: &'static str,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V> PostgresJsonStore<K, V> {
    pub fn new(pool: PgPool, collection: &'static str) -> Self {
        Self {
            pool,
            collection,
            _marker: PhantomData,
        }
    }

    pub fn collection(&self) -> &'static str {
        self.collection
    }
}

#[async_trait]
impl<K, V> Store<K, V> for PostgresJsonStore<K, V>
where
    K: Display + Send + Sync + 'static,
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    #[instrument(skip_all, fields(id = %key), err)]
    async fn get(&self, key: &K) -> Result<Option<V>, StoreError> {
        let row = sqlx::query("SELECT body FROM documents WHERE collection = $1 AND id = $2")
            .bind(self.collection)
            .bind(key.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get", e))?;

        match row {
            Some(row) => {
                let body: serde_json::Value = row
                    .try_get("body")
                    .map_err(|e| map_sqlx_error("get", e))?;
                Ok(Some(serde_json::from_value(body)?))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip_all, fields(id = %key), err)]
    async fn insert(&self, key: K, value: V) -> Result<(), StoreError> {
        let body = serde_json::to_value(&value)?;
        let result = sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO NOTHING
            "#,
        )
        .bind(self.collection)
        .bind(key.to_string())
        .bind(body)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(format!(
                "{}/{key} already exists",
                self.collection
            )));
        }
        Ok(())
    }

    #[instrument(skip_all, fields(id = %key), err)]
    async fn upsert(&self, key: K, value: V) -> Result<(), StoreError> {
        let body = serde_json::to_value(&value)?;
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id)
            DO UPDATE SET body = EXCLUDED.body, updated_at = NOW()
            "#,
        )
        .bind(self.collection)
        .bind(key.to_string())
        .bind(body)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("upsert", e))?;
        Ok(())
    }

    #[instrument(skip_all, fields(id = %key), err)]
    async fn delete(&self, key: &K) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(self.collection)
            .bind(key.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip_all, err)]
    async fn list(&self) -> Result<Vec<V>, StoreError> {
        let rows = sqlx::query("SELECT body FROM documents WHERE collection = $1 ORDER BY id ASC")
            .bind(self.collection)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list", e))?;

        rows.into_iter()
            .map(|row| {
                let body: serde_json::Value = row
                    .try_get("body")
                    .map_err(|e| map_sqlx_error("list", e))?;
                Ok(serde_json::from_value(body)?)
            })
            .collect()
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {operation}: {}", db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {operation}"))
        }
        other => StoreError::Backend(format!("sqlx error in {operation}: {other}")),
    }
}
