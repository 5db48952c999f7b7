use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::{PgPool, Row};
use std::time::Duration;
use tracing::info;

use super::{Document, DocumentStore, StoreError};
use crate::config::DatabaseConfig;
use crate::filter::path::{to_pg_path, validate_field_path};
use crate::filter::types::SqlParam;
use crate::filter::Filter;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        collection TEXT NOT NULL,
        id TEXT NOT NULL,
        data JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (collection, id)
    )
"#;

/// Document store over a single PostgreSQL JSONB table.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
    log_queries: bool,
}

impl PgDocumentStore {
    /// Opens the pool and prepares the documents table.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = config.url.as_deref().ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        let store = Self::from_pool(pool, config.enable_query_logging);
        store.migrate().await?;
        info!("Connected document store (max_connections={})", config.max_connections);
        Ok(store)
    }

    pub fn from_pool(pool: PgPool, log_queries: bool) -> Self {
        Self { pool, log_queries }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    fn log(&self, sql: &str) {
        if self.log_queries {
            tracing::debug!(target: "campus_hub_api::sql", "{}", sql);
        }
    }

    /// Nested `jsonb_set` calls applying each change in order.
    fn update_expression(changes: &Map<String, Value>) -> Result<(String, Vec<Value>), StoreError> {
        let mut expression = "data".to_string();
        let mut values = Vec::with_capacity(changes.len());
        for (path, value) in changes {
            validate_field_path(path)?;
            values.push(value.clone());
            // $1 collection, $2 id, values from $3
            expression = format!(
                "jsonb_set({}, '{}', ${}::jsonb, true)",
                expression,
                to_pg_path(path),
                values.len() + 2
            );
        }
        Ok((expression, values))
    }
}

fn bind_param<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    p: &'q SqlParam,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match p {
        SqlParam::Text(s) => q.bind(s),
        SqlParam::Json(v) => q.bind(v),
        SqlParam::Int(i) => q.bind(*i),
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query("SELECT id, data FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(match row {
            Some(row) => Some(Document::new(row.try_get::<String, _>("id")?, row.try_get::<Value, _>("data")?)),
            None => None,
        })
    }

    async fn insert(&self, collection: &str, document: Document) -> Result<(), StoreError> {
        let result = sqlx::query(
            "INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3) ON CONFLICT (collection, id) DO NOTHING",
        )
        .bind(collection)
        .bind(&document.id)
        .bind(&document.data)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::already_exists(collection, &document.id));
        }
        Ok(())
    }

    async fn put(&self, collection: &str, document: Document) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3) \
             ON CONFLICT (collection, id) DO UPDATE SET data = EXCLUDED.data, updated_at = now()",
        )
        .bind(collection)
        .bind(&document.id)
        .bind(&document.data)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, changes: &Map<String, Value>) -> Result<(), StoreError> {
        let (expression, values) = Self::update_expression(changes)?;
        let sql = format!(
            "UPDATE documents SET data = {}, updated_at = now() WHERE collection = $1 AND id = $2",
            expression
        );
        self.log(&sql);

        let mut q = sqlx::query(&sql).bind(collection).bind(id);
        for value in values.iter() {
            q = q.bind(value);
        }
        let result = q.execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(())
    }

    async fn add_to_set(&self, collection: &str, id: &str, field: &str, value: Value) -> Result<bool, StoreError> {
        validate_field_path(field)?;
        let path = to_pg_path(field);
        // Single statement: the containment check and append cannot interleave
        let sql = format!(
            "UPDATE documents \
             SET data = jsonb_set(data, '{path}', COALESCE(data #> '{path}', '[]'::jsonb) || $3::jsonb, true), \
                 updated_at = now() \
             WHERE collection = $1 AND id = $2 AND NOT (COALESCE(data #> '{path}', '[]'::jsonb) @> $3::jsonb)"
        );
        self.log(&sql);

        let element = Value::Array(vec![value]);
        let result = sqlx::query(&sql)
            .bind(collection)
            .bind(id)
            .bind(&element)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() > 0 {
            return Ok(true);
        }
        match self.get(collection, id).await? {
            Some(_) => Ok(false),
            None => Err(StoreError::not_found(collection, id)),
        }
    }

    async fn query(&self, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let sql = filter.to_sql();
        self.log(&sql.query);

        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_param(q, p);
        }
        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|row| -> Result<Document, StoreError> {
                Ok(Document::new(row.try_get::<String, _>("id")?, row.try_get::<Value, _>("data")?))
            })
            .collect()
    }

    async fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        let sql = filter.to_count_sql();
        self.log(&sql.query);

        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_param(q, p);
        }
        let row = q.fetch_one(&self.pool).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count.max(0) as u64)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
