pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::filter::{Filter, FilterError};

pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;
pub use repository::Repository;

/// Errors from document store backends
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Already exists: {collection}/{id}")]
    AlreadyExists { collection: String, id: String },

    #[error("Invalid document in {collection}: {reason}")]
    InvalidDocument { collection: String, reason: String },

    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        StoreError::NotFound { collection: collection.to_string(), id: id.to_string() }
    }

    pub fn already_exists(collection: &str, id: &str) -> Self {
        StoreError::AlreadyExists { collection: collection.to_string(), id: id.to_string() }
    }
}

/// A stored record: its id plus the JSON body. The id is never part of the
/// body; it is surfaced to API clients as `_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self { id: id.into(), data }
    }

    pub fn from_model<T: Serialize>(id: impl Into<String>, model: &T) -> Result<Self, StoreError> {
        let mut data = serde_json::to_value(model)?;
        if let Value::Object(map) = &mut data {
            map.remove("_id");
        }
        Ok(Self { id: id.into(), data })
    }

    pub fn into_model<T: DeserializeOwned>(self, collection: &str) -> Result<T, StoreError> {
        serde_json::from_value(self.into_api_value()).map_err(|e| StoreError::InvalidDocument {
            collection: collection.to_string(),
            reason: e.to_string(),
        })
    }

    /// Body with `_id` merged in, the shape returned to clients.
    pub fn into_api_value(self) -> Value {
        match self.data {
            Value::Object(mut map) => {
                map.insert("_id".to_string(), Value::String(self.id));
                Value::Object(map)
            }
            other => other,
        }
    }
}

/// Query interface over the document database. One evaluator per backend.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Creates a document, failing with `AlreadyExists` if the id is taken.
    async fn insert(&self, collection: &str, document: Document) -> Result<(), StoreError>;

    /// Creates or replaces a document.
    async fn put(&self, collection: &str, document: Document) -> Result<(), StoreError>;

    /// Applies field changes keyed by dotted path. Fails with `NotFound`.
    async fn update(&self, collection: &str, id: &str, changes: &Map<String, Value>) -> Result<(), StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Atomically appends `value` to the array at `field` unless already
    /// present. Returns whether the value was added.
    async fn add_to_set(&self, collection: &str, id: &str, field: &str, value: Value) -> Result<bool, StoreError>;

    async fn query(&self, filter: &Filter) -> Result<Vec<Document>, StoreError>;

    async fn count(&self, filter: &Filter) -> Result<u64, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
