use futures::future::join_all;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::marker::PhantomData;
use std::sync::Arc;

use super::{Document, DocumentStore, StoreError};
use crate::filter::Filter;

/// Typed access to one collection.
pub struct Repository<T> {
    collection: &'static str,
    store: Arc<dyn DocumentStore>,
    _phantom: PhantomData<T>,
}

impl<T> Repository<T>
where
    T: Serialize + DeserializeOwned + Send,
{
    pub fn new(collection: &'static str, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            collection,
            store,
            _phantom: PhantomData,
        }
    }

    pub fn collection(&self) -> &'static str {
        self.collection
    }

    /// Fresh query specification over this collection.
    pub fn filter(&self) -> Result<Filter, StoreError> {
        Ok(Filter::new(self.collection)?)
    }

    pub fn decode(&self, document: Document) -> Result<T, StoreError> {
        document.into_model(self.collection)
    }

    pub async fn select_any(&self, filter: &Filter) -> Result<Vec<T>, StoreError> {
        self.store
            .query(filter)
            .await?
            .into_iter()
            .map(|doc| self.decode(doc))
            .collect()
    }

    pub async fn select_one(&self, id: &str) -> Result<Option<T>, StoreError> {
        match self.store.get(self.collection, id).await? {
            Some(doc) => Ok(Some(self.decode(doc)?)),
            None => Ok(None),
        }
    }

    pub async fn select_404(&self, id: &str) -> Result<T, StoreError> {
        self.select_one(id)
            .await?
            .ok_or_else(|| StoreError::not_found(self.collection, id))
    }

    pub async fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        self.store.count(filter).await
    }

    /// Concurrent per-id fetch. Missing ids are skipped; order follows `ids`.
    pub async fn select_ids(&self, ids: &[String]) -> Result<Vec<T>, StoreError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let lookups = ids.iter().map(|id| self.store.get(self.collection, id));
        let mut records = Vec::with_capacity(ids.len());
        for result in join_all(lookups).await {
            if let Some(doc) = result? {
                records.push(self.decode(doc)?);
            }
        }
        Ok(records)
    }

    pub async fn insert(&self, id: &str, record: &T) -> Result<(), StoreError> {
        self.store.insert(self.collection, Document::from_model(id, record)?).await
    }

    pub async fn put(&self, id: &str, record: &T) -> Result<(), StoreError> {
        self.store.put(self.collection, Document::from_model(id, record)?).await
    }

    pub async fn update(&self, id: &str, changes: &Map<String, Value>) -> Result<(), StoreError> {
        self.store.update(self.collection, id, changes).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(self.collection, id).await
    }
}
