use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use super::{Document, DocumentStore, StoreError};
use crate::filter::filter_order::FilterOrder;
use crate::filter::path::{lookup, set_path, validate_field_path};
use crate::filter::Filter;

/// Process-local document store.
///
/// Documents within a collection iterate in id order, which stands in for the
/// natural order of an unordered store query.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn require_object(collection: &str, data: &Value) -> Result<(), StoreError> {
    if data.is_object() {
        Ok(())
    } else {
        Err(StoreError::InvalidDocument {
            collection: collection.to_string(),
            reason: "document body must be a JSON object".to_string(),
        })
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document::new(id, data.clone())))
    }

    async fn insert(&self, collection: &str, document: Document) -> Result<(), StoreError> {
        require_object(collection, &document.data)?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(&document.id) {
            return Err(StoreError::already_exists(collection, &document.id));
        }
        docs.insert(document.id, document.data);
        Ok(())
    }

    async fn put(&self, collection: &str, document: Document) -> Result<(), StoreError> {
        require_object(collection, &document.data)?;
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(document.id, document.data);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, changes: &Map<String, Value>) -> Result<(), StoreError> {
        for path in changes.keys() {
            validate_field_path(path)?;
        }
        let mut collections = self.collections.write().await;
        let Some(Value::Object(body)) = collections.get_mut(collection).and_then(|docs| docs.get_mut(id)) else {
            return Err(StoreError::not_found(collection, id));
        };
        for (path, value) in changes {
            set_path(body, path, value.clone());
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(collection, id))
    }

    async fn add_to_set(&self, collection: &str, id: &str, field: &str, value: Value) -> Result<bool, StoreError> {
        validate_field_path(field)?;
        let mut collections = self.collections.write().await;
        let Some(Value::Object(body)) = collections.get_mut(collection).and_then(|docs| docs.get_mut(id)) else {
            return Err(StoreError::not_found(collection, id));
        };

        let mut items = match lookup(&Value::Object(body.clone()), field) {
            Some(Value::Array(items)) => items.clone(),
            Some(Value::Null) | None => Vec::new(),
            Some(_) => {
                return Err(StoreError::InvalidDocument {
                    collection: collection.to_string(),
                    reason: format!("field '{}' is not an array", field),
                })
            }
        };
        if items.contains(&value) {
            return Ok(false);
        }
        items.push(value);
        set_path(body, field, Value::Array(items));
        Ok(true)
    }

    async fn query(&self, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(filter.collection()) else {
            return Ok(vec![]);
        };

        let mut matched: Vec<(&String, &Value)> = docs.iter().filter(|(_, data)| filter.matches(data)).collect();
        if let Some(order) = filter.order_info() {
            // Stable: ties keep id order
            matched.sort_by(|(_, a), (_, b)| FilterOrder::compare_documents(order, a, b));
        }

        let take = filter.take().unwrap_or(usize::MAX);
        Ok(matched
            .into_iter()
            .skip(filter.skip())
            .take(take)
            .map(|(id, data)| Document::new(id.clone(), data.clone()))
            .collect())
    }

    async fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(filter.collection())
            .map(|docs| docs.values().filter(|data| filter.matches(data)).count() as u64)
            .unwrap_or(0))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
