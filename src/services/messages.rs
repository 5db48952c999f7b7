use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::database::models::{collections, Message};
use crate::database::{DocumentStore, Repository, StoreError};

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 50;

pub struct MessageService {
    messages: Repository<Message>,
}

impl MessageService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            messages: Repository::new(collections::MESSAGES, store),
        }
    }

    async fn window(&self, field: &str, user_id: &str, size: usize) -> Result<Vec<Message>, StoreError> {
        let mut filter = self.messages.filter()?;
        filter.where_eq(field, Value::String(user_id.to_string()))?.limit(size);
        self.messages.select_any(&filter).await
    }

    /// Messages sent or received by `user_id`, newest first.
    ///
    /// Each side is fetched as an unordered window of `2 * limit` and the
    /// union is sorted in memory, so very active users may not see their
    /// true latest messages.
    pub async fn conversation(&self, user_id: &str, limit: usize) -> Result<Vec<Message>, StoreError> {
        let limit = limit.clamp(1, MAX_LIMIT);
        let window = limit * 2;

        let received = self.window("recipientId", user_id, window).await?;
        let sent = self.window("senderId", user_id, window).await?;

        let mut unique: HashMap<String, Message> = HashMap::new();
        for message in received.into_iter().chain(sent) {
            unique.insert(message.id.clone(), message);
        }
        let mut messages: Vec<Message> = unique.into_values().collect();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        messages.truncate(limit);
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use chrono::{Duration, Utc};
    use serde_json::json;

    async fn seed(store: &Arc<dyn DocumentStore>, id: &str, from: &str, to: &str, minutes_ago: Option<i64>) {
        let repo = Repository::<Message>::new(collections::MESSAGES, store.clone());
        let created_at = minutes_ago.map(|m| Utc::now() - Duration::minutes(m));
        let mut message: Message = serde_json::from_value(json!({
            "senderId": from,
            "recipientId": to,
            "content": format!("message {}", id)
        }))
        .unwrap();
        message.created_at = created_at;
        repo.insert(id, &message).await.unwrap();
    }

    #[tokio::test]
    async fn merges_both_directions_newest_first() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        seed(&store, "m1", "ada", "grace", Some(30)).await;
        seed(&store, "m2", "grace", "ada", Some(10)).await;
        seed(&store, "m3", "ada", "ada", Some(20)).await;
        seed(&store, "m4", "linus", "grace", Some(1)).await;
        seed(&store, "m5", "grace", "ada", None).await;

        let messages = MessageService::new(store).conversation("ada", 10).await.unwrap();
        let ids: Vec<&str> = messages.iter().map(|m| m.id.as_str()).collect();
        // m3 appears in both windows but only once; undated sorts last
        assert_eq!(ids, vec!["m2", "m3", "m1", "m5"]);
    }

    #[tokio::test]
    async fn caps_the_result() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        for i in 0..8 {
            seed(&store, &format!("m{}", i), "ada", "grace", Some(i)).await;
        }
        let messages = MessageService::new(store).conversation("ada", 3).await.unwrap();
        let ids: Vec<&str> = messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m0", "m1", "m2"]);
    }
}
