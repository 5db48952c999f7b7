//! Seed data loaded from YAML or JSON files.
//!
//! ```yaml
//! users:
//!   - _id: admin-1
//!     email: admin@example.edu
//!     displayName: Admin
//!     role: admin
//! events:
//!   - title: Rust Meetup
//!     description: Monthly meetup
//!     startDate: 2025-03-01T18:00:00.000Z
//!     endDate: 2025-03-01T20:00:00.000Z
//! ```
//!
//! Documents without an `_id` get a fresh UUID; users fall back to `uid`.
//! Seeding replaces documents with the same id.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::database::models::{collections, Attendance, Badge, Event, Message, User, UserBadge};
use crate::database::{Document, DocumentStore, StoreError};

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("Failed to read fixture {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML fixture: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid JSON fixture: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Fixture {
    pub users: Vec<User>,
    pub events: Vec<Event>,
    pub attendance: Vec<Attendance>,
    pub badges: Vec<Badge>,
    pub user_badges: Vec<UserBadge>,
    pub messages: Vec<Message>,
}

impl Fixture {
    /// `.yaml`/`.yml` files parse as YAML, everything else as JSON.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.display().to_string(),
            source,
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&raw),
            _ => Self::from_json(&raw),
        }
    }

    pub fn from_yaml(raw: &str) -> Result<Self, FixtureError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(raw)?)
    }

    fn into_documents(self) -> Result<Vec<(&'static str, Document)>, StoreError> {
        let mut documents = Vec::new();

        for mut user in self.users {
            if user.id.is_empty() {
                user.id = user.uid.clone();
            }
            user.id = id_or_new(user.id);
            user.normalize();
            documents.push((collections::USERS, Document::from_model(user.id.clone(), &user)?));
        }
        for mut event in self.events {
            event.id = id_or_new(event.id);
            event.normalize();
            documents.push((collections::EVENTS, Document::from_model(event.id.clone(), &event)?));
        }
        push_all(&mut documents, collections::ATTENDANCE, self.attendance, |a| &mut a.id)?;
        push_all(&mut documents, collections::BADGES, self.badges, |b| &mut b.id)?;
        push_all(&mut documents, collections::USER_BADGES, self.user_badges, |b| &mut b.id)?;
        push_all(&mut documents, collections::MESSAGES, self.messages, |m| &mut m.id)?;

        Ok(documents)
    }

    /// Writes every document to `store`; returns how many were written.
    pub async fn seed(self, store: &Arc<dyn DocumentStore>) -> Result<usize, FixtureError> {
        let documents = self.into_documents()?;
        let count = documents.len();
        for (collection, document) in documents {
            store.put(collection, document).await?;
        }
        info!("Seeded {} fixture documents", count);
        Ok(count)
    }
}

fn id_or_new(id: String) -> String {
    if id.trim().is_empty() {
        Uuid::new_v4().to_string()
    } else {
        id
    }
}

fn push_all<T: Serialize>(
    documents: &mut Vec<(&'static str, Document)>,
    collection: &'static str,
    records: Vec<T>,
    id: impl Fn(&mut T) -> &mut String,
) -> Result<(), StoreError> {
    for mut record in records {
        let slot = id(&mut record);
        *slot = id_or_new(std::mem::take(slot));
        let doc_id = slot.clone();
        documents.push((collection, Document::from_model(doc_id, &record)?));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{MemoryStore, Repository};

    const SEED: &str = r#"
users:
  - uid: ada
    email: ada@example.edu
    displayName: Ada Lovelace
    role: admin
events:
  - _id: meetup
    title: Rust Meetup
    description: Monthly meetup
    startDate: 2025-03-01T18:00:00.000Z
    endDate: 2025-03-01T20:00:00.000Z
    attendees: [ada]
messages:
  - senderId: ada
    recipientId: grace
    content: hello
"#;

    #[tokio::test]
    async fn seeds_yaml_into_store() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let written = Fixture::from_yaml(SEED).unwrap().seed(&store).await.unwrap();
        assert_eq!(written, 3);

        let user = Repository::<User>::new(collections::USERS, store.clone())
            .select_404("ada")
            .await
            .unwrap();
        assert!(user.is_admin());
        assert_eq!(user.display_name_lower, "ada lovelace");

        let event = Repository::<Event>::new(collections::EVENTS, store.clone())
            .select_404("meetup")
            .await
            .unwrap();
        assert_eq!(event.title_lower, "rust meetup");
        assert_eq!(event.current_attendees, 1);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(Fixture::from_json("{ users: "), Err(FixtureError::Json(_))));
    }
}
