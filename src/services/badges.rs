use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::database::models::{collections, timestamp, Badge, UserBadge};
use crate::database::{DocumentStore, Repository, StoreError};

pub const MAX_USER_BADGES: usize = 100;

/// A user's badge award joined with the badge definition.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnedBadge {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub badge_id: String,
    #[serde(with = "timestamp::option")]
    pub earned_at: Option<chrono::DateTime<chrono::Utc>>,
    pub points: u64,
    pub badge: Option<Badge>,
}

pub struct BadgeService {
    badges: Repository<Badge>,
    user_badges: Repository<UserBadge>,
}

impl BadgeService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            badges: Repository::new(collections::BADGES, store.clone()),
            user_badges: Repository::new(collections::USER_BADGES, store),
        }
    }

    /// Up to `MAX_USER_BADGES` awards for `user_id`, most recent first.
    /// Awards without a timestamp sort last; a missing badge joins as `None`.
    pub async fn earned_by(&self, user_id: &str) -> Result<Vec<EarnedBadge>, StoreError> {
        let mut filter = self.user_badges.filter()?;
        filter.where_eq("userId", Value::String(user_id.to_string()))?.limit(MAX_USER_BADGES);
        let awards = self.user_badges.select_any(&filter).await?;
        if awards.is_empty() {
            return Ok(vec![]);
        }

        let badge_ids: Vec<String> = awards
            .iter()
            .map(|a| a.badge_id.clone())
            .filter(|id| !id.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let definitions: HashMap<String, Badge> = self
            .badges
            .select_ids(&badge_ids)
            .await?
            .into_iter()
            .map(|badge| (badge.id.clone(), badge))
            .collect();

        let mut earned: Vec<EarnedBadge> = awards
            .into_iter()
            .map(|award| EarnedBadge {
                badge: definitions.get(&award.badge_id).cloned(),
                id: award.id,
                user_id: award.user_id,
                badge_id: award.badge_id,
                earned_at: award.earned_at,
                points: award.points,
            })
            .collect();
        // Stable; Option orders None first, so reversing puts it last
        earned.sort_by(|a, b| b.earned_at.cmp(&a.earned_at));
        Ok(earned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use chrono::{Duration, Utc};

    fn badge(id: &str, name: &str) -> Badge {
        serde_json::from_value(serde_json::json!({ "_id": id, "name": name })).unwrap()
    }

    fn award(user_id: &str, badge_id: &str, earned_at: Option<chrono::DateTime<Utc>>) -> UserBadge {
        UserBadge {
            id: String::new(),
            user_id: user_id.to_string(),
            badge_id: badge_id.to_string(),
            earned_at,
            points: 5,
        }
    }

    #[tokio::test]
    async fn joins_and_orders_by_earned_at_desc() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let badges = Repository::<Badge>::new(collections::BADGES, store.clone());
        let awards = Repository::<UserBadge>::new(collections::USER_BADGES, store.clone());

        badges.insert("b1", &badge("b1", "First Steps")).await.unwrap();
        badges.insert("b2", &badge("b2", "Regular")).await.unwrap();

        let t1 = Utc::now() - Duration::days(3);
        let t2 = Utc::now() - Duration::days(1);
        awards.insert("ub1", &award("ada", "b1", Some(t1))).await.unwrap();
        awards.insert("ub2", &award("ada", "b2", Some(t2))).await.unwrap();
        awards.insert("ub3", &award("ada", "gone", None)).await.unwrap();
        awards.insert("ub4", &award("grace", "b1", Some(t2))).await.unwrap();

        let earned = BadgeService::new(store).earned_by("ada").await.unwrap();
        let ids: Vec<&str> = earned.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["ub2", "ub1", "ub3"]);
        assert_eq!(earned[0].badge.as_ref().unwrap().name, "Regular");
        assert!(earned[2].badge.is_none());
    }

    #[tokio::test]
    async fn no_awards_is_empty() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        assert!(BadgeService::new(store).earned_by("nobody").await.unwrap().is_empty());
    }
}
