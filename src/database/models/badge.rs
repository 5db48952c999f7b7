use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::timestamp;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeCategory {
    #[default]
    Attendance,
    Volunteering,
    Leadership,
    Special,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub category: BadgeCategory,
    #[serde(default)]
    pub points: u64,
    #[serde(default)]
    pub requirements: Value,
    #[serde(with = "timestamp", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// Award of a badge to a user. Written once, joined against `Badge` on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBadge {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub user_id: String,
    pub badge_id: String,
    #[serde(with = "timestamp::option", default)]
    pub earned_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub points: u64,
}
