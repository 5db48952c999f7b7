use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Text,
    Image,
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub sender_id: String,
    #[serde(default)]
    pub sender_name: String,
    #[serde(alias = "receiverId")]
    pub recipient_id: String,
    pub content: String,
    #[serde(rename = "type", default)]
    pub message_type: MessageType,
    #[serde(default)]
    pub read: bool,
    #[serde(with = "timestamp::option", default)]
    pub created_at: Option<DateTime<Utc>>,
}
