use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;

pub const DEFAULT_CHECK_IN_POINTS: u64 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckInMethod {
    Qr,
    Manual,
    #[default]
    Digital,
}

/// One check-in of a user at an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub event_id: String,
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(with = "timestamp")]
    pub check_in_time: DateTime<Utc>,
    #[serde(with = "timestamp::option", default, skip_serializing_if = "Option::is_none")]
    pub check_out_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub method: CheckInMethod,
    #[serde(default)]
    pub verified: bool,
    #[serde(default = "default_points")]
    pub points: u64,
    #[serde(with = "timestamp", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn default_points() -> u64 {
    DEFAULT_CHECK_IN_POINTS
}
