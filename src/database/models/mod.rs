pub mod attendance;
pub mod badge;
pub mod event;
pub mod message;
pub mod user;

pub use attendance::{Attendance, CheckInMethod, DEFAULT_CHECK_IN_POINTS};
pub use badge::{Badge, BadgeCategory, UserBadge};
pub use event::{Event, EventStatus, EventType};
pub use message::{Message, MessageType};
pub use user::{Role, User, UserProfile, UserStats, Verification};

/// Collection names.
pub mod collections {
    pub const USERS: &str = "users";
    pub const EVENTS: &str = "events";
    pub const ATTENDANCE: &str = "attendance";
    pub const BADGES: &str = "badges";
    pub const USER_BADGES: &str = "user_badges";
    pub const MESSAGES: &str = "messages";
}

/// Fixed-width RFC 3339 timestamps (`2024-01-01T00:00:00.000Z`).
///
/// A constant width keeps lexicographic order equal to chronological order,
/// which both store backends rely on for range and sort operations.
pub mod timestamp {
    use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Accepts RFC 3339 or a bare `YYYY-MM-DD` date (midnight UTC).
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    pub fn parse_millis(raw: &str) -> Option<i64> {
        parse(raw).map(|ts| ts.timestamp_millis())
    }

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(ts: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error> {
            match ts {
                Some(ts) => serializer.serialize_str(&super::format(ts)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw: Option<String> = Option::deserialize(deserializer)?;
            raw.map(|raw| super::parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw))))
                .transpose()
        }
    }

}
