use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Upcoming,
    Ongoing,
    Completed,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Upcoming => "upcoming",
            EventStatus::Ongoing => "ongoing",
            EventStatus::Completed => "completed",
            EventStatus::Cancelled => "cancelled",
        }
    }

    pub fn accepts_check_in(&self) -> bool {
        matches!(self, EventStatus::Upcoming | EventStatus::Ongoing)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    #[default]
    Session,
    Workshop,
    Meetup,
    Conference,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub title_lower: String,
    pub description: String,
    #[serde(rename = "type", default)]
    pub event_type: EventType,
    #[serde(with = "timestamp")]
    pub start_date: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attendees: Option<u64>,
    #[serde(default)]
    pub organizer_id: String,
    #[serde(default)]
    pub organizer_name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub attendees: Vec<String>,
    /// Always `attendees.len()` once normalized.
    #[serde(default)]
    pub current_attendees: u64,
    #[serde(with = "timestamp", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp", default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Refreshes derived fields after a read or before a write.
    pub fn normalize(&mut self) {
        self.title_lower = self.title.trim().to_lowercase();
        self.current_attendees = self.attendees.len() as u64;
    }

    pub fn is_full(&self) -> bool {
        match self.max_attendees {
            Some(max) => self.attendees.len() as u64 >= max,
            None => false,
        }
    }

    pub fn has_attendee(&self, user_id: &str) -> bool {
        self.attendees.iter().any(|id| id == user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Event {
        serde_json::from_value(json!({
            "_id": "e1",
            "title": "Rust Meetup",
            "description": "Ownership and borrowing",
            "type": "meetup",
            "startDate": "2024-03-01",
            "endDate": "2024-03-01T18:00:00Z",
            "maxAttendees": 2,
            "attendees": ["u1"],
            "currentAttendees": 40
        }))
        .unwrap()
    }

    #[test]
    fn counter_is_derived_from_attendees() {
        let mut event = sample();
        event.normalize();
        assert_eq!(event.current_attendees, 1);
        assert_eq!(event.title_lower, "rust meetup");
        assert_eq!(event.status, EventStatus::Upcoming);
    }

    #[test]
    fn capacity_and_status_checks() {
        let mut event = sample();
        assert!(!event.is_full());
        event.attendees.push("u2".to_string());
        assert!(event.is_full());
        assert!(event.has_attendee("u2"));
        assert!(!EventStatus::Cancelled.accepts_check_in());
        assert!(EventStatus::Ongoing.accepts_check_in());
    }

    #[test]
    fn dates_serialize_fixed_width() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["startDate"], json!("2024-03-01T00:00:00.000Z"));
        assert_eq!(value["type"], json!("meetup"));
    }
}
