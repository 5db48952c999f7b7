//! Event creation and attendance.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::models::{
    collections, timestamp, Attendance, CheckInMethod, Event, EventStatus, User, DEFAULT_CHECK_IN_POINTS,
};
use crate::database::{DocumentStore, Repository, StoreError};

pub const REQUIRED_FIELDS: &[&str] = &["title", "description", "startDate", "endDate"];

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Request body must be a JSON object")]
    NotAnObject,

    #[error("Title, description, start date, and end date are required")]
    MissingFields(Vec<&'static str>),

    #[error("Invalid {field}: '{value}'")]
    InvalidDate { field: &'static str, value: String },

    #[error("Invalid event data: {0}")]
    Invalid(#[from] serde_json::Error),

    #[error("Event not found")]
    NotFound,

    #[error("Event is full")]
    Full,

    #[error("Event is {0}; check-in is closed")]
    Closed(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Builds a new event from an admin's request body.
///
/// Client-supplied `status`, `attendees` and `currentAttendees` are replaced
/// with their initial values. Organizer fields default to the creating admin.
pub fn new_event_from_body(body: Value, organizer: &User, now: DateTime<Utc>) -> Result<Event, EventError> {
    let Value::Object(mut body) = body else {
        return Err(EventError::NotAnObject);
    };

    let missing: Vec<&'static str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| match body.get(*field) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(_) => false,
        })
        .collect();
    if !missing.is_empty() {
        return Err(EventError::MissingFields(missing));
    }

    for field in ["startDate", "endDate"] {
        let raw = body.get(field).and_then(Value::as_str).unwrap_or_default().to_string();
        let parsed = timestamp::parse(&raw).ok_or(EventError::InvalidDate { field, value: raw })?;
        body.insert(field.to_string(), Value::String(timestamp::format(&parsed)));
    }

    let stamp = Value::String(timestamp::format(&now));
    body.remove("_id");
    body.insert("status".to_string(), Value::String(EventStatus::Upcoming.as_str().to_string()));
    body.insert("attendees".to_string(), Value::Array(vec![]));
    body.insert("currentAttendees".to_string(), Value::from(0));
    body.insert("createdAt".to_string(), stamp.clone());
    body.insert("updatedAt".to_string(), stamp);
    default_string(&mut body, "organizerId", &organizer.id);
    default_string(&mut body, "organizerName", &organizer.display_name);

    let mut event: Event = serde_json::from_value(Value::Object(body))?;
    event.id = Uuid::new_v4().to_string();
    event.normalize();
    Ok(event)
}

fn default_string(body: &mut Map<String, Value>, key: &str, value: &str) {
    let blank = match body.get(key) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    };
    if blank {
        body.insert(key.to_string(), Value::String(value.to_string()));
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckInRequest {
    #[serde(default)]
    pub method: Option<CheckInMethod>,
    #[serde(default)]
    pub points: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct CheckInOutcome {
    pub event: Event,
    /// `None` when the user was already checked in.
    pub attendance: Option<Attendance>,
}

pub struct EventService {
    events: Repository<Event>,
    attendance: Repository<Attendance>,
    store: Arc<dyn DocumentStore>,
}

impl EventService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            events: Repository::new(collections::EVENTS, store.clone()),
            attendance: Repository::new(collections::ATTENDANCE, store.clone()),
            store,
        }
    }

    pub async fn get(&self, id: &str) -> Result<Option<Event>, StoreError> {
        Ok(self.events.select_one(id).await?.map(|mut event| {
            event.normalize();
            event
        }))
    }

    pub async fn create(&self, event: &Event) -> Result<(), StoreError> {
        self.events.insert(&event.id, event).await
    }

    /// Adds `user` to the event's attendee set.
    ///
    /// The set insert is atomic and idempotent. The capacity check before it
    /// reads a snapshot, so two concurrent check-ins into the last seat can
    /// both succeed. Attendance records are keyed by event and user, so each
    /// attendee has at most one. A repeat check-in writes the record if an
    /// earlier attempt joined the set but never recorded it.
    pub async fn check_in(
        &self,
        event_id: &str,
        user: &User,
        request: CheckInRequest,
        now: DateTime<Utc>,
    ) -> Result<CheckInOutcome, EventError> {
        let mut event = self.get(event_id).await?.ok_or(EventError::NotFound)?;

        if !event.status.accepts_check_in() {
            return Err(EventError::Closed(event.status.as_str()));
        }

        let added = if event.has_attendee(&user.id) {
            false
        } else {
            if event.is_full() {
                return Err(EventError::Full);
            }
            let added = self
                .store
                .add_to_set(collections::EVENTS, event_id, "attendees", Value::String(user.id.clone()))
                .await
                .map_err(|err| match err {
                    StoreError::NotFound { .. } => EventError::NotFound,
                    other => EventError::Store(other),
                })?;
            if !added {
                warn!("Concurrent check-in for user {} at event {}", user.id, event_id);
            }
            added
        };

        let record = Attendance {
            id: attendance_id(event_id, &user.id),
            event_id: event_id.to_string(),
            user_id: user.id.clone(),
            user_name: user.display_name.clone(),
            check_in_time: now,
            check_out_time: None,
            method: request.method.unwrap_or_default(),
            verified: true,
            points: request.points.unwrap_or(DEFAULT_CHECK_IN_POINTS),
            created_at: now,
        };
        let attendance = match self.attendance.insert(&record.id, &record).await {
            Ok(()) => Some(record),
            Err(StoreError::AlreadyExists { .. }) => None,
            Err(err) => return Err(err.into()),
        };

        if !added {
            if attendance.is_some() {
                warn!("Recorded missing attendance for user {} at event {}", user.id, event_id);
            }
            let event = self.get(event_id).await?.ok_or(EventError::NotFound)?;
            return Ok(CheckInOutcome { event, attendance });
        }

        let mut changes = Map::new();
        changes.insert("updatedAt".to_string(), Value::String(timestamp::format(&now)));
        self.events.update(event_id, &changes).await?;

        info!("User {} checked in to event {}", user.id, event_id);
        event.attendees.push(user.id.clone());
        event.updated_at = now;
        event.normalize();
        Ok(CheckInOutcome { event, attendance })
    }
}

/// One attendance record per attendee and event.
fn attendance_id(event_id: &str, user_id: &str) -> String {
    format!("{}:{}", event_id, user_id)
}
