//! Write rules for user records.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::database::models::{timestamp, Role, User, UserProfile, Verification};

/// Never writable through an update.
pub const IMMUTABLE_FIELDS: &[&str] = &["_id", "uid", "createdAt"];

/// Writable by admins only.
pub const ADMIN_ONLY_FIELDS: &[&str] = &["role", "verification", "stats"];

/// Required on admin-created users.
pub const REQUIRED_FIELDS: &[&str] = &["uid", "email", "displayName"];

#[derive(Debug, Error)]
pub enum UserWriteError {
    #[error("Request body must be a JSON object")]
    NotAnObject,

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Only admins can change '{0}'")]
    AdminOnlyField(String),

    #[error("Invalid user data: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Fields among `required` that are absent, null or blank strings.
pub fn missing_fields(body: &Map<String, Value>, required: &[&'static str]) -> Vec<&'static str> {
    required
        .iter()
        .copied()
        .filter(|field| match body.get(*field) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(_) => false,
        })
        .collect()
}

/// Builds a user from an admin's create request. The `uid` becomes the
/// document id; timestamps are stamped with `now`.
pub fn new_user_from_body(body: Value, now: DateTime<Utc>) -> Result<User, UserWriteError> {
    let Value::Object(mut body) = body else {
        return Err(UserWriteError::NotAnObject);
    };
    let missing = missing_fields(&body, REQUIRED_FIELDS);
    if !missing.is_empty() {
        return Err(UserWriteError::MissingFields(missing));
    }

    let stamp = Value::String(timestamp::format(&now));
    body.insert("createdAt".to_string(), stamp.clone());
    body.insert("updatedAt".to_string(), stamp);
    if let Some(uid) = body.get("uid").cloned() {
        body.insert("_id".to_string(), uid);
    }

    let mut user: User = serde_json::from_value(Value::Object(body))?;
    user.normalize();
    Ok(user)
}

/// Merges a partial update into `current`.
///
/// Immutable fields are dropped silently. Non-admins get an error when they
/// try to change an admin-only field; resubmitting the current value is
/// accepted. Top-level keys replace the stored value wholesale.
pub fn apply_update(
    current: &User,
    changes: Value,
    actor_is_admin: bool,
    now: DateTime<Utc>,
) -> Result<User, UserWriteError> {
    let Value::Object(mut changes) = changes else {
        return Err(UserWriteError::NotAnObject);
    };
    for field in IMMUTABLE_FIELDS {
        changes.remove(*field);
    }

    let Value::Object(mut merged) = serde_json::to_value(current)? else {
        return Err(UserWriteError::NotAnObject);
    };

    if !actor_is_admin {
        for field in ADMIN_ONLY_FIELDS {
            if let Some(value) = changes.get(*field) {
                if merged.get(*field) != Some(value) {
                    return Err(UserWriteError::AdminOnlyField(field.to_string()));
                }
            }
        }
    }

    for (key, value) in changes {
        merged.insert(key, value);
    }
    merged.insert("updatedAt".to_string(), Value::String(timestamp::format(&now)));

    let mut user: User = serde_json::from_value(Value::Object(merged))?;
    user.normalize();
    Ok(user)
}

/// Comma-separated text or a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SkillsInput {
    List(Vec<String>),
    Text(String),
}

impl SkillsInput {
    pub fn into_vec(self) -> Vec<String> {
        let items = match self {
            SkillsInput::List(items) => items,
            SkillsInput::Text(text) => text.split(',').map(str::to_string).collect(),
        };
        items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Self-registration body. Identity comes from the verified token.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub college: Option<String>,
    pub skills: Option<SkillsInput>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
}

/// Student profile for a newly registered identity, pending approval.
pub fn registered_student(
    uid: &str,
    token_email: Option<&str>,
    token_name: Option<&str>,
    request: RegisterRequest,
) -> Result<User, UserWriteError> {
    let email = token_email.map(str::to_string).or(request.email).unwrap_or_default();
    let display_name = request
        .display_name
        .or_else(|| token_name.map(str::to_string))
        .unwrap_or_default();

    let mut missing = Vec::new();
    if email.trim().is_empty() {
        missing.push("email");
    }
    if display_name.trim().is_empty() {
        missing.push("displayName");
    }
    if !missing.is_empty() {
        return Err(UserWriteError::MissingFields(missing));
    }

    let phone_number = request.phone_number.filter(|p| !p.trim().is_empty());
    let mut user = User::new(uid, email, display_name);
    user.role = Role::Student;
    user.profile = UserProfile {
        college: request.college.unwrap_or_default(),
        skills: request.skills.map(SkillsInput::into_vec).unwrap_or_default(),
        linkedin_url: request.linkedin_url,
        github_url: request.github_url,
        ..UserProfile::default()
    };
    user.verification = Verification {
        email_verified: false,
        phone_verified: phone_number.is_some(),
        admin_approved: false,
    };
    user.phone_number = phone_number;
    user.normalize();
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn student() -> User {
        User::new("u1", "ada@example.edu", "Ada")
    }

    #[test]
    fn update_strips_immutable_fields() {
        let current = student();
        let updated = apply_update(
            &current,
            json!({ "_id": "evil", "uid": "evil", "createdAt": "1999-01-01T00:00:00.000Z", "displayName": "Ada L." }),
            false,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(updated.id, "u1");
        assert_eq!(updated.uid, "u1");
        assert_eq!(timestamp::format(&updated.created_at), timestamp::format(&current.created_at));
        assert_eq!(updated.display_name_lower, "ada l.");
    }

    #[test]
    fn students_cannot_touch_admin_fields() {
        let current = student();
        let err = apply_update(&current, json!({ "role": "admin" }), false, Utc::now()).unwrap_err();
        assert!(matches!(err, UserWriteError::AdminOnlyField(field) if field == "role"));

        let err = apply_update(
            &current,
            json!({ "verification": { "adminApproved": true } }),
            false,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, UserWriteError::AdminOnlyField(_)));

        // Unchanged values pass through
        assert!(apply_update(&current, json!({ "role": "student" }), false, Utc::now()).is_ok());
    }

    #[test]
    fn admins_can_change_anything_mutable() {
        let updated = apply_update(&student(), json!({ "stats": { "points": 40 } }), true, Utc::now()).unwrap();
        assert_eq!(updated.stats.points, 40);
    }

    #[test]
    fn create_requires_identity_fields() {
        let err = new_user_from_body(json!({ "uid": "u9", "displayName": " " }), Utc::now()).unwrap_err();
        match err {
            UserWriteError::MissingFields(fields) => assert_eq!(fields, vec!["email", "displayName"]),
            other => panic!("unexpected {:?}", other),
        }

        let user = new_user_from_body(
            json!({ "uid": "u9", "email": "x@example.edu", "displayName": "Xavier", "role": "admin" }),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(user.id, "u9");
        assert!(user.is_admin());
    }

    #[test]
    fn registration_builds_pending_student() {
        let request = RegisterRequest {
            display_name: Some("Grace".to_string()),
            skills: Some(SkillsInput::Text("rust, go ,".to_string())),
            phone_number: Some("+15550100".to_string()),
            ..RegisterRequest::default()
        };
        let user = registered_student("g1", Some("grace@example.edu"), None, request).unwrap();
        assert!(user.is_pending_approval());
        assert_eq!(user.profile.skills, vec!["rust", "go"]);
        assert!(user.verification.phone_verified);
        assert_eq!(user.email, "grace@example.edu");

        let err = registered_student("g2", None, None, RegisterRequest::default()).unwrap_err();
        assert!(matches!(err, UserWriteError::MissingFields(_)));
    }
}
