use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub college: String,
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfolio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Verification {
    pub email_verified: bool,
    pub phone_verified: bool,
    pub admin_approved: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserStats {
    pub points: u64,
    pub sessions_attended: u64,
    pub badges_earned: u64,
    pub volunteering_hours: u64,
}

/// Community member. The document id is the identity provider's subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub uid: String,
    pub email: String,
    pub display_name: String,
    #[serde(default)]
    pub display_name_lower: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub profile: UserProfile,
    #[serde(default)]
    pub verification: Verification,
    #[serde(default)]
    pub stats: UserStats,
    #[serde(with = "timestamp", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp", default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(uid: impl Into<String>, email: impl Into<String>, display_name: impl Into<String>) -> Self {
        let uid = uid.into();
        let now = Utc::now();
        let mut user = Self {
            id: uid.clone(),
            uid,
            email: email.into(),
            display_name: display_name.into(),
            display_name_lower: String::new(),
            phone_number: None,
            role: Role::Student,
            profile: UserProfile::default(),
            verification: Verification::default(),
            stats: UserStats::default(),
            created_at: now,
            updated_at: now,
        };
        user.normalize();
        user
    }

    /// Refreshes derived fields. Call before every write.
    pub fn normalize(&mut self) {
        self.display_name_lower = self.display_name.trim().to_lowercase();
        if self.uid.is_empty() {
            self.uid = self.id.clone();
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Students wait for admin approval; admins never do.
    pub fn is_pending_approval(&self) -> bool {
        self.role == Role::Student && !self.verification.admin_approved
    }
}
