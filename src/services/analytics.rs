//! Dashboard aggregates. Recomputed on every request, never stored.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

use crate::database::models::{collections, timestamp, Attendance, Event, EventStatus, Role, User};
use crate::database::{DocumentStore, Repository, StoreError};

pub const TOP_PERFORMERS: usize = 10;
pub const ACTIVE_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub total_users: u64,
    pub active_users: u64,
    pub total_events: u64,
    pub upcoming_events: u64,
    pub total_attendance: u64,
    pub average_attendance: u64,
    pub top_performers: Vec<LeaderboardEntry>,
    pub engagement_metrics: EngagementMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub user_name: String,
    pub points: u64,
    pub rank: usize,
    pub stats: LeaderboardStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardStats {
    pub sessions_attended: u64,
    pub badges_earned: u64,
    pub volunteering_hours: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementMetrics {
    pub average_points: u64,
    pub average_sessions_attended: u64,
    pub average_volunteering_hours: f64,
}

/// Records the aggregates are folded over.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsSnapshot {
    pub total_users: u64,
    pub total_attendance: u64,
    pub users: Vec<User>,
    pub events: Vec<Event>,
    pub recent_attendance: Vec<Attendance>,
}

/// Distinct attendees among `attendance`.
pub fn active_users(attendance: &[Attendance]) -> u64 {
    attendance.iter().map(|a| a.user_id.as_str()).collect::<HashSet<_>>().len() as u64
}

pub fn upcoming_events(events: &[Event]) -> u64 {
    events.iter().filter(|e| e.status == EventStatus::Upcoming).count() as u64
}

/// Mean attendee count per event, rounded; 0 without events.
pub fn average_attendance(events: &[Event]) -> u64 {
    if events.is_empty() {
        return 0;
    }
    let attendees: usize = events.iter().map(|e| e.attendees.len()).sum();
    (attendees as f64 / events.len() as f64).round() as u64
}

/// Top `n` students by points, descending. Ties keep input order.
pub fn top_performers(users: &[User], n: usize) -> Vec<LeaderboardEntry> {
    let mut students: Vec<&User> = users.iter().filter(|u| u.role == Role::Student).collect();
    students.sort_by(|a, b| b.stats.points.cmp(&a.stats.points));
    students
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(index, user)| LeaderboardEntry {
            user_id: user.id.clone(),
            user_name: user.display_name.clone(),
            points: user.stats.points,
            rank: index + 1,
            stats: LeaderboardStats {
                sessions_attended: user.stats.sessions_attended,
                badges_earned: user.stats.badges_earned,
                volunteering_hours: user.stats.volunteering_hours,
            },
        })
        .collect()
}

/// Per-student averages. All zero when there are no students.
pub fn engagement_metrics(users: &[User]) -> EngagementMetrics {
    let students: Vec<&User> = users.iter().filter(|u| u.role == Role::Student).collect();
    if students.is_empty() {
        return EngagementMetrics::default();
    }
    let count = students.len() as f64;
    let points: u64 = students.iter().map(|u| u.stats.points).sum();
    let sessions: u64 = students.iter().map(|u| u.stats.sessions_attended).sum();
    let hours: u64 = students.iter().map(|u| u.stats.volunteering_hours).sum();

    EngagementMetrics {
        average_points: (points as f64 / count).round() as u64,
        average_sessions_attended: (sessions as f64 / count).round() as u64,
        average_volunteering_hours: (hours as f64 / count * 10.0).round() / 10.0,
    }
}

impl Analytics {
    pub fn from_snapshot(snapshot: &AnalyticsSnapshot) -> Self {
        Self {
            total_users: snapshot.total_users,
            active_users: active_users(&snapshot.recent_attendance),
            total_events: snapshot.events.len() as u64,
            upcoming_events: upcoming_events(&snapshot.events),
            total_attendance: snapshot.total_attendance,
            average_attendance: average_attendance(&snapshot.events),
            top_performers: top_performers(&snapshot.users, TOP_PERFORMERS),
            engagement_metrics: engagement_metrics(&snapshot.users),
        }
    }
}

pub struct AnalyticsService {
    users: Repository<User>,
    events: Repository<Event>,
    attendance: Repository<Attendance>,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            users: Repository::new(collections::USERS, store.clone()),
            events: Repository::new(collections::EVENTS, store.clone()),
            attendance: Repository::new(collections::ATTENDANCE, store),
        }
    }

    pub async fn snapshot(&self, now: DateTime<Utc>) -> Result<AnalyticsSnapshot, StoreError> {
        let all_users = self.users.filter()?;
        let all_events = self.events.filter()?;
        let all_attendance = self.attendance.filter()?;

        let since = now - Duration::days(ACTIVE_WINDOW_DAYS);
        let mut recent = self.attendance.filter()?;
        recent.where_gte("checkInTime", Value::String(timestamp::format(&since)))?;

        Ok(AnalyticsSnapshot {
            total_users: self.users.count(&all_users).await?,
            total_attendance: self.attendance.count(&all_attendance).await?,
            users: self.users.select_any(&all_users).await?,
            events: self.events.select_any(&all_events).await?,
            recent_attendance: self.attendance.select_any(&recent).await?,
        })
    }

    pub async fn compute(&self, now: DateTime<Utc>) -> Result<Analytics, StoreError> {
        let snapshot = self.snapshot(now).await?;
        Ok(Analytics::from_snapshot(&snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::CheckInMethod;
    use crate::database::MemoryStore;

    fn student(id: &str, points: u64, sessions: u64, hours: u64) -> User {
        let mut user = User::new(id, format!("{}@example.edu", id), id.to_uppercase());
        user.stats.points = points;
        user.stats.sessions_attended = sessions;
        user.stats.volunteering_hours = hours;
        user
    }

    fn attendance(user_id: &str, check_in: DateTime<Utc>) -> Attendance {
        Attendance {
            id: String::new(),
            event_id: "e1".to_string(),
            user_id: user_id.to_string(),
            user_name: String::new(),
            check_in_time: check_in,
            check_out_time: None,
            method: CheckInMethod::Digital,
            verified: true,
            points: 10,
            created_at: check_in,
        }
    }

    #[test]
    fn no_students_means_zero_engagement() {
        let mut admin = student("root", 900, 9, 9);
        admin.role = Role::Admin;
        assert_eq!(engagement_metrics(&[]), EngagementMetrics::default());
        assert_eq!(engagement_metrics(&[admin.clone()]), EngagementMetrics::default());
        assert!(top_performers(&[admin], 10).is_empty());
    }

    #[test]
    fn engagement_rounds_half_away_from_zero() {
        let users = vec![student("a", 1, 1, 1), student("b", 2, 2, 0)];
        let metrics = engagement_metrics(&users);
        assert_eq!(metrics.average_points, 2);
        assert_eq!(metrics.average_sessions_attended, 2);
        assert_eq!(metrics.average_volunteering_hours, 0.5);

        let thirds = vec![student("a", 0, 0, 1), student("b", 0, 0, 0), student("c", 0, 0, 0)];
        assert_eq!(engagement_metrics(&thirds).average_volunteering_hours, 0.3);
    }

    #[test]
    fn top_performers_are_ranked_and_stable() {
        let mut users: Vec<User> = (0..12).map(|i| student(&format!("s{:02}", i), (i % 4) * 10, 0, 0)).collect();
        let mut admin = student("admin", 1000, 0, 0);
        admin.role = Role::Admin;
        users.insert(3, admin);

        let top = top_performers(&users, TOP_PERFORMERS);
        assert_eq!(top.len(), 10);
        assert_eq!(top.iter().map(|e| e.rank).collect::<Vec<_>>(), (1..=10).collect::<Vec<_>>());
        assert!(top.windows(2).all(|w| w[0].points >= w[1].points));
        // s03, s07, s11 tie at 30 and keep input order
        assert_eq!(top[0].user_id, "s03");
        assert_eq!(top[1].user_id, "s07");
        assert_eq!(top[2].user_id, "s11");
        assert!(top.iter().all(|e| e.user_id != "admin"));
    }

    #[test]
    fn active_users_are_distinct() {
        let now = Utc::now();
        let records = vec![attendance("a", now), attendance("a", now), attendance("b", now)];
        assert_eq!(active_users(&records), 2);
    }

    #[tokio::test]
    async fn computes_from_store() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let users = Repository::<User>::new(collections::USERS, store.clone());
        let attendance_repo = Repository::<Attendance>::new(collections::ATTENDANCE, store.clone());

        users.insert("a", &student("a", 50, 5, 2)).await.unwrap();
        users.insert("b", &student("b", 70, 3, 1)).await.unwrap();

        let now = Utc::now();
        attendance_repo.insert("r1", &attendance("a", now - Duration::days(2))).await.unwrap();
        attendance_repo.insert("r2", &attendance("b", now - Duration::days(45))).await.unwrap();

        let analytics = AnalyticsService::new(store).compute(now).await.unwrap();
        assert_eq!(analytics.total_users, 2);
        assert_eq!(analytics.total_attendance, 2);
        assert_eq!(analytics.active_users, 1);
        assert_eq!(analytics.total_events, 0);
        assert_eq!(analytics.average_attendance, 0);
        assert_eq!(analytics.top_performers[0].user_id, "b");
        assert_eq!(analytics.engagement_metrics.average_points, 60);
    }
}
