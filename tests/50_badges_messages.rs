mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use campus_hub_api::fixtures::Fixture;
use common::{body, ids, TestServer};

const BADGES: &str = r#"
badges:
  - _id: first-steps
    name: First Steps
    category: attendance
    points: 5
  - _id: helper
    name: Helper
    category: volunteering
    points: 20
userBadges:
  - _id: early
    userId: sam
    badgeId: first-steps
    earnedAt: 2024-01-10T09:00:00.000Z
    points: 5
  - _id: later
    userId: sam
    badgeId: helper
    earnedAt: 2024-02-20T09:00:00.000Z
    points: 20
  - _id: someone-else
    userId: kim
    badgeId: helper
    earnedAt: 2024-03-01T09:00:00.000Z
"#;

const MESSAGES: &str = r#"{
  "messages": [
    { "_id": "m1", "senderId": "sam", "recipientId": "kim", "content": "hi", "createdAt": "2024-01-01T10:00:00.000Z" },
    { "_id": "m2", "senderId": "kim", "recipientId": "sam", "content": "hello", "createdAt": "2024-01-01T10:05:00.000Z" },
    { "_id": "m3", "senderId": "kim", "receiverId": "sam", "content": "legacy", "createdAt": "2024-01-01T10:10:00.000Z" },
    { "_id": "m4", "senderId": "kim", "recipientId": "lee", "content": "not ours", "createdAt": "2024-01-01T10:15:00.000Z" }
  ]
}"#;

#[tokio::test]
async fn badges_are_listed_most_recent_first() -> Result<()> {
    let server = TestServer::start().await?;
    server.seed_student("sam", "Sam").await?;
    Fixture::from_yaml(BADGES)?.seed(&server.state.store).await?;

    let (status, listed) = body(server.get_as("/api/users/sam/badges", "sam").send().await?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&listed["data"]), vec!["later", "early"]);
    assert_eq!(listed["data"][0]["badge"]["name"], json!("Helper"));
    assert_eq!(listed["data"][1]["badge"]["name"], json!("First Steps"));

    let (_, empty) = body(server.get_as("/api/users/nobody/badges", "sam").send().await?).await?;
    assert_eq!(empty["data"], json!([]));
    Ok(())
}

#[tokio::test]
async fn messages_merge_both_directions() -> Result<()> {
    let server = TestServer::start().await?;
    server.seed_student("sam", "Sam").await?;
    Fixture::from_json(MESSAGES)?.seed(&server.state.store).await?;

    let (status, listed) = body(server.get_as("/api/users/sam/messages", "sam").send().await?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&listed["data"]), vec!["m3", "m2", "m1"]);

    let (_, capped) = body(server.get_as("/api/users/sam/messages?limit=1", "sam").send().await?).await?;
    assert_eq!(ids(&capped["data"]), vec!["m3"]);

    let resp = server.get_as("/api/users/sam/messages?limit=0", "sam").send().await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn messages_are_private_to_owner_and_admins() -> Result<()> {
    let server = TestServer::start().await?;
    server.seed_student("sam", "Sam").await?;
    server.seed_student("kim", "Kim").await?;
    server.seed_admin("root").await?;
    Fixture::from_json(MESSAGES)?.seed(&server.state.store).await?;

    let (status, denied) = body(server.get_as("/api/users/sam/messages", "kim").send().await?).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(denied["success"], json!(false));

    let (status, listed) = body(server.get_as("/api/users/sam/messages", "root").send().await?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["data"].as_array().map(Vec::len), Some(3));
    Ok(())
}
