#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{RequestBuilder, StatusCode};
use serde_json::{json, Value};

use campus_hub_api::config::AppConfig;
use campus_hub_api::database::models::{collections, Event, Role, User};
use campus_hub_api::database::Repository;
use campus_hub_api::{app, AppState};

/// In-process server on an unused port, backed by the memory store.
pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        Self::start_with(AppConfig::development()).await
    }

    pub async fn start_with(config: AppConfig) -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let state = AppState::in_memory(config);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        let router = app(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>()).await;
        });

        let server = Self {
            base_url: format!("http://{}", addr),
            state,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn token(&self, sub: &str) -> String {
        self.state.verifier.issue_for(sub, None).expect("token")
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    pub fn get_as(&self, path: &str, sub: &str) -> RequestBuilder {
        self.get(path).bearer_auth(self.token(sub))
    }

    pub fn post_as(&self, path: &str, sub: &str, body: Value) -> RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(self.token(sub)).json(&body)
    }

    pub fn patch_as(&self, path: &str, sub: &str, body: Value) -> RequestBuilder {
        self.client.patch(self.url(path)).bearer_auth(self.token(sub)).json(&body)
    }

    pub fn delete_as(&self, path: &str, sub: &str) -> RequestBuilder {
        self.client.delete(self.url(path)).bearer_auth(self.token(sub))
    }

    pub fn users(&self) -> Repository<User> {
        Repository::new(collections::USERS, self.state.store.clone())
    }

    pub async fn seed_user(&self, id: &str, name: &str, role: Role, approved: bool) -> Result<User> {
        let mut user = User::new(id, format!("{}@example.edu", id), name);
        user.role = role;
        user.verification.admin_approved = approved;
        self.users().insert(id, &user).await?;
        Ok(user)
    }

    pub async fn seed_admin(&self, id: &str) -> Result<User> {
        self.seed_user(id, "Admin", Role::Admin, true).await
    }

    pub async fn seed_student(&self, id: &str, name: &str) -> Result<User> {
        self.seed_user(id, name, Role::Student, true).await
    }

    pub async fn seed_event(&self, id: &str, title: &str, start: &str, extra: Value) -> Result<Event> {
        let mut body = json!({
            "_id": id,
            "title": title,
            "description": format!("{} description", title),
            "startDate": start,
            "endDate": start,
        });
        if let (Value::Object(body), Value::Object(extra)) = (&mut body, extra) {
            body.extend(extra);
        }
        let mut event: Event = serde_json::from_value(body)?;
        event.normalize();
        Repository::<Event>::new(collections::EVENTS, self.state.store.clone())
            .insert(id, &event)
            .await?;
        Ok(event)
    }
}

pub async fn body(resp: reqwest::Response) -> Result<(StatusCode, Value)> {
    let status = resp.status();
    let value = resp.json::<Value>().await?;
    Ok((status, value))
}

pub fn ids(data: &Value) -> Vec<String> {
    data.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["_id"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
