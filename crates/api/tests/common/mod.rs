//! Common test utilities for integration tests.
//!
//! The router is driven in-process against in-memory stores and a recording
//! mail transport, so no database or mail server is needed.

// Not every helper is used by every test binary.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request},
    Router,
};
use domain::services::{InMemoryDirectory, MailMessage, RecordingMailSender};
use invite_api::{
    app::{create_router, AppState, Stores},
    config::Config,
};
use std::sync::Arc;

pub const ADMIN: &str = "admin";
pub const ADMIN_DISPLAY_NAME: &str = "The Admin";
pub const MEMBER: &str = "carol";

/// Test configuration with an HS256 secret for requester tokens.
pub fn test_config() -> Config {
    Config::load_for_test(&[("database.url", "postgres://unused/test")])
        .expect("Failed to load test config")
}

/// A router plus handles on its stores for assertions.
pub struct TestApp {
    pub router: Router,
    pub directory: Arc<InMemoryDirectory>,
    pub mailer: Arc<RecordingMailSender>,
    pub config: Config,
}

impl TestApp {
    /// Directory with an admin, a plain member and a `users` group.
    pub fn new() -> Self {
        Self::with_parts(seeded_directory(), RecordingMailSender::new())
    }

    pub fn with_parts(directory: InMemoryDirectory, mailer: RecordingMailSender) -> Self {
        let config = test_config();
        let directory = Arc::new(directory);
        let mailer = Arc::new(mailer);

        let state = AppState::new(
            &config,
            Stores {
                users: directory.clone(),
                groups: directory.clone(),
                preferences: directory.clone(),
            },
            mailer.clone(),
            None,
        )
        .expect("Failed to build app state");

        Self {
            router: create_router(state, &config.server),
            directory,
            mailer,
            config,
        }
    }

    /// A valid bearer token for `username`.
    pub fn token_for(&self, username: &str) -> String {
        self.config
            .auth
            .jwt_config()
            .expect("jwt config")
            .issue(username, 300)
            .expect("Failed to issue test token")
    }

    pub fn sent(&self) -> Vec<MailMessage> {
        self.mailer.sent()
    }

    /// Plaintext token from the most recent invitation mail.
    pub fn last_mailed_token(&self) -> String {
        let sent = self.sent();
        let body = &sent.last().expect("no mail sent").body;
        let start = body.find("token=").expect("join link in body") + "token=".len();
        body[start..]
            .chars()
            .take_while(|c| c.is_ascii_hexdigit())
            .collect()
    }
}

pub fn seeded_directory() -> InMemoryDirectory {
    InMemoryDirectory::new()
        .with_user(ADMIN, "admin-pw")
        .with_display_name(ADMIN, ADMIN_DISPLAY_NAME)
        .with_user(MEMBER, "carol-pw")
        .with_group("admin")
        .with_member("admin", ADMIN)
        .with_group("users")
}

pub fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub fn json_request_with_auth(
    method: Method,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn parse_response_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
}
