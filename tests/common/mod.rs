//! Shared fixtures for the integration suites
//!
//! Builds a TestServer over the full router with in-memory stores, a
//! recording notifier and the header identity resolver, then exposes
//! helpers for seeding users and attaching identity headers.
#![allow(dead_code)]

use axum::http::{HeaderName, HeaderValue};
use axum_test::{TestRequest, TestServer};
use chrono::Duration;
use std::sync::Arc;
use stoa::prelude::*;

pub struct TestApp {
    pub server: TestServer,
    pub users: Arc<InMemoryStore<User>>,
    pub settings: Arc<InMemoryStore<AppSettings>>,
    pub notifier: RecordingNotifier,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(AppConfig::default()).await
}

pub async fn spawn_app_with(config: AppConfig) -> TestApp {
    let users = Arc::new(InMemoryStore::new());
    let settings = Arc::new(InMemoryStore::new());
    let notifier = RecordingNotifier::new();
    let state = AppState::new(
        users.clone() as Arc<dyn EntityStore<User>>,
        settings.clone() as Arc<dyn EntityStore<AppSettings>>,
        Arc::new(HeaderIdentityResolver),
        Arc::new(notifier.clone()),
        &config,
    );
    let server = TestServer::new(build_router(state));
    TestApp {
        server,
        users,
        settings,
        notifier,
    }
}

/// Seed one user directly into the store. `age_minutes` pushes `created`
/// into the past so listing order is deterministic.
pub async fn seed_user(
    users: &InMemoryStore<User>,
    name: &str,
    username: &str,
    subject: &str,
    admin: bool,
    age_minutes: i64,
) -> User {
    let mut user = User::new(name, username);
    user.federated_id = subject.to_string();
    user.email = format!("{username}@example.com");
    user.admin = admin;
    user.created = Utc::now() - Duration::minutes(age_minutes);
    users.put(user).await.expect("failed to seed user")
}

/// Attach a federated identity to a request
pub fn with_identity(request: TestRequest, subject: &str, name: &str, email: &str) -> TestRequest {
    request
        .add_header(
            HeaderName::from_static("x-auth-provider"),
            HeaderValue::from_static("federated"),
        )
        .add_header(
            HeaderName::from_static("x-auth-subject"),
            HeaderValue::from_str(subject).expect("bad subject"),
        )
        .add_header(
            HeaderName::from_static("x-auth-name"),
            HeaderValue::from_str(name).expect("bad name"),
        )
        .add_header(
            HeaderName::from_static("x-auth-email"),
            HeaderValue::from_str(email).expect("bad email"),
        )
}
