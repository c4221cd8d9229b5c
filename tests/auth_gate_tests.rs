//! Integration tests for the authorization gates over the full router:
//! guard outcomes, lazy provisioning and the surface-specific error
//! rendering.

mod common;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use common::{seed_user, spawn_app, with_identity};
use serde_json::Value;
use stoa::prelude::EntityStore;

#[tokio::test]
async fn anonymous_request_to_protected_operation_is_401() {
    let app = spawn_app().await;
    let response = app.server.get("/_s/profile/").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let body: Value = response.json();
    assert_eq!(body["status"], "error");
    assert_eq!(body["error_code"], 401);
    assert_eq!(body["error_name"], "unauthorized");
}

#[tokio::test]
async fn non_admin_listing_users_is_403() {
    let app = spawn_app().await;
    seed_user(&app.users, "Bob", "bob", "bob-sub", false, 10).await;

    let response = with_identity(
        app.server.get("/_s/user/"),
        "bob-sub",
        "Bob",
        "bob@example.com",
    )
    .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let body: Value = response.json();
    assert_eq!(body["error_name"], "forbidden");
}

#[tokio::test]
async fn admin_listing_users_succeeds() {
    let app = spawn_app().await;
    seed_user(&app.users, "Ada", "ada", "ada-sub", true, 10).await;

    let response = with_identity(
        app.server.get("/_s/user/"),
        "ada-sub",
        "Ada",
        "ada@example.com",
    )
    .await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn malformed_identity_is_401() {
    let app = spawn_app().await;
    // Provider present, subject missing
    let response = app
        .server
        .get("/_s/profile/")
        .add_header(
            HeaderName::from_static("x-auth-provider"),
            HeaderValue::from_static("federated"),
        )
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    // Unknown provider
    let response = app
        .server
        .get("/_s/profile/")
        .add_header(
            HeaderName::from_static("x-auth-provider"),
            HeaderValue::from_static("myspace"),
        )
        .add_header(
            HeaderName::from_static("x-auth-subject"),
            HeaderValue::from_static("123"),
        )
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn inactive_account_is_denied() {
    let app = spawn_app().await;
    let mut carol = seed_user(&app.users, "Carol", "carol", "carol-sub", false, 10).await;
    carol.active = false;
    app.users.put(carol).await.unwrap();

    let response = with_identity(
        app.server.get("/_s/profile/"),
        "carol-sub",
        "Carol",
        "carol@example.com",
    )
    .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn first_sign_in_provisions_a_user() {
    let app = spawn_app().await;
    assert!(app.users.is_empty());

    let response = with_identity(
        app.server.get("/_s/profile/"),
        "new-sub",
        "Dana Rivers",
        "dana@example.com",
    )
    .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(app.users.len(), 1);

    let body: Value = response.json();
    assert_eq!(body["username"], "dana");
    assert_eq!(body["name"], "Dana Rivers");
}

#[tokio::test]
async fn second_sign_in_reuses_the_same_account() {
    let app = spawn_app().await;

    let first = with_identity(
        app.server.get("/_s/profile/"),
        "new-sub",
        "Dana Rivers",
        "dana@example.com",
    )
    .await;
    let second = with_identity(
        app.server.get("/_s/profile/"),
        "new-sub",
        "Dana Rivers",
        "dana@example.com",
    )
    .await;

    let first: Value = first.json();
    let second: Value = second.json();
    assert_eq!(first["id"], second["id"]);
    assert_eq!(app.users.len(), 1);
}

#[tokio::test]
async fn provisioning_suffixes_taken_usernames() {
    let app = spawn_app().await;
    seed_user(&app.users, "Dana Prior", "dana", "other-sub", false, 10).await;

    let response = with_identity(
        app.server.get("/_s/profile/"),
        "new-sub",
        "Dana Rivers",
        "dana@example.com",
    )
    .await;
    let body: Value = response.json();
    assert_eq!(body["username"], "dana-2");
}

#[tokio::test]
async fn denial_renders_html_on_the_human_surface() {
    let app = spawn_app().await;
    let response = app.server.get("/profile/").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    assert!(content_type.starts_with("text/html"), "got {content_type}");
    assert!(response.text().contains("sign-in required"));
}

#[tokio::test]
async fn denial_happens_before_any_write() {
    let app = spawn_app().await;
    // A malformed identity on a mutating endpoint must not provision anyone
    let response = app
        .server
        .post("/_s/profile/")
        .add_header(
            HeaderName::from_static("x-auth-provider"),
            HeaderValue::from_static("federated"),
        )
        .json(&serde_json::json!({ "name": "Mallory" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert!(app.users.is_empty());
}
