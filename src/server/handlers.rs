//! HTTP handlers for the dual exposure surfaces
//!
//! Every handler runs the same pipeline regardless of surface: gate first,
//! then query or load, then schema-restricted serialization. Only the last
//! step (JSON envelope versus page) looks at the path prefix.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, Uri};
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::core::auth::{AuthGate, IdentityResolver};
use crate::core::error::ApiError;
use crate::core::field::valid_email;
use crate::core::query::{ListQuery, PageLimits, retrieve_entities};
use crate::core::serialize::{serialize_entity, serialize_page};
use crate::core::store::EntityStore;
use crate::entities::settings::{ANNOUNCEMENT_KINDS, AppSettings, SettingsService};
use crate::entities::user::User;
use crate::server::notify::{Notifier, OutboundMessage};
use crate::server::surface::{Surface, SurfaceError, html_escape, more_url, render_page};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn EntityStore<User>>,
    pub settings: SettingsService,
    pub gate: AuthGate,
    pub notifier: Arc<dyn Notifier>,
    pub limits: PageLimits,
    pub default_order: String,
}

impl AppState {
    pub fn new(
        users: Arc<dyn EntityStore<User>>,
        settings_store: Arc<dyn EntityStore<AppSettings>>,
        resolver: Arc<dyn IdentityResolver>,
        notifier: Arc<dyn Notifier>,
        config: &AppConfig,
    ) -> Self {
        Self {
            gate: AuthGate::new(users.clone(), resolver),
            users,
            settings: SettingsService::new(settings_store),
            notifier,
            limits: config.pages.clone(),
            default_order: config.default_order.clone(),
        }
    }
}

/// GET /: the landing page (human surface only)
pub async fn welcome(State(state): State<AppState>) -> Result<Html<String>, SurfaceError> {
    let settings = state
        .settings
        .get()
        .await
        .map_err(|e| SurfaceError::new(Surface::Html, e))?;
    let mut body = format!("<h1>{}</h1>", html_escape(&settings.brand_name));
    if !settings.announcement_html.is_empty() {
        body.push_str(&format!(
            "<div class=\"announcement {}\">{}</div>",
            html_escape(&settings.announcement_kind),
            settings.announcement_html
        ));
    }
    Ok(Html(render_page(&settings.brand_name, &body)))
}

/// GET /profile/ and /_s/profile/: the current user, both surfaces
pub async fn profile_view(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, SurfaceError> {
    let surface = Surface::from_path(uri.path());
    let user = state
        .gate
        .require_user(&headers)
        .await
        .map_err(|e| SurfaceError::new(surface, e))?;
    Ok(render_user(surface, &user, "Profile"))
}

/// Fields a user may change about themselves
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub locale: Option<String>,
}

/// POST /profile/ and /_s/profile/: update the current user
pub async fn profile_update(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    Json(update): Json<ProfileUpdate>,
) -> Result<Response, SurfaceError> {
    let surface = Surface::from_path(uri.path());
    let wrap = |e| SurfaceError::new(surface, e);

    let mut user = state.gate.require_user(&headers).await.map_err(wrap)?;
    apply_profile_update(&mut user, update).map_err(wrap)?;
    let user = state
        .users
        .put(user)
        .await
        .map_err(|e| wrap(ApiError::from(e)))?;
    Ok(render_user(surface, &user, "Profile"))
}

fn apply_profile_update(user: &mut User, update: ProfileUpdate) -> Result<(), ApiError> {
    if let Some(name) = update.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::InvalidQuery("name must not be empty".to_string()));
        }
        user.name = name;
    }
    if let Some(email) = update.email {
        let email = email.trim().to_lowercase();
        if !email.is_empty() && !valid_email(&email) {
            return Err(ApiError::InvalidQuery(format!(
                "'{email}' does not look like an email"
            )));
        }
        user.email = email;
    }
    if let Some(locale) = update.locale {
        user.locale = locale.trim().to_string();
    }
    Ok(())
}

fn render_user(surface: Surface, user: &User, title: &str) -> Response {
    match surface {
        Surface::Json => Json(Value::Object(serialize_entity(user))).into_response(),
        Surface::Html => {
            let body = format!(
                "<h1>{}</h1>\n<p>@{}</p>\n<img src=\"{}\" alt=\"avatar\">",
                html_escape(&user.name),
                html_escape(&user.username),
                html_escape(&user.avatar_url()),
            );
            Html(render_page(title, &body)).into_response()
        }
    }
}

/// GET /user/ and /_s/user/: admin-only listing with pagination and
/// attribute filters
pub async fn user_list(
    State(state): State<AppState>,
    uri: Uri,
    Query(pairs): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Result<Response, SurfaceError> {
    let surface = Surface::from_path(uri.path());
    let wrap = |e| SurfaceError::new(surface, e);

    state.gate.require_admin(&headers).await.map_err(wrap)?;

    let query = ListQuery::from_pairs(pairs);
    let page = retrieve_entities(
        state.users.as_ref(),
        &query,
        &state.limits,
        &state.default_order,
    )
    .await
    .map_err(wrap)?;

    let more = page.next_cursor.as_ref().map(|cursor| more_url(&uri, cursor));
    match surface {
        Surface::Json => Ok(Json(serialize_page(&page.items, more)).into_response()),
        Surface::Html => {
            let mut body = String::from("<h1>Users</h1>\n<ul>\n");
            for user in &page.items {
                body.push_str(&format!(
                    "<li>@{} ({})</li>\n",
                    html_escape(&user.username),
                    html_escape(&user.name)
                ));
            }
            body.push_str("</ul>\n");
            if let Some(more) = more {
                body.push_str(&format!(
                    "<a href=\"{}\">More</a>\n",
                    html_escape(&more)
                ));
            }
            Ok(Html(render_page("User List", &body)).into_response())
        }
    }
}

/// A feedback submission
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackForm {
    pub subject: String,
    pub message: String,
    #[serde(default)]
    pub email: String,
}

/// POST /feedback/ and /_s/feedback/: answers 418 when the feature is
/// not configured; the status is part of the external contract
pub async fn feedback_submit(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    Json(form): Json<FeedbackForm>,
) -> Result<Response, SurfaceError> {
    let surface = Surface::from_path(uri.path());
    let wrap = |e| SurfaceError::new(surface, e);

    let settings = state.settings.get().await.map_err(wrap)?;
    if !settings.feedback_enabled() {
        return Err(wrap(ApiError::FeatureDisabled("feedback")));
    }

    let subject = form.subject.trim();
    let message = form.message.trim();
    if subject.is_empty() {
        return Err(wrap(ApiError::InvalidQuery("subject is required".to_string())));
    }
    if message.is_empty() {
        return Err(wrap(ApiError::InvalidQuery("message is required".to_string())));
    }
    let sender_email = form.email.trim().to_lowercase();
    if !sender_email.is_empty() && !valid_email(&sender_email) {
        return Err(wrap(ApiError::InvalidQuery(format!(
            "'{sender_email}' does not look like an email"
        ))));
    }

    // A signed-in sender's account email backs an omitted reply address
    let current = state.gate.current_user(&headers).await.map_err(wrap)?;
    let reply_to = if !sender_email.is_empty() {
        sender_email.clone()
    } else {
        current
            .map(|user| user.email)
            .filter(|email| !email.is_empty())
            .unwrap_or_else(|| settings.feedback_email.clone())
    };

    state
        .notifier
        .send(OutboundMessage {
            to: settings.feedback_email.clone(),
            reply_to,
            subject: format!("[{}] {}", settings.brand_name, subject),
            body: format!("{message}\n\n{sender_email}"),
        })
        .await
        .map_err(|e| wrap(ApiError::Internal(e.to_string())))?;

    match surface {
        Surface::Json => Ok(Json(json!({ "status": "success" })).into_response()),
        Surface::Html => Ok(Html(render_page(
            "Feedback",
            "<p>Thank you for your feedback!</p>",
        ))
        .into_response()),
    }
}

/// GET /_s/settings/: the serialized singleton, admin only
pub async fn settings_view(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, SurfaceError> {
    let wrap = |e| SurfaceError::new(Surface::Json, e);
    state.gate.require_admin(&headers).await.map_err(wrap)?;
    let settings = state.settings.get().await.map_err(wrap)?;
    Ok(Json(Value::Object(serialize_entity(&settings))))
}

/// Fields the admin surface may change on the settings singleton
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub analytics_id: Option<String>,
    pub announcement_html: Option<String>,
    pub announcement_kind: Option<String>,
    pub brand_name: Option<String>,
    pub feedback_email: Option<String>,
    pub locale: Option<String>,
    pub facebook_app_id: Option<String>,
    pub facebook_app_secret: Option<String>,
    pub twitter_consumer_key: Option<String>,
    pub twitter_consumer_secret: Option<String>,
}

/// PUT /_s/settings/: update the singleton; the write refreshes the
/// process-wide cache before the response goes out
pub async fn settings_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<Value>, SurfaceError> {
    let wrap = |e| SurfaceError::new(Surface::Json, e);
    state.gate.require_admin(&headers).await.map_err(wrap)?;
    validate_settings_update(&update).map_err(wrap)?;

    let written = state
        .settings
        .update(|settings| {
            let apply = |target: &mut String, source: &Option<String>| {
                if let Some(value) = source {
                    *target = value.trim().to_string();
                }
            };
            apply(&mut settings.analytics_id, &update.analytics_id);
            apply(&mut settings.announcement_html, &update.announcement_html);
            apply(&mut settings.announcement_kind, &update.announcement_kind);
            apply(&mut settings.brand_name, &update.brand_name);
            apply(&mut settings.feedback_email, &update.feedback_email);
            apply(&mut settings.locale, &update.locale);
            apply(&mut settings.facebook_app_id, &update.facebook_app_id);
            apply(&mut settings.facebook_app_secret, &update.facebook_app_secret);
            apply(&mut settings.twitter_consumer_key, &update.twitter_consumer_key);
            apply(
                &mut settings.twitter_consumer_secret,
                &update.twitter_consumer_secret,
            );
        })
        .await
        .map_err(wrap)?;
    Ok(Json(Value::Object(serialize_entity(&written))))
}

fn validate_settings_update(update: &SettingsUpdate) -> Result<(), ApiError> {
    if let Some(kind) = &update.announcement_kind {
        if !ANNOUNCEMENT_KINDS.contains(&kind.trim()) {
            return Err(ApiError::InvalidQuery(format!(
                "announcement_kind must be one of {ANNOUNCEMENT_KINDS:?}"
            )));
        }
    }
    if let Some(email) = &update.feedback_email {
        let email = email.trim();
        if !email.is_empty() && !valid_email(email) {
            return Err(ApiError::InvalidQuery(format!(
                "'{email}' does not look like an email"
            )));
        }
    }
    Ok(())
}

/// Fallback for unknown paths
pub async fn not_found(uri: Uri) -> SurfaceError {
    SurfaceError::new(
        Surface::from_path(uri.path()),
        ApiError::NotFound {
            kind: "resource",
            id: None,
        },
    )
}

/// Fallback for known paths hit with the wrong method
pub async fn method_not_allowed(uri: Uri) -> SurfaceError {
    SurfaceError::new(Surface::from_path(uri.path()), ApiError::MethodNotAllowed)
}
