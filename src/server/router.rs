//! Route table wiring the dual surfaces to the shared handler pipeline
//!
//! Paths under `/_s/` are the JSON API; the same handlers serve both
//! prefixes and pick the rendering from the path, so the data fetched,
//! filtered and authorized is identical between the two surfaces.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::server::handlers::{
    self, AppState, feedback_submit, profile_update, profile_view, settings_update, settings_view,
    user_list, welcome,
};

/// Build the complete application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/profile/", get(profile_view).post(profile_update))
        .route("/_s/profile/", get(profile_view).post(profile_update))
        .route("/user/", get(user_list))
        .route("/_s/user/", get(user_list))
        .route("/feedback/", post(feedback_submit))
        .route("/_s/feedback/", post(feedback_submit))
        .route("/_s/settings/", get(settings_view).put(settings_update))
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
