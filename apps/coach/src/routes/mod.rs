pub mod discovery;
pub mod health;
pub mod profile;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Discovery triggers
        .route("/api/v1/discovery/url", post(discovery::handle_add_by_url))
        .route(
            "/api/v1/discovery/manual",
            post(discovery::handle_add_manually),
        )
        .route(
            "/api/v1/discovery/scan",
            post(discovery::handle_trigger_scan),
        )
        // Profile triggers
        .route("/api/v1/cv/parse", post(profile::handle_enqueue_cv_parse))
        .with_state(state)
}
