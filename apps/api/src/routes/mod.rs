pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::state::AppState;
use crate::wizard::handlers;

pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.config.max_request_bytes);

    Router::new()
        .route("/health", get(health::health_handler))
        // Wizard session lifecycle
        .route("/api/v1/wizard", post(handlers::handle_create))
        .route(
            "/api/v1/wizard/:id",
            get(handlers::handle_get).delete(handlers::handle_discard),
        )
        // Field mutation
        .route(
            "/api/v1/wizard/:id/personal",
            patch(handlers::handle_set_personal),
        )
        .route(
            "/api/v1/wizard/:id/records",
            patch(handlers::handle_update_record),
        )
        .route(
            "/api/v1/wizard/:id/records/:section",
            post(handlers::handle_add_record),
        )
        .route(
            "/api/v1/wizard/:id/records/:section/:index",
            delete(handlers::handle_remove_record),
        )
        .route("/api/v1/wizard/:id/terms", put(handlers::handle_set_terms))
        // Files
        .route(
            "/api/v1/wizard/:id/files/:slot",
            post(handlers::handle_upload).delete(handlers::handle_detach),
        )
        .route(
            "/api/v1/wizard/:id/banner",
            delete(handlers::handle_dismiss_banner),
        )
        // Navigation
        .route("/api/v1/wizard/:id/next", post(handlers::handle_next))
        .route(
            "/api/v1/wizard/:id/previous",
            post(handlers::handle_previous),
        )
        .layer(body_limit)
        .with_state(state)
}
