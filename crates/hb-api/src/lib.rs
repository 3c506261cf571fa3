//! # hb-api
//!
//! The web routing and orchestration layer for Hushbox.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod session;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

pub use error::ApiError;
pub use handlers::{AppState, SessionSettings};

/// Builds the full application router.
///
/// Everything under `/api/admin` except login and logout requires an admin session.
pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/health", get(handlers::health))
        // Public submission form
        .route("/api/confessions", post(handlers::submit_confession))
        // Admin session
        .route("/api/admin/auth/login", post(handlers::login))
        .route("/api/admin/auth/logout", post(handlers::logout))
        .route("/api/admin/auth/verify", get(handlers::verify))
        // Moderation
        .route("/api/admin/confessions", get(handlers::list_confessions))
        .route(
            "/api/admin/confessions/by-ip",
            delete(handlers::delete_by_ip),
        )
        .route(
            "/api/admin/confessions/{id}",
            patch(handlers::update_confession).delete(handlers::delete_confession),
        )
        .route(
            "/api/admin/confessions/{id}/archive",
            post(handlers::archive_confession),
        )
        .route("/api/admin/archive", get(handlers::list_archived))
        .route("/api/admin/archive/{id}", delete(handlers::delete_archived))
        .route(
            "/api/admin/archive/{id}/unarchive",
            post(handlers::unarchive_confession),
        )
        .route("/api/admin/ban", post(handlers::ban_ip))
        .route("/api/admin/stats", get(handlers::stats))
        .layer(middleware::cors_policy())
        .layer(middleware::standard_middleware());

    middleware::security_headers(routes).with_state(state)
}
