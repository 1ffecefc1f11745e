//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `POST /api/auth/register` - Email/password registration
/// - `POST /api/auth/login` - Email/password login
/// - `GET /api/auth/verify` - Session token verification
/// - `GET /api/auth/oauth` - OAuth entry point (`?provider=yandex|vk[&code=...]`)
pub fn auth_routes() -> Router {
    Router::new()
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/verify", get(handlers::verify))
        .route("/api/auth/oauth", get(handlers::oauth_entry))
}
