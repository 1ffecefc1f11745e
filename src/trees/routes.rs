//! Family tree routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Creates the trees router
///
/// # Routes
/// - `GET /api/trees` - List a user's trees
/// - `GET /api/trees/load` - Load one tree as a node/edge graph
/// - `POST /api/trees/save` - Save a tree (full replace)
pub fn trees_routes() -> Router {
    Router::new()
        .route("/api/trees", get(handlers::list_trees))
        .route("/api/trees/load", get(handlers::load_tree))
        .route("/api/trees/save", post(handlers::save_tree))
}
