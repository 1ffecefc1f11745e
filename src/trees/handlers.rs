//! Family tree handlers

use axum::extract::{Extension, Json, Query};
use axum::http::HeaderMap;
use std::sync::Arc;

use super::models::{
    ListTreesQuery, ListTreesResponse, LoadTreeQuery, LoadTreeResponse, SaveTreeRequest,
    SaveTreeResponse,
};
use super::services::TreesService;
use crate::common::{ApiError, AppState};

/// Header fallback for the user email accepted by all tree endpoints.
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// GET /api/trees?user_email=... - List all trees owned by a user
///
/// An unknown user or a user with no trees yields an empty list, not an
/// error.
pub async fn list_trees(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListTreesQuery>,
) -> Result<Json<ListTreesResponse>, ApiError> {
    let user_email = query
        .user_email
        .or_else(|| header_value(&headers, USER_EMAIL_HEADER))
        .filter(|email| !email.is_empty())
        .ok_or_else(|| ApiError::BadRequest("user_email is required".to_string()))?;

    let trees = TreesService::new(state.db.clone())
        .list_trees(&user_email)
        .await?;

    Ok(Json(ListTreesResponse {
        count: trees.len(),
        trees,
    }))
}

/// GET /api/trees/load?tree_id=...&user_email=... - Load one tree as a graph
///
/// With an email the tree must belong to that user; without one any tree id
/// is loadable.
pub async fn load_tree(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<LoadTreeQuery>,
) -> Result<Json<LoadTreeResponse>, ApiError> {
    let tree_id = query
        .tree_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("tree_id is required".to_string()))?;

    let user_email = query
        .user_email
        .or_else(|| header_value(&headers, USER_EMAIL_HEADER))
        .filter(|email| !email.is_empty());

    let tree = TreesService::new(state.db.clone())
        .load_tree(&tree_id, user_email.as_deref())
        .await?;

    Ok(Json(tree))
}

/// POST /api/trees/save - Save a tree, replacing its persons and
/// relationships with the request's node and edge arrays
pub async fn save_tree(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<SaveTreeRequest>,
) -> Result<Json<SaveTreeResponse>, ApiError> {
    let user_email = request
        .user_email
        .clone()
        .or_else(|| header_value(&headers, USER_EMAIL_HEADER))
        .filter(|email| !email.is_empty())
        .ok_or_else(|| ApiError::BadRequest("user_email is required".to_string()))?;

    let saved = TreesService::new(state.db.clone())
        .save_tree(&user_email, request)
        .await?;

    Ok(Json(saved))
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}
