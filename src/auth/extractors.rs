//! Authentication extractors for Axum

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::request::Parts,
};
use chrono::Utc;
use sqlx::{FromRow, SqlitePool};
use std::sync::Arc;
use tracing::warn;

use crate::common::{safe_email_log, ApiError, AppState};

/// Header carrying the opaque session token.
pub const SESSION_TOKEN_HEADER: &str = "x-session-token";

/// Authenticated session extractor
///
/// Validates the `X-Session-Token` header against the sessions table and
/// loads the bound user's profile. Expiry is checked here; expired rows are
/// rejected but never deleted.
#[derive(Debug, FromRow)]
pub struct SessionUser {
    pub user_id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub expires_at: String,
}

/// Look up a session token and return the bound user, enforcing expiry.
pub async fn lookup_session(db: &SqlitePool, token: &str) -> Result<SessionUser, ApiError> {
    let session: Option<SessionUser> = sqlx::query_as(
        r#"
        SELECT s.user_id, u.email, u.display_name, u.avatar_url, s.expires_at
        FROM sessions s
        JOIN users u ON s.user_id = u.id
        WHERE s.session_token = ?
        "#,
    )
    .bind(token)
    .fetch_optional(db)
    .await
    .map_err(ApiError::DatabaseError)?;

    let session = match session {
        Some(s) => s,
        None => {
            warn!("Session verification failed: unknown token");
            return Err(ApiError::Unauthorized("Invalid session token".to_string()));
        }
    };

    let expired = match chrono::DateTime::parse_from_rfc3339(&session.expires_at) {
        Ok(expires_at) => expires_at.with_timezone(&Utc) < Utc::now(),
        Err(_) => true,
    };
    if expired {
        warn!(
            email = %safe_email_log(&session.email),
            "Session verification failed: token expired"
        );
        return Err(ApiError::Unauthorized("Session expired".to_string()));
    }

    Ok(session)
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(app_state): Extension<Arc<AppState>> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        let token = parts
            .headers
            .get(SESSION_TOKEN_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());

        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => {
                warn!("Session verification failed: missing X-Session-Token header");
                return Err(ApiError::Unauthorized("Session token required".to_string()));
            }
        };

        lookup_session(&app_state.db, &token).await
    }
}
