//! Authentication handlers

use axum::extract::{Extension, Json, Query};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::crypto;
use super::extractors::SessionUser;
use super::models::{
    LoginRequest, LoginResponse, OAuthQuery, RegisterRequest, RegisterResponse, User,
    VerifyResponse,
};
use crate::common::{
    generate_oauth_account_id, generate_user_id, safe_email_log, ApiError, AppState,
};
use crate::services::oauth::{self, OAuthError, OAuthProfile, OAuthProvider};

/// Sessions are valid for 30 days from issuance.
const SESSION_TTL_DAYS: i64 = 30;

/// POST /api/auth/register
/// Registers a user by email and password and issues a session token
///
/// # Request Body
/// ```json
/// {
///   "email": "a@example.com",
///   "password": "secret1",
///   "display_name": "Anna"
/// }
/// ```
///
/// # Response (201)
/// ```json
/// {
///   "user_id": "U_K7NP3X",
///   "email": "a@example.com",
///   "display_name": "Anna",
///   "session_token": "...",
///   "expires_at": "..."
/// }
/// ```
pub async fn register(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = register_user(&state.db, payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/auth/login
/// Authenticates by email and password and issues a fresh session token
pub async fn login(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let response = login_user(&state.db, payload).await?;
    Ok(Json(response))
}

/// GET /api/auth/verify
/// Returns the profile bound to the `X-Session-Token` header
pub async fn verify(session: SessionUser) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        user_id: session.user_id,
        email: session.email,
        display_name: session.display_name,
        avatar_url: session.avatar_url,
        expires_at: session.expires_at,
    })
}

/// GET /api/auth/oauth?provider=yandex|vk[&code=...]
///
/// Without `code`: 302 to the provider's authorize URL. With `code`:
/// exchanges it, resolves or creates the local user, issues a session and
/// redirects to the frontend callback with the token as a query parameter.
pub async fn oauth_entry(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<OAuthQuery>,
) -> Result<Response, ApiError> {
    let provider = OAuthProvider::parse(&query.provider)
        .ok_or_else(|| ApiError::BadRequest("Unknown OAuth provider".to_string()))?;

    let credentials = match provider {
        OAuthProvider::Yandex => state.config.yandex.as_ref(),
        OAuthProvider::Vk => state.config.vk.as_ref(),
    }
    .ok_or_else(|| ApiError::InternalServer("OAuth not configured".to_string()))?;

    let redirect_uri = state.config.oauth_redirect_uri(provider.as_str());

    let code = match query.code {
        Some(code) if !code.is_empty() => code,
        _ => {
            let auth_url = oauth::authorize_url(provider, credentials, &redirect_uri);
            info!(provider = provider.as_str(), "Redirecting to OAuth authorize URL");
            return Ok(redirect(&auth_url));
        }
    };

    let profile = oauth::fetch_profile(&state.http, provider, credentials, &code, &redirect_uri)
        .await
        .map_err(|e| oauth_error(provider, e))?;

    let user_id = resolve_oauth_user(&state.db, provider, &profile).await?;
    let (session_token, _) = create_session(&state.db, &user_id).await?;

    info!(
        provider = provider.as_str(),
        user_id = %user_id,
        "OAuth login successful"
    );

    let callback_url = format!(
        "{}/auth/callback?session_token={}",
        state.config.frontend_url, session_token
    );
    Ok(redirect(&callback_url))
}

// ---- Core flows (shared with tests) ----

pub(crate) async fn register_user(
    db: &SqlitePool,
    payload: RegisterRequest,
) -> Result<RegisterResponse, ApiError> {
    let email = payload
        .email
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    let password = payload.password.unwrap_or_default();

    if email.is_empty() || password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }
    if password.chars().count() < 6 {
        return Err(ApiError::BadRequest(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::Conflict(
            "User with this email already exists".to_string(),
        ));
    }

    let display_name = payload
        .display_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| email_local_part(&email));

    let user_id = generate_user_id();
    let password_hash = crypto::hash_password(&password);

    sqlx::query(
        r#"
        INSERT INTO users (id, email, password_hash, display_name, email_verified)
        VALUES (?, ?, ?, ?, 0)
        "#,
    )
    .bind(&user_id)
    .bind(&email)
    .bind(&password_hash)
    .bind(&display_name)
    .execute(db)
    .await?;

    let (session_token, expires_at) = create_session(db, &user_id).await?;

    info!(
        user_id = %user_id,
        email = %safe_email_log(&email),
        "User registered"
    );

    Ok(RegisterResponse {
        user_id,
        email,
        display_name,
        session_token,
        expires_at,
    })
}

pub(crate) async fn login_user(
    db: &SqlitePool,
    payload: LoginRequest,
) -> Result<LoginResponse, ApiError> {
    let email = payload
        .email
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    let password = payload.password.unwrap_or_default();

    if email.is_empty() || password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let user: Option<User> = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(db)
        .await?;

    // One uniform message for unknown email, OAuth-only account and wrong
    // password, so the endpoint can't be used to enumerate users.
    let user = match user {
        Some(user) => user,
        None => return Err(invalid_credentials(&email)),
    };
    let password_hash = match &user.password_hash {
        Some(hash) => hash,
        None => return Err(invalid_credentials(&email)),
    };
    if !crypto::verify_password(&password, password_hash) {
        return Err(invalid_credentials(&email));
    }

    let (session_token, expires_at) = create_session(db, &user.id).await?;

    info!(
        user_id = %user.id,
        email = %safe_email_log(&email),
        "User logged in"
    );

    Ok(LoginResponse {
        user_id: user.id,
        email,
        display_name: user.display_name,
        avatar_url: user.avatar_url,
        session_token,
        expires_at,
    })
}

/// Insert a fresh session row; returns the token and its expiry (RFC 3339).
pub(crate) async fn create_session(
    db: &SqlitePool,
    user_id: &str,
) -> Result<(String, String), ApiError> {
    let session_token = crypto::generate_session_token();
    let expires_at = (Utc::now() + Duration::days(SESSION_TTL_DAYS)).to_rfc3339();

    sqlx::query("INSERT INTO sessions (session_token, user_id, expires_at) VALUES (?, ?, ?)")
        .bind(&session_token)
        .bind(user_id)
        .bind(&expires_at)
        .execute(db)
        .await?;

    Ok((session_token, expires_at))
}

/// Resolve an OAuth profile to a local user id: existing provider link,
/// else user with the same email, else a freshly created verified account.
pub(crate) async fn resolve_oauth_user(
    db: &SqlitePool,
    provider: OAuthProvider,
    profile: &OAuthProfile,
) -> Result<String, ApiError> {
    let linked: Option<(String,)> = sqlx::query_as(
        "SELECT user_id FROM oauth_accounts WHERE provider = ? AND provider_user_id = ?",
    )
    .bind(provider.as_str())
    .bind(&profile.provider_user_id)
    .fetch_optional(db)
    .await?;

    if let Some((user_id,)) = linked {
        return Ok(user_id);
    }

    let email = profile
        .email
        .clone()
        .ok_or_else(|| ApiError::BadRequest("Failed to get user info".to_string()))?;

    let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(db)
        .await?;

    let user_id = match existing {
        Some((user_id,)) => user_id,
        None => {
            let user_id = generate_user_id();
            let display_name = profile
                .display_name
                .clone()
                .unwrap_or_else(|| email_local_part(&email));

            sqlx::query(
                r#"
                INSERT INTO users (id, email, display_name, avatar_url, email_verified)
                VALUES (?, ?, ?, ?, 1)
                "#,
            )
            .bind(&user_id)
            .bind(&email)
            .bind(&display_name)
            .bind(&profile.avatar_url)
            .execute(db)
            .await?;

            info!(
                user_id = %user_id,
                email = %safe_email_log(&email),
                provider = provider.as_str(),
                "Created new user via OAuth"
            );

            user_id
        }
    };

    let provider_data =
        serde_json::to_string(&profile.raw).unwrap_or_else(|_| "{}".to_string());

    sqlx::query(
        r#"
        INSERT INTO oauth_accounts (id, user_id, provider, provider_user_id, provider_email, provider_data)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT (provider, provider_user_id) DO UPDATE SET
            provider_email = excluded.provider_email,
            provider_data = excluded.provider_data
        "#,
    )
    .bind(generate_oauth_account_id())
    .bind(&user_id)
    .bind(provider.as_str())
    .bind(&profile.provider_user_id)
    .bind(&email)
    .bind(&provider_data)
    .execute(db)
    .await?;

    Ok(user_id)
}

// ---- Helper Functions ----

fn email_local_part(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

fn invalid_credentials(email: &str) -> ApiError {
    warn!(email = %safe_email_log(email), "Login failed: invalid credentials");
    ApiError::Unauthorized("Invalid email or password".to_string())
}

fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

fn oauth_error(provider: OAuthProvider, e: OAuthError) -> ApiError {
    match e {
        OAuthError::MissingAccessToken => {
            warn!(provider = provider.as_str(), "OAuth token exchange returned no access token");
            ApiError::BadRequest("Failed to get access token".to_string())
        }
        OAuthError::MissingProfile => {
            warn!(provider = provider.as_str(), "OAuth profile response was incomplete");
            ApiError::BadRequest("Failed to get user info".to_string())
        }
        OAuthError::Upstream { status, message } => {
            warn!(
                provider = provider.as_str(),
                status = status,
                body = %message,
                "OAuth provider returned an error"
            );
            ApiError::Upstream {
                status,
                message: "OAuth provider error".to_string(),
            }
        }
        OAuthError::RequestFailed(e) => {
            error!(provider = provider.as_str(), error = %e, "HTTP error contacting OAuth provider");
            ApiError::InternalServer("OAuth provider unavailable".to_string())
        }
    }
}
