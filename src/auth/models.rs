//! Authentication data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User database model
#[derive(FromRow, Serialize, Deserialize, Debug)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub email_verified: i64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Body of a successful registration (201)
#[derive(Serialize, Debug)]
pub struct RegisterResponse {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub session_token: String,
    pub expires_at: String,
}

/// Body of a successful login (200)
#[derive(Serialize, Debug)]
pub struct LoginResponse {
    pub user_id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub session_token: String,
    pub expires_at: String,
}

/// Body of a successful session verification (200)
#[derive(Serialize, Debug)]
pub struct VerifyResponse {
    pub user_id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub expires_at: String,
}

/// Query parameters of the OAuth entry point
#[derive(Deserialize, Debug)]
pub struct OAuthQuery {
    pub provider: String,
    pub code: Option<String>,
}
