// src/services/oauth.rs
//! OAuth provider clients (Yandex, VK).
//!
//! Both providers follow the same authorization-code flow: redirect the user
//! to the provider's authorize URL, then exchange the returned `code` for an
//! access token and fetch the provider profile.

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::common::config::OAuthCredentials;

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Failed to get access token")]
    MissingAccessToken,

    #[error("Failed to get user info")]
    MissingProfile,

    #[error("provider returned status {status}")]
    Upstream { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Yandex,
    Vk,
}

impl OAuthProvider {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "yandex" => Some(OAuthProvider::Yandex),
            "vk" => Some(OAuthProvider::Vk),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Yandex => "yandex",
            OAuthProvider::Vk => "vk",
        }
    }
}

/// Provider profile normalized to the fields the auth flow needs.
#[derive(Debug)]
pub struct OAuthProfile {
    pub provider_user_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    /// Raw provider payload, persisted alongside the account link.
    pub raw: Value,
}

/// Build the provider authorize URL the client is redirected to.
pub fn authorize_url(
    provider: OAuthProvider,
    credentials: &OAuthCredentials,
    redirect_uri: &str,
) -> String {
    match provider {
        OAuthProvider::Yandex => format!(
            "https://oauth.yandex.ru/authorize?response_type=code&client_id={}&redirect_uri={}",
            urlencoding::encode(&credentials.client_id),
            urlencoding::encode(redirect_uri),
        ),
        OAuthProvider::Vk => format!(
            "https://oauth.vk.com/authorize?client_id={}&redirect_uri={}&display=page&scope=email&response_type=code&v=5.131",
            urlencoding::encode(&credentials.client_id),
            urlencoding::encode(redirect_uri),
        ),
    }
}

/// Exchange an authorization code and fetch the provider profile.
pub async fn fetch_profile(
    http: &Client,
    provider: OAuthProvider,
    credentials: &OAuthCredentials,
    code: &str,
    redirect_uri: &str,
) -> Result<OAuthProfile, OAuthError> {
    match provider {
        OAuthProvider::Yandex => fetch_yandex_profile(http, credentials, code).await,
        OAuthProvider::Vk => fetch_vk_profile(http, credentials, code, redirect_uri).await,
    }
}

async fn fetch_yandex_profile(
    http: &Client,
    credentials: &OAuthCredentials,
    code: &str,
) -> Result<OAuthProfile, OAuthError> {
    let response = http
        .post("https://oauth.yandex.ru/token")
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
        ])
        .send()
        .await?;

    let token_response = read_json(response).await?;
    let access_token = token_response["access_token"]
        .as_str()
        .ok_or(OAuthError::MissingAccessToken)?
        .to_string();

    debug!(provider = "yandex", "Access token obtained, fetching profile");

    let response = http
        .get("https://login.yandex.ru/info?format=json")
        .header("Authorization", format!("OAuth {}", access_token))
        .send()
        .await?;

    let user_info = read_json(response).await?;
    let provider_user_id = json_string(&user_info["id"]).ok_or(OAuthError::MissingProfile)?;

    let email = user_info["default_email"].as_str().map(str::to_string);
    let display_name = user_info["display_name"]
        .as_str()
        .or_else(|| user_info["real_name"].as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    let avatar_url = user_info["default_avatar_id"]
        .as_str()
        .filter(|s| !s.is_empty())
        .map(|avatar_id| format!("https://avatars.yandex.net/get-yapic/{}/islands-200", avatar_id));

    Ok(OAuthProfile {
        provider_user_id,
        email,
        display_name,
        avatar_url,
        raw: user_info,
    })
}

async fn fetch_vk_profile(
    http: &Client,
    credentials: &OAuthCredentials,
    code: &str,
    redirect_uri: &str,
) -> Result<OAuthProfile, OAuthError> {
    let response = http
        .get("https://oauth.vk.com/access_token")
        .query(&[
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("redirect_uri", redirect_uri),
            ("code", code),
        ])
        .send()
        .await?;

    let token_response = read_json(response).await?;
    let access_token = token_response["access_token"]
        .as_str()
        .map(str::to_string)
        .ok_or(OAuthError::MissingAccessToken)?;
    let user_id = token_response["user_id"]
        .as_i64()
        .ok_or(OAuthError::MissingAccessToken)?;
    // VK only exposes the email with the "email" scope, and not for every
    // account; a synthetic address keeps the identity-by-email path working.
    let email = token_response["email"]
        .as_str()
        .map(str::to_string)
        .or_else(|| Some(format!("vk{}@vk.com", user_id)));

    debug!(provider = "vk", "Access token obtained, fetching profile");

    let user_ids = user_id.to_string();
    let response = http
        .get("https://api.vk.com/method/users.get")
        .query(&[
            ("user_ids", user_ids.as_str()),
            ("fields", "photo_200"),
            ("access_token", access_token.as_str()),
            ("v", "5.131"),
        ])
        .send()
        .await?;

    let api_response = read_json(response).await?;
    let user_info = api_response["response"]
        .get(0)
        .cloned()
        .ok_or(OAuthError::MissingProfile)?;

    let first_name = user_info["first_name"].as_str().unwrap_or("");
    let last_name = user_info["last_name"].as_str().unwrap_or("");
    let display_name = Some(format!("{} {}", first_name, last_name).trim().to_string())
        .filter(|s| !s.is_empty());
    let avatar_url = user_info["photo_200"].as_str().map(str::to_string);

    Ok(OAuthProfile {
        provider_user_id: user_id.to_string(),
        email,
        display_name,
        avatar_url,
        raw: user_info,
    })
}

async fn read_json(response: reqwest::Response) -> Result<Value, OAuthError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(OAuthError::Upstream {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.json::<Value>().await?)
}

/// Provider ids arrive as strings (Yandex) or numbers (VK).
fn json_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
