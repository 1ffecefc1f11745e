// src/common/config.rs
//! Application configuration loaded from the environment.
//!
//! All environment reads happen here, once, at process start. Handlers only
//! ever see the resulting `Config` through `AppState`. A missing secret
//! surfaces as a 500 from the endpoint that needs it, never as a crash.

use std::env;

/// OAuth client credentials for a single provider.
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Immutable application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Frontend base URL, target of the OAuth callback redirect.
    pub frontend_url: String,
    /// Public base URL of this service, used to build OAuth redirect URIs.
    pub public_base_url: String,
    pub yandex: Option<OAuthCredentials>,
    pub vk: Option<OAuthCredentials>,
    pub metrika_token: Option<String>,
    pub metrika_counter_id: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://family_tree.db".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(8080),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            yandex: credentials_from_env("YANDEX_CLIENT_ID", "YANDEX_CLIENT_SECRET"),
            vk: credentials_from_env("VK_CLIENT_ID", "VK_CLIENT_SECRET"),
            metrika_token: env::var("YANDEX_METRIKA_TOKEN").ok().filter(|t| !t.is_empty()),
            metrika_counter_id: env::var("METRIKA_COUNTER_ID")
                .unwrap_or_else(|_| "101026698".to_string()),
        }
    }

    /// Redirect URI registered with an OAuth provider for this deployment.
    pub fn oauth_redirect_uri(&self, provider: &str) -> String {
        format!("{}/api/auth/oauth?provider={}", self.public_base_url, provider)
    }
}

fn credentials_from_env(id_key: &str, secret_key: &str) -> Option<OAuthCredentials> {
    let client_id = env::var(id_key).ok().filter(|v| !v.is_empty())?;
    let client_secret = env::var(secret_key).ok().filter(|v| !v.is_empty())?;
    Some(OAuthCredentials {
        client_id,
        client_secret,
    })
}
