//! Tests for auth module
//!
//! These tests verify core authentication functionality including:
//! - Password hashing and verification
//! - Registration, login and session verification flows
//! - OAuth identity resolution

#[cfg(test)]
mod tests {
    use super::super::*;
    use chrono::{Duration, Utc};
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    use crate::common::migrations::run_migrations;
    use crate::common::ApiError;
    use crate::services::oauth::{OAuthProfile, OAuthProvider};

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to open in-memory database");
        run_migrations(&pool).await.expect("Failed to run migrations");
        pool
    }

    fn register_request(email: &str, password: &str) -> models::RegisterRequest {
        models::RegisterRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            display_name: None,
        }
    }

    fn login_request(email: &str, password: &str) -> models::LoginRequest {
        models::LoginRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }

    // ---- crypto ----

    #[test]
    fn test_password_hash_round_trip() {
        let stored = crypto::hash_password("secret1");

        assert!(stored.contains('$'), "Stored form should be salt$digest");
        assert!(crypto::verify_password("secret1", &stored));
        assert!(!crypto::verify_password("secret2", &stored));
    }

    #[test]
    fn test_password_hash_is_salted() {
        let a = crypto::hash_password("secret1");
        let b = crypto::hash_password("secret1");
        assert_ne!(a, b, "Two hashes of the same password should differ");
    }

    #[test]
    fn test_malformed_stored_hash_never_verifies() {
        assert!(!crypto::verify_password("secret1", ""));
        assert!(!crypto::verify_password("secret1", "no-separator"));
        assert!(!crypto::verify_password("secret1", "salt$not-hex"));
    }

    #[test]
    fn test_session_tokens_are_unique_and_opaque() {
        let a = crypto::generate_session_token();
        let b = crypto::generate_session_token();

        assert_ne!(a, b);
        // 64 random bytes in URL-safe base64
        assert!(a.len() > 80);
        assert!(!a.contains('='));
    }

    // ---- registration ----

    #[tokio::test]
    async fn test_register_issues_session() {
        let pool = test_pool().await;

        let response = handlers::register_user(&pool, register_request("a@x.com", "secret1"))
            .await
            .expect("registration should succeed");

        assert_eq!(response.email, "a@x.com");
        assert_eq!(response.display_name, "a", "defaults to the email local part");
        assert!(response.user_id.starts_with("U_"));
        assert!(!response.session_token.is_empty());
    }

    #[tokio::test]
    async fn test_register_normalizes_email() {
        let pool = test_pool().await;

        let response = handlers::register_user(&pool, register_request("  A@X.Com ", "secret1"))
            .await
            .unwrap();

        assert_eq!(response.email, "a@x.com");
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let pool = test_pool().await;

        handlers::register_user(&pool, register_request("a@x.com", "secret1"))
            .await
            .unwrap();
        let err = handlers::register_user(&pool, register_request("a@x.com", "another1"))
            .await
            .unwrap_err();

        assert!(matches!(&err, ApiError::Conflict(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_register_rejects_short_password() {
        let pool = test_pool().await;

        // Rejected regardless of email validity
        for email in ["a@x.com", "not-an-email"] {
            let err = handlers::register_user(&pool, register_request(email, "12345"))
                .await
                .unwrap_err();
            assert!(matches!(&err, ApiError::BadRequest(_)), "got {:?}", err);
        }
    }

    #[tokio::test]
    async fn test_register_requires_email_and_password() {
        let pool = test_pool().await;

        let err = handlers::register_user(
            &pool,
            models::RegisterRequest {
                email: None,
                password: Some("secret1".to_string()),
                display_name: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(&err, ApiError::BadRequest(_)));

        let err = handlers::register_user(&pool, register_request("a@x.com", ""))
            .await
            .unwrap_err();
        assert!(matches!(&err, ApiError::BadRequest(_)));
    }

    // ---- login and verification ----

    #[tokio::test]
    async fn test_login_and_verify_flow() {
        let pool = test_pool().await;

        let registered = handlers::register_user(&pool, register_request("a@x.com", "secret1"))
            .await
            .unwrap();
        let logged_in = handlers::login_user(&pool, login_request("a@x.com", "secret1"))
            .await
            .expect("login should succeed");

        assert_eq!(logged_in.user_id, registered.user_id);
        assert_ne!(
            logged_in.session_token, registered.session_token,
            "every login issues a fresh session"
        );

        let session = extractors::lookup_session(&pool, &logged_in.session_token)
            .await
            .expect("fresh token should verify");
        assert_eq!(session.user_id, registered.user_id);
        assert_eq!(session.email, "a@x.com");

        // Each successful auth path writes exactly one session row
        let (sessions,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(sessions, 2);
    }

    #[tokio::test]
    async fn test_login_uniform_error_for_bad_credentials() {
        let pool = test_pool().await;

        handlers::register_user(&pool, register_request("a@x.com", "secret1"))
            .await
            .unwrap();

        let wrong_password = handlers::login_user(&pool, login_request("a@x.com", "wrong-1"))
            .await
            .unwrap_err();
        let unknown_email = handlers::login_user(&pool, login_request("b@x.com", "secret1"))
            .await
            .unwrap_err();

        let message = |e: &ApiError| match e {
            ApiError::Unauthorized(msg) => msg.clone(),
            other => panic!("expected Unauthorized, got {:?}", other),
        };
        assert_eq!(message(&wrong_password), message(&unknown_email));
    }

    #[tokio::test]
    async fn test_verify_rejects_unknown_token() {
        let pool = test_pool().await;

        let err = extractors::lookup_session(&pool, "no-such-token")
            .await
            .unwrap_err();
        assert!(matches!(&err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_verify_rejects_expired_session() {
        let pool = test_pool().await;

        let registered = handlers::register_user(&pool, register_request("a@x.com", "secret1"))
            .await
            .unwrap();

        let stale_token = "stale-token";
        let expired_at = (Utc::now() - Duration::days(1)).to_rfc3339();
        sqlx::query("INSERT INTO sessions (session_token, user_id, expires_at) VALUES (?, ?, ?)")
            .bind(stale_token)
            .bind(&registered.user_id)
            .bind(&expired_at)
            .execute(&pool)
            .await
            .unwrap();

        let err = extractors::lookup_session(&pool, stale_token)
            .await
            .unwrap_err();
        match err {
            ApiError::Unauthorized(msg) => assert_eq!(msg, "Session expired"),
            other => panic!("expected Unauthorized, got {:?}", other),
        }
    }

    // ---- OAuth identity resolution ----

    fn vk_profile(provider_user_id: &str, email: &str) -> OAuthProfile {
        OAuthProfile {
            provider_user_id: provider_user_id.to_string(),
            email: Some(email.to_string()),
            display_name: Some("Ivan Petrov".to_string()),
            avatar_url: Some("https://example.com/p.jpg".to_string()),
            raw: json!({"id": provider_user_id}),
        }
    }

    #[tokio::test]
    async fn test_oauth_creates_verified_user_and_link() {
        let pool = test_pool().await;

        let profile = vk_profile("100", "vk100@vk.com");
        let user_id = handlers::resolve_oauth_user(&pool, OAuthProvider::Vk, &profile)
            .await
            .unwrap();

        let (email, verified): (String, i64) =
            sqlx::query_as("SELECT email, email_verified FROM users WHERE id = ?")
                .bind(&user_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(email, "vk100@vk.com");
        assert_eq!(verified, 1, "OAuth accounts are created verified");

        // Same provider identity resolves to the same user
        let again = handlers::resolve_oauth_user(&pool, OAuthProvider::Vk, &profile)
            .await
            .unwrap();
        assert_eq!(again, user_id);
    }

    #[tokio::test]
    async fn test_oauth_links_existing_user_by_email() {
        let pool = test_pool().await;

        let registered = handlers::register_user(&pool, register_request("a@x.com", "secret1"))
            .await
            .unwrap();

        let user_id =
            handlers::resolve_oauth_user(&pool, OAuthProvider::Yandex, &vk_profile("7", "a@x.com"))
                .await
                .unwrap();

        assert_eq!(user_id, registered.user_id);

        let (links,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM oauth_accounts WHERE user_id = ? AND provider = 'yandex'",
        )
        .bind(&user_id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(links, 1);
    }

    #[tokio::test]
    async fn test_oauth_without_email_is_rejected() {
        let pool = test_pool().await;

        let profile = OAuthProfile {
            provider_user_id: "1".to_string(),
            email: None,
            display_name: None,
            avatar_url: None,
            raw: json!({}),
        };
        let err = handlers::resolve_oauth_user(&pool, OAuthProvider::Yandex, &profile)
            .await
            .unwrap_err();
        assert!(matches!(&err, ApiError::BadRequest(_)));
    }
}
