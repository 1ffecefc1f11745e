//! Password hashing and session token generation.
//!
//! Passwords are hashed with PBKDF2-HMAC-SHA256 (100k iterations, per-user
//! random salt) and stored as `salt_hex$digest_hex`. Session tokens are
//! opaque random bearer credentials.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

const PBKDF2_ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;
const SESSION_TOKEN_LEN: usize = 64;

/// Hash a password with a fresh random salt.
///
/// Returns the storage form `salt_hex$digest_hex`.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt_hex = hex::encode(salt);

    let digest = derive(password, salt_hex.as_bytes());
    format!("{}${}", salt_hex, hex::encode(digest))
}

/// Verify a password against a stored `salt_hex$digest_hex` value.
///
/// Malformed stored values verify as false.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
        return false;
    };
    let Ok(expected) = hex::decode(digest_hex) else {
        return false;
    };

    let digest = derive(password, salt_hex.as_bytes());

    // Constant-time comparison
    digest.len() == expected.len() && digest.iter().zip(expected.iter()).all(|(a, b)| a == b)
}

/// Generate an opaque session token (64 random bytes, URL-safe base64).
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn derive(password: &str, salt: &[u8]) -> [u8; HASH_LEN] {
    let mut digest = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut digest);
    digest
}
