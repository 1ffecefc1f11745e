//! # Auth Module
//!
//! This module handles all authentication-related functionality including:
//! - Email/password registration and login
//! - Opaque session token issuance and verification
//! - Yandex and VK OAuth flows
//! - SessionUser extractor for token-protected routes

pub mod crypto;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;

#[cfg(test)]
mod tests;

pub use extractors::SessionUser;
pub use models::User;
pub use routes::auth_routes;
