// src/common/id_generator.rs
//! Crockford Base32 ID Generator
//!
//! Generates human-readable, prefixed IDs using Crockford Base32 encoding.
//! Format: PREFIX_XXXXXX (e.g., T_K7NP3X for family trees)
//!
//! Benefits:
//! - No ambiguous characters (excludes I, L, O, U)
//! - Case-insensitive
//! - ~1 billion combinations per entity type (32^6)
//! - Easy to read, type, and communicate verbally

use rand::Rng;

/// Crockford Base32 alphabet (excludes I, L, O, U to avoid confusion)
const CROCKFORD_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Entity type prefixes for ID generation
#[derive(Debug, Clone, Copy)]
pub enum EntityPrefix {
    /// User account (U_)
    User,
    /// Family tree (T_)
    Tree,
    /// Person node within a tree (P_)
    Person,
    /// Relationship edge between persons (R_)
    Relationship,
    /// Linked OAuth provider account (O_)
    OAuthAccount,
}

impl EntityPrefix {
    /// Get the string prefix for this entity type
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::User => "U",
            EntityPrefix::Tree => "T",
            EntityPrefix::Person => "P",
            EntityPrefix::Relationship => "R",
            EntityPrefix::OAuthAccount => "O",
        }
    }
}

/// Generate a random Crockford Base32 string of specified length
fn generate_crockford_string(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..32);
            CROCKFORD_ALPHABET[idx] as char
        })
        .collect()
}

/// Generate a prefixed ID using Crockford Base32 encoding
///
/// # Returns
/// A string in format "PREFIX_XXXXXX" (e.g., "T_K7NP3X")
pub fn generate_id(prefix: EntityPrefix) -> String {
    format!("{}_{}", prefix.as_str(), generate_crockford_string(6))
}

// ============================================================================
// Convenience functions for each entity type
// ============================================================================

/// Generate a User ID (U_XXXXXX)
pub fn generate_user_id() -> String {
    generate_id(EntityPrefix::User)
}

/// Generate a Tree ID (T_XXXXXX)
pub fn generate_tree_id() -> String {
    generate_id(EntityPrefix::Tree)
}

/// Generate a Person ID (P_XXXXXX)
pub fn generate_person_id() -> String {
    generate_id(EntityPrefix::Person)
}

/// Generate a Relationship ID (R_XXXXXX)
pub fn generate_relationship_id() -> String {
    generate_id(EntityPrefix::Relationship)
}

/// Generate an OAuth account ID (O_XXXXXX)
pub fn generate_oauth_account_id() -> String {
    generate_id(EntityPrefix::OAuthAccount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_id_format() {
        let tree_id = generate_tree_id();
        assert!(tree_id.starts_with("T_"));
        assert_eq!(tree_id.len(), 8); // "T_" + 6 chars

        let person_id = generate_person_id();
        assert!(person_id.starts_with("P_"));
        assert_eq!(person_id.len(), 8);
    }

    #[test]
    fn test_crockford_alphabet_only() {
        let id = generate_user_id();
        let random_part = &id[2..]; // Skip "U_"

        for c in random_part.chars() {
            assert!(
                CROCKFORD_ALPHABET.contains(&(c as u8)),
                "Character '{}' not in Crockford alphabet",
                c
            );
        }

        // Verify no ambiguous characters
        assert!(!random_part.contains('I'));
        assert!(!random_part.contains('L'));
        assert!(!random_part.contains('O'));
        assert!(!random_part.contains('U'));
    }

    #[test]
    fn test_uniqueness() {
        let mut ids = HashSet::new();
        for _ in 0..1000 {
            let id = generate_person_id();
            assert!(ids.insert(id), "Duplicate ID generated");
        }
    }

    #[test]
    fn test_all_prefixes() {
        assert!(generate_user_id().starts_with("U_"));
        assert!(generate_tree_id().starts_with("T_"));
        assert!(generate_person_id().starts_with("P_"));
        assert!(generate_relationship_id().starts_with("R_"));
        assert!(generate_oauth_account_id().starts_with("O_"));
    }
}
