//! Secret hashing and one-time tokens
//!
//! Secrets are only ever stored as Argon2id hashes. Reset tokens are handed
//! out in clear once and stored as SHA-256 digests; every comparison of
//! secret material is constant-time.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use once_cell::sync::Lazy;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::{PersistenceError, PersistenceResult};

/// Prefix of every encoded Argon2id hash
pub const HASH_PREFIX: &str = "$argon2id$";

/// Hash a secret using Argon2id with a fresh salt
pub fn hash_password(password: &str) -> PersistenceResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| PersistenceError::Hashing)
}

/// Check a secret against a stored hash; a malformed hash never matches
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Hash of a random secret nobody knows
static DUMMY_HASH: Lazy<Option<String>> = Lazy::new(|| hash_password(&generate_token()).ok());

/// Spend the same Argon2id work as [`verify_password`] when there is no
/// stored hash to check; never matches
pub fn verify_password_against_dummy(password: &str) -> bool {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        verify_password(password, hash);
    }
    false
}

/// Whether a stored value is already an encoded hash
pub fn is_hashed(value: &str) -> bool {
    value.starts_with(HASH_PREFIX)
}

/// 256 random bits, URL-safe base64
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Digest of a token for storage
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

pub fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Encode a user id for a reset link
pub fn encode_uid(id: i64) -> String {
    URL_SAFE_NO_PAD.encode(id.to_string())
}

/// Decode a reset link's user id; `None` for anything malformed
pub fn decode_uid(uidb64: &str) -> Option<i64> {
    let bytes = URL_SAFE_NO_PAD.decode(uidb64).ok()?;
    String::from_utf8(bytes).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("longenough").unwrap();
        assert!(is_hashed(&hash));
        assert!(verify_password("longenough", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_dummy_hash_is_real_and_never_matches() {
        let hash = DUMMY_HASH.as_deref().unwrap();
        assert!(is_hashed(hash));
        assert!(PasswordHash::new(hash).is_ok());
        assert!(!verify_password_against_dummy(""));
        assert!(!verify_password_against_dummy("longenough"));
    }

    #[test]
    fn test_malformed_hash_never_matches() {
        assert!(!verify_password("plain", "plain"));
        assert!(!is_hashed("plain"));
    }

    #[test]
    fn test_tokens() {
        let token = generate_token();
        assert_eq!(token.len(), 43);
        assert_ne!(token, generate_token());
        assert_eq!(hash_token(&token), hash_token(&token));
        assert_ne!(hash_token(&token), token);
        assert!(constant_time_eq(&hash_token(&token), &hash_token(&token)));
        assert!(!constant_time_eq("a", "b"));
    }

    #[test]
    fn test_uid_encoding() {
        assert_eq!(decode_uid(&encode_uid(42)), Some(42));
        assert_eq!(decode_uid("!!"), None);
        assert_eq!(decode_uid(&URL_SAFE_NO_PAD.encode("abc")), None);
    }
}
