//! Password hashing and verification using bcrypt

use crate::core::error::{PhonebookError, Result};

/// Fixed work factor; bcrypt embeds the salt in the encoded hash
const BCRYPT_COST: u32 = 10;

/// Hash a password using bcrypt
pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, BCRYPT_COST)
        .map_err(|e| PhonebookError::PasswordHash(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a stored hash
///
/// A malformed stored hash counts as a verification failure rather than an
/// error: the caller only ever learns "matched" or "did not match".
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}
