//! Bearer token generation and validation

use crate::core::error::{PhonebookError, Result};
use crate::db::models::User;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Fixed token lifetime. The short expiry bounds exposure of a leaked
/// token; single-session enforcement comes from the stored-token
/// cross-check in the session guard.
pub const TOKEN_TTL_SECS: i64 = 3600;

/// Identity claims carried by a bearer token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub subscription: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issue a signed bearer token for a user
pub fn issue_token(user: &User, secret: &str) -> Result<String> {
    issue_token_with_ttl(user, secret, TOKEN_TTL_SECS)
}

pub(crate) fn issue_token_with_ttl(user: &User, secret: &str, ttl_secs: i64) -> Result<String> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user.id.clone(),
        email: user.email.clone(),
        subscription: user.subscription.clone(),
        iat: now,
        exp: now + ttl_secs,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| PhonebookError::Token(format!("Failed to issue token: {}", e)))
}

/// Validate a bearer token and extract its claims
///
/// Bad signature, malformed structure, and expiry all collapse into the
/// generic authorization failure; the reason is only logged.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(reason = %e, "Bearer token rejected");
        PhonebookError::NotAuthorized
    })
}
