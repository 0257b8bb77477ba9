//! Session guard middleware
//!
//! Gates every protected route: extracts the bearer token, verifies the
//! signature and expiry, and cross-checks the token against the single
//! stored session token on the user record. The cross-check is what makes
//! logout and re-login invalidate still-unexpired tokens.

use crate::auth::jwt::verify_token;
use crate::core::error::PhonebookError;
use crate::db::repository::Repository;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Resolved identity stored in request extensions on success
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub subscription: String,
}

/// Authentication middleware for protected routes
///
/// Every rejection path returns the same generic 401 body so callers
/// cannot tell which sub-check failed.
pub async fn authenticate(
    State(state): State<crate::api::handlers::AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.to_string());

    let Some(token) = token else {
        return PhonebookError::NotAuthorized.into_response();
    };

    let claims = match verify_token(&token, &state.jwt_secret) {
        Ok(claims) => claims,
        Err(e) => return e.into_response(),
    };

    let user = match state.user_repo.find_by_id(&claims.sub).await {
        Ok(Some(user)) => user,
        Ok(None) => return PhonebookError::NotAuthorized.into_response(),
        Err(e) => {
            // A store failure must not reveal which layer rejected
            tracing::error!(error = %e, "Session guard user lookup failed");
            return PhonebookError::NotAuthorized.into_response();
        }
    };

    // Byte-equality against the stored single-slot token
    if user.token.as_deref() != Some(token.as_str()) {
        return PhonebookError::NotAuthorized.into_response();
    }

    request.extensions_mut().insert(AuthUser {
        id: user.id,
        email: user.email,
        subscription: user.subscription,
    });

    next.run(request).await
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = PhonebookError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(PhonebookError::NotAuthorized)
    }
}
