//! Authentication API handlers

use crate::api::extract::Json;
use crate::api::handlers::AppState;
use crate::api::models::MessageResponse;
use crate::auth::jwt::issue_token;
use crate::auth::middleware::AuthUser;
use crate::auth::models::{
    AvatarResponse, CredentialsRequest, LoginResponse, SignupResponse, SignupUser, UserProjection,
};
use crate::auth::password::{hash_password, verify_password};
use crate::avatar::gravatar_url;
use crate::core::error::{PhonebookError, Result};
use crate::db::models::{User, DEFAULT_SUBSCRIPTION};
use crate::db::repository::Repository;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

/// Opaque single-use token mailed to the user at signup
fn generate_verification_token() -> String {
    use rand::RngCore;

    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Handler for POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<impl IntoResponse> {
    let (email, password) = req.validate()?;

    if state.user_repo.find_by_email(&email).await?.is_some() {
        return Err(PhonebookError::Conflict("Conflict Error: Email in use.".into()));
    }

    let password_hash = hash_password(&password)?;
    let verification_token = generate_verification_token();

    let user = User {
        id: Uuid::new_v4().to_string(),
        email: email.clone(),
        password_hash,
        subscription: DEFAULT_SUBSCRIPTION.to_string(),
        token: None,
        avatar_url: gravatar_url(&email),
        verified: false,
        verification_token: Some(verification_token.clone()),
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    state.user_repo.create(&user).await?;

    tracing::info!(user_id = %user.id, email = %user.email, "User registered");

    // Delivery failure does not fail the signup; the account exists and the
    // token can be re-sent out of band.
    if let Err(e) = state
        .mailer
        .send_verification(&user.email, &verification_token)
        .await
    {
        tracing::warn!(error = %e, email = %user.email, "Failed to send verification mail");
    }

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            user: SignupUser {
                email: user.email,
                subscription: user.subscription,
                avatar_url: user.avatar_url,
            },
            message: "Registration successful".into(),
        }),
    ))
}

/// Handler for GET /api/auth/verify/:token
///
/// Consumes the token: the first visit flips `verified`, any later visit
/// with the same token gets 404.
pub async fn verify_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse> {
    if !state.user_repo.mark_verified(&token).await? {
        return Err(PhonebookError::NotFound("User not found".into()));
    }

    tracing::info!("Email verified");

    Ok(Json(MessageResponse {
        message: "Verification successful".into(),
    }))
}

/// Handler for POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<impl IntoResponse> {
    let (email, password) = req.validate()?;

    // Unknown email and wrong password take the same exit so the response
    // cannot be used to enumerate accounts
    let Some(user) = state.user_repo.find_by_email(&email).await? else {
        return Err(PhonebookError::WrongCredentials);
    };
    if !verify_password(&password, &user.password_hash) {
        return Err(PhonebookError::WrongCredentials);
    }

    let token = issue_token(&user, &state.jwt_secret)?;
    state
        .user_repo
        .set_session_token(&user.id, Some(token.clone()))
        .await?;

    tracing::info!(user_id = %user.id, "Login successful");

    Ok(Json(LoginResponse {
        token,
        user: UserProjection {
            email: user.email,
            subscription: user.subscription,
        },
    }))
}

/// Handler for GET /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse> {
    state.user_repo.set_session_token(&user.id, None).await?;

    tracing::info!(user_id = %user.id, "Logged out");

    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /api/auth/current
pub async fn current_user(user: AuthUser) -> Json<UserProjection> {
    Json(UserProjection {
        email: user.email,
        subscription: user.subscription,
    })
}

/// Handler for PATCH /api/auth/avatars
///
/// Multipart upload with a single `avatar` file field.
pub async fn update_avatar(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PhonebookError::Validation(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("avatar") {
            continue;
        }

        let original_name = field
            .file_name()
            .map(|n| n.to_string())
            .ok_or_else(|| PhonebookError::Validation("Avatar file name is required".into()))?;

        let data = field
            .bytes()
            .await
            .map_err(|e| PhonebookError::Validation(format!("Failed to read avatar upload: {}", e)))?;

        let avatar_url = state.avatar_store.store(&user.id, &original_name, &data).await?;
        state.user_repo.set_avatar_url(&user.id, &avatar_url).await?;

        tracing::info!(user_id = %user.id, avatar_url = %avatar_url, "Avatar updated");

        return Ok(Json(AvatarResponse { avatar_url }));
    }

    Err(PhonebookError::Validation("missing avatar file".into()))
}
