//! Authentication request/response models

use crate::core::error::{PhonebookError, Result};
use crate::core::validate::is_valid_email;
use serde::{Deserialize, Serialize};

/// Signup and login share the same body shape. Fields are optional so
/// that missing ones produce the 400 validation message instead of a
/// decode error.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl CredentialsRequest {
    /// Validate presence and email shape, returning the owned pair
    pub fn validate(self) -> Result<(String, String)> {
        let (Some(email), Some(password)) = (self.email, self.password) else {
            return Err(PhonebookError::Validation(
                "Validation Error: Email and password are required.".into(),
            ));
        };
        if email.is_empty() || password.is_empty() {
            return Err(PhonebookError::Validation(
                "Validation Error: Email and password are required.".into(),
            ));
        }
        if !is_valid_email(&email) {
            return Err(PhonebookError::Validation(
                "Validation Error: Invalid email format.".into(),
            ));
        }
        Ok((email, password))
    }
}

/// Public projection of a user, never the hash
#[derive(Debug, Serialize)]
pub struct UserProjection {
    pub email: String,
    pub subscription: String,
}

/// Signup response user block additionally carries the derived avatar
#[derive(Debug, Serialize)]
pub struct SignupUser {
    pub email: String,
    pub subscription: String,
    #[serde(rename = "avatarURL")]
    pub avatar_url: String,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub user: SignupUser,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProjection,
}

#[derive(Debug, Serialize)]
pub struct AvatarResponse {
    #[serde(rename = "avatarURL")]
    pub avatar_url: String,
}
