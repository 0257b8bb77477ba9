//! Database models
//!
//! Data structures representing database rows

use serde::{Deserialize, Serialize};

/// User record in the database
///
/// `token` is the single-slot current session token: login overwrites it,
/// logout nulls it, and the session guard compares the presented bearer
/// token against it byte for byte.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub subscription: String,
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub avatar_url: String,
    pub verified: bool,
    #[serde(skip_serializing)]
    pub verification_token: Option<String>,
    pub created_at: String,
}

/// Contact record in the database, always owned by a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    #[serde(skip_serializing)]
    pub owner_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub favorite: bool,
    pub created_at: String,
}

/// Partial update applied to a contact; None fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct ContactPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub favorite: Option<bool>,
}

/// Allowed subscription tiers
pub const SUBSCRIPTIONS: &[&str] = &["starter", "pro", "business"];

/// Default tier assigned at signup
pub const DEFAULT_SUBSCRIPTION: &str = "starter";
