//! API handlers

pub mod contacts;

pub use contacts::*;

use crate::avatar::AvatarStore;
use crate::db::repository::{ContactRepository, UserRepository};
use crate::email::Mailer;
use std::sync::Arc;

/// Shared application state for handlers
#[derive(Clone)]
pub struct AppState {
    pub user_repo: Arc<UserRepository>,
    pub contact_repo: Arc<ContactRepository>,
    pub mailer: Arc<Mailer>,
    pub avatar_store: Arc<AvatarStore>,
    pub jwt_secret: Arc<String>,
}
