//! Repository pattern implementation for the data access layer

use crate::core::error::{PhonebookError, Result};
use crate::db::manager::DatabaseManager;
use crate::db::models::{Contact, ContactPatch, User};
use async_trait::async_trait;
use rusqlite::{OptionalExtension, Row};
use std::sync::Arc;

/// Generic repository trait for CRUD operations
#[async_trait]
pub trait Repository<T>: Send + Sync {
    /// Find an entity by its ID
    async fn find_by_id(&self, id: &str) -> Result<Option<T>>;

    /// Create a new entity
    async fn create(&self, entity: &T) -> Result<()>;

    /// Update an existing entity
    async fn update(&self, entity: &T) -> Result<()>;

    /// Delete an entity by its ID
    async fn delete(&self, id: &str) -> Result<()>;
}

const USER_COLUMNS: &str = "id, email, password_hash, subscription, token, avatar_url, \
     verified, verification_token, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        subscription: row.get(3)?,
        token: row.get(4)?,
        avatar_url: row.get(5)?,
        verified: row.get(6)?,
        verification_token: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Repository for User entities
pub struct UserRepository {
    db: Arc<DatabaseManager>,
}

impl UserRepository {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Find a user by email (unique)
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.to_string();
        self.db
            .execute(move |conn| {
                conn.query_row(
                    &format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS),
                    [&email],
                    user_from_row,
                )
                .optional()
                .map_err(PhonebookError::Database)
            })
            .await
    }

    /// Overwrite the single session-token slot. `None` logs the user out;
    /// a new value invalidates whatever token was stored before.
    pub async fn set_session_token(&self, id: &str, token: Option<String>) -> Result<()> {
        let id = id.to_string();
        self.db
            .execute(move |conn| {
                conn.execute("UPDATE users SET token = ? WHERE id = ?", (&token, &id))
                    .map_err(PhonebookError::Database)?;
                Ok(())
            })
            .await
    }

    /// Consume a verification token: flip `verified` and clear the token in
    /// one statement. Returns false when no row matched, which covers both
    /// unknown tokens and replay after a successful visit.
    pub async fn mark_verified(&self, verification_token: &str) -> Result<bool> {
        let token = verification_token.to_string();
        self.db
            .execute(move |conn| {
                let changed = conn
                    .execute(
                        "UPDATE users SET verified = 1, verification_token = NULL \
                         WHERE verification_token = ?",
                        [&token],
                    )
                    .map_err(PhonebookError::Database)?;
                Ok(changed > 0)
            })
            .await
    }

    pub async fn set_avatar_url(&self, id: &str, avatar_url: &str) -> Result<()> {
        let id = id.to_string();
        let avatar_url = avatar_url.to_string();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "UPDATE users SET avatar_url = ? WHERE id = ?",
                    [&avatar_url, &id],
                )
                .map_err(PhonebookError::Database)?;
                Ok(())
            })
            .await
    }
}

#[async_trait]
impl Repository<User> for UserRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let id = id.to_string();
        self.db
            .execute(move |conn| {
                conn.query_row(
                    &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
                    [&id],
                    user_from_row,
                )
                .optional()
                .map_err(PhonebookError::Database)
            })
            .await
    }

    async fn create(&self, user: &User) -> Result<()> {
        let user = user.clone();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO users (id, email, password_hash, subscription, token, \
                     avatar_url, verified, verification_token, created_at) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    (
                        &user.id,
                        &user.email,
                        &user.password_hash,
                        &user.subscription,
                        &user.token,
                        &user.avatar_url,
                        user.verified,
                        &user.verification_token,
                        &user.created_at,
                    ),
                )
                .map_err(PhonebookError::Database)?;
                Ok(())
            })
            .await
    }

    async fn update(&self, user: &User) -> Result<()> {
        let user = user.clone();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "UPDATE users SET email = ?, password_hash = ?, subscription = ?, \
                     token = ?, avatar_url = ?, verified = ?, verification_token = ? \
                     WHERE id = ?",
                    (
                        &user.email,
                        &user.password_hash,
                        &user.subscription,
                        &user.token,
                        &user.avatar_url,
                        user.verified,
                        &user.verification_token,
                        &user.id,
                    ),
                )
                .map_err(PhonebookError::Database)?;
                Ok(())
            })
            .await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.db
            .execute(move |conn| {
                conn.execute("DELETE FROM users WHERE id = ?", [&id])
                    .map_err(PhonebookError::Database)?;
                Ok(())
            })
            .await
    }
}

const CONTACT_COLUMNS: &str = "id, owner_id, name, email, phone, favorite, created_at";

fn contact_from_row(row: &Row<'_>) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        favorite: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Repository for Contact entities
///
/// Deliberately does not implement the generic [`Repository`] trait: every
/// operation here takes the owner id, and there is no unscoped access path.
pub struct ContactRepository {
    db: Arc<DatabaseManager>,
}

impl ContactRepository {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// List the owner's contacts, optionally filtered by favorite flag
    pub async fn find_all(&self, owner_id: &str, favorite: Option<bool>) -> Result<Vec<Contact>> {
        let owner_id = owner_id.to_string();
        self.db
            .execute(move |conn| {
                let mut query = format!(
                    "SELECT {} FROM contacts WHERE owner_id = ?",
                    CONTACT_COLUMNS
                );
                // Params kept as String for uniform binding
                let mut params: Vec<String> = vec![owner_id];

                if let Some(favorite) = favorite {
                    query.push_str(" AND favorite = ?");
                    params.push(if favorite { "1" } else { "0" }.to_string());
                }

                query.push_str(" ORDER BY created_at DESC, id");

                let mut stmt = conn.prepare(&query).map_err(PhonebookError::Database)?;
                let contacts = stmt
                    .query_map(rusqlite::params_from_iter(params.iter()), contact_from_row)
                    .map_err(PhonebookError::Database)?
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(PhonebookError::Database)?;

                Ok(contacts)
            })
            .await
    }

    /// Fetch one contact; other-owned ids come back as None
    pub async fn find_by_id(&self, owner_id: &str, id: &str) -> Result<Option<Contact>> {
        let owner_id = owner_id.to_string();
        let id = id.to_string();
        self.db
            .execute(move |conn| {
                conn.query_row(
                    &format!(
                        "SELECT {} FROM contacts WHERE id = ? AND owner_id = ?",
                        CONTACT_COLUMNS
                    ),
                    [&id, &owner_id],
                    contact_from_row,
                )
                .optional()
                .map_err(PhonebookError::Database)
            })
            .await
    }

    pub async fn create(&self, contact: &Contact) -> Result<()> {
        let contact = contact.clone();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO contacts (id, owner_id, name, email, phone, favorite, created_at) \
                     VALUES (?, ?, ?, ?, ?, ?, ?)",
                    (
                        &contact.id,
                        &contact.owner_id,
                        &contact.name,
                        &contact.email,
                        &contact.phone,
                        contact.favorite,
                        &contact.created_at,
                    ),
                )
                .map_err(PhonebookError::Database)?;
                Ok(())
            })
            .await
    }

    /// Apply a partial update and return the updated row, or None when the
    /// contact does not exist for this owner
    pub async fn update(
        &self,
        owner_id: &str,
        id: &str,
        patch: &ContactPatch,
    ) -> Result<Option<Contact>> {
        let owner_id = owner_id.to_string();
        let id = id.to_string();
        let patch = patch.clone();
        self.db
            .transaction(move |tx| {
                let existing = tx
                    .query_row(
                        &format!(
                            "SELECT {} FROM contacts WHERE id = ? AND owner_id = ?",
                            CONTACT_COLUMNS
                        ),
                        [&id, &owner_id],
                        contact_from_row,
                    )
                    .optional()
                    .map_err(PhonebookError::Database)?;

                let Some(mut contact) = existing else {
                    return Ok(None);
                };

                if let Some(name) = patch.name {
                    contact.name = name;
                }
                if let Some(email) = patch.email {
                    contact.email = email;
                }
                if let Some(phone) = patch.phone {
                    contact.phone = phone;
                }
                if let Some(favorite) = patch.favorite {
                    contact.favorite = favorite;
                }

                tx.execute(
                    "UPDATE contacts SET name = ?, email = ?, phone = ?, favorite = ? \
                     WHERE id = ? AND owner_id = ?",
                    (
                        &contact.name,
                        &contact.email,
                        &contact.phone,
                        contact.favorite,
                        &contact.id,
                        &contact.owner_id,
                    ),
                )
                .map_err(PhonebookError::Database)?;

                Ok(Some(contact))
            })
            .await
    }

    /// Set the favorite flag and return the updated row. Idempotent.
    pub async fn set_favorite(
        &self,
        owner_id: &str,
        id: &str,
        favorite: bool,
    ) -> Result<Option<Contact>> {
        let owner_id = owner_id.to_string();
        let id = id.to_string();
        self.db
            .execute(move |conn| {
                let changed = conn
                    .execute(
                        "UPDATE contacts SET favorite = ? WHERE id = ? AND owner_id = ?",
                        (favorite, &id, &owner_id),
                    )
                    .map_err(PhonebookError::Database)?;

                if changed == 0 {
                    return Ok(None);
                }

                conn.query_row(
                    &format!(
                        "SELECT {} FROM contacts WHERE id = ? AND owner_id = ?",
                        CONTACT_COLUMNS
                    ),
                    [&id, &owner_id],
                    contact_from_row,
                )
                .optional()
                .map_err(PhonebookError::Database)
            })
            .await
    }

    /// Delete a contact; returns false when nothing matched for this owner
    pub async fn delete(&self, owner_id: &str, id: &str) -> Result<bool> {
        let owner_id = owner_id.to_string();
        let id = id.to_string();
        self.db
            .execute(move |conn| {
                let changed = conn
                    .execute(
                        "DELETE FROM contacts WHERE id = ? AND owner_id = ?",
                        [&id, &owner_id],
                    )
                    .map_err(PhonebookError::Database)?;
                Ok(changed > 0)
            })
            .await
    }
}
