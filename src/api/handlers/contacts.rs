//! Contact API handlers
//!
//! Every operation is scoped to the authenticated owner at the repository
//! layer; a foreign contact id behaves exactly like a missing one.

use crate::api::extract::Json;
use crate::api::handlers::AppState;
use crate::api::models::{
    CreateContactRequest, FavoriteRequest, ListContactsQuery, MessageResponse,
    UpdateContactRequest,
};
use crate::auth::middleware::AuthUser;
use crate::core::error::{PhonebookError, Result};
use crate::db::models::Contact;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

/// Handler for GET /api/contacts
pub async fn list_contacts(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListContactsQuery>,
) -> Result<Json<Vec<Contact>>> {
    let contacts = state.contact_repo.find_all(&user.id, query.favorite).await?;
    Ok(Json(contacts))
}

/// Handler for GET /api/contacts/:id
pub async fn get_contact(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Contact>> {
    let contact = state
        .contact_repo
        .find_by_id(&user.id, &id)
        .await?
        .ok_or_else(|| PhonebookError::NotFound("Not found".into()))?;
    Ok(Json(contact))
}

/// Handler for POST /api/contacts
pub async fn create_contact(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateContactRequest>,
) -> Result<impl IntoResponse> {
    let new_contact = req.validate()?;

    let contact = Contact {
        id: Uuid::new_v4().to_string(),
        owner_id: user.id,
        name: new_contact.name,
        email: new_contact.email,
        phone: new_contact.phone,
        favorite: new_contact.favorite,
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    state.contact_repo.create(&contact).await?;

    tracing::info!(contact_id = %contact.id, "Contact created");

    Ok((StatusCode::CREATED, Json(contact)))
}

/// Handler for PUT /api/contacts/:id
pub async fn update_contact(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateContactRequest>,
) -> Result<Json<Contact>> {
    let patch = req.validate()?;

    let contact = state
        .contact_repo
        .update(&user.id, &id, &patch)
        .await?
        .ok_or_else(|| PhonebookError::NotFound("Not found".into()))?;

    Ok(Json(contact))
}

/// Handler for DELETE /api/contacts/:id
pub async fn delete_contact(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    if !state.contact_repo.delete(&user.id, &id).await? {
        return Err(PhonebookError::NotFound("Not found".into()));
    }

    Ok(Json(MessageResponse {
        message: "contact deleted".into(),
    }))
}

/// Handler for PATCH /api/contacts/:id/favorite
pub async fn update_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<FavoriteRequest>,
) -> Result<Json<Contact>> {
    let favorite = req.validate()?;

    let contact = state
        .contact_repo
        .set_favorite(&user.id, &id, favorite)
        .await?
        .ok_or_else(|| PhonebookError::NotFound("Not found".into()))?;

    Ok(Json(contact))
}
