//! Contact request models and validation

use crate::core::error::{PhonebookError, Result};
use crate::core::validate::{is_valid_email, is_valid_phone};
use crate::db::models::ContactPatch;
use serde::Deserialize;

fn require_field(value: Option<String>, field: &str) -> Result<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| PhonebookError::Validation(format!("missing required {} field", field)))
}

fn check_email(email: &str) -> Result<()> {
    if !is_valid_email(email) {
        return Err(PhonebookError::Validation("invalid email format".into()));
    }
    Ok(())
}

fn check_phone(phone: &str) -> Result<()> {
    if !is_valid_phone(phone) {
        return Err(PhonebookError::Validation(
            "phone must contain only digits".into(),
        ));
    }
    Ok(())
}

/// Validated payload for contact creation
#[derive(Debug)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub favorite: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub favorite: Option<bool>,
}

impl CreateContactRequest {
    pub fn validate(self) -> Result<NewContact> {
        let CreateContactRequest {
            name,
            email,
            phone,
            favorite,
        } = self;

        let name = require_field(name, "name")?;
        let email = require_field(email, "email")?;
        let phone = require_field(phone, "phone")?;
        check_email(&email)?;
        check_phone(&phone)?;

        Ok(NewContact {
            name,
            email,
            phone,
            favorite: favorite.unwrap_or(false),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub favorite: Option<bool>,
}

impl UpdateContactRequest {
    pub fn validate(self) -> Result<ContactPatch> {
        if self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.favorite.is_none()
        {
            return Err(PhonebookError::Validation("missing fields".into()));
        }

        if let Some(email) = &self.email {
            check_email(email)?;
        }
        if let Some(phone) = &self.phone {
            check_phone(phone)?;
        }

        Ok(ContactPatch {
            name: self.name,
            email: self.email,
            phone: self.phone,
            favorite: self.favorite,
        })
    }
}

/// Body of PATCH /api/contacts/:id/favorite. A non-boolean value never
/// reaches validation; it is rejected at the extractor.
#[derive(Debug, Deserialize)]
pub struct FavoriteRequest {
    pub favorite: Option<bool>,
}

impl FavoriteRequest {
    pub fn validate(self) -> Result<bool> {
        self.favorite
            .ok_or_else(|| PhonebookError::Validation("missing field favorite".into()))
    }
}

/// Query parameters for listing contacts
#[derive(Debug, Deserialize)]
pub struct ListContactsQuery {
    pub favorite: Option<bool>,
}
