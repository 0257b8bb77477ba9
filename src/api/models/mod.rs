//! API request/response models

pub mod common;
pub mod contacts;

pub use common::MessageResponse;
pub use contacts::{
    CreateContactRequest, FavoriteRequest, ListContactsQuery, NewContact, UpdateContactRequest,
};
