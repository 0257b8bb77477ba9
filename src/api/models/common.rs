//! Shared API response models

use serde::{Deserialize, Serialize};

/// Plain message body, used for verification and delete confirmations
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
