//! Avatar derivation and storage
//!
//! Default avatars are gravatar URLs derived from the email address.
//! Uploaded avatars pass through the temp dir, get resized to a fixed
//! square, and land in the public avatars directory for static serving.

use crate::core::error::{PhonebookError, Result};
use image::imageops::FilterType;
use std::path::{Path, PathBuf};
use tokio::task;
use uuid::Uuid;

/// Uploaded avatars are normalized to this square size
pub const AVATAR_SIZE: u32 = 250;

/// Derive the default avatar URL for an email address.
///
/// Gravatar hashes the trimmed, lowercased address; identical emails always
/// map to the same image.
pub fn gravatar_url(email: &str) -> String {
    use sha2::{Digest, Sha256};

    let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
    format!(
        "https://www.gravatar.com/avatar/{}?s=200&r=pg&d=identicon",
        hex::encode(digest)
    )
}

/// Filesystem store for uploaded avatars
pub struct AvatarStore {
    temp_dir: PathBuf,
    avatars_dir: PathBuf,
}

impl AvatarStore {
    /// Create the store, ensuring both directories exist
    pub fn new(temp_dir: &Path, public_dir: &Path) -> Result<Self> {
        let avatars_dir = public_dir.join("avatars");
        std::fs::create_dir_all(temp_dir)?;
        std::fs::create_dir_all(&avatars_dir)?;
        Ok(Self {
            temp_dir: temp_dir.to_path_buf(),
            avatars_dir,
        })
    }

    /// Directory that should be served statically under `/avatars`
    pub fn avatars_dir(&self) -> &Path {
        &self.avatars_dir
    }

    /// Persist an uploaded avatar for a user and return its public URL path.
    ///
    /// The upload is staged in the temp dir, decoded and resized on the
    /// blocking pool, and written as `<user_id>_<original file name>`.
    pub async fn store(&self, user_id: &str, original_name: &str, data: &[u8]) -> Result<String> {
        // Only the final path component of the client-supplied name is used
        let file_name = Path::new(original_name)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                PhonebookError::Validation("Invalid avatar file name".into())
            })?;

        let mime = mime_guess::from_path(&file_name).first_or_octet_stream();
        if mime.type_() != mime_guess::mime::IMAGE {
            return Err(PhonebookError::Validation(format!(
                "Unsupported avatar type: {}",
                mime
            )));
        }

        let temp_path = self.temp_dir.join(format!("upload-{}-{}", Uuid::new_v4(), file_name));
        tokio::fs::write(&temp_path, data).await?;

        let final_name = format!("{}_{}", user_id, file_name);
        let final_path = self.avatars_dir.join(&final_name);

        let src = temp_path.clone();
        let dst = final_path.clone();
        let resize_result = task::spawn_blocking(move || -> Result<()> {
            let img = image::open(&src)
                .map_err(|e| PhonebookError::Image(format!("Failed to decode avatar: {}", e)))?;
            img.resize_exact(AVATAR_SIZE, AVATAR_SIZE, FilterType::Triangle)
                .save(&dst)
                .map_err(|e| PhonebookError::Image(format!("Failed to save avatar: {}", e)))?;
            Ok(())
        })
        .await
        .map_err(|e| PhonebookError::Task(format!("Avatar task panicked: {}", e)))?;

        // The staged upload is removed on both paths
        let _ = tokio::fs::remove_file(&temp_path).await;
        resize_result?;

        Ok(format!("/avatars/{}", final_name))
    }
}
