//! Image upload helper shared by the composer and the pet/profile forms.

use std::path::Path;

use chrono::Utc;

use crate::errors::AppError;
use crate::store::ObjectStore;

/// Bucket holding all user-uploaded images.
pub const IMAGES_BUCKET: &str = "images";

/// An image picked for upload: raw bytes plus naming metadata.
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageAttachment {
    /// Read an image from disk. Unreadable paths are a form-input problem,
    /// not a remote one.
    pub async fn read(path: &Path) -> Result<Self, AppError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| AppError::Validation(format!("Could not read image {:?}: {}", path, err)))?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.jpg".to_string());

        let content_type = content_type_for(&file_name).to_string();

        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }
}

fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name.rsplit('.').next().unwrap_or("");
    match extension.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

/// Upload an image under a timestamp-prefixed key and return its public URL.
pub async fn upload_image(
    objects: &dyn ObjectStore,
    image: &ImageAttachment,
) -> Result<String, AppError> {
    let key = format!(
        "public/{}-{}",
        Utc::now().timestamp_millis(),
        image.file_name
    );

    objects
        .upload(IMAGES_BUCKET, &key, image.bytes.clone(), &image.content_type)
        .await?;

    Ok(objects.public_url(IMAGES_BUCKET, &key))
}
