//! Post composition.
//!
//! A draft needs both a caption and an image before submission does
//! anything. Submission uploads the image first and only then inserts the
//! post row; if the upload fails, nothing is inserted, so a post can never
//! reference an image that was not stored.

use chrono::Utc;
use uuid::Uuid;

use super::images::{upload_image, ImageAttachment};
use crate::errors::AppError;
use crate::models::{Post, PostAuthor};
use crate::session::Session;
use crate::store::{insert_row, tables, ObjectStore, RecordStore};

/// Local form state of the composer.
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub caption: String,
    pub image: Option<ImageAttachment>,
    pub kind: Option<String>,
    pub location: Option<String>,
    pub tags: Option<Vec<String>>,
    pub reward: Option<f64>,
    /// Post on behalf of this animal instead of the user
    pub author_animal: Option<String>,
}

impl PostDraft {
    /// Submission is enabled only with a non-empty caption and an image.
    pub fn can_submit(&self) -> bool {
        !self.caption.trim().is_empty() && self.image.is_some()
    }
}

/// Submit the draft. The caller clears its form state only on success.
pub async fn submit(
    records: &dyn RecordStore,
    objects: &dyn ObjectStore,
    session: Option<&Session>,
    draft: &PostDraft,
) -> Result<Post, AppError> {
    // Incomplete drafts never reach either store.
    let Some(image) = draft.image.as_ref() else {
        return Err(AppError::Validation(
            "A caption and a photo are required.".to_string(),
        ));
    };
    if draft.caption.trim().is_empty() {
        return Err(AppError::Validation(
            "A caption and a photo are required.".to_string(),
        ));
    }

    let session = session.ok_or_else(|| AppError::Unauthorized("Sign in to post.".to_string()))?;

    let image_url = upload_image(objects, image).await?;

    let author = match &draft.author_animal {
        Some(animal_id) => PostAuthor::Animal {
            animal_id: animal_id.clone(),
            posted_by: session.user_id.clone(),
        },
        None => PostAuthor::User {
            user_id: session.user_id.clone(),
        },
    };

    let post = Post {
        id: Uuid::new_v4().to_string(),
        author,
        caption: draft.caption.trim().to_string(),
        image_url,
        kind: draft.kind.clone(),
        location: draft.location.clone(),
        tags: draft.tags.clone(),
        reward: draft.reward,
        created_at: Utc::now().to_rfc3339(),
    };

    insert_row(records, tables::POSTS, &post).await
}
