//! The main feed: all posts, newest first.

use crate::errors::AppError;
use crate::models::{Animal, Post, PostAuthor, Profile};
use crate::store::{fetch_all, fetch_one, tables, Query, RecordStore};

/// Load the feed, ordered by creation time descending.
pub async fn load_feed(records: &dyn RecordStore) -> Result<Vec<Post>, AppError> {
    fetch_all(
        records,
        tables::POSTS,
        &Query::new().order_desc("created_at"),
    )
    .await
}

/// Resolve the display name for a post's author, preferring the animal's
/// identity when the post was made on its behalf. Lookup failures fall back
/// to the raw identifier so the feed still renders.
pub async fn author_display(records: &dyn RecordStore, post: &Post) -> String {
    match &post.author {
        PostAuthor::Animal { animal_id, .. } => {
            match fetch_one::<Animal>(records, tables::ANIMALS, animal_id).await {
                Ok(Some(animal)) => animal.name,
                Ok(None) => animal_id.clone(),
                Err(err) => {
                    tracing::warn!("Could not resolve animal author {}: {}", animal_id, err);
                    animal_id.clone()
                }
            }
        }
        PostAuthor::User { user_id } => {
            match fetch_one::<Profile>(records, tables::PROFILES, user_id).await {
                Ok(Some(profile)) => profile.username,
                Ok(None) => user_id.clone(),
                Err(err) => {
                    tracing::warn!("Could not resolve author profile {}: {}", user_id, err);
                    user_id.clone()
                }
            }
        }
    }
}
