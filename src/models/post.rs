//! Post model matching the backend `posts` table.
//!
//! The table stores authorship as `user_id` plus a nullable `animal_id`.
//! In the domain model authorship is a tagged variant so a post can never
//! be attributed to both or neither; the two-column shape only exists at
//! the serde boundary.

use serde::{Deserialize, Serialize};

/// Who a post is attributed to. Display logic prefers the animal's
/// identity when one was selected at composition time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostAuthor {
    /// Posted by the user themselves
    User { user_id: String },
    /// Posted on behalf of one of the user's animals
    Animal { animal_id: String, posted_by: String },
}

impl PostAuthor {
    /// The profile that composed the post, regardless of attribution.
    pub fn posted_by(&self) -> &str {
        match self {
            PostAuthor::User { user_id } => user_id,
            PostAuthor::Animal { posted_by, .. } => posted_by,
        }
    }

    /// The animal the post is attributed to, if any.
    pub fn animal_id(&self) -> Option<&str> {
        match self {
            PostAuthor::User { .. } => None,
            PostAuthor::Animal { animal_id, .. } => Some(animal_id),
        }
    }
}

/// A feed item with image and caption. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "PostRow", into = "PostRow")]
pub struct Post {
    pub id: String,
    pub author: PostAuthor,
    pub caption: String,
    pub image_url: String,
    /// Post type/category, stored in the `type` column
    pub kind: Option<String>,
    pub location: Option<String>,
    pub tags: Option<Vec<String>>,
    pub reward: Option<f64>,
    pub created_at: String,
}

/// Wire shape of a `posts` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRow {
    pub id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animal_id: Option<String>,
    pub caption: String,
    pub image_url: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward: Option<f64>,
    pub created_at: String,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        let author = match row.animal_id {
            Some(animal_id) => PostAuthor::Animal {
                animal_id,
                posted_by: row.user_id,
            },
            None => PostAuthor::User {
                user_id: row.user_id,
            },
        };
        Post {
            id: row.id,
            author,
            caption: row.caption,
            image_url: row.image_url,
            kind: row.kind,
            location: row.location,
            tags: row.tags,
            reward: row.reward,
            created_at: row.created_at,
        }
    }
}

impl From<Post> for PostRow {
    fn from(post: Post) -> Self {
        let (user_id, animal_id) = match post.author {
            PostAuthor::User { user_id } => (user_id, None),
            PostAuthor::Animal {
                animal_id,
                posted_by,
            } => (posted_by, Some(animal_id)),
        };
        PostRow {
            id: post.id,
            user_id,
            animal_id,
            caption: post.caption,
            image_url: post.image_url,
            kind: post.kind,
            location: post.location,
            tags: post.tags,
            reward: post.reward,
            created_at: post.created_at,
        }
    }
}
