//! User and animal profile pages, plus the edit/password flows.

use crate::errors::AppError;
use crate::models::{Animal, Post, Profile, UpdateProfileRequest};
use crate::session::Session;
use crate::store::{fetch_all, fetch_one, tables, Query, RecordStore, SessionService};

/// Everything the user profile page shows, fetched with chained lookups.
#[derive(Debug, Clone)]
pub struct UserPage {
    pub profile: Profile,
    pub animals: Vec<Animal>,
    pub posts: Vec<Post>,
}

/// An animal's public page: the animal and its owner.
#[derive(Debug, Clone)]
pub struct AnimalPage {
    pub animal: Animal,
    pub owner: Profile,
}

pub async fn user_page(records: &dyn RecordStore, user_id: &str) -> Result<UserPage, AppError> {
    let profile = fetch_one(records, tables::PROFILES, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", user_id)))?;

    let animals = fetch_all(
        records,
        tables::ANIMALS,
        &Query::new().eq("owner_id", user_id),
    )
    .await?;

    let posts = fetch_all(
        records,
        tables::POSTS,
        &Query::new().eq("user_id", user_id).order_desc("created_at"),
    )
    .await?;

    Ok(UserPage {
        profile,
        animals,
        posts,
    })
}

pub async fn animal_page(records: &dyn RecordStore, animal_id: &str) -> Result<AnimalPage, AppError> {
    let animal: Animal = fetch_one(records, tables::ANIMALS, animal_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Animal {} not found", animal_id)))?;

    let owner = fetch_one(records, tables::PROFILES, &animal.owner_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Owner of {} not found", animal_id)))?;

    Ok(AnimalPage { animal, owner })
}

/// The signed-in user's own profile.
pub async fn my_profile(records: &dyn RecordStore, session: &Session) -> Result<Profile, AppError> {
    fetch_one(records, tables::PROFILES, &session.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Your profile was not found".to_string()))
}

/// Apply a partial profile edit.
pub async fn edit_profile(
    records: &dyn RecordStore,
    session: &Session,
    update: &UpdateProfileRequest,
) -> Result<Profile, AppError> {
    if update.is_empty() {
        return Err(AppError::Validation("Nothing to update.".to_string()));
    }

    let patch = serde_json::to_value(update)?;
    let row = records
        .update(tables::PROFILES, &session.user_id, patch)
        .await?;
    Ok(serde_json::from_value(row)?)
}

/// Change the account password. Both fields are required and must match
/// before the session service is contacted.
pub async fn change_password(
    sessions: &dyn SessionService,
    new_password: &str,
    confirm_password: &str,
) -> Result<(), AppError> {
    if new_password.is_empty() || confirm_password.is_empty() {
        return Err(AppError::Validation("Please fill in all fields.".to_string()));
    }
    if new_password != confirm_password {
        return Err(AppError::Validation("Passwords do not match.".to_string()));
    }
    sessions.change_password(new_password).await
}
