//! Pet list, detail and registration flows.

use uuid::Uuid;

use super::images::{upload_image, ImageAttachment};
use crate::errors::AppError;
use crate::models::{Animal, CreateAnimalRequest};
use crate::session::Session;
use crate::store::{fetch_all, fetch_one, insert_row, tables, ObjectStore, Query, RecordStore};

/// The signed-in user's pets.
pub async fn list_pets(
    records: &dyn RecordStore,
    session: &Session,
) -> Result<Vec<Animal>, AppError> {
    fetch_all(
        records,
        tables::ANIMALS,
        &Query::new().eq("owner_id", &session.user_id),
    )
    .await
}

/// One pet by id; not-found is a terminal display state.
pub async fn pet_detail(records: &dyn RecordStore, id: &str) -> Result<Animal, AppError> {
    fetch_one(records, tables::ANIMALS, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Pet {} not found", id)))
}

/// Register a new pet for the signed-in user. The profile picture, when
/// provided, is uploaded before the row is inserted; an upload failure
/// abandons the registration.
pub async fn register_pet(
    records: &dyn RecordStore,
    objects: &dyn ObjectStore,
    session: &Session,
    request: CreateAnimalRequest,
    photo: Option<&ImageAttachment>,
) -> Result<Animal, AppError> {
    if request.name.trim().is_empty()
        || request.species.trim().is_empty()
        || request.breed.as_deref().unwrap_or("").trim().is_empty()
    {
        return Err(AppError::Validation(
            "Name, species and breed are required.".to_string(),
        ));
    }

    let profile_picture = match photo {
        Some(image) => Some(upload_image(objects, image).await?),
        None => None,
    };

    let animal = Animal {
        id: Uuid::new_v4().to_string(),
        name: request.name.trim().to_string(),
        species: request.species.trim().to_string(),
        breed: request.breed,
        birth_date: request.birth_date,
        color: request.color,
        metric_number: request.metric_number,
        profile_picture,
        owner_id: session.user_id.clone(),
        father_id: request.father_id,
        mother_id: request.mother_id,
        has_pedigree: request.has_pedigree,
    };

    insert_row(records, tables::ANIMALS, &animal).await
}
