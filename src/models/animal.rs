//! Animal model matching the backend `animals` table.

use serde::{Deserialize, Serialize};

/// A registered pet, optionally linked to recorded parent animals.
///
/// `father_id` / `mother_id`, when present, reference other rows of the same
/// table. Nothing enforces acyclicity; the pedigree traversal is hard-capped
/// at two generations and never follows these links further.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Animal {
    pub id: String,
    pub name: String,
    /// Species, stored in the `type` column
    #[serde(rename = "type")]
    pub species: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// External registry/metric number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    pub owner_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mother_id: Option<String>,
    #[serde(default)]
    pub has_pedigree: bool,
}

impl Animal {
    /// Breed when recorded, species otherwise. Display shorthand used by
    /// pet cards and pedigree slots.
    pub fn lineage(&self) -> &str {
        self.breed.as_deref().unwrap_or(&self.species)
    }
}

/// Form payload for registering a new pet.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateAnimalRequest {
    pub name: String,
    pub species: String,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub metric_number: Option<String>,
    #[serde(default)]
    pub father_id: Option<String>,
    #[serde(default)]
    pub mother_id: Option<String>,
    #[serde(default)]
    pub has_pedigree: bool,
}
