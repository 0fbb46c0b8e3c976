//! Two-generation ancestor tree resolution.
//!
//! Given a starting animal, resolves its recorded father and mother and, for
//! each parent that resolved, that parent's own father and mother. The
//! result is a fixed seven-slot tree. Traversal is hard-capped at two
//! generations: at most seven lookups, no recursion, and therefore no need
//! for cycle detection. If ancestry depth is ever generalized past the cap,
//! a visited set becomes mandatory.

use crate::models::Animal;
use crate::store::{fetch_one, tables, RecordStore};

/// Display summary of one resolved ancestor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestorSummary {
    pub id: String,
    pub name: String,
    /// Breed when recorded, species otherwise
    pub lineage: String,
}

impl From<&Animal> for AncestorSummary {
    fn from(animal: &Animal) -> Self {
        AncestorSummary {
            id: animal.id.clone(),
            name: animal.name.clone(),
            lineage: animal.lineage().to_string(),
        }
    }
}

/// The fixed seven-slot ancestor tree. The root is always populated; every
/// other slot is absent when the ancestor is unrecorded or failed to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PedigreeTree {
    pub root: AncestorSummary,
    pub father: Option<AncestorSummary>,
    pub mother: Option<AncestorSummary>,
    pub paternal_grandfather: Option<AncestorSummary>,
    pub paternal_grandmother: Option<AncestorSummary>,
    pub maternal_grandfather: Option<AncestorSummary>,
    pub maternal_grandmother: Option<AncestorSummary>,
}

/// Terminal outcome of a pedigree resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PedigreeView {
    Ready(PedigreeTree),
    /// The root identifier was missing or did not resolve
    RootNotFound,
}

/// Resolve the ancestor tree for `animal_id`.
///
/// Only the root lookup can fail the operation; every other lookup that
/// errors or finds nothing leaves its slot absent without touching sibling
/// branches. An absent parent reference skips the fetch entirely, so the
/// lookup count is bounded by the recorded ancestry, never padded to seven.
pub async fn resolve_pedigree(store: &dyn RecordStore, animal_id: &str) -> PedigreeView {
    if animal_id.trim().is_empty() {
        return PedigreeView::RootNotFound;
    }

    let Some(root) = lookup(store, Some(animal_id)).await else {
        return PedigreeView::RootNotFound;
    };

    let father = lookup(store, root.father_id.as_deref()).await;
    let mother = lookup(store, root.mother_id.as_deref()).await;

    let (paternal_grandfather, paternal_grandmother) = grandparents(store, father.as_ref()).await;
    let (maternal_grandfather, maternal_grandmother) = grandparents(store, mother.as_ref()).await;

    PedigreeView::Ready(PedigreeTree {
        root: AncestorSummary::from(&root),
        father: father.as_ref().map(AncestorSummary::from),
        mother: mother.as_ref().map(AncestorSummary::from),
        paternal_grandfather: paternal_grandfather.as_ref().map(AncestorSummary::from),
        paternal_grandmother: paternal_grandmother.as_ref().map(AncestorSummary::from),
        maternal_grandfather: maternal_grandfather.as_ref().map(AncestorSummary::from),
        maternal_grandmother: maternal_grandmother.as_ref().map(AncestorSummary::from),
    })
}

/// Both parents of `parent`, or nothing at all when the parent itself never
/// resolved (no lookups are attempted for an absent branch).
async fn grandparents(
    store: &dyn RecordStore,
    parent: Option<&Animal>,
) -> (Option<Animal>, Option<Animal>) {
    match parent {
        Some(parent) => (
            lookup(store, parent.father_id.as_deref()).await,
            lookup(store, parent.mother_id.as_deref()).await,
        ),
        None => (None, None),
    }
}

/// Fetch one animal. An absent reference performs no fetch; a failed fetch
/// is logged and treated as an unrecorded ancestor.
async fn lookup(store: &dyn RecordStore, id: Option<&str>) -> Option<Animal> {
    let id = id?;
    match fetch_one::<Animal>(store, tables::ANIMALS, id).await {
        Ok(found) => found,
        Err(err) => {
            tracing::warn!("Pedigree lookup for animal {} failed: {}", id, err);
            None
        }
    }
}
