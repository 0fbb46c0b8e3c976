//! Collaborator contracts for the remote backend.
//!
//! All durable state lives behind three external services: the record store
//! (relational rows), the object store (image blobs) and the session service
//! (auth). The traits here are the whole surface the rest of the client is
//! allowed to touch; [`rest::RestClient`] implements all three over HTTP.

mod rest;

pub use rest::RestClient;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::errors::AppError;
use crate::session::Session;

/// Table names used by the client.
pub mod tables {
    pub const PROFILES: &str = "profiles";
    pub const ANIMALS: &str = "animals";
    pub const POSTS: &str = "posts";
}

/// Filtered read over a table: equality filters plus an optional descending
/// order column. This is the only query shape the client ever issues.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filters: Vec<(String, String)>,
    pub order_desc: Option<String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `column = value`.
    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.filters.push((column.to_string(), value.to_string()));
        self
    }

    /// Order results by `column`, newest first.
    pub fn order_desc(mut self, column: &str) -> Self {
        self.order_desc = Some(column.to_string());
        self
    }
}

/// Remote relational data service with per-table CRUD and filtered reads.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Filtered read returning all matching rows.
    async fn get(&self, table: &str, query: &Query) -> Result<Vec<Value>, AppError>;

    /// Read a single row by id; `Ok(None)` when the id resolves to nothing.
    async fn get_one(&self, table: &str, id: &str) -> Result<Option<Value>, AppError>;

    /// Insert a row and return the stored representation.
    async fn insert(&self, table: &str, row: Value) -> Result<Value, AppError>;

    /// Patch a row by id and return the updated representation.
    /// Fails with [`AppError::NotFound`] when the id resolves to nothing.
    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value, AppError>;
}

/// Remote blob storage for images.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AppError>;

    /// Stable public URL for an uploaded object.
    fn public_url(&self, bucket: &str, key: &str) -> String;
}

/// Remote auth service issuing sessions.
#[async_trait]
pub trait SessionService: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AppError>;

    /// Ends the remote session. The local session state is cleared even when
    /// the remote call fails; the failure is logged, not surfaced.
    async fn sign_out(&self) -> Result<(), AppError>;

    async fn change_password(&self, new_password: &str) -> Result<(), AppError>;

    fn current_session(&self) -> Option<Session>;
}

// Typed helpers over the Value-based trait. The trait stays dyn-safe; the
// generics live out here.

/// Read one row and deserialize it.
pub async fn fetch_one<T: DeserializeOwned>(
    store: &dyn RecordStore,
    table: &str,
    id: &str,
) -> Result<Option<T>, AppError> {
    match store.get_one(table, id).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Filtered read, deserialized.
pub async fn fetch_all<T: DeserializeOwned>(
    store: &dyn RecordStore,
    table: &str,
    query: &Query,
) -> Result<Vec<T>, AppError> {
    let rows = store.get(table, query).await?;
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(serde_json::from_value(row)?);
    }
    Ok(out)
}

/// Insert a typed row and deserialize the stored representation.
pub async fn insert_row<T: Serialize, R: DeserializeOwned>(
    store: &dyn RecordStore,
    table: &str,
    row: &T,
) -> Result<R, AppError> {
    let value = serde_json::to_value(row)?;
    let stored = store.insert(table, value).await?;
    Ok(serde_json::from_value(stored)?)
}
