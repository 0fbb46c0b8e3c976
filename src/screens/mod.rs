//! Screen-level data flows behind the navigational surface.
//!
//! One module per screen family, mirroring the client routes: auth forms,
//! the feed, pet management, profile pages and the post composer. Each flow
//! owns a request-scoped copy of what it fetched; there is no cache and no
//! retry, and every remote failure is mapped to an [`crate::errors::AppError`]
//! at this boundary.

pub mod auth;
pub mod compose;
pub mod feed;
pub mod images;
pub mod pets;
pub mod profile;
