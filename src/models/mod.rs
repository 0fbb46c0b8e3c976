//! Data models mirroring the backend tables.

mod animal;
mod post;
mod profile;

pub use animal::*;
pub use post::*;
pub use profile::*;
