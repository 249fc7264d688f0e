//! JSON-file storage for calculator projects.
//!
//! Used when nobody is signed in: all projects live in a single
//! `{ "projects": [...] }` document on the local disk, or only in memory when
//! opened with `:memory:`.

mod factory;
mod repository;

pub use factory::LocalRepositoryFactory;
pub use repository::{IN_MEMORY, LocalProjectRepository};
