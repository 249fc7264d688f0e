//! SQLite storage for calculator projects.
//!
//! Each project is one row in `projects`; its calculator snapshot is kept as
//! a JSON document in the `state` column.

mod factory;
mod repository;

pub use factory::SqliteRepositoryFactory;
pub use repository::SqliteProjectRepository;
