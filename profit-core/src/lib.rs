pub mod calculations;
pub mod db;
pub mod models;
pub mod session;

pub use calculations::{ComputationResult, ComputedRow, compute};
pub use db::repository::{ProjectRepository, RepositoryError};
pub use models::*;
pub use session::{Owner, ProjectSession, SaveOutcome};
