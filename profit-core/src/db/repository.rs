use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewProject, Project, ProjectUpdate};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for RepositoryError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Storage for saved projects.
///
/// Every operation is scoped to an owner: a project stored for one owner is
/// invisible to every other owner. Writes are last-write-wins at the
/// granularity of a whole project.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// All projects of `owner_id`, most recently updated first.
    async fn list_projects(
        &self,
        owner_id: &str,
    ) -> Result<Vec<Project>, RepositoryError>;

    async fn get_project(
        &self,
        owner_id: &str,
        id: &str,
    ) -> Result<Project, RepositoryError>;

    /// Stores a new project with a fresh id and `created_at == updated_at`.
    async fn create_project(
        &self,
        owner_id: &str,
        project: NewProject,
    ) -> Result<Project, RepositoryError>;

    /// Applies `update` and bumps `updated_at`.
    async fn update_project(
        &self,
        owner_id: &str,
        id: &str,
        update: &ProjectUpdate,
    ) -> Result<(), RepositoryError>;

    async fn delete_project(
        &self,
        owner_id: &str,
        id: &str,
    ) -> Result<(), RepositoryError>;
}
