use async_trait::async_trait;

use profit_core::db::{DbConfig, RepositoryFactory};
use profit_core::{ProjectRepository, RepositoryError};

use crate::repository::SqliteProjectRepository;

/// [`RepositoryFactory`] for SQLite.
///
/// Register this with a [`profit_core::db::RepositoryRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use profit_core::db::RepositoryRegistry;
/// use profit_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database described by `config.connection_string` and bring
    /// its schema up to date.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn ProjectRepository>, RepositoryError> {
        let repo = SqliteProjectRepository::new(&config.connection_string)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        Ok(Box::new(repo))
    }
}
