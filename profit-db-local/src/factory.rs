use async_trait::async_trait;

use profit_core::db::{DbConfig, RepositoryFactory};
use profit_core::{ProjectRepository, RepositoryError};

use crate::repository::LocalProjectRepository;

/// [`RepositoryFactory`] for the local JSON store, registered as `"local"`.
///
/// `connection_string` is a file path, or `:memory:` for a store that is
/// never written to disk.
pub struct LocalRepositoryFactory;

#[async_trait]
impl RepositoryFactory for LocalRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "local"
    }

    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn ProjectRepository>, RepositoryError> {
        let repo = LocalProjectRepository::open(&config.connection_string)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
        Ok(Box::new(repo))
    }
}

#[cfg(test)]
mod tests {
    use profit_core::db::{DbConfig, RepositoryFactory, RepositoryRegistry};
    use profit_core::{CalculatorState, NewProject};

    use super::LocalRepositoryFactory;

    #[test]
    fn backend_name_is_local() {
        assert_eq!(LocalRepositoryFactory.backend_name(), "local");
    }

    #[tokio::test]
    async fn registry_creates_in_memory_store() {
        let mut registry = RepositoryRegistry::new();
        registry.register(Box::new(LocalRepositoryFactory));

        let repo = registry
            .create(&DbConfig::new("local", ":memory:"))
            .await
            .expect("failed to create local repository");

        let created = repo
            .create_project("local", NewProject::new("Scratch", CalculatorState::default()))
            .await
            .expect("create project");
        let listed = repo.list_projects("local").await.expect("list projects");
        assert_eq!(listed, vec![created]);
    }
}
