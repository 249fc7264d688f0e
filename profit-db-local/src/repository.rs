use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use profit_core::{NewProject, Project, ProjectRepository, ProjectUpdate, RepositoryError};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

/// Location string that keeps the store in memory only.
pub const IN_MEMORY: &str = ":memory:";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    projects: Vec<Project>,
}

/// Reads the document at `path`. A missing file is an empty document.
async fn read_document(path: &Path) -> Result<Document> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse project file '{}'", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Document::default()),
        Err(e) => Err(e).with_context(|| format!("Failed to read project file '{}'", path.display())),
    }
}

pub struct LocalProjectRepository {
    path: Option<PathBuf>,
    document: Mutex<Document>,
}

impl LocalProjectRepository {
    /// Opens the store at `location`, or an empty in-memory store for
    /// [`IN_MEMORY`].
    ///
    /// A missing file is an empty store; it is created on the first write.
    pub async fn open(location: &str) -> Result<Self> {
        if location == IN_MEMORY {
            return Ok(Self::in_memory());
        }

        let path = PathBuf::from(location);
        let document = read_document(&path).await?;

        debug!(path = %path.display(), count = document.projects.len(), "opened local project file");
        Ok(Self {
            path: Some(path),
            document: Mutex::new(document),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            document: Mutex::new(Document::default()),
        }
    }

    /// Backing file, `None` for an in-memory store.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Writes `document` to a sibling temp file and renames it over the
    /// backing file.
    async fn persist(
        &self,
        document: &Document,
    ) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory '{}'", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(document).context("Failed to encode projects")?;
        let mut tmp = OsString::from(path.as_os_str());
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write '{}'", tmp.display()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .with_context(|| format!("Failed to replace '{}'", path.display()))?;
        Ok(())
    }

    /// Locks the document after reloading it from disk, so writes made by
    /// another process since the last call are seen.
    async fn current(&self) -> Result<MutexGuard<'_, Document>, RepositoryError> {
        let mut document = self.document.lock().await;
        if let Some(path) = &self.path {
            *document = read_document(path)
                .await
                .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        }
        Ok(document)
    }

    /// Applies `change` to a fresh copy of the document and keeps it only
    /// once it is on disk.
    async fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Document) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let mut document = self.current().await?;
        let mut next = document.clone();
        let value = change(&mut next)?;

        self.persist(&next)
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        *document = next;
        Ok(value)
    }
}

fn position(
    document: &Document,
    owner_id: &str,
    id: &str,
) -> Result<usize, RepositoryError> {
    document
        .projects
        .iter()
        .position(|p| p.owner_id == owner_id && p.id == id)
        .ok_or(RepositoryError::NotFound)
}

#[async_trait]
impl ProjectRepository for LocalProjectRepository {
    async fn list_projects(
        &self,
        owner_id: &str,
    ) -> Result<Vec<Project>, RepositoryError> {
        let document = self.current().await?;
        let mut projects: Vec<_> = document
            .projects
            .iter()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(projects)
    }

    async fn get_project(
        &self,
        owner_id: &str,
        id: &str,
    ) -> Result<Project, RepositoryError> {
        let document = self.current().await?;
        let index = position(&document, owner_id, id)?;
        Ok(document.projects[index].clone())
    }

    async fn create_project(
        &self,
        owner_id: &str,
        project: NewProject,
    ) -> Result<Project, RepositoryError> {
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            name: project.name,
            created_at: now,
            updated_at: now,
            state: project.state,
        };

        let stored = project.clone();
        self.mutate(move |document| {
            document.projects.push(stored);
            Ok(())
        })
        .await?;

        debug!(owner_id, project_id = %project.id, "project stored");
        Ok(project)
    }

    async fn update_project(
        &self,
        owner_id: &str,
        id: &str,
        update: &ProjectUpdate,
    ) -> Result<(), RepositoryError> {
        let now = Utc::now();
        self.mutate(|document| {
            let index = position(document, owner_id, id)?;
            update.apply_to(&mut document.projects[index], now);
            Ok(())
        })
        .await?;

        debug!(owner_id, project_id = id, "project updated");
        Ok(())
    }

    async fn delete_project(
        &self,
        owner_id: &str,
        id: &str,
    ) -> Result<(), RepositoryError> {
        self.mutate(|document| {
            let index = position(document, owner_id, id)?;
            document.projects.remove(index);
            Ok(())
        })
        .await?;

        debug!(owner_id, project_id = id, "project deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use profit_core::{CalculatorState, ExpenseId, ExpenseMode};
    use rust_decimal_macros::dec;

    use super::*;

    /// A fresh file path under the system temp dir, removed on drop.
    struct TempFile(PathBuf);

    impl TempFile {
        fn new() -> Self {
            let dir = std::env::temp_dir().join(format!("profit-local-{}", Uuid::new_v4()));
            Self(dir.join("projects.json"))
        }

        fn location(&self) -> &str {
            self.0.to_str().expect("temp path is utf-8")
        }
    }

    impl Drop for TempFile {
        fn drop(&mut self) {
            if let Some(dir) = self.0.parent() {
                let _ = std::fs::remove_dir_all(dir);
            }
        }
    }

    fn test_project(name: &str) -> NewProject {
        NewProject::new(
            name,
            CalculatorState::default().set_expense_amount(ExpenseId::Installers, 8000.0),
        )
    }

    #[tokio::test]
    async fn in_memory_store_round_trip() {
        let repo = LocalProjectRepository::open(IN_MEMORY).await.unwrap();
        assert_eq!(repo.path(), None);

        let created = repo.create_project("local", test_project("Hall")).await.unwrap();
        let fetched = repo.get_project("local", &created.id).await.unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.state.expenses.installers.mode, ExpenseMode::Amount(dec!(8000)));
    }

    #[tokio::test]
    async fn missing_file_opens_empty() {
        let file = TempFile::new();

        let repo = LocalProjectRepository::open(file.location()).await.unwrap();

        assert!(repo.list_projects("local").await.unwrap().is_empty());
        assert!(!file.0.exists());
    }

    #[tokio::test]
    async fn projects_survive_reopen() {
        let file = TempFile::new();
        let repo = LocalProjectRepository::open(file.location()).await.unwrap();
        let created = repo.create_project("local", test_project("Kept")).await.unwrap();
        repo.update_project("local", &created.id, &ProjectUpdate::name("Kept too"))
            .await
            .unwrap();
        drop(repo);

        let reopened = LocalProjectRepository::open(file.location()).await.unwrap();
        let projects = reopened.list_projects("local").await.unwrap();

        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].id, created.id);
        assert_eq!(projects[0].name, "Kept too");
        assert_eq!(projects[0].state, created.state);
    }

    #[tokio::test]
    async fn file_holds_projects_document() {
        let file = TempFile::new();
        let repo = LocalProjectRepository::open(file.location()).await.unwrap();
        repo.create_project("local", test_project("Doc")).await.unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&file.0).unwrap()).unwrap();

        assert_eq!(json["projects"][0]["name"], "Doc");
        assert_eq!(json["projects"][0]["state"]["expenses"]["installers"]["mode"], "amount");
    }

    #[tokio::test]
    async fn corrupt_file_fails_to_open() {
        let file = TempFile::new();
        std::fs::create_dir_all(file.0.parent().unwrap()).unwrap();
        std::fs::write(&file.0, "{ not json").unwrap();

        assert!(LocalProjectRepository::open(file.location()).await.is_err());
    }

    #[tokio::test]
    async fn stored_values_are_sanitized_on_load() {
        let file = TempFile::new();
        std::fs::create_dir_all(file.0.parent().unwrap()).unwrap();
        let mut state = serde_json::to_value(CalculatorState::default()).unwrap();
        state["expenses"]["claims"]["value"] = serde_json::Value::from(3.5);
        state["expenses"]["hardware"]["value"] = serde_json::Value::from(-10.0);
        let document = serde_json::json!({
            "projects": [{
                "id": "p-1",
                "ownerId": "local",
                "name": "Hand edited",
                "createdAt": "2025-03-01T09:30:00Z",
                "updatedAt": "2025-03-01T09:30:00Z",
                "state": state,
            }]
        });
        std::fs::write(&file.0, document.to_string()).unwrap();

        let repo = LocalProjectRepository::open(file.location()).await.unwrap();
        let project = repo.get_project("local", "p-1").await.unwrap();

        assert_eq!(project.state.expenses.claims.mode, ExpenseMode::Percent(dec!(1)));
        assert_eq!(project.state.expenses.hardware.mode, ExpenseMode::Amount(dec!(0)));
    }

    #[tokio::test]
    async fn out_of_range_numbers_saturate_on_load() {
        let file = TempFile::new();
        std::fs::create_dir_all(file.0.parent().unwrap()).unwrap();
        let mut state = serde_json::to_value(CalculatorState::default()).unwrap();
        state["unitPrice"] = serde_json::Value::from(1e30);
        state["expenses"]["logistics"]["value"] = serde_json::Value::from(1e30);
        let document = serde_json::json!({
            "projects": [{
                "id": "p-big",
                "ownerId": "local",
                "name": "Big",
                "createdAt": "2025-03-01T09:30:00Z",
                "updatedAt": "2025-03-01T09:30:00Z",
                "state": state,
            }]
        });
        std::fs::write(&file.0, document.to_string()).unwrap();

        let repo = LocalProjectRepository::open(file.location()).await.unwrap();
        let project = repo.get_project("local", "p-big").await.unwrap();

        assert_eq!(project.state.unit_price, rust_decimal::Decimal::MAX);
        assert_eq!(
            project.state.expenses.logistics.mode,
            ExpenseMode::Amount(rust_decimal::Decimal::MAX)
        );
    }

    #[tokio::test]
    async fn two_handles_on_one_file_keep_each_others_projects() {
        let file = TempFile::new();
        let left = LocalProjectRepository::open(file.location()).await.unwrap();
        let right = LocalProjectRepository::open(file.location()).await.unwrap();

        let a = left.create_project("local", test_project("Left")).await.unwrap();
        let b = right.create_project("local", test_project("Right")).await.unwrap();
        left.update_project("local", &a.id, &ProjectUpdate::name("Left again"))
            .await
            .unwrap();

        let reopened = LocalProjectRepository::open(file.location()).await.unwrap();
        let mut names: Vec<_> = reopened
            .list_projects("local")
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        names.sort();

        assert_eq!(names, vec!["Left again".to_string(), "Right".to_string()]);
        assert_eq!(left.get_project("local", &b.id).await.unwrap().name, "Right");
    }

    #[tokio::test]
    async fn file_corrupted_after_open_is_a_database_error() {
        let file = TempFile::new();
        let repo = LocalProjectRepository::open(file.location()).await.unwrap();
        repo.create_project("local", test_project("Before")).await.unwrap();

        std::fs::write(&file.0, "{ not json").unwrap();

        assert!(matches!(
            repo.list_projects("local").await,
            Err(RepositoryError::Database(_))
        ));
        assert!(matches!(
            repo.create_project("local", test_project("After")).await,
            Err(RepositoryError::Database(_))
        ));
        assert_eq!(std::fs::read_to_string(&file.0).unwrap(), "{ not json");
    }

    #[tokio::test]
    async fn list_is_newest_first_and_scoped() {
        let repo = LocalProjectRepository::in_memory();
        let first = repo.create_project("local", test_project("First")).await.unwrap();
        let second = repo.create_project("local", test_project("Second")).await.unwrap();
        repo.create_project("user-1", test_project("Foreign")).await.unwrap();

        repo.update_project("local", &first.id, &ProjectUpdate::name("Touched"))
            .await
            .unwrap();

        let ids: Vec<_> = repo
            .list_projects("local")
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn update_and_delete_unknown_are_not_found() {
        let repo = LocalProjectRepository::in_memory();
        let created = repo.create_project("local", test_project("Mine")).await.unwrap();

        assert_eq!(
            repo.update_project("user-1", &created.id, &ProjectUpdate::name("x")).await,
            Err(RepositoryError::NotFound)
        );
        assert_eq!(
            repo.delete_project("local", "missing").await,
            Err(RepositoryError::NotFound)
        );
    }

    #[tokio::test]
    async fn delete_removes_from_file() {
        let file = TempFile::new();
        let repo = LocalProjectRepository::open(file.location()).await.unwrap();
        let created = repo.create_project("local", test_project("Gone")).await.unwrap();

        repo.delete_project("local", &created.id).await.unwrap();
        drop(repo);

        let reopened = LocalProjectRepository::open(file.location()).await.unwrap();
        assert!(reopened.list_projects("local").await.unwrap().is_empty());
    }
}
