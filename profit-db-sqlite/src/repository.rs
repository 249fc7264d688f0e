use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use profit_core::{
    CalculatorState, NewProject, Project, ProjectRepository, ProjectUpdate, RepositoryError,
};
use sqlx::FromRow;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::debug;
use uuid::Uuid;

pub struct SqliteProjectRepository {
    pool: SqlitePool,
}

impl SqliteProjectRepository {
    /// Connects to `database_url`, creating the database file if needed.
    ///
    /// Accepts sqlx URLs (`sqlite:profit.db?mode=rwc`, `sqlite::memory:`) as
    /// well as bare paths. In-memory databases are held on a single
    /// connection so every query sees the same data.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database url: {}", database_url))?
            .create_if_missing(true);

        let mut pool_options = SqlitePoolOptions::new();
        if database_url.contains(":memory:") {
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[derive(FromRow)]
struct ProjectRow {
    id: String,
    owner_id: String,
    name: String,
    state: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProjectRow> for Project {
    type Error = RepositoryError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        let state = CalculatorState::from_json(&row.state).map_err(|e| {
            RepositoryError::Serialization(format!("project {}: {}", row.id, e))
        })?;

        Ok(Project {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
            state,
        })
    }
}

const SELECT_PROJECT: &str =
    "SELECT id, owner_id, name, state, created_at, updated_at FROM projects";

#[async_trait]
impl ProjectRepository for SqliteProjectRepository {
    async fn list_projects(
        &self,
        owner_id: &str,
    ) -> Result<Vec<Project>, RepositoryError> {
        debug!(owner_id, "listing projects");
        let rows = sqlx::query_as::<_, ProjectRow>(&format!(
            "{} WHERE owner_id = ? ORDER BY updated_at DESC",
            SELECT_PROJECT
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.into_iter().map(Project::try_from).collect()
    }

    async fn get_project(
        &self,
        owner_id: &str,
        id: &str,
    ) -> Result<Project, RepositoryError> {
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            "{} WHERE owner_id = ? AND id = ?",
            SELECT_PROJECT
        ))
        .bind(owner_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?
        .ok_or(RepositoryError::NotFound)?;

        Project::try_from(row)
    }

    async fn create_project(
        &self,
        owner_id: &str,
        project: NewProject,
    ) -> Result<Project, RepositoryError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let state = project.state.to_json()?;

        sqlx::query(
            "INSERT INTO projects (id, owner_id, name, state, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(owner_id)
        .bind(&project.name)
        .bind(&state)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        debug!(owner_id, project_id = %id, "project inserted");
        Ok(Project {
            id,
            owner_id: owner_id.to_string(),
            name: project.name,
            created_at: now,
            updated_at: now,
            state: project.state,
        })
    }

    async fn update_project(
        &self,
        owner_id: &str,
        id: &str,
        update: &ProjectUpdate,
    ) -> Result<(), RepositoryError> {
        let state = update.state.as_ref().map(CalculatorState::to_json).transpose()?;

        let result = sqlx::query(
            "UPDATE projects SET
                name = COALESCE(?, name),
                state = COALESCE(?, state),
                updated_at = ?
             WHERE owner_id = ? AND id = ?",
        )
        .bind(update.name.as_deref())
        .bind(state)
        .bind(Utc::now())
        .bind(owner_id)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        debug!(owner_id, project_id = id, "project updated");
        Ok(())
    }

    async fn delete_project(
        &self,
        owner_id: &str,
        id: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM projects WHERE owner_id = ? AND id = ?")
            .bind(owner_id)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        debug!(owner_id, project_id = id, "project deleted");
        Ok(())
    }
}
