//! The in-memory editing session around one calculator snapshot.
//!
//! A [`ProjectSession`] is the single writer of the current
//! [`CalculatorState`]: every edit goes through it and replaces the snapshot
//! wholesale. It also keeps the owner's project list in sync with the
//! repository it was opened on. Which repository that is (the signed-in store
//! or the local fallback) is decided by the caller.

use tracing::{debug, info};

use crate::calculations::{ComputationResult, compute};
use crate::db::repository::{ProjectRepository, RepositoryError};
use crate::models::{
    CalculatorState, ExpenseId, NewProject, Project, ProjectUpdate, normalize_project_name,
};

/// Who the session's projects belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Owner {
    /// A user resolved by the identity provider.
    SignedIn(String),
    /// Nobody is signed in; projects live in local storage.
    Anonymous,
}

impl Owner {
    /// Owner id used for projects saved without a signed-in user.
    pub const LOCAL_ID: &'static str = "local";

    pub fn id(&self) -> &str {
        match self {
            Self::SignedIn(id) => id,
            Self::Anonymous => Self::LOCAL_ID,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn(_))
    }
}

/// What [`ProjectSession::save`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing was active, so a new project was stored and made active.
    Created(Project),
    /// The active project was overwritten.
    Updated(Project),
}

pub struct ProjectSession {
    repo: Box<dyn ProjectRepository>,
    owner: Owner,
    projects: Vec<Project>,
    active_project_id: Option<String>,
    project_name: String,
    state: CalculatorState,
}

impl ProjectSession {
    /// Opens a session and loads the owner's projects.
    ///
    /// The session starts on the default snapshot with no active project.
    pub async fn open(
        repo: Box<dyn ProjectRepository>,
        owner: Owner,
    ) -> Result<Self, RepositoryError> {
        let projects = repo.list_projects(owner.id()).await?;
        debug!(owner = owner.id(), count = projects.len(), "loaded projects");

        Ok(Self {
            repo,
            owner,
            projects,
            active_project_id: None,
            project_name: String::new(),
            state: CalculatorState::default(),
        })
    }

    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    /// Projects of the owner, most recently updated first.
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn active_project(&self) -> Option<&Project> {
        let id = self.active_project_id.as_deref()?;
        self.projects.iter().find(|p| p.id == id)
    }

    /// Name of the active project, empty when nothing is active.
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// The current snapshot.
    pub fn state(&self) -> &CalculatorState {
        &self.state
    }

    /// Waterfall of the current snapshot, recomputed on every call.
    pub fn result(&self) -> ComputationResult {
        compute(&self.state)
    }

    /// Replaces the current snapshot with `edit(current)`.
    pub fn apply(
        &mut self,
        edit: impl FnOnce(&CalculatorState) -> CalculatorState,
    ) {
        self.state = edit(&self.state);
    }

    pub fn set_expense_percent(
        &mut self,
        id: ExpenseId,
        percent01: f64,
    ) {
        self.apply(|s| s.set_expense_percent(id, percent01));
    }

    pub fn set_expense_amount(
        &mut self,
        id: ExpenseId,
        amount: f64,
    ) {
        self.apply(|s| s.set_expense_amount(id, amount));
    }

    pub fn set_unit_price(
        &mut self,
        unit_price: f64,
    ) {
        self.apply(|s| s.set_unit_price(unit_price));
    }

    pub fn set_quantity(
        &mut self,
        quantity: f64,
    ) {
        self.apply(|s| s.set_quantity(quantity));
    }

    /// Back to the default snapshot. The active project is kept.
    pub fn reset(&mut self) {
        self.state = CalculatorState::default();
    }

    /// Reloads the project list from the repository.
    ///
    /// If the active project disappeared it is deselected; the current
    /// snapshot is kept either way.
    pub async fn reload(&mut self) -> Result<(), RepositoryError> {
        self.projects = self.repo.list_projects(self.owner.id()).await?;
        if self.active_project().is_none() {
            self.deselect();
        }
        Ok(())
    }

    /// Makes `id` the active project and loads its snapshot and name.
    pub async fn select(
        &mut self,
        id: &str,
    ) -> Result<(), RepositoryError> {
        let project = match self.projects.iter().find(|p| p.id == id) {
            Some(project) => project.clone(),
            None => {
                let project = self.repo.get_project(self.owner.id(), id).await?;
                self.projects.insert(0, project.clone());
                project
            }
        };

        debug!(project_id = %project.id, "project selected");
        self.state = project.state;
        self.project_name = project.name;
        self.active_project_id = Some(project.id);
        Ok(())
    }

    /// Stores a new project seeded with the default snapshot and makes it
    /// active.
    pub async fn create_project(
        &mut self,
        name: &str,
    ) -> Result<Project, RepositoryError> {
        self.insert_project(name, CalculatorState::default()).await
    }

    /// Saves the current snapshot.
    ///
    /// With no active project a new one is created from the current snapshot,
    /// named `name`. Otherwise the active project is overwritten with the
    /// current snapshot and with `name` if one is given.
    pub async fn save(
        &mut self,
        name: Option<&str>,
    ) -> Result<SaveOutcome, RepositoryError> {
        let Some(id) = self.active_project_id.clone() else {
            let project = self
                .insert_project(name.unwrap_or_default(), self.state.clone())
                .await?;
            return Ok(SaveOutcome::Created(project));
        };

        let name = name.map_or_else(|| self.project_name.clone(), normalize_project_name);
        let update = ProjectUpdate::state(self.state.clone()).with_name(&name);
        let project = self.write_update(&id, &update).await?;

        info!(project_id = %id, "project saved");
        Ok(SaveOutcome::Updated(project))
    }

    /// Renames the active project. Returns `false` when the name is unchanged.
    ///
    /// # Errors
    /// [`RepositoryError::NotFound`] when no project is active.
    pub async fn rename(
        &mut self,
        name: &str,
    ) -> Result<bool, RepositoryError> {
        let id = self
            .active_project_id
            .clone()
            .ok_or(RepositoryError::NotFound)?;
        let name = normalize_project_name(name);
        if name == self.project_name {
            return Ok(false);
        }

        self.write_update(&id, &ProjectUpdate::name(&name)).await?;
        info!(project_id = %id, %name, "project renamed");
        Ok(true)
    }

    /// Deletes a project. Deleting the active project deselects it but keeps
    /// the current snapshot on screen.
    pub async fn delete(
        &mut self,
        id: &str,
    ) -> Result<(), RepositoryError> {
        self.repo.delete_project(self.owner.id(), id).await?;
        self.projects.retain(|p| p.id != id);
        if self.active_project_id.as_deref() == Some(id) {
            self.deselect();
        }

        info!(project_id = %id, "project deleted");
        Ok(())
    }

    async fn insert_project(
        &mut self,
        name: &str,
        state: CalculatorState,
    ) -> Result<Project, RepositoryError> {
        let project = self
            .repo
            .create_project(self.owner.id(), NewProject::new(name, state))
            .await?;

        info!(project_id = %project.id, name = %project.name, "project created");
        self.projects.insert(0, project.clone());
        self.state = project.state.clone();
        self.project_name = project.name.clone();
        self.active_project_id = Some(project.id.clone());
        Ok(project)
    }

    async fn write_update(
        &mut self,
        id: &str,
        update: &ProjectUpdate,
    ) -> Result<Project, RepositoryError> {
        self.repo.update_project(self.owner.id(), id, update).await?;
        let project = self.repo.get_project(self.owner.id(), id).await?;

        self.projects.retain(|p| p.id != id);
        self.projects.insert(0, project.clone());
        if self.active_project_id.as_deref() == Some(id) {
            self.project_name = project.name.clone();
        }
        Ok(project)
    }

    fn deselect(&mut self) {
        self.active_project_id = None;
        self.project_name.clear();
    }
}
