use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::calculator_state::CalculatorState;

/// Name given to projects saved without one.
pub const DEFAULT_PROJECT_NAME: &str = "Перегородки";

/// A named, persisted calculator snapshot owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub state: CalculatorState,
}

/// For creating new projects (no id or timestamps)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub name: String,
    pub state: CalculatorState,
}

impl NewProject {
    pub fn new(
        name: &str,
        state: CalculatorState,
    ) -> Self {
        Self {
            name: normalize_project_name(name),
            state,
        }
    }
}

/// Partial update of a stored project. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub state: Option<CalculatorState>,
}

impl ProjectUpdate {
    pub fn name(name: &str) -> Self {
        Self {
            name: Some(normalize_project_name(name)),
            state: None,
        }
    }

    pub fn state(state: CalculatorState) -> Self {
        Self {
            name: None,
            state: Some(state),
        }
    }

    pub fn with_name(
        mut self,
        name: &str,
    ) -> Self {
        self.name = Some(normalize_project_name(name));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.state.is_none()
    }

    /// Applies the update to an in-memory project, bumping `updated_at`.
    pub fn apply_to(
        &self,
        project: &mut Project,
        now: DateTime<Utc>,
    ) {
        if let Some(name) = &self.name {
            project.name = name.clone();
        }
        if let Some(state) = &self.state {
            project.state = state.clone();
        }
        project.updated_at = now;
    }
}

/// Trims a project name, substituting [`DEFAULT_PROJECT_NAME`] when empty.
pub fn normalize_project_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        DEFAULT_PROJECT_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}
